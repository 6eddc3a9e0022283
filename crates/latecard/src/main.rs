//! `latecard` - CLI for the tardiness-card scan station
//!
//! This binary runs the scan session, manages the roster and the station's
//! default teacher, and issues printable or submitted tardiness cards.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::mpsc;

use latecard::cli::{CardCommand, Cli, Command, ConfigCommand, RosterCommand, TeacherCommand};
use latecard::record::TardinessRecord;
use latecard::scan::{CameraConstraint, SimulatedCamera, SimulatedDecoder};
use latecard::{
    init_logging, render_card, Config, LookupOutcome, Roster, ScanOptions, ScanSession, Student,
    SubmissionOutcome, SubmissionSink, TeacherPrefs,
};

// Platform-specific imports using conditional compilation
#[cfg(target_os = "linux")]
use latecard_linux as platform;

#[cfg(target_os = "macos")]
use latecard_mac as platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Scan(cmd) => handle_scan(&config, &cmd).await,
        Command::Lookup(cmd) => handle_lookup(&config, &cmd.id, cmd.json),
        Command::Roster(cmd) => handle_roster(&config, &cmd),
        Command::Card(cmd) => handle_card(&config, cmd).await,
        Command::Teacher(cmd) => handle_teacher(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_scan(config: &Config, cmd: &latecard::cli::ScanCommand) -> anyhow::Result<()> {
    if cmd.simulate.is_empty() {
        platform::init().map_err(|err| anyhow::anyhow!("{err}"))?;
        bail!(
            "no camera backend is built in for {}; rerun with --simulate <PAYLOAD>",
            platform::platform_name()
        );
    }

    // Interleave blank frames so the loop exercises non-detection ticks too.
    let mut script = Vec::new();
    for payload in &cmd.simulate {
        script.push(None);
        script.push(Some(payload.clone()));
    }
    let expected = cmd.simulate.len();

    let roster = Roster::open(config.roster_path())?;

    let options = ScanOptions {
        constraint: CameraConstraint {
            facing: config.camera.facing,
            device: None,
        },
        interval: config.scan_interval(),
        scan_box: config.camera.scan_box,
    };
    let mut session = ScanSession::new(
        Arc::new(SimulatedCamera::scripted(script)),
        Arc::new(SimulatedDecoder),
        options,
    );

    let (tx, mut rx) = mpsc::channel(16);
    session.activate(tx).await?;
    println!("Scan session running (ctrl-c to stop)...");

    let mut decoded = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                decoded += 1;
                println!();
                println!("Scanned: {}", event.payload);
                match roster.lookup(&event.payload)? {
                    LookupOutcome::Found(student) => {
                        println!("  Class: {}", student.class);
                        println!("  Name:  {}", student.name);
                    }
                    LookupOutcome::NotFound { reason } => {
                        println!("  Not in roster ({reason}); manual entry required");
                    }
                }
                if cmd.once || decoded >= expected {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    session.deactivate().await;
    println!("Scan session stopped after {decoded} detection(s).");
    Ok(())
}

fn handle_lookup(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let roster = Roster::open(config.roster_path())?;
    match roster.lookup(id)? {
        LookupOutcome::Found(student) => {
            if json {
                let value = serde_json::json!({
                    "found": true,
                    "id": student.id,
                    "class": student.class,
                    "name": student.name,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Student ID: {}", student.id);
                println!("Class:      {}", student.class);
                println!("Name:       {}", student.name);
            }
        }
        LookupOutcome::NotFound { reason } => {
            if json {
                let value = serde_json::json!({ "found": false, "reason": reason });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Not found: {reason}");
            }
        }
    }
    Ok(())
}

fn handle_roster(config: &Config, cmd: &RosterCommand) -> anyhow::Result<()> {
    let roster = Roster::open(config.roster_path())?;
    match cmd {
        RosterCommand::Add { id, class, name } => {
            roster.upsert(&Student {
                id: id.clone(),
                class: class.clone(),
                name: name.clone(),
            })?;
            println!("Added {id} ({class}, {name}).");
        }
        RosterCommand::Remove { id } => {
            if roster.remove(id)? {
                println!("Removed {id}.");
            } else {
                println!("No entry for {id}.");
            }
        }
        RosterCommand::List { json } => {
            let students = roster.list()?;
            if *json {
                let value: Vec<_> = students
                    .iter()
                    .map(|s| {
                        serde_json::json!({ "id": s.id, "class": s.class, "name": s.name })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if students.is_empty() {
                println!("Roster is empty.");
            } else {
                for student in students {
                    println!("{:<12}  {:<6}  {}", student.id, student.class, student.name);
                }
            }
        }
        RosterCommand::Seed => {
            roster.seed_fixtures()?;
            println!("Roster has {} entr(ies).", roster.count()?);
        }
    }
    Ok(())
}

async fn handle_card(config: &Config, cmd: CardCommand) -> anyhow::Result<()> {
    let teacher = match cmd.teacher {
        Some(teacher) => teacher,
        None => TeacherPrefs::new(config.prefs_path()).load().context(
            "no teacher selected; pass --teacher or set one with `latecard teacher set`",
        )?,
    };
    if !config.station.teachers.iter().any(|t| t == &teacher) {
        println!("Note: {teacher} is not in the configured teacher list.");
    }

    let mut record = TardinessRecord::new(&cmd.id, cmd.reason.into(), &teacher);
    record.contact = cmd.contact.into();
    record.reason_detail = cmd.detail;
    record.notes = cmd.notes;
    record.class = cmd.class;
    record.name = cmd.name;

    // Fill roster fields the operator didn't supply; a miss is not fatal.
    if record.class.is_none() || record.name.is_none() {
        let roster = Roster::open(config.roster_path())?;
        match roster.lookup(&cmd.id)? {
            LookupOutcome::Found(student) => {
                record.class.get_or_insert(student.class);
                record.name.get_or_insert(student.name);
            }
            LookupOutcome::NotFound { reason } => {
                println!("Note: {reason}; issuing card with manual fields.");
            }
        }
    }

    record.validate()?;

    if cmd.submit {
        let sink = SubmissionSink::from_config(&config.submission)?;
        match sink.submit(&record).await? {
            SubmissionOutcome::Delivered => println!("Record delivered."),
            SubmissionOutcome::AssumedDelivered => {
                println!("Endpoint response was unreadable; record assumed delivered.");
            }
        }
    } else {
        print!("{}", render_card(&record));
    }
    Ok(())
}

fn handle_teacher(config: &Config, cmd: &TeacherCommand) -> anyhow::Result<()> {
    let prefs = TeacherPrefs::new(config.prefs_path());
    match cmd {
        TeacherCommand::Show => match prefs.load() {
            Some(teacher) => println!("Default teacher: {teacher}"),
            None => println!("No default teacher set."),
        },
        TeacherCommand::Set { name } => {
            if !config.station.teachers.iter().any(|t| t == name) {
                println!("Note: {name} is not in the configured teacher list.");
            }
            prefs.set(name)?;
            println!("Default teacher set to {name}.");
        }
        TeacherCommand::Clear => {
            prefs.clear()?;
            println!("Default teacher cleared.");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Camera]");
                println!("  Facing:              {}", config.camera.facing);
                println!(
                    "  Attempts per second: {}",
                    config.camera.attempts_per_second
                );
                println!("  Scan box (px):       {}", config.camera.scan_box);
                println!();
                println!("[Roster]");
                println!("  Database path:       {}", config.roster_path().display());
                println!();
                println!("[Submission]");
                println!(
                    "  Endpoint:            {}",
                    config.submission.endpoint.as_deref().unwrap_or("(not set)")
                );
                println!("  Timeout (s):         {}", config.submission.timeout_secs);
                println!(
                    "  Assume success on unparseable body: {}",
                    config.submission.assume_success_on_unparseable
                );
                println!();
                println!("[Station]");
                println!(
                    "  Teachers:            {}",
                    config.station.teachers.join(", ")
                );
                println!("  Preference file:     {}", config.prefs_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
