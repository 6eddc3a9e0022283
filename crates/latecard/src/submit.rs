//! Submission sink for completed tardiness records.
//!
//! Records are POSTed as JSON to a configured endpoint (typically a
//! spreadsheet-backed script) in a single fire-and-forget call: no retry, no
//! backoff, no idempotency key. The endpoint is known to return non-JSON
//! bodies on success, so by default a 2xx response with an unparseable body
//! is treated as delivered rather than blocking the operator; see
//! `DESIGN.md` for the trade-off.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SubmissionConfig;
use crate::error::{Error, Result};
use crate::record::TardinessRecord;

/// How a submission concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The endpoint acknowledged the record.
    Delivered,
    /// The endpoint returned 2xx but the body could not be interpreted;
    /// assumed delivered per station policy.
    AssumedDelivered,
}

/// Acknowledgment body the endpoint returns when it behaves.
#[derive(Debug, Deserialize)]
struct EndpointAck {
    result: Option<String>,
    message: Option<String>,
}

/// Interpret an endpoint response.
///
/// Pure function so response handling is testable without a network:
/// - non-2xx status: rejected;
/// - 2xx with a parseable ack: delivered, unless the ack itself reports an
///   error;
/// - 2xx with an unparseable body: assumed delivered when
///   `assume_success_on_unparseable` is set, rejected otherwise.
///
/// # Errors
///
/// Returns [`Error::SubmissionRejected`] for responses interpreted as
/// failures.
pub fn interpret_response(
    status: StatusCode,
    body: &str,
    assume_success_on_unparseable: bool,
) -> Result<SubmissionOutcome> {
    if !status.is_success() {
        return Err(Error::SubmissionRejected {
            message: format!("endpoint returned HTTP {status}"),
        });
    }

    match serde_json::from_str::<EndpointAck>(body) {
        Ok(ack) => {
            if ack.result.as_deref() == Some("error") {
                let message = ack
                    .message
                    .unwrap_or_else(|| "endpoint reported an error".to_string());
                Err(Error::SubmissionRejected { message })
            } else {
                Ok(SubmissionOutcome::Delivered)
            }
        }
        Err(_) if assume_success_on_unparseable => {
            debug!("unparseable endpoint body treated as success");
            Ok(SubmissionOutcome::AssumedDelivered)
        }
        Err(_) => Err(Error::SubmissionRejected {
            message: "endpoint response could not be interpreted".to_string(),
        }),
    }
}

/// HTTP submission sink.
#[derive(Debug, Clone)]
pub struct SubmissionSink {
    client: reqwest::Client,
    endpoint: Url,
    assume_success_on_unparseable: bool,
}

impl SubmissionSink {
    /// Create a sink posting to the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        assume_success_on_unparseable: bool,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| Error::ConfigValidation {
            message: format!("invalid submission endpoint URL: {err}"),
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            assume_success_on_unparseable,
        })
    }

    /// Build a sink from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubmissionNotConfigured`] when no endpoint is set,
    /// or a configuration error for an invalid one.
    pub fn from_config(config: &SubmissionConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or(Error::SubmissionNotConfigured)?;
        Self::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
            config.assume_success_on_unparseable,
        )
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submit a validated record.
    ///
    /// One shot: transport failures and rejections are returned to the
    /// caller, which may offer a manual retry. Each attempt is logged with
    /// the student id and issue timestamp so duplicates from ambiguous
    /// retries stay traceable.
    ///
    /// # Errors
    ///
    /// Returns an error if the record fails validation, the request fails at
    /// the transport level, or the response is interpreted as a rejection.
    pub async fn submit(&self, record: &TardinessRecord) -> Result<SubmissionOutcome> {
        record.validate()?;

        info!(
            student_id = %record.student_id,
            issued_at = %record.issued_at_text(),
            "submitting tardiness record"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let outcome = interpret_response(status, &body, self.assume_success_on_unparseable);

        match &outcome {
            Ok(SubmissionOutcome::Delivered) => info!("record delivered"),
            Ok(SubmissionOutcome::AssumedDelivered) => {
                warn!("endpoint body unparseable; assuming delivery");
            }
            Err(err) => warn!(error = %err, "submission failed"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TardyReason;

    #[test]
    fn test_interpret_parseable_success() {
        let outcome = interpret_response(StatusCode::OK, r#"{"result":"success"}"#, true).unwrap();
        assert_eq!(outcome, SubmissionOutcome::Delivered);
    }

    #[test]
    fn test_interpret_ack_without_result_field() {
        let outcome = interpret_response(StatusCode::OK, r"{}", true).unwrap();
        assert_eq!(outcome, SubmissionOutcome::Delivered);
    }

    #[test]
    fn test_interpret_unparseable_body_assumed_success() {
        let outcome =
            interpret_response(StatusCode::OK, "<html>moved</html>", true).unwrap();
        assert_eq!(outcome, SubmissionOutcome::AssumedDelivered);
    }

    #[test]
    fn test_interpret_unparseable_body_strict() {
        let err = interpret_response(StatusCode::OK, "<html>moved</html>", false).unwrap_err();
        assert!(err.is_submission_error());
    }

    #[test]
    fn test_interpret_http_error_status() {
        let err =
            interpret_response(StatusCode::SERVICE_UNAVAILABLE, "", true).unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_interpret_endpoint_reported_error() {
        let err = interpret_response(
            StatusCode::OK,
            r#"{"result":"error","message":"sheet is full"}"#,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sheet is full"));
    }

    #[test]
    fn test_sink_rejects_invalid_url() {
        let result = SubmissionSink::new("not a url", Duration::from_secs(5), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_sink_from_config_without_endpoint() {
        let config = SubmissionConfig::default();
        let err = SubmissionSink::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::SubmissionNotConfigured));
    }

    #[test]
    fn test_sink_from_config_with_endpoint() {
        let config = SubmissionConfig {
            endpoint: Some("https://script.example.com/exec".to_string()),
            ..SubmissionConfig::default()
        };
        let sink = SubmissionSink::from_config(&config).unwrap();
        assert_eq!(sink.endpoint().as_str(), "https://script.example.com/exec");
    }

    #[tokio::test]
    async fn test_submit_validates_record_first() {
        let sink =
            SubmissionSink::new("https://script.example.com/exec", Duration::from_secs(5), true)
                .unwrap();
        let record = TardinessRecord::new("", TardyReason::Overslept, "Yamamoto");
        let err = sink.submit(&record).await.unwrap_err();
        assert!(err.to_string().contains("student id"));
    }
}
