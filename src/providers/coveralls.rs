//! Coveralls coverage service adapter.
//!
//! Coveralls posts an urlencoded form after each coverage report. The two
//! numeric fields must parse as floats; every other field is optional.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::CoverallsSettings;
use crate::notifier::{NotifyError, WirePayload};
use crate::webhook::{
    DecodeError, MatchSpec, Notification, ProviderAdapter, SharedNotification, WebhookRequest,
};

pub const NAME: &str = "coveralls";

/// User agent of the Coveralls webhook client.
pub const DEFAULT_USER_AGENT: &str = "ruby";

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Coverage report notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverallsNotification {
    pub badge_url: String,
    pub branch: String,
    pub commit_message: String,
    pub commit_sha: String,
    pub committer_email: String,
    pub committer_name: String,
    pub coverage_change: f64,
    pub covered_percent: f64,
    pub repo_name: String,
    pub url: String,
}

impl fmt::Display for CoverallsNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Coveralls[{}]: Change({:.2}%) Covered({:.2}%) {}",
            self.repo_name, self.coverage_change, self.covered_percent, self.url
        )
    }
}

impl Notification for CoverallsNotification {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WirePayload for CoverallsNotification {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    fn user_agent(&self) -> &'static str {
        DEFAULT_USER_AGENT
    }

    fn encode(&self) -> Result<Vec<u8>, NotifyError> {
        serde_urlencoded::to_string(self)
            .map(String::into_bytes)
            .map_err(|e| NotifyError::Encode(e.to_string()))
    }
}

/// Form fields as posted, before the numeric fields are parsed.
#[derive(Debug, Default)]
struct CoverallsForm {
    badge_url: String,
    branch: String,
    commit_message: String,
    commit_sha: String,
    committer_email: String,
    committer_name: String,
    coverage_change: String,
    covered_percent: String,
    repo_name: String,
    url: String,
}

impl CoverallsForm {
    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        let field = match key {
            "badge_url" => &mut self.badge_url,
            "branch" => &mut self.branch,
            "commit_message" => &mut self.commit_message,
            "commit_sha" => &mut self.commit_sha,
            "committer_email" => &mut self.committer_email,
            "committer_name" => &mut self.committer_name,
            "coverage_change" => &mut self.coverage_change,
            "covered_percent" => &mut self.covered_percent,
            "repo_name" => &mut self.repo_name,
            "url" => &mut self.url,
            _ => return None,
        };
        Some(field)
    }
}

/// Unknown keys are ignored. A repeated key keeps its first value.
impl FromIterator<(String, String)> for CoverallsForm {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut form = Self::default();
        let mut seen = HashSet::new();
        for (key, value) in pairs {
            let Some(field) = form.field_mut(&key) else {
                continue;
            };
            if seen.insert(key) {
                *field = value;
            }
        }
        form
    }
}

impl TryFrom<CoverallsForm> for CoverallsNotification {
    type Error = DecodeError;

    fn try_from(form: CoverallsForm) -> Result<Self, Self::Error> {
        Ok(Self {
            coverage_change: parse_float("coverage_change", form.coverage_change)?,
            covered_percent: parse_float("covered_percent", form.covered_percent)?,
            badge_url: form.badge_url,
            branch: form.branch,
            commit_message: form.commit_message,
            commit_sha: form.commit_sha,
            committer_email: form.committer_email,
            committer_name: form.committer_name,
            repo_name: form.repo_name,
            url: form.url,
        })
    }
}

fn parse_float(field: &'static str, value: String) -> Result<f64, DecodeError> {
    match value.parse::<f64>() {
        Ok(parsed) => Ok(parsed),
        Err(source) => Err(DecodeError::InvalidNumber {
            field,
            value,
            source,
        }),
    }
}

/// Adapter for Coveralls webhooks.
#[derive(Debug, Clone)]
pub struct CoverallsAdapter {
    spec: MatchSpec,
}

impl CoverallsAdapter {
    pub fn new(spec: MatchSpec) -> Self {
        Self { spec }
    }

    pub fn from_settings(settings: &CoverallsSettings) -> Self {
        Self::new(
            MatchSpec::post(settings.path.clone())
                .content_type(CONTENT_TYPE)
                .user_agent(settings.user_agent.clone()),
        )
    }
}

impl Default for CoverallsAdapter {
    fn default() -> Self {
        Self::from_settings(&CoverallsSettings::default())
    }
}

impl ProviderAdapter for CoverallsAdapter {
    fn match_spec(&self) -> &MatchSpec {
        &self.spec
    }

    fn handle(&self, request: &WebhookRequest) -> Result<SharedNotification, DecodeError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(request.body())?;
        let form: CoverallsForm = pairs.into_iter().collect();
        let notification = CoverallsNotification::try_from(form)?;
        Ok(Arc::new(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::capture_logs;
    use crate::webhook::{DispatchOutcome, Dispatcher, Registry};
    use axum::http::{HeaderValue, header};

    const TEST_FORM: &str = "badge_url=badge_url&branch=branch&commit_message=commit_message\
        &commit_sha=commit_sha&committer_email=committer_email&committer_name=committer_name\
        &coverage_change=1.5&covered_percent=97&repo_name=repo_name&url=url";

    fn test_notification() -> CoverallsNotification {
        CoverallsNotification {
            badge_url: "badge_url".to_string(),
            branch: "branch".to_string(),
            commit_message: "commit_message".to_string(),
            commit_sha: "commit_sha".to_string(),
            committer_email: "committer_email".to_string(),
            committer_name: "committer_name".to_string(),
            coverage_change: 1.5,
            covered_percent: 97.0,
            repo_name: "repo_name".to_string(),
            url: "url".to_string(),
        }
    }

    fn coveralls_request(body: impl Into<axum::body::Bytes>) -> WebhookRequest {
        WebhookRequest::post("/")
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .with_header(header::USER_AGENT, HeaderValue::from_static("ruby"))
            .with_body(body)
    }

    #[test]
    fn test_string() {
        assert_eq!(
            test_notification().to_string(),
            "Coveralls[repo_name]: Change(1.50%) Covered(97.00%) url"
        );
    }

    #[test]
    fn test_handle() {
        let adapter = CoverallsAdapter::default();
        let request = coveralls_request(TEST_FORM);
        assert!(adapter.recognize(&request));

        let note = adapter.handle(&request).unwrap();
        assert_eq!(
            note.downcast_ref::<CoverallsNotification>(),
            Some(&test_notification())
        );
    }

    #[test]
    fn test_handle_decodes_percent_escapes() {
        let adapter = CoverallsAdapter::default();
        let note = adapter
            .handle(&coveralls_request(
                "repo_name=octo%2Fapp&coverage_change=-0.25&covered_percent=80.5&url=https%3A%2F%2Fcoveralls.io%2Fbuilds%2F1",
            ))
            .unwrap();
        assert_eq!(
            note.to_string(),
            "Coveralls[octo/app]: Change(-0.25%) Covered(80.50%) https://coveralls.io/builds/1"
        );
    }

    #[test]
    fn test_handle_repeated_field_keeps_first_value() {
        let adapter = CoverallsAdapter::default();
        let note = adapter
            .handle(&coveralls_request(
                "repo_name=first&coverage_change=1&covered_percent=50\
                 &repo_name=second&covered_percent=oops&url=u",
            ))
            .unwrap();
        let note = note.downcast_ref::<CoverallsNotification>().unwrap();
        assert_eq!(note.repo_name, "first");
        assert_eq!(note.covered_percent, 50.0);
        assert_eq!(note.url, "u");
    }

    #[test]
    fn test_handle_ignores_unknown_fields() {
        let adapter = CoverallsAdapter::default();
        let note = adapter
            .handle(&coveralls_request(
                "coverage_change=0&covered_percent=1&extra=x&repo_name=r",
            ))
            .unwrap();
        assert_eq!(note.to_string(), "Coveralls[r]: Change(0.00%) Covered(1.00%) ");
    }

    #[test]
    fn test_handle_missing_number() {
        let adapter = CoverallsAdapter::default();
        let err = adapter
            .handle(&coveralls_request("repo_name=repo&covered_percent=97"))
            .unwrap_err();
        match err {
            DecodeError::InvalidNumber { field, value, .. } => {
                assert_eq!(field, "coverage_change");
                assert_eq!(value, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_handle_invalid_covered_percent() {
        let adapter = CoverallsAdapter::default();
        let err = adapter
            .handle(&coveralls_request("coverage_change=1&covered_percent=lots"))
            .unwrap_err();
        assert!(err.to_string().contains("covered_percent"));
        assert!(err.to_string().contains("\"lots\""));
    }

    #[test]
    fn test_recognize_rejects_json() {
        let adapter = CoverallsAdapter::default();
        let request = WebhookRequest::post("/")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_header(header::USER_AGENT, HeaderValue::from_static("ruby"));
        assert!(!adapter.recognize(&request));
    }

    #[tokio::test]
    async fn test_handle_fail() {
        let registry = Arc::new(Registry::new());
        registry.register(NAME, CoverallsAdapter::default()).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let (logs, _guard) = capture_logs();
        assert!(logs.is_empty());

        let outcome = dispatcher
            .handle_and_dispatch(&coveralls_request("{!$@($*&@&$)(*$)*&@$)"))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::DecodeFailed {
                provider: NAME.to_string()
            }
        );
        assert!(!logs.is_empty());
    }

    #[test]
    fn test_wire_payload_round_trips_through_adapter() {
        let payload = test_notification();
        let request = WebhookRequest::post("/")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(payload.content_type()))
            .with_header(header::USER_AGENT, HeaderValue::from_static(payload.user_agent()))
            .with_body(payload.encode().unwrap());

        let note = CoverallsAdapter::default().handle(&request).unwrap();
        assert_eq!(note.downcast_ref::<CoverallsNotification>(), Some(&payload));
    }
}
