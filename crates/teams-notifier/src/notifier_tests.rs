//! Tests for hook routing and invocation outcomes.

use super::*;
use crate::delivery::WebhookTransport;
use crate::release::CategorizedChanges;
use async_trait::async_trait;
use reqwest::StatusCode;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const WEBHOOK: &str = "https://example.webhook.office.com/webhookb2/abc/IncomingWebhook/def/ghi";

// ============================================================================
// Test Helpers
// ============================================================================

/// Counts calls and answers with a fixed status.
struct MockTransport {
    status: StatusCode,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
    last_payload: Mutex<Option<Value>>,
}

impl MockTransport {
    fn new(status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
            last_payload: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_payload(&self) -> Option<Value> {
        self.last_payload.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    async fn post_json(&self, url: &str, payload: Vec<u8>) -> Result<StatusCode, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        *self.last_payload.lock().unwrap() = serde_json::from_slice(&payload).ok();
        Ok(self.status)
    }
}

fn notifier_with(transport: Arc<MockTransport>) -> TeamsNotifier {
    TeamsNotifier::with_delivery_client(DeliveryClient::with_transport(transport))
}

fn config(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn release() -> ReleaseContext {
    ReleaseContext {
        version: "1.2.3".to_string(),
        release_type: "minor".to_string(),
        branch: "main".to_string(),
        tag_name: "v1.2.3".to_string(),
        repository_url: "https://github.com/org/repo".to_string(),
        release_notes: "Added things".to_string(),
        changes: Some(CategorizedChanges::default()),
        ..ReleaseContext::default()
    }
}

fn request(hook: Hook, config_value: Value) -> ExecuteRequest {
    ExecuteRequest::new(hook, release()).config(config(config_value))
}

// ============================================================================
// Plugin Info Tests
// ============================================================================

mod info_tests {
    use super::*;

    #[test]
    fn test_info_identifies_plugin() {
        let info = TeamsNotifier::info();

        assert_eq!(info.name, "teams");
        assert_eq!(info.version, "2.0.0");
        assert_eq!(info.description, "Send release notifications to Microsoft Teams");
        assert_eq!(info.author, "Relicta Team");
        assert_eq!(
            info.hooks,
            vec![Hook::PostPublish, Hook::OnSuccess, Hook::OnError]
        );
    }

    #[test]
    fn test_config_schema_is_valid_json() {
        let schema: Value = serde_json::from_str(&TeamsNotifier::info().config_schema).unwrap();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["webhook_url"]));
        for key in [
            "webhook_url",
            "title_template",
            "include_changelog",
            "theme_color",
            "mention_users",
            "notify_on_success",
            "notify_on_error",
        ] {
            assert!(schema["properties"].get(key).is_some(), "missing {}", key);
        }
        assert_eq!(
            schema["properties"]["title_template"]["default"],
            "Release {{version}}"
        );
    }
}

// ============================================================================
// Routing Tests
// ============================================================================

mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_notification_disabled_makes_no_call() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(
            Hook::PostPublish,
            json!({ "webhook_url": WEBHOOK, "notify_on_success": false }),
        );

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Success notification disabled"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_error_notification_disabled_makes_no_call() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(
            Hook::OnError,
            json!({ "webhook_url": WEBHOOK, "notify_on_error": "false" }),
        );

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Error notification disabled"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_unhandled_hooks_are_successful_no_ops() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());

        for hook in Hook::ALL {
            if TeamsNotifier::info().hooks.contains(&hook) {
                continue;
            }
            let req = request(hook, json!({ "webhook_url": WEBHOOK }));
            let response = notifier.execute(&req, &CancellationToken::new()).await;

            assert!(response.success);
            assert_eq!(
                response.message.as_deref(),
                Some(format!("Hook {} not handled", hook).as_str())
            );
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_on_success_hook_sends_success_card() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::OnSuccess, json!({ "webhook_url": WEBHOOK }));

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Sent Teams success notification"));
        let payload = transport.last_payload().unwrap();
        assert_eq!(
            payload["attachments"][0]["content"]["body"][0]["text"],
            "Release 1.2.3"
        );
    }
}

// ============================================================================
// Dry Run Tests
// ============================================================================

mod dry_run_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_dry_run_reports_version() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::PostPublish, json!({ "webhook_url": WEBHOOK })).dry_run(true);

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("Would send Teams success notification")
        );
        assert_eq!(response.outputs, Some(config(json!({ "version": "1.2.3" }))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_error_dry_run_has_no_outputs() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::OnError, json!({ "webhook_url": WEBHOOK })).dry_run(true);

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Would send Teams error notification"));
        assert_eq!(transport.calls(), 0);
    }

    /// Dry runs never touch the network, so the URL is not checked.
    #[tokio::test]
    async fn test_dry_run_skips_url_validation() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(
            Hook::PostPublish,
            json!({ "webhook_url": "http://not-teams.example.com" }),
        )
        .dry_run(true);

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(response.success);
        assert_eq!(transport.calls(), 0);
    }
}

// ============================================================================
// Delivery Outcome Tests
// ============================================================================

mod delivery_tests {
    use super::*;

    #[tokio::test]
    async fn test_ok_status_reports_sent() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::PostPublish, json!({ "webhook_url": WEBHOOK }));

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Sent Teams success notification"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.last_url.lock().unwrap().as_deref(), Some(WEBHOOK));
    }

    #[tokio::test]
    async fn test_server_error_reports_failure_with_status() {
        let transport = MockTransport::new(StatusCode::INTERNAL_SERVER_ERROR);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::PostPublish, json!({ "webhook_url": WEBHOOK }));

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(!response.success);
        assert!(response.message.is_none());
        let error = response.error.unwrap();
        assert!(error.starts_with("failed to send Teams message"), "{}", error);
        assert!(error.contains("500"), "{}", error);
    }

    #[tokio::test]
    async fn test_error_hook_sends_failure_card() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::OnError, json!({ "webhook_url": WEBHOOK }));

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert_eq!(response, ExecuteResponse::ok("Sent Teams error notification"));
        let payload = transport.last_payload().unwrap();
        let title = &payload["attachments"][0]["content"]["body"][0];
        assert_eq!(title["text"], "Release 1.2.3 Failed");
        assert_eq!(title["color"], "attention");
    }

    #[tokio::test]
    async fn test_disallowed_url_is_refused_without_call() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(
            Hook::PostPublish,
            json!({ "webhook_url": "https://example.webhook.office.com.evil.com/x" }),
        );

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(!response.success);
        assert!(response
            .error
            .unwrap()
            .contains("must be on *.webhook.office.com"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_plain_http_url_is_refused_without_call() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(
            Hook::OnError,
            json!({ "webhook_url": "http://example.webhook.office.com/x" }),
        );

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("HTTPS"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_url_is_refused() {
        std::env::remove_var(crate::config::WEBHOOK_URL_ENV);
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = ExecuteRequest::new(Hook::PostPublish, release());

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("required"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_env_url_is_used_when_config_has_none() {
        std::env::set_var(crate::config::WEBHOOK_URL_ENV, WEBHOOK);
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = ExecuteRequest::new(Hook::PostPublish, release());

        let response = notifier.execute(&req, &CancellationToken::new()).await;
        std::env::remove_var(crate::config::WEBHOOK_URL_ENV);

        assert!(response.success, "{:?}", response);
        assert_eq!(transport.last_url.lock().unwrap().as_deref(), Some(WEBHOOK));
    }

    #[tokio::test]
    async fn test_cancelled_invocation_reports_failure() {
        let transport = MockTransport::new(StatusCode::OK);
        let notifier = notifier_with(transport.clone());
        let req = request(Hook::PostPublish, json!({ "webhook_url": WEBHOOK }));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let response = notifier.execute(&req, &cancel).await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("cancelled"));
        assert_eq!(transport.calls(), 0);
    }
}

// ============================================================================
// Preview and Validate Tests
// ============================================================================

mod preview_tests {
    use super::*;

    #[test]
    fn test_preview_builds_success_card() {
        let notifier = notifier_with(MockTransport::new(StatusCode::OK));
        let req = request(Hook::PostPublish, json!({ "webhook_url": WEBHOOK }));

        let message = notifier.preview(&req).unwrap();

        let texts: Vec<String> = message
            .card()
            .map(|card| card.text_blocks().into_iter().map(|b| b.text.clone()).collect())
            .unwrap_or_default();
        assert_eq!(texts.first().map(String::as_str), Some("Release 1.2.3"));
        assert!(texts.iter().any(|t| t == "Changes: 0 features, 0 fixes"));
    }

    #[test]
    fn test_preview_is_none_for_unhandled_or_disabled() {
        let notifier = notifier_with(MockTransport::new(StatusCode::OK));

        let unhandled = request(Hook::PrePlan, json!({ "webhook_url": WEBHOOK }));
        assert!(notifier.preview(&unhandled).is_none());

        let disabled = request(
            Hook::OnError,
            json!({ "webhook_url": WEBHOOK, "notify_on_error": false }),
        );
        assert!(notifier.preview(&disabled).is_none());
    }

    #[test]
    fn test_validate_accepts_good_config() {
        let notifier = notifier_with(MockTransport::new(StatusCode::OK));
        let raw = config(json!({ "webhook_url": WEBHOOK, "theme_color": "#0076D7" }));

        let response = notifier.validate(Some(&raw));

        assert!(response.valid, "{:?}", response.errors);
    }

    #[test]
    fn test_validate_reports_format_errors() {
        let notifier = notifier_with(MockTransport::new(StatusCode::OK));
        let raw = config(json!({ "webhook_url": "https://evil.com/hook", "theme_color": "blue" }));

        let response = notifier.validate(Some(&raw));

        assert!(!response.valid);
        assert!(response.has_error("webhook_url"));
        assert!(response.has_error("theme_color"));
    }
}

// ============================================================================
// Wire Format Tests
// ============================================================================

mod wire_tests {
    use super::*;

    #[test]
    fn test_request_deserializes_from_host_json() {
        let req: ExecuteRequest = serde_json::from_value(json!({
            "hook": "on-error",
            "config": { "webhook_url": WEBHOOK },
            "context": { "version": "3.0.0", "branch": "release" },
            "dry_run": true,
        }))
        .unwrap();

        assert_eq!(req.hook, Hook::OnError);
        assert!(req.dry_run);
        assert_eq!(req.context.version, "3.0.0");
        assert_eq!(req.context.branch, "release");
    }

    #[test]
    fn test_response_omits_unset_fields() {
        let failure = serde_json::to_value(ExecuteResponse::failure("boom")).unwrap();
        assert_eq!(failure, json!({ "success": false, "error": "boom" }));

        let ok = serde_json::to_value(ExecuteResponse::ok("done").with_output("version", "1.0.0"))
            .unwrap();
        assert_eq!(
            ok,
            json!({ "success": true, "message": "done", "outputs": { "version": "1.0.0" } })
        );
    }
}

// ============================================================================
// Credential Redaction Tests
// ============================================================================

mod redaction_tests {
    use super::*;
    use crate::delivery::{DeliveryConfig, ReqwestTransport};
    use std::time::Duration;

    /// Sends through the real transport to a closed loopback port, keeping
    /// the webhook path so connection errors see the credential.
    struct LoopbackTransport {
        inner: ReqwestTransport,
    }

    #[async_trait]
    impl WebhookTransport for LoopbackTransport {
        async fn post_json(&self, url: &str, payload: Vec<u8>) -> Result<StatusCode, DeliveryError> {
            let path = url::Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_default();
            self.inner
                .post_json(&format!("http://127.0.0.1:1{}", path), payload)
                .await
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_expose_webhook_token() {
        let inner =
            ReqwestTransport::new(&DeliveryConfig::default().with_timeout(Duration::from_secs(2)))
                .unwrap();
        let notifier = TeamsNotifier::with_delivery_client(DeliveryClient::with_transport(
            Arc::new(LoopbackTransport { inner }),
        ));
        let req = request(
            Hook::PostPublish,
            json!({
                "webhook_url": "https://example.webhook.office.com/webhookb2/SECRET-TOKEN/IncomingWebhook/abc"
            }),
        );

        let response = notifier.execute(&req, &CancellationToken::new()).await;

        assert!(!response.success);
        let error = response.error.unwrap();
        assert!(error.starts_with("failed to send Teams message"), "{}", error);
        assert!(!error.contains("SECRET-TOKEN"), "{}", error);
    }
}
