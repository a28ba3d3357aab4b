//! Push notifications: subscription mirroring, payload interpretation,
//! and click routing.

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{DevicePlatform, NotificationDisplay, PushPayload, PushSubscription};

// ============================================================================
// Constants
// ============================================================================

/// Notification title shown when the payload does not carry one.
const DEFAULT_TITLE: &str = "Drive School DZ";

/// Notification body shown when the payload does not carry one.
const DEFAULT_BODY: &str = "You have a new notification";

/// Collapse tag applied when the payload does not carry one, so untagged
/// notifications replace each other instead of stacking up.
const DEFAULT_TAG: &str = "general";

/// Server side of the subscription lifecycle.
///
/// The HTTP client implements this for production; tests script it.
#[allow(async_fn_in_trait)]
pub trait PushBackend {
    async fn subscribe_push(&self, descriptor: &Value, device: DevicePlatform) -> Result<()>;
    async fn unsubscribe_push(&self, endpoint: &str) -> Result<()>;
}

/// Where a notification click should take the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Close the notification and do nothing else.
    Dismissed,
    /// Bring the app to the foreground at this path.
    Navigate(String),
}

/// Holds at most one live push subscription and turns raw push events
/// into displayable notifications.
pub struct NotificationRelay {
    subscription: Option<PushSubscription>,
}

impl NotificationRelay {
    pub fn new() -> Self {
        Self { subscription: None }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn subscription(&self) -> Option<&PushSubscription> {
        self.subscription.as_ref()
    }

    // ===== Subscription lifecycle =====

    /// Mirror a platform subscription to the server, then adopt it
    /// locally. Subscribing again replaces the previous subscription, so
    /// at most one is ever live per device.
    pub async fn subscribe(
        &mut self,
        api: &impl PushBackend,
        descriptor: Value,
        user_agent: &str,
    ) -> Result<()> {
        let endpoint = descriptor
            .get("endpoint")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Subscription descriptor has no endpoint"))?
            .to_string();
        let device = DevicePlatform::from_user_agent(user_agent);

        api.subscribe_push(&descriptor, device).await?;
        info!(device = %device, "Push subscription mirrored to server");

        self.subscription = Some(PushSubscription {
            endpoint,
            descriptor,
            device,
        });
        Ok(())
    }

    /// Drop the live subscription, server first. The local copy survives
    /// a failed server call so a retry can finish the job. Returns false
    /// when there was nothing to unsubscribe.
    pub async fn unsubscribe(&mut self, api: &impl PushBackend) -> Result<bool> {
        let Some(subscription) = self.subscription.take() else {
            debug!("Unsubscribe with no live subscription");
            return Ok(false);
        };
        if let Err(e) = api.unsubscribe_push(&subscription.endpoint).await {
            self.subscription = Some(subscription);
            return Err(e);
        }
        info!("Push subscription removed");
        Ok(true)
    }

    // ===== Incoming events =====

    /// Interpret a raw push body. Absent fields take the app defaults;
    /// high priority pins the notification until acted on. A missing or
    /// malformed payload is silently dropped.
    pub fn handle_push(&self, body: Option<&str>) -> Option<NotificationDisplay> {
        let body = body?;
        let payload: PushPayload = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "Ignoring malformed push payload");
                return None;
            }
        };

        let sticky = payload.priority.as_deref() == Some("high");
        Some(NotificationDisplay {
            title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: payload.message.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            tag: payload.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            sticky,
            data: payload.data.unwrap_or_else(|| serde_json::json!({})),
        })
    }

    /// Route a notification click: the dismiss action just closes it,
    /// anything else navigates to the payload's url or the app root.
    pub fn handle_click(&self, action: Option<&str>, data: &Value) -> ClickOutcome {
        if action == Some("dismiss") {
            return ClickOutcome::Dismissed;
        }
        let url = data
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or("/")
            .to_string();
        ClickOutcome::Navigate(url)
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    enum Call {
        Subscribe(String, DevicePlatform),
        Unsubscribe(String),
    }

    struct FakePushBackend {
        fail: bool,
        calls: RefCell<Vec<Call>>,
    }

    impl FakePushBackend {
        fn working() -> Self {
            Self {
                fail: false,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PushBackend for FakePushBackend {
        async fn subscribe_push(&self, descriptor: &Value, device: DevicePlatform) -> Result<()> {
            let endpoint = descriptor["endpoint"].as_str().unwrap_or("").to_string();
            self.calls.borrow_mut().push(Call::Subscribe(endpoint, device));
            if self.fail {
                anyhow::bail!("server unavailable");
            }
            Ok(())
        }

        async fn unsubscribe_push(&self, endpoint: &str) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Unsubscribe(endpoint.to_string()));
            if self.fail {
                anyhow::bail!("server unavailable");
            }
            Ok(())
        }
    }

    fn descriptor(endpoint: &str) -> Value {
        json!({
            "endpoint": endpoint,
            "keys": {"p256dh": "pk", "auth": "secret"}
        })
    }

    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7)";

    #[test]
    fn test_push_payload_defaults() {
        let relay = NotificationRelay::new();
        let shown = relay.handle_push(Some("{}")).expect("displayable");

        assert_eq!(shown.title, "Drive School DZ");
        assert_eq!(shown.body, "You have a new notification");
        assert_eq!(shown.tag, "general");
        assert!(!shown.sticky);
        assert_eq!(shown.data, json!({}));
    }

    #[test]
    fn test_push_payload_fields_pass_through() {
        let relay = NotificationRelay::new();
        let body = r#"{
            "title": "Exam reminder",
            "message": "Your theory exam is tomorrow",
            "tag": "exam",
            "data": {"url": "/exams"},
            "priority": "high"
        }"#;
        let shown = relay.handle_push(Some(body)).expect("displayable");

        assert_eq!(shown.title, "Exam reminder");
        assert_eq!(shown.body, "Your theory exam is tomorrow");
        assert_eq!(shown.tag, "exam");
        assert!(shown.sticky);
        assert_eq!(shown.data["url"], "/exams");
    }

    #[test]
    fn test_push_normal_priority_is_not_sticky() {
        let relay = NotificationRelay::new();
        let shown = relay
            .handle_push(Some(r#"{"priority": "normal"}"#))
            .expect("displayable");
        assert!(!shown.sticky);
    }

    #[test]
    fn test_push_absent_or_malformed_is_silently_ignored() {
        let relay = NotificationRelay::new();
        assert!(relay.handle_push(None).is_none());
        assert!(relay.handle_push(Some("not json")).is_none());
        assert!(relay.handle_push(Some("")).is_none());
    }

    #[test]
    fn test_click_routing() {
        let relay = NotificationRelay::new();

        assert_eq!(
            relay.handle_click(Some("dismiss"), &json!({"url": "/exams"})),
            ClickOutcome::Dismissed
        );
        assert_eq!(
            relay.handle_click(None, &json!({"url": "/exams"})),
            ClickOutcome::Navigate("/exams".to_string())
        );
        assert_eq!(
            relay.handle_click(Some("open"), &json!({})),
            ClickOutcome::Navigate("/".to_string())
        );
    }

    #[tokio::test]
    async fn test_subscribe_mirrors_to_server_then_stores() {
        let backend = FakePushBackend::working();
        let mut relay = NotificationRelay::new();

        relay
            .subscribe(&backend, descriptor("https://push.example/ep1"), ANDROID_UA)
            .await
            .expect("subscribe");

        assert!(relay.is_subscribed());
        let sub = relay.subscription().expect("live subscription");
        assert_eq!(sub.endpoint, "https://push.example/ep1");
        assert_eq!(sub.device, DevicePlatform::Android);
        assert_eq!(
            *backend.calls.borrow(),
            vec![Call::Subscribe(
                "https://push.example/ep1".to_string(),
                DevicePlatform::Android
            )]
        );
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_previous_subscription() {
        let backend = FakePushBackend::working();
        let mut relay = NotificationRelay::new();

        relay
            .subscribe(&backend, descriptor("https://push.example/ep1"), ANDROID_UA)
            .await
            .expect("first subscribe");
        relay
            .subscribe(&backend, descriptor("https://push.example/ep2"), ANDROID_UA)
            .await
            .expect("second subscribe");

        let sub = relay.subscription().expect("live subscription");
        assert_eq!(sub.endpoint, "https://push.example/ep2");
    }

    #[tokio::test]
    async fn test_subscribe_without_endpoint_fails_before_server_call() {
        let backend = FakePushBackend::working();
        let mut relay = NotificationRelay::new();

        let result = relay
            .subscribe(&backend, json!({"keys": {}}), ANDROID_UA)
            .await;

        assert!(result.is_err());
        assert!(!relay.is_subscribed());
        assert!(backend.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_failure_leaves_nothing_live() {
        let backend = FakePushBackend::failing();
        let mut relay = NotificationRelay::new();

        let result = relay
            .subscribe(&backend, descriptor("https://push.example/ep1"), ANDROID_UA)
            .await;

        assert!(result.is_err());
        assert!(!relay.is_subscribed());
    }

    #[tokio::test]
    async fn test_unsubscribe_round_trip() {
        let backend = FakePushBackend::working();
        let mut relay = NotificationRelay::new();
        relay
            .subscribe(&backend, descriptor("https://push.example/ep1"), ANDROID_UA)
            .await
            .expect("subscribe");

        assert!(relay.unsubscribe(&backend).await.expect("unsubscribe"));
        assert!(!relay.is_subscribed());
        assert_eq!(
            backend.calls.borrow().last(),
            Some(&Call::Unsubscribe("https://push.example/ep1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_without_subscription_is_a_noop() {
        let backend = FakePushBackend::working();
        let mut relay = NotificationRelay::new();

        assert!(!relay.unsubscribe(&backend).await.expect("no-op"));
        assert!(backend.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_failure_keeps_local_subscription() {
        let working = FakePushBackend::working();
        let failing = FakePushBackend::failing();
        let mut relay = NotificationRelay::new();
        relay
            .subscribe(&working, descriptor("https://push.example/ep1"), ANDROID_UA)
            .await
            .expect("subscribe");

        assert!(relay.unsubscribe(&failing).await.is_err());
        assert!(relay.is_subscribed(), "retry must still be possible");
    }
}
