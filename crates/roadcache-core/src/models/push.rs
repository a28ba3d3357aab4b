use serde::{Deserialize, Serialize};

/// Device family reported to the API when registering a push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Android,
    Ios,
    Mobile,
}

impl DevicePlatform {
    /// Classify from a user-agent string. Anything that is not
    /// recognizably Android or iOS reports as generic mobile.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("android") {
            DevicePlatform::Android
        } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
            DevicePlatform::Ios
        } else {
            DevicePlatform::Mobile
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePlatform::Android => "android",
            DevicePlatform::Ios => "ios",
            DevicePlatform::Mobile => "mobile",
        }
    }
}

impl std::fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered push subscription. The descriptor is the platform's
/// opaque JSON (endpoint plus keys) and is forwarded to the API as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub descriptor: serde_json::Value,
    pub device: DevicePlatform,
}

/// Incoming push message body. Every field is optional; defaults are
/// applied when the notification is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// What the rendering layer should show for a delivered push message.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDisplay {
    pub title: String,
    pub body: String,
    pub tag: String,
    /// High-priority notifications stay visible until dismissed.
    pub sticky: bool,
    pub data: serde_json::Value,
}
