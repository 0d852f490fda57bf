//! Slack Web API payloads, and the small subset of Block Kit we need to build the permission
//! prompt.
//!
//! See: <https://api.slack.com/block-kit>

use serde::{Deserialize, Serialize};

/// Body of a `chat.postEphemeral` call: only `user` will see the message in `channel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EphemeralMessage {
    pub channel: String,
    pub user: String,
    /// Fallback text, shown in notifications.
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Body of a `chat.postMessage` call. Using a user ID as the channel sends a direct message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: Text },
    Actions { elements: Vec<ActionElement> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button {
        text: Text,
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
}

/// Envelope shared by every Web API response: `ok` tells whether the call succeeded, and `error`
/// holds a short machine-readable reason when it didn't.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `usergroups.users.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsergroupUsersResponse {
    pub ok: bool,
    #[serde(default)]
    pub users: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}
