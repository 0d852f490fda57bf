//! Outbound side: the few Slack Web API methods grantbot calls.
//!
//! Every call is classified through [`SlackError`], including the `ok: false` answers Slack sends
//! with an HTTP 200, so callers can't mistake a failed lookup for an empty result.

mod client;
pub use client::SlackClient;

mod error;
pub use error::SlackError;

pub mod types;
use types::EphemeralMessage;

#[cfg(test)]
pub(crate) mod fake;

#[rocket::async_trait]
pub trait SlackApi: Send + Sync {
    /// `chat.postEphemeral`
    async fn post_ephemeral(&self, message: &EphemeralMessage) -> Result<(), SlackError>;

    /// `chat.postMessage`; passing a user ID as `channel` sends a direct message.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError>;

    /// `usergroups.users.list`, in the order Slack returns them.
    async fn usergroup_members(&self, usergroup: &str) -> Result<Vec<String>, SlackError>;

    /// `usergroups.users.update`. This replaces the whole member list.
    async fn update_usergroup_members(
        &self,
        usergroup: &str,
        users: &[String],
    ) -> Result<(), SlackError>;
}
