use std::sync::Arc;

use anyhow::Context;
use rocket::http::Status;
use serde_json::{json, Value};
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::GrantbotConfig,
    slack::{SlackApi, SlackClient, SlackError},
    webhooks::{
        events::{CallbackEvent, Envelope, MemberJoinedChannel},
        interactions::{payload_from_form, Interaction},
    },
};

pub mod messages;
use messages::{Locale, Messages};

mod prompt;
use prompt::permission_prompt;

mod reconcile;
use reconcile::grant_membership;

/// `action_id` of the button in the prompt.
pub const GRANT_PERMISSION: &str = "grant_permission";

/// Handles the requests Slack sends us, independently of how they reached the process.
pub struct Grantbot {
    slack: Arc<dyn SlackApi>,
    user_group: String,
    messages: &'static Messages,
}

impl Grantbot {
    /// Creates a new [`Grantbot`] talking to the Slack Web API with the configured bot token.
    pub fn new(config: &GrantbotConfig) -> anyhow::Result<Self> {
        let client = SlackClient::new(config.slack_bot_token.clone(), config.slack_api_url.clone())
            .context("couldn't create Slack client")?;

        Ok(Self::with_api(
            Arc::new(client),
            &config.user_group_id,
            config.locale,
        ))
    }

    pub fn with_api(slack: Arc<dyn SlackApi>, user_group: &str, locale: Locale) -> Self {
        Self {
            slack,
            user_group: user_group.to_owned(),
            messages: Messages::for_locale(locale),
        }
    }

    /// Answers an Events API request.
    pub async fn handle_events(&self, body: &str) -> Reply {
        trace!("received event: {}", body);

        let envelope = match Envelope::parse(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("couldn't parse event envelope: {}", e);
                return Reply::error(Status::InternalServerError, e);
            }
        };

        match envelope {
            Envelope::UrlVerification { challenge } => {
                info!("received URL verification challenge");
                Reply::challenge(challenge)
            }
            Envelope::EventCallback { event } => {
                match event {
                    CallbackEvent::MemberJoinedChannel(joined) => self.welcome(joined).await,
                    CallbackEvent::Other => debug!("ignoring event"),
                }
                Reply::status_ok()
            }
            Envelope::Other => {
                debug!("ignoring envelope");
                Reply::status_ok()
            }
        }
    }

    /// Sends the permission prompt. The event is only a notification, so a failure is logged and
    /// goes no further.
    async fn welcome(&self, joined: MemberJoinedChannel) {
        let MemberJoinedChannel { user, channel } = joined;
        info!("user {} joined channel {}", user, channel);

        let prompt = permission_prompt(self.messages, &user, &channel);
        match self.slack.post_ephemeral(&prompt).await {
            Ok(()) => info!("sent permission prompt to {} in {}", user, channel),
            Err(e) => warn!(
                "couldn't send permission prompt to {} in {}: {}",
                user, channel, e
            ),
        }
    }

    /// Answers an interactivity request. Only a missing or non-JSON payload is a bad request, any
    /// later fault ends up as a 500 with the error message.
    pub async fn handle_interaction(&self, body: &str) -> Reply {
        let payload = match payload_from_form(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("rejected interaction: {}", e);
                return Reply::error(Status::BadRequest, e);
            }
        };
        trace!("interaction payload: {}", payload);

        match self.on_interaction(payload).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("encountered error while handling interaction: {:#}", e);
                Reply::error(Status::InternalServerError, format!("{:#}", e))
            }
        }
    }

    async fn on_interaction(&self, payload: Value) -> anyhow::Result<Reply> {
        let Interaction { action_id, user_id } = Interaction::from_payload(payload)?;

        if action_id != GRANT_PERMISSION {
            info!("unknown action `{}` from {}", action_id, user_id);
            return Ok(Reply::text(self.messages.unknown_action));
        }

        info!("permission grant requested by {}", user_id);
        let (dm, reply) = match grant_membership(&*self.slack, &self.user_group, &user_id).await {
            Ok(grant) => {
                debug!("grant for {} resulted in {:?}", user_id, grant);
                (
                    self.messages.granted_dm.to_owned(),
                    self.messages.granted_reply,
                )
            }
            Err(e) => {
                warn!(
                    "couldn't add {} to user group {}: {}",
                    user_id, self.user_group, e
                );
                (
                    self.messages.failed_dm(&e.to_string()),
                    self.messages.failed_reply,
                )
            }
        };

        // the grant already happened, so Slack refusing the message doesn't fail the request
        match self.slack.post_message(&user_id, &dm).await {
            Ok(()) => info!("sent direct message to {}", user_id),
            Err(SlackError::Api(code)) => {
                warn!("Slack refused direct message to {}: {}", user_id, code)
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("couldn't send direct message to {}", user_id));
            }
        }

        Ok(Reply::text(reply))
    }
}

/// Response to an inbound request, turned into HTTP by the hosting layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub body: ReplyBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Text(String),
    Json(Value),
}

impl Reply {
    fn json(status: Status, value: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(value),
        }
    }

    /// `200 {"status": "ok"}`
    pub fn status_ok() -> Self {
        Self::json(Status::Ok, json!({ "status": "ok" }))
    }

    /// The verification token, as plain text.
    pub fn challenge(challenge: String) -> Self {
        Self {
            status: Status::Ok,
            body: ReplyBody::Text(challenge),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::json(Status::Ok, json!({ "text": text }))
    }

    pub fn error(status: Status, error: impl ToString) -> Self {
        Self::json(status, json!({ "error": error.to_string() }))
    }

    pub fn content_type(&self) -> &'static str {
        match self.body {
            ReplyBody::Text(_) => "text/plain; charset=utf-8",
            ReplyBody::Json(_) => "application/json",
        }
    }

    pub fn into_body(self) -> String {
        match self.body {
            ReplyBody::Text(text) => text,
            ReplyBody::Json(value) => value.to_string(),
        }
    }
}
