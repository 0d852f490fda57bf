//! Interactivity callbacks, as posted to `/slack/interactions`: a form with a single `payload`
//! field holding JSON.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The request itself is unusable: answered with a 400.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Missing payload")]
    Missing,
    #[error("Invalid payload: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// The payload is JSON but not shaped like a button click.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("unexpected interaction payload: {0}")]
    Malformed(serde_json::Error),
    #[error("no actions in interaction payload")]
    NoActions,
}

#[derive(Debug, Deserialize)]
struct InteractionPayload {
    user: InteractionUser,
    actions: Vec<InteractionAction>,
}

#[derive(Debug, Deserialize)]
struct InteractionUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct InteractionAction {
    action_id: String,
}

/// Extracts the JSON `payload` field from a form-encoded body.
pub fn payload_from_form(body: &str) -> Result<Value, PayloadError> {
    let payload = url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .ok_or(PayloadError::Missing)?;

    Ok(serde_json::from_str(&payload)?)
}

/// The part of a button click we act on.
#[derive(Debug, PartialEq, Eq)]
pub struct Interaction {
    pub action_id: String,
    pub user_id: String,
}

impl Interaction {
    /// Only the first action is looked at: the prompt we send has a single button.
    pub fn from_payload(payload: Value) -> Result<Self, InteractionError> {
        let payload: InteractionPayload =
            serde_json::from_value(payload).map_err(InteractionError::Malformed)?;
        let action = payload
            .actions
            .into_iter()
            .next()
            .ok_or(InteractionError::NoActions)?;

        Ok(Self {
            action_id: action.action_id,
            user_id: payload.user.id,
        })
    }
}
