//! In-memory [`SlackApi`] recording every call, for tests.

use std::sync::Mutex;

use crate::slack::{types::EphemeralMessage, SlackApi, SlackError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    PostEphemeral(EphemeralMessage),
    PostMessage { channel: String, text: String },
    ListMembers { usergroup: String },
    UpdateMembers { usergroup: String, users: Vec<String> },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    /// Slack answers `ok: false` with this error code.
    Api(&'static str),
    /// Slack can't be reached.
    Unreachable,
}

impl Failure {
    fn error(self) -> SlackError {
        match self {
            Self::Api(code) => SlackError::Api(code.to_string()),
            Self::Unreachable => SlackError::Request("connection refused".to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeSlack {
    pub(crate) members: Mutex<Vec<String>>,
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) ephemeral_failure: Option<Failure>,
    pub(crate) message_failure: Option<Failure>,
    pub(crate) list_failure: Option<Failure>,
    pub(crate) update_failure: Option<Failure>,
}

impl FakeSlack {
    pub(crate) fn with_members(members: &[&str]) -> Self {
        Self {
            members: Mutex::new(members.iter().map(|m| m.to_string()).collect()),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn members(&self) -> Vec<String> {
        self.members.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[rocket::async_trait]
impl SlackApi for FakeSlack {
    async fn post_ephemeral(&self, message: &EphemeralMessage) -> Result<(), SlackError> {
        self.record(Call::PostEphemeral(message.clone()));
        self.ephemeral_failure.map_or(Ok(()), |f| Err(f.error()))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        self.record(Call::PostMessage {
            channel: channel.to_owned(),
            text: text.to_owned(),
        });
        self.message_failure.map_or(Ok(()), |f| Err(f.error()))
    }

    async fn usergroup_members(&self, usergroup: &str) -> Result<Vec<String>, SlackError> {
        self.record(Call::ListMembers {
            usergroup: usergroup.to_owned(),
        });
        match self.list_failure {
            Some(failure) => Err(failure.error()),
            None => Ok(self.members()),
        }
    }

    async fn update_usergroup_members(
        &self,
        usergroup: &str,
        users: &[String],
    ) -> Result<(), SlackError> {
        self.record(Call::UpdateMembers {
            usergroup: usergroup.to_owned(),
            users: users.to_vec(),
        });
        if let Some(failure) = self.update_failure {
            return Err(failure.error());
        }

        *self.members.lock().unwrap() = users.to_vec();
        Ok(())
    }
}
