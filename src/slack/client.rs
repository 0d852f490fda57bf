use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::slack::{
    types::{ApiResponse, EphemeralMessage, Message, UsergroupUsersResponse},
    SlackApi, SlackError,
};

/// Slack Web API client, authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    bot_token: SecretString,
    api_url: Url,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    /// Creates a client sending every call to a method under `api_url`, usually
    /// `https://slack.com/api/`.
    pub fn new(bot_token: SecretString, mut api_url: Url) -> Result<Self, SlackError> {
        if api_url.cannot_be_a_base() {
            return Err(SlackError::Config(format!(
                "`{}` can't be used as an API base URL",
                api_url
            )));
        }

        // methods are joined to the base, which drops the last path segment without this
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            bot_token,
            api_url,
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, SlackError> {
        self.api_url
            .join(method)
            .map_err(|e| SlackError::Config(format!("invalid method URL for {}: {}", method, e)))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<T, SlackError> {
        let response = request
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        let status = response.status();
        trace!("{} answered with HTTP {}", method, status);

        response
            .json::<T>()
            .await
            .map_err(|e| SlackError::Response(format!("{} (HTTP {}): {}", method, status, e)))
    }
}

#[rocket::async_trait]
impl SlackApi for SlackClient {
    #[instrument(skip(self, message), fields(channel = %message.channel, user = %message.user))]
    async fn post_ephemeral(&self, message: &EphemeralMessage) -> Result<(), SlackError> {
        let url = self.method_url("chat.postEphemeral")?;
        let response: ApiResponse = self
            .call("chat.postEphemeral", self.client.post(url).json(message))
            .await?;

        if !response.ok {
            return Err(SlackError::from_api("chat.postEphemeral", response.error));
        }

        debug!("ephemeral message posted");
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let url = self.method_url("chat.postMessage")?;
        let message = Message {
            channel: channel.to_owned(),
            text: text.to_owned(),
        };
        let response: ApiResponse = self
            .call("chat.postMessage", self.client.post(url).json(&message))
            .await?;

        if !response.ok {
            return Err(SlackError::from_api("chat.postMessage", response.error));
        }

        debug!("message posted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn usergroup_members(&self, usergroup: &str) -> Result<Vec<String>, SlackError> {
        let url = self.method_url("usergroups.users.list")?;
        let response: UsergroupUsersResponse = self
            .call(
                "usergroups.users.list",
                self.client.get(url).query(&[("usergroup", usergroup)]),
            )
            .await?;

        if !response.ok {
            return Err(SlackError::from_api("usergroups.users.list", response.error));
        }

        // a group nobody belongs to may come back without a `users` field at all
        Ok(response.users.unwrap_or_default())
    }

    #[instrument(skip(self, users), fields(count = users.len()))]
    async fn update_usergroup_members(
        &self,
        usergroup: &str,
        users: &[String],
    ) -> Result<(), SlackError> {
        let url = self.method_url("usergroups.users.update")?;
        let users = users.join(",");
        let response: ApiResponse = self
            .call(
                "usergroups.users.update",
                self.client
                    .post(url)
                    .form(&[("usergroup", usergroup), ("users", users.as_str())]),
            )
            .await?;

        if !response.ok {
            return Err(SlackError::from_api(
                "usergroups.users.update",
                response.error,
            ));
        }

        debug!("usergroup members updated");
        Ok(())
    }
}
