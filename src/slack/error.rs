use thiserror::Error;

/// Errors that can occur when calling the Slack Web API.
#[derive(Debug, Error)]
pub enum SlackError {
    /// The HTTP request couldn't be sent, or no response came back.
    #[error("Slack request failed: {0}")]
    Request(String),

    /// The response body wasn't what the Web API documents.
    #[error("Slack response error: {0}")]
    Response(String),

    /// Slack answered with `ok: false`; holds the `error` field.
    #[error("{0}")]
    Api(String),

    #[error("Slack configuration error: {0}")]
    Config(String),
}

impl SlackError {
    pub(crate) fn from_api(method: &str, error: Option<String>) -> Self {
        Self::Api(error.unwrap_or_else(|| format!("{} failed without an error code", method)))
    }
}
