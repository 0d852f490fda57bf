use std::{env, fs::File, io::BufReader, path::Path};

use anyhow::{anyhow, Context};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::bot::messages::Locale;

const SLACK_API_URL: &str = "https://slack.com/api/";

#[derive(Debug, Deserialize)]
pub struct GrantbotConfig {
    /// Bot token (`xoxb-...`) used for every Web API call
    #[serde(deserialize_with = "secret")]
    pub slack_bot_token: SecretString,
    /// ID of the user group (`S...`) members are added to when they click the button
    pub user_group_id: String,
    /// Signing secret of the Slack app. When set, requests without a valid signature are rejected.
    #[serde(default, deserialize_with = "optional_secret")]
    pub slack_signing_secret: Option<SecretString>,
    /// Language of the messages sent to users
    #[serde(default)]
    pub locale: Locale,
    /// Base URL of the Web API, only worth changing to point at a mock server.
    #[serde(default = "default_api_url")]
    pub slack_api_url: Url,
}

impl GrantbotConfig {
    /// Reads the YAML configuration file at `path` if one was given, and the environment otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config_file =
            File::open(path).with_context(|| format!("couldn't open {}", path.display()))?;
        serde_yaml::from_reader(BufReader::new(config_file)).context("couldn't parse config file")
    }

    /// Reads the configuration from environment variables, loading a `.env` file first if there
    /// is one in the working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // an empty variable counts as unset
        let var = |name: &str| var(name).filter(|value| !value.is_empty());
        let required = |name: &str| var(name).ok_or_else(|| anyhow!("{} is not set", name));

        let locale = match var("GRANTBOT_LOCALE") {
            Some(locale) => locale
                .parse()
                .with_context(|| format!("invalid GRANTBOT_LOCALE `{}`", locale))?,
            None => Locale::default(),
        };
        let slack_api_url = match var("SLACK_API_URL") {
            Some(url) => Url::parse(&url).context("invalid SLACK_API_URL")?,
            None => default_api_url(),
        };

        Ok(Self {
            slack_bot_token: SecretString::from(required("SLACK_BOT_TOKEN")?),
            user_group_id: required("USER_GROUP_ID")?,
            slack_signing_secret: var("SLACK_SIGNING_SECRET").map(SecretString::from),
            locale,
            slack_api_url,
        })
    }
}

fn default_api_url() -> Url {
    Url::parse(SLACK_API_URL).expect("hardcoded URL is valid")
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}
