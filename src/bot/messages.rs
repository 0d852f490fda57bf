//! Localized texts sent to users.

use std::str::FromStr;

use anyhow::anyhow;
use serde::{de, Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    /// Accepts a bare language code, or a full tag like `ko_KR` / `en-US`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = s.split(['-', '_']).next().unwrap_or_default();
        match language.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ko" => Ok(Self::Ko),
            _ => Err(anyhow!("unsupported locale `{}`", s)),
        }
    }
}

// same spellings as the environment variable
impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let locale = String::deserialize(deserializer)?;
        locale.parse().map_err(de::Error::custom)
    }
}

pub struct Messages {
    /// Section text of the prompt; `{user}` is replaced with a mention of the user.
    welcome: &'static str,
    pub button: &'static str,
    pub granted_dm: &'static str,
    pub granted_reply: &'static str,
    /// Followed by the reason Slack gave.
    failed_dm: &'static str,
    pub failed_reply: &'static str,
    pub unknown_action: &'static str,
}

static EN: Messages = Messages {
    welcome: "Welcome, {user}! To get the proper permissions, please click the button below.",
    button: "✅ Grant Permissions",
    granted_dm: "✅ Permissions granted! You can now use the team channels.",
    granted_reply: "✅ Permissions have been granted.",
    failed_dm: "❌ Permissions could not be granted. Reason:",
    failed_reply: "❌ Permissions could not be granted.",
    unknown_action: "❌ Unknown action.",
};

static KO: Messages = Messages {
    welcome: "{user}님 반갑습니다. 권한 승계를 위해 아래 체크버튼을 눌러주세요.",
    button: "✅ 체크",
    granted_dm: "✅ 권한이 부여되었습니다. 이제 팀 채널을 이용하실 수 있습니다!",
    granted_reply: "✅ 권한이 부여되었습니다.",
    failed_dm: "❌ 권한 부여에 실패했습니다. 사유:",
    failed_reply: "❌ 권한 부여에 실패했습니다.",
    unknown_action: "❌ 알 수 없는 동작입니다.",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::En => &EN,
            Locale::Ko => &KO,
        }
    }

    pub fn welcome(&self, user_id: &str) -> String {
        self.welcome.replace("{user}", &format!("<@{}>", user_id))
    }

    pub fn failed_dm(&self, reason: &str) -> String {
        format!("{} {}", self.failed_dm, reason)
    }
}
