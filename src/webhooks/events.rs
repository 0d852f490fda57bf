//! Events API envelopes, as posted to `/slack/events`.
//!
//! <https://api.slack.com/apis/connections/events-api#receiving-events>

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Handshake sent once when the request URL is saved in the app settings.
    UrlVerification { challenge: String },
    EventCallback {
        #[serde(default)]
        event: CallbackEvent,
    },
    #[serde(other)]
    Other,
}

impl Envelope {
    /// Parses an envelope. Well-formed JSON without a `type` field is treated like an envelope
    /// type we don't know about.
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        if value.get("type").is_none() {
            return Ok(Self::Other);
        }
        serde_json::from_value(value)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackEvent {
    MemberJoinedChannel(MemberJoinedChannel),
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MemberJoinedChannel {
    pub user: String,
    pub channel: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_verification() {
        let envelope = Envelope::parse(
            r#"{
                "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
                "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
                "type": "url_verification"
            }"#,
        )
        .unwrap();

        match envelope {
            Envelope::UrlVerification { challenge } => assert_eq!(
                challenge,
                "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
            ),
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[test]
    fn member_joined_channel() {
        let envelope = Envelope::parse(
            r#"{
                "token": "XXYYZZ",
                "team_id": "T123ABC456",
                "api_app_id": "A123ABC456",
                "type": "event_callback",
                "event_id": "Ev123ABC456",
                "event_time": 1515449522000016,
                "event": {
                    "type": "member_joined_channel",
                    "user": "W123ABC456",
                    "channel": "C123ABC456",
                    "channel_type": "C",
                    "team": "T123ABC456",
                    "inviter": "U123456789"
                }
            }"#,
        )
        .unwrap();

        match envelope {
            Envelope::EventCallback {
                event: CallbackEvent::MemberJoinedChannel(joined),
            } => {
                assert_eq!(joined.user, "W123ABC456");
                assert_eq!(joined.channel, "C123ABC456");
            }
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[test]
    fn other_events_and_envelopes() {
        assert!(matches!(
            Envelope::parse(r#"{"type": "event_callback", "event": {"type": "app_mention"}}"#),
            Ok(Envelope::EventCallback {
                event: CallbackEvent::Other
            })
        ));
        assert!(matches!(
            Envelope::parse(r#"{"type": "event_callback"}"#),
            Ok(Envelope::EventCallback {
                event: CallbackEvent::Other
            })
        ));
        assert!(matches!(
            Envelope::parse(r#"{"type": "app_rate_limited"}"#),
            Ok(Envelope::Other)
        ));
        assert!(matches!(Envelope::parse("{}"), Ok(Envelope::Other)));
    }

    #[test]
    fn malformed() {
        assert!(Envelope::parse("not json").is_err());
        assert!(Envelope::parse(r#"{"type": "url_verification"}"#).is_err());
        assert!(Envelope::parse(
            r#"{"type": "event_callback", "event": {"type": "member_joined_channel"}}"#
        )
        .is_err());
    }
}
