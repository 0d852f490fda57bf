//! Single-shot invocations: one API gateway proxy event in, one proxy response out.
//!
//! Both payload versions are understood: `path` comes from version 1.0 events and `rawPath` from
//! version 2.0 ones.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    bot::{Grantbot, Reply},
    webhooks::{single, verified_body, Invocation},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<Reply> for ProxyResponse {
    fn from(reply: Reply) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), reply.content_type().to_string());

        Self {
            status_code: reply.status.code,
            headers,
            body: reply.into_body(),
        }
    }
}

impl Invocation for ProxyEvent {
    fn path(&self) -> &str {
        self.raw_path
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<&str> {
        single(
            self.headers
                .as_ref()?
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
        )
    }

    fn body(&self) -> anyhow::Result<Cow<'_, str>> {
        let body = self.body.as_deref().unwrap_or_default();
        if !self.is_base64_encoded {
            return Ok(Cow::Borrowed(body));
        }

        let bytes = STANDARD
            .decode(body)
            .context("body isn't valid base64")?;
        let body = String::from_utf8(bytes).context("decoded body isn't valid UTF-8")?;
        Ok(Cow::Owned(body))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Endpoint {
    Events,
    Interactions,
}

impl Endpoint {
    /// Picks the handler from the path, falling back on the content type when the gateway
    /// forwards everything to a single route.
    fn resolve(invocation: &dyn Invocation) -> Self {
        let path = invocation.path().trim_end_matches('/');
        if path.ends_with("/slack/interactions") {
            return Self::Interactions;
        }
        if path.ends_with("/slack/events") {
            return Self::Events;
        }

        match invocation.header("Content-Type") {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => Self::Interactions,
            _ => Self::Events,
        }
    }
}

/// Runs `event` through the same handlers as the HTTP server.
pub async fn invoke(
    bot: &Grantbot,
    signing_secret: Option<&SecretString>,
    event: &ProxyEvent,
) -> ProxyResponse {
    let body = match verified_body(event, signing_secret) {
        Ok(body) => body,
        Err((status, e)) => {
            warn!("rejected invocation on `{}`: {:#}", event.path(), e);
            return Reply::error(status, format!("{:#}", e)).into();
        }
    };

    let endpoint = Endpoint::resolve(event);
    debug!("dispatching invocation on `{}` to {:?}", event.path(), endpoint);

    let reply = match endpoint {
        Endpoint::Events => bot.handle_events(&body).await,
        Endpoint::Interactions => bot.handle_interaction(&body).await,
    };
    reply.into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::{
        bot::messages::Locale,
        slack::fake::{Call, FakeSlack},
    };

    fn event(value: Value) -> ProxyEvent {
        serde_json::from_value(value).unwrap()
    }

    fn grant_form(user_id: &str) -> String {
        let payload = json!({
            "user": { "id": user_id },
            "actions": [{ "action_id": "grant_permission" }],
        });
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish()
    }

    #[test]
    fn headers_are_case_insensitive() {
        let event = event(json!({
            "headers": { "content-type": "application/json", "X-Slack-Signature": "v0=00" },
        }));

        assert_eq!(event.header("Content-Type"), Some("application/json"));
        assert_eq!(event.header("x-slack-signature"), Some("v0=00"));
        assert_eq!(event.header("X-Slack-Request-Timestamp"), None);
    }

    #[test]
    fn repeated_header_is_absent() {
        let event = event(json!({
            "headers": { "x-slack-signature": "v0=00", "X-Slack-Signature": "v0=11" },
        }));
        assert_eq!(event.header("X-Slack-Signature"), None);
    }

    #[test]
    fn null_headers() {
        let event = event(json!({ "headers": null, "body": "{}" }));
        assert_eq!(event.header("Content-Type"), None);
    }

    #[test]
    fn base64_body() {
        let event = event(json!({
            "body": STANDARD.encode("payload=%7B%7D"),
            "isBase64Encoded": true,
        }));
        assert_eq!(event.body().unwrap(), "payload=%7B%7D");

        let event = ProxyEvent {
            body: Some("!!!".to_string()),
            is_base64_encoded: true,
            ..Default::default()
        };
        assert!(event.body().is_err());
    }

    #[test]
    fn endpoint_resolution() {
        let by_path = |path: &str| {
            Endpoint::resolve(&ProxyEvent {
                raw_path: Some(path.to_string()),
                ..Default::default()
            })
        };
        assert_eq!(by_path("/slack/interactions"), Endpoint::Interactions);
        assert_eq!(by_path("/prod/slack/interactions/"), Endpoint::Interactions);
        assert_eq!(by_path("/slack/events"), Endpoint::Events);

        let form = event(json!({
            "path": "/",
            "headers": { "Content-Type": "application/x-www-form-urlencoded; charset=utf-8" },
        }));
        assert_eq!(Endpoint::resolve(&form), Endpoint::Interactions);
        assert_eq!(Endpoint::resolve(&ProxyEvent::default()), Endpoint::Events);
    }

    #[rocket::async_test]
    async fn verification_through_gateway() {
        let bot = Grantbot::with_api(Arc::new(FakeSlack::default()), "S1", Locale::En);
        let event = event(json!({
            "httpMethod": "POST",
            "path": "/slack/events",
            "headers": { "Content-Type": "application/json" },
            "body": r#"{"type": "url_verification", "challenge": "xyz"}"#,
            "isBase64Encoded": false,
        }));

        let response = invoke(&bot, None, &event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "xyz");
        assert_eq!(response.headers["Content-Type"], "text/plain; charset=utf-8");
    }

    #[rocket::async_test]
    async fn base64_interaction_through_gateway() {
        let slack = Arc::new(FakeSlack::with_members(&["U1"]));
        let bot = Grantbot::with_api(slack.clone(), "S1", Locale::En);
        let event = event(json!({
            "rawPath": "/default/grantbot",
            "headers": { "content-type": "application/x-www-form-urlencoded" },
            "body": STANDARD.encode(grant_form("U2")),
            "isBase64Encoded": true,
        }));

        let response = invoke(&bot, None, &event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            serde_json::from_str::<Value>(&response.body).unwrap(),
            json!({"text": "✅ Permissions have been granted."})
        );
        assert!(slack.calls().contains(&Call::UpdateMembers {
            usergroup: "S1".to_string(),
            users: vec!["U1".to_string(), "U2".to_string()],
        }));
    }

    #[rocket::async_test]
    async fn gateway_checks_signature() {
        let slack = Arc::new(FakeSlack::default());
        let bot = Grantbot::with_api(slack.clone(), "S1", Locale::En);
        let secret = SecretString::from("signing-secret".to_string());
        let event = event(json!({
            "path": "/slack/interactions",
            "headers": { "X-Slack-Request-Timestamp": "1", "X-Slack-Signature": "v0=00" },
            "body": grant_form("U2"),
        }));

        let response = invoke(&bot, Some(&secret), &event).await;

        assert_eq!(response.status_code, 401);
        assert!(slack.calls().is_empty());
    }

    #[rocket::async_test]
    async fn undecodable_body() {
        let bot = Grantbot::with_api(Arc::new(FakeSlack::default()), "S1", Locale::En);
        let event = event(json!({ "body": "%%%", "isBase64Encoded": true }));

        let response = invoke(&bot, None, &event).await;

        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn response_serialization() {
        let response: ProxyResponse = Reply::status_ok().into();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "application/json" },
                "body": r#"{"status":"ok"}"#,
            })
        );
    }
}
