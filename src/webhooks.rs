use std::{borrow::Cow, io};

use anyhow::anyhow;
use rocket::{
    catchers,
    data::{ByteUnit, FromData, Outcome},
    http::{ContentType, Status},
    response::{self, Responder},
    routes, Build, Data, Request, Rocket, State,
};
use secrecy::SecretString;
use tracing::{debug, trace, warn};

use crate::bot::{Grantbot, Reply, ReplyBody};

pub mod events;
pub mod interactions;
pub mod signing;

/// An inbound HTTP request, as handed over by whatever hosts grantbot.
///
/// Hosts don't all deliver the body the way Slack sent it (API gateways may base64 it), so
/// [`Invocation::body`] has to undo that before anything looks at the content.
pub trait Invocation {
    fn path(&self) -> &str;

    /// Case-insensitive header lookup. A header sent more than once counts as absent.
    fn header(&self, name: &str) -> Option<&str>;

    fn body(&self) -> anyhow::Result<Cow<'_, str>>;
}

/// Decodes the body of `invocation`, then checks its signature when a secret is configured.
pub fn verified_body<'a>(
    invocation: &'a dyn Invocation,
    signing_secret: Option<&SecretString>,
) -> Result<Cow<'a, str>, (Status, anyhow::Error)> {
    let body = invocation.body().map_err(|e| (Status::BadRequest, e))?;

    if let Some(secret) = signing_secret {
        signing::verify_invocation(secret, invocation, &body)
            .map_err(|e| (Status::Unauthorized, e.into()))?;
        debug!("validated Slack request signature");
    }

    Ok(body)
}

/// The only value of a header, if it was sent exactly once.
pub(crate) fn single<'a>(mut values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    match (values.next(), values.next()) {
        (Some(value), None) => Some(value),
        _ => None,
    }
}

/// The app's signing secret, if requests should be verified.
pub struct SigningSecret(pub Option<SecretString>);

pub fn rocket(bot: Grantbot, signing_secret: Option<SecretString>) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![slack_events, slack_interactions])
        .register("/", catchers![json_error])
        .manage(bot)
        .manage(SigningSecret(signing_secret))
}

#[rocket::post("/slack/events", data = "<request>")]
pub(crate) async fn slack_events(request: SlackRequest, bot: &State<Grantbot>) -> Reply {
    bot.handle_events(&request.0).await
}

#[rocket::post("/slack/interactions", data = "<request>")]
pub(crate) async fn slack_interactions(request: SlackRequest, bot: &State<Grantbot>) -> Reply {
    bot.handle_interaction(&request.0).await
}

#[rocket::catch(default)]
fn json_error(status: Status, _request: &Request<'_>) -> Reply {
    Reply::error(status, status.reason().unwrap_or("Unknown error"))
}

impl<'r> Responder<'r, 'static> for Reply {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status;
        match self.body {
            ReplyBody::Text(text) => (status, (ContentType::Plain, text)).respond_to(request),
            ReplyBody::Json(value) => {
                (status, (ContentType::JSON, value.to_string())).respond_to(request)
            }
        }
    }
}

/// Request body, checked against the signing secret when one is configured.
pub struct SlackRequest(pub String);

struct RocketInvocation<'a, 'r> {
    request: &'a Request<'r>,
    body: &'a str,
}

impl Invocation for RocketInvocation<'_, '_> {
    fn path(&self) -> &str {
        self.request.uri().path().as_str()
    }

    fn header(&self, name: &str) -> Option<&str> {
        // rocket's header map is already case-insensitive
        single(self.request.headers().get(name))
    }

    fn body(&self) -> anyhow::Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(self.body))
    }
}

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

#[rocket::async_trait]
impl<'r> FromData<'r> for SlackRequest {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on {}", request.uri());

        let size_limit = match request.content_type() {
            Some(ct) if ct.is_form() => request.limits().get("form").unwrap_or(LIMIT),
            _ => request.limits().get("json").unwrap_or(LIMIT),
        };
        let content = match data.open(size_limit).into_string().await {
            Ok(s) if s.is_complete() => s.into_inner(),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                return Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, e.into())),
        };

        let secret = match request.rocket().state::<SigningSecret>() {
            Some(secret) => secret,
            None => {
                return Outcome::Error((
                    Status::InternalServerError,
                    anyhow!("signing secret isn't managed"),
                ))
            }
        };

        let invocation = RocketInvocation {
            request,
            body: &content,
        };
        match verified_body(&invocation, secret.0.as_ref()) {
            Ok(body) => Outcome::Success(SlackRequest(body.into_owned())),
            Err((status, e)) => {
                warn!("rejected request on {}: {:#}", invocation.path(), e);
                Outcome::Error((status, e))
            }
        }
    }
}
