use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::PathBuf,
};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use rocket::http::Status;
use tracing_subscriber::EnvFilter;

mod bot;
use bot::{Grantbot, Reply};

mod config;
use config::GrantbotConfig;

mod gateway;
use gateway::{ProxyEvent, ProxyResponse};

mod slack;

mod webhooks;

#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// YAML configuration file for grantbot. Settings are read from the environment when omitted.
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the Slack webhooks over HTTP (default)
    Serve,
    /// Handle a single API gateway proxy event and print the proxy response
    Invoke {
        /// File holding the event as JSON, standard input when omitted
        #[clap(short, long)]
        event: Option<PathBuf>,
    },
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for the proxy response of `invoke`
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();

    match opts.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(opts.config).await,
        Command::Invoke { event } => invoke(opts.config, event).await,
    }
}

async fn serve(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = GrantbotConfig::load(config.as_deref()).context("couldn't load configuration")?;
    let bot = Grantbot::new(&config).context("failed to create grantbot")?;

    let rocket = webhooks::rocket(bot, config.slack_signing_secret);
    if let Err(err) = rocket.launch().await {
        return Err(anyhow!("rocket failed: {}", err));
    }

    Ok(())
}

async fn invoke(config: Option<PathBuf>, event: Option<PathBuf>) -> anyhow::Result<()> {
    let event = read_event(event)?;

    // a misconfigured function still has to answer the gateway
    let response = match GrantbotConfig::load(config.as_deref())
        .and_then(|config| Ok((Grantbot::new(&config)?, config)))
    {
        Ok((bot, config)) => {
            gateway::invoke(&bot, config.slack_signing_secret.as_ref(), &event).await
        }
        Err(e) => {
            tracing::error!("couldn't set up grantbot: {:#}", e);
            ProxyResponse::from(Reply::error(Status::InternalServerError, format!("{:#}", e)))
        }
    };

    serde_json::to_writer(io::stdout().lock(), &response).context("couldn't write response")?;
    Ok(())
}

fn read_event(path: Option<PathBuf>) -> anyhow::Result<ProxyEvent> {
    let mut content = String::new();
    match &path {
        Some(path) => BufReader::new(
            File::open(path).with_context(|| format!("couldn't open {}", path.display()))?,
        )
        .read_to_string(&mut content),
        None => io::stdin().lock().read_to_string(&mut content),
    }
    .context("couldn't read event")?;

    serde_json::from_str(&content).context("couldn't parse event")
}
