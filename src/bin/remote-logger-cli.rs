use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remote_logger::config::{load_config, ConfigError};
use remote_logger::remote::{ControlTopic, ExceptionNotice};

#[derive(Parser)]
#[command(name = "remote-logger-cli")]
#[command(about = "Operator CLI for remote-controlled loggers", long_about = None)]
struct Cli {
    /// MQTT broker host
    #[arg(short, long, default_value = "localhost")]
    server: String,

    /// MQTT broker port
    #[arg(short, long, default_value_t = 1883)]
    port: u16,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Host alias of the logger
    #[arg(long)]
    host_alias: String,

    /// Service (logger) name
    #[arg(long)]
    service: String,

    /// Control key the logger was enabled with
    #[arg(short, long)]
    key: String,
}

impl Target {
    fn topic(&self) -> ControlTopic {
        ControlTopic::new(&self.host_alias, &self.service, &self.key)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send a command to a logger
    Send {
        #[command(flatten)]
        target: Target,

        /// Command name, e.g. "disconnect"
        #[arg(short, long)]
        function: String,

        /// Extra JSON object fields to send along
        #[arg(long)]
        payload: Option<String>,
    },
    /// Print exception notices published by a logger
    Watch {
        #[command(flatten)]
        target: Target,
    },
    /// Validate a logger configuration file
    CheckConfig { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remote_logger_cli=info,rumqttc=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let options = mqtt_options(&cli);

    match cli.command {
        Commands::Send {
            target,
            function,
            payload,
        } => send(options, target.topic(), function, payload).await?,
        Commands::Watch { target } => watch(options, target.topic()).await?,
        Commands::CheckConfig { path } => check_config(&path)?,
    }

    Ok(())
}

fn mqtt_options(cli: &Cli) -> MqttOptions {
    let client_id = format!("remote-logger-cli-{}", std::process::id());
    let mut options = MqttOptions::new(client_id, cli.server.clone(), cli.port);
    options.set_keep_alive(Duration::from_secs(10));
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        options.set_credentials(username.clone(), password.clone());
    }
    options
}

async fn send(
    options: MqttOptions,
    topic: ControlTopic,
    function: String,
    payload: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = command_body(&function, payload.as_deref())?;

    let (client, mut eventloop) = AsyncClient::new(options, 10);
    client
        .publish(topic.as_str(), QoS::AtMostOnce, false, body)
        .await?;
    client.disconnect().await?;

    // Drive the event loop until the publish and the disconnect are out.
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(topic = %topic, function = %function, "Command sent");
    Ok(())
}

/// Merge `function` into the optional JSON object `payload`.
fn command_body(function: &str, payload: Option<&str>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut body = match payload {
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => return Err("--payload must be a JSON object".into()),
        },
        None => Map::new(),
    };
    body.insert("function".to_string(), Value::String(function.to_string()));
    Ok(serde_json::to_vec(&body)?)
}

async fn watch(options: MqttOptions, topic: ControlTopic) -> Result<(), Box<dyn std::error::Error>> {
    let (client, mut eventloop) = AsyncClient::new(options, 10);
    client.subscribe(topic.as_str(), QoS::AtMostOnce).await?;
    tracing::info!(topic = %topic, "Watching for exception notices");

    loop {
        let event = tokio::select! {
            event = eventloop.poll() => event?,
            _ = tokio::signal::ctrl_c() => break,
        };

        if let Event::Incoming(Packet::Publish(publish)) = event {
            // Operator commands travel on the same topic; only print notices.
            match serde_json::from_slice::<ExceptionNotice>(&publish.payload) {
                Ok(notice) if notice.status == "exception" => {
                    println!("{}", serde_json::to_string_pretty(&notice)?);
                }
                _ => {}
            }
        }
    }

    client.disconnect().await?;
    Ok(())
}

fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match load_config(path) {
        Ok(config) => {
            println!("{}: OK (logger '{}')", path.display(), config.name);
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("{}: {}", path.display(), error);
            }
            Err(format!("{} validation error(s)", errors.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
