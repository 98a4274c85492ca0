//! Greenhouse Monitor binary.
//!
//! Standalone service: polls the sensor on an interval, publishes readings to
//! an MQTT broker, and exposes the HTTP control surface.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use greenhouse_monitor::{
    sensor, start_web_server, MonitorConfig, MqttPublisher, SessionRegistry, WebConfig,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_INTERVAL_SECS, DEFAULT_MQTT_PORT, DEFAULT_WEB_PORT,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "greenhouse_monitor")]
#[command(about = "🌱 Greenhouse Monitor - temperature/humidity readings over MQTT")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Polls a DHT temperature/humidity sensor and publishes JSON readings \
to an MQTT broker, with HTTP endpoints to start and stop monitoring")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Greenhouse identifier stamped on every reading
    #[arg(long, env = "GREENHOUSE_ID")]
    greenhouse_id: Option<String>,

    /// MQTT broker hostname
    #[arg(long, env = "MQTT_BROKER_HOST")]
    broker_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "MQTT_BROKER_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    broker_port: u16,

    /// Publish topic override (defaults to greenhouse/<id>/data)
    #[arg(long, env = "MQTT_TOPIC")]
    topic: Option<String>,

    /// Poll interval between sensor read cycles, in seconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring service with the HTTP control surface (default)
    Serve(ServeArgs),

    /// Read the sensor once, print the reading, and exit
    Probe(ProbeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Broker connect timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Spawn a monitoring session immediately instead of waiting for /start
    #[arg(long)]
    autostart: bool,
}

#[derive(Args)]
struct ProbeArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    print_banner();

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await?,
        Some(Commands::Probe(args)) => probe_command(&cli, args)?,
        None => {
            let serve_args = ServeArgs {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_WEB_PORT,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
                no_cors: false,
                autostart: false,
            };
            serve_command(&cli, &serve_args).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("🌱 Greenhouse Monitor");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn monitor_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let greenhouse_id = cli
        .greenhouse_id
        .clone()
        .context("greenhouse id is required (--greenhouse-id or GREENHOUSE_ID)")?;
    let broker_host = cli
        .broker_host
        .clone()
        .context("broker host is required (--broker-host or MQTT_BROKER_HOST)")?;

    let config = MonitorConfig::new(greenhouse_id, broker_host)
        .with_broker_port(cli.broker_port)
        .with_topic(cli.topic.clone())
        .with_interval_secs(cli.interval);
    config.validate()?;
    Ok(config)
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let config = monitor_config(cli)?.with_connect_timeout_secs(args.connect_timeout);

    info!("Greenhouse: {}", config.greenhouse_id);
    info!("Broker: {}", config.broker_address());
    info!("Topic: {}", config.data_topic());
    info!("Poll interval: {}s", config.interval_secs);

    // The broker connection is confirmed before anything can publish.
    let publisher = Arc::new(
        MqttPublisher::connect(&config)
            .await
            .context("could not connect to the MQTT broker")?,
    );

    let registry = Arc::new(SessionRegistry::new(
        config,
        sensor::default_sensor_factory(),
        publisher,
    ));

    if args.autostart {
        let id = registry.start()?;
        info!("Autostarted monitoring session {}", id);
    }

    let web_config = WebConfig::new(&args.host, args.port).with_cors(!args.no_cors);
    start_web_server(web_config, registry).await?;

    Ok(())
}

fn probe_command(cli: &Cli, args: &ProbeArgs) -> anyhow::Result<()> {
    let greenhouse_id = cli.greenhouse_id.clone().unwrap_or_else(|| "probe".to_string());
    let reading = sensor::probe_once(&greenhouse_id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&reading)?),
        "pretty" => {
            println!("🌱 Sensor Probe ({})", reading.greenhouse_id);
            println!("==============================");
            match reading.temperature {
                Some(t) => println!("  Temperature: {:.1}°C", t),
                None => println!("  Temperature: unavailable"),
            }
            match reading.humidity {
                Some(h) => println!("  Humidity:    {:.1}%", h),
                None => println!("  Humidity:    unavailable"),
            }
            println!("  Timestamp:   {}", reading.timestamp);
        }
        other => anyhow::bail!("Unsupported format: {other}. Use 'json' or 'pretty'"),
    }

    Ok(())
}
