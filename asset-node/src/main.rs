//! asset-node: attribute event pipeline daemon
//!
//! Seeds an in-memory asset store from the config file and runs the
//! standard processing chain over it. With `--events`, replays the file
//! and prints processing statistics; otherwise it waits for ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use asset_node::config::NodeConfig;
use asset_node::replay;
use asset_processing::processors::{ChannelActuatorSink, MemoryDatapointStore, RulesProcessor};
use asset_processing::{AssetProcessingService, Direction, MemoryAssetStore};

#[derive(Parser)]
#[command(name = "asset-node")]
#[command(about = "Attribute event processing pipeline")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "asset-node.yaml")]
    config: PathBuf,

    /// JSON-lines file of events to replay
    #[arg(short, long, env = "ASSET_NODE_EVENTS")]
    events: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(long, env = "ASSET_NODE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Future timestamp tolerance in ms (overrides config file)
    #[arg(long)]
    future_tolerance_ms: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = NodeConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.processing.general.log_level = level;
    }
    if let Some(tolerance) = cli.future_tolerance_ms {
        config.processing.validation.future_tolerance_ms = tolerance;
    }

    let level = &config.processing.general.log_level;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("asset_node={level},asset_processing={level}")))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(node = %config.node.name, config = %cli.config.display(), "Starting asset-node");

    let assets = config.assets()?;
    info!(assets = assets.len(), "Seeding asset store");
    let store = Arc::new(MemoryAssetStore::with_assets(assets));

    let (actuator, mut commands) = ChannelActuatorSink::channel(config.processing.actuator.capacity);
    let actuator_task = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            info!(
                attribute = %command.event.attribute_ref(),
                value = %command.event.value(),
                agent = %command.link.agent_name,
                protocol = command.link.protocol.as_deref().unwrap_or("unknown"),
                "Actuator command"
            );
        }
    });

    let datapoints = Arc::new(MemoryDatapointStore::new(
        config.processing.datapoints.max_per_attribute,
    ));
    let service = Arc::new(
        AssetProcessingService::builder()
            .config(config.processing.clone())
            .store(store)
            .with_standard_chain(
                Arc::new(RulesProcessor::new()),
                Arc::new(actuator),
                datapoints.clone(),
            )
            .build()?,
    );

    let (sensors, route) = service.open_sensor_route();

    match cli.events {
        Some(path) => {
            let entries = replay::load_events(&path)?;
            info!(events = entries.len(), file = %path.display(), "Replaying events");

            for entry in entries {
                match entry.direction {
                    Direction::Northbound => {
                        if sensors.send(entry.event).await.is_err() {
                            warn!("Sensor route closed, stopping replay");
                            break;
                        }
                    }
                    Direction::Southbound => {
                        if let Err(e) = service.update_attribute_value(entry.event).await {
                            error!(error = %e, "Attribute update failed");
                        }
                    }
                }
            }
        }
        None => {
            info!("No event file given, waiting for ctrl-c");
            tokio::signal::ctrl_c().await?;
        }
    }

    drop(sensors);
    route.await?;

    match serde_json::to_string_pretty(&service.stats()) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to serialize statistics"),
    }

    // The service holds the last actuator sender
    drop(service);
    actuator_task.await?;

    info!(datapoints = datapoints.len(), "Shutting down");
    Ok(())
}
