use anyhow::{Context, Result};
use clap::Parser;
use spp_bridge::actuator::{Actuator, PinActuator, SimulatedPin, SysfsPin};
use spp_bridge::config::{ActuatorMode, BridgeConfig, Cli, TransportMode};
use spp_bridge::session::SessionManager;
use spp_bridge::transport::{
    event_channel, EventSender, RfcommTransport, TcpTransport, TransportControl,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_bridge_config();

    info!("SPP bridge starting: {}", config.device_name);
    info!("  transport: {:?}", config.transport);
    info!("  actuator: {:?} (line {})", config.actuator, config.gpio_line);

    // Bring-up failures stop the process before any event is dispatched
    let actuator = open_actuator(&config).inspect_err(|e| error!("[SPP] {:#}", e))?;
    let (events_tx, mut events_rx) = event_channel();
    let transport = open_transport(&config, events_tx)
        .await
        .inspect_err(|e| error!("[SPP] {:#}", e))?;

    info!("{} SPP server initialized", transport.name());

    let mut manager = SessionManager::new(config.session(), transport, actuator);

    tokio::select! {
        _ = manager.run(&mut events_rx) => {
            error!("[SPP] Transport stopped delivering events");
        }
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }

    Ok(())
}

/// Configure the output line (one-time `ConfigureAsOutput`)
fn open_actuator(config: &BridgeConfig) -> Result<Box<dyn Actuator>> {
    let line = config.gpio_line;
    match config.actuator {
        ActuatorMode::Sysfs => {
            let pin = SysfsPin::export_output(&config.gpio_root, line)
                .with_context(|| format!("configure GPIO line {} as output failed", line))?;
            Ok(Box::new(PinActuator::new(pin, line)))
        }
        ActuatorMode::Simulated => Ok(Box::new(PinActuator::new(SimulatedPin::output(line), line))),
    }
}

/// Bring up the transport provider and register the event channel
async fn open_transport(
    config: &BridgeConfig,
    events: EventSender,
) -> Result<Arc<dyn TransportControl>> {
    match config.transport {
        TransportMode::Rfcomm => {
            let transport = RfcommTransport::open(config.link, events)
                .await
                .context("Bluetooth bring-up")?;
            Ok(Arc::new(transport))
        }
        TransportMode::Tcp => Ok(Arc::new(TcpTransport::new(
            config.tcp_listen,
            config.link,
            events,
        ))),
    }
}
