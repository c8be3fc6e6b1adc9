//! Bridge configuration
//!
//! [`BridgeConfig`] holds every runtime setting. `main` builds it from the
//! command line ([`Cli`]), where each flag can also come from an
//! `SPP_BRIDGE_*` environment variable.

use crate::actuator::sysfs::DEFAULT_SYSFS_ROOT;
use crate::session::SessionConfig;
use crate::transport::{LinkConfig, ServiceRecord};
use clap::{Parser, ValueEnum};
use spp_bridge_shared::spp;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Transport the bridge serves sessions on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Real RFCOMM Bluetooth (requires BlueZ)
    #[default]
    Rfcomm,
    /// TCP simulation (for development)
    Tcp,
}

/// Backing for the output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ActuatorMode {
    /// Linux sysfs GPIO
    #[default]
    Sysfs,
    /// In-memory pin that only logs
    Simulated,
}

/// Runtime configuration for the bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Transport mode
    pub transport: TransportMode,
    /// Name shown to peers during discovery
    pub device_name: String,
    /// Service registered for inbound sessions
    pub service: ServiceRecord,
    /// TCP listen address (when transport is Tcp)
    pub tcp_listen: SocketAddr,
    /// Per-link sizing
    pub link: LinkConfig,
    /// Actuator backing
    pub actuator: ActuatorMode,
    /// GPIO line driven by commands
    pub gpio_line: u32,
    /// sysfs GPIO class directory
    pub gpio_root: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::default(),
            device_name: spp::SERVER_NAME.into(),
            service: ServiceRecord::default(),
            tcp_listen: SocketAddr::from(([127, 0, 0, 1], 9000)),
            link: LinkConfig::default(),
            actuator: ActuatorMode::default(),
            gpio_line: spp::DEFAULT_OUTPUT_LINE,
            gpio_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl BridgeConfig {
    /// Identity handed to the session manager
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            visible_name: self.device_name.clone(),
            service: self.service.clone(),
        }
    }
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "spp-bridge", version, about = "Serial Port Profile command bridge")]
pub struct Cli {
    /// Transport to serve sessions on
    #[arg(long, value_enum, env = "SPP_BRIDGE_TRANSPORT", default_value_t = TransportMode::Rfcomm)]
    pub transport: TransportMode,

    /// Name peers see during discovery
    #[arg(long, env = "SPP_BRIDGE_DEVICE_NAME", default_value = spp::SERVER_NAME)]
    pub device_name: String,

    /// Advertised service name
    #[arg(long, env = "SPP_BRIDGE_SERVICE_NAME", default_value = spp::SERVER_NAME)]
    pub service_name: String,

    /// Fixed RFCOMM channel (default: chosen by BlueZ)
    #[arg(long, env = "SPP_BRIDGE_CHANNEL", value_parser = clap::value_parser!(u8).range(1..=30))]
    pub channel: Option<u8>,

    /// Listen address for the TCP simulation
    #[arg(long, env = "SPP_BRIDGE_TCP_LISTEN", default_value = "127.0.0.1:9000")]
    pub tcp_listen: SocketAddr,

    /// Largest frame delivered per data event
    #[arg(long, env = "SPP_BRIDGE_MAX_FRAME", default_value_t = spp::MAX_FRAME_LEN)]
    pub max_frame: usize,

    /// Outbound frames buffered per link before congestion
    #[arg(long, env = "SPP_BRIDGE_WRITE_QUEUE", default_value_t = spp::WRITE_QUEUE_DEPTH)]
    pub write_queue: usize,

    /// Output line backing
    #[arg(long, value_enum, env = "SPP_BRIDGE_ACTUATOR", default_value_t = ActuatorMode::Sysfs)]
    pub actuator: ActuatorMode,

    /// GPIO line driven by ON/OFF
    #[arg(long, env = "SPP_BRIDGE_GPIO_LINE", default_value_t = spp::DEFAULT_OUTPUT_LINE)]
    pub gpio_line: u32,

    /// sysfs GPIO class directory
    #[arg(long, env = "SPP_BRIDGE_GPIO_ROOT", default_value = DEFAULT_SYSFS_ROOT)]
    pub gpio_root: PathBuf,
}

impl Cli {
    /// Convert parsed arguments into a [`BridgeConfig`]
    pub fn into_bridge_config(self) -> BridgeConfig {
        BridgeConfig {
            transport: self.transport,
            device_name: self.device_name,
            service: ServiceRecord {
                class_id: spp::SERVICE_CLASS_ID,
                name: self.service_name,
                channel: self.channel,
            },
            tcp_listen: self.tcp_listen,
            link: LinkConfig {
                max_frame: self.max_frame,
                write_queue_depth: self.write_queue,
            },
            actuator: self.actuator,
            gpio_line: self.gpio_line,
            gpio_root: self.gpio_root,
        }
    }
}
