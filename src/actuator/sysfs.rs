//! Linux sysfs GPIO output pin

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin};
use spp_bridge_shared::ActuatorError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default sysfs GPIO class directory
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// I/O failure writing a sysfs attribute
#[derive(Debug)]
pub struct SysfsPinError(pub io::Error);

impl Error for SysfsPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// GPIO line exported through `/sys/class/gpio`
#[derive(Debug)]
pub struct SysfsPin {
    line: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `line` under `root` if needed and configure it as an output
    pub fn export_output(root: &Path, line: u32) -> Result<Self, ActuatorError> {
        let dir = root.join(format!("gpio{}", line));
        if !dir.exists() {
            fs::write(root.join("export"), line.to_string())?;
        }
        fs::write(dir.join("direction"), "out")?;
        info!("[GPIO] Line {} configured as output ({})", line, dir.display());

        Ok(Self {
            line,
            value_path: dir.join("value"),
        })
    }

    /// GPIO line number
    pub fn line(&self) -> u32 {
        self.line
    }

    fn write_value(&self, value: &str) -> Result<(), SysfsPinError> {
        fs::write(&self.value_path, value).map_err(SysfsPinError)
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsPinError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_value("0")
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_value("1")
    }
}
