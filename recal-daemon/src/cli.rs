//! Command-line configuration for the recal daemon

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use recal_core::DEFAULT_RETRAIN_THRESHOLD;

/// How raw readings are acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AcquisitionMode {
    /// Line-oriented serial (UART) sensor
    Serial,
    /// HTTP gateway endpoint returning `{"sensor_value": ...}`
    Api,
}

/// Continuously correct a low-cost sensor against a trusted reference,
/// retraining the calibration mapping as paired observations accumulate.
#[derive(Debug, Parser)]
#[command(name = "recal", version, about)]
pub struct Cli {
    /// Acquisition mode; without one the daemon runs but every cycle
    /// reports the sensor as unavailable
    #[arg(long, value_enum)]
    pub mode: Option<AcquisitionMode>,

    /// Serial device path (serial mode)
    #[arg(long, default_value = "/dev/ttyUSB0")]
    pub serial_port: String,

    /// Serial baud rate (serial mode)
    #[arg(long, default_value_t = 9600)]
    pub baud_rate: u32,

    /// Gateway endpoint URL (api mode)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Pending observations that trigger a retrain cycle
    #[arg(long, default_value_t = DEFAULT_RETRAIN_THRESHOLD)]
    pub retrain_threshold: usize,

    /// Seconds between acquisition cycles
    #[arg(long, default_value_t = 10.0)]
    pub poll_interval: f64,

    /// Calibration snapshot path
    #[arg(long, default_value = "calibration.json")]
    pub store: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_configuration() {
        let cli = Cli::try_parse_from(["recal"]).unwrap();
        assert_eq!(cli.mode, None);
        assert_eq!(cli.serial_port, "/dev/ttyUSB0");
        assert_eq!(cli.baud_rate, 9600);
        assert_eq!(cli.retrain_threshold, 10);
        assert_eq!(cli.poll_interval, 10.0);
        assert_eq!(cli.store, PathBuf::from("calibration.json"));
    }

    #[test]
    fn api_mode_parses() {
        let cli = Cli::try_parse_from([
            "recal",
            "--mode",
            "api",
            "--api-url",
            "http://gateway.local/reading",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(AcquisitionMode::Api));
        assert_eq!(cli.api_url.as_deref(), Some("http://gateway.local/reading"));
    }
}
