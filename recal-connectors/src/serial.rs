//! Serial (UART) Acquisition - Line-Oriented Sensor Framing
//!
//! Reads a sensor that prints one decimal reading per line, e.g. firmware
//! doing the classic `printf("%f\n", value)`. One sample means one line.
//!
//! The port is opened lazily on the first sample and held open across
//! cycles. Any failure - open, read timeout, lost device, garbled line -
//! drops the handle so the next cycle starts from a clean reopen; that is
//! what makes unplugging and replugging the sensor a transient condition
//! rather than a restart.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use serialport::SerialPort;

use crate::{finite_reading, AcquisitionError, AcquisitionSource};

/// Default read timeout per sample
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Serial line-reader source
pub struct SerialSource {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    reader: Option<BufReader<Box<dyn SerialPort>>>,
}

impl SerialSource {
    /// Create a source for the given device path and baud rate.
    ///
    /// Nothing is opened yet; the first sample connects.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout: DEFAULT_TIMEOUT,
            reader: None,
        }
    }

    /// Replace the per-sample read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured device path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn reader(&mut self) -> Result<&mut BufReader<Box<dyn SerialPort>>, AcquisitionError> {
        if self.reader.is_none() {
            let port = serialport::new(&self.path, self.baud_rate)
                .timeout(self.timeout)
                .open()
                .map_err(|err| {
                    AcquisitionError::Transport(format!("opening {} failed: {err}", self.path))
                })?;
            self.reader = Some(BufReader::new(port));
        }
        // Just ensured above
        Ok(self.reader.as_mut().unwrap())
    }

    fn read_line(&mut self) -> Result<f64, AcquisitionError> {
        let reader = self.reader()?;
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|err| AcquisitionError::Transport(err.to_string()))?;
        if read == 0 {
            return Err(AcquisitionError::Transport("port closed".into()));
        }
        parse_line(&line)
    }
}

impl AcquisitionSource for SerialSource {
    fn try_sample(&mut self) -> Result<f64, AcquisitionError> {
        let result = self.read_line();
        if result.is_err() {
            // Reopen from scratch next cycle
            self.reader = None;
        }
        result
    }

    fn description(&self) -> &str {
        &self.path
    }
}

/// Parse one line of sensor output into a finite reading
fn parse_line(line: &str) -> Result<f64, AcquisitionError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(AcquisitionError::Malformed("empty line".into()));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| AcquisitionError::Malformed(format!("not a number: {trimmed:?}")))?;
    finite_reading(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_reading() {
        assert_eq!(parse_line("97.4\r\n").unwrap(), 97.4);
        assert_eq!(parse_line("  140 \n").unwrap(), 140.0);
    }

    #[test]
    fn garbled_lines_are_malformed() {
        assert!(matches!(
            parse_line("ERR sensor saturated\n"),
            Err(AcquisitionError::Malformed(_))
        ));
        assert!(matches!(
            parse_line("\n"),
            Err(AcquisitionError::Malformed(_))
        ));
        assert!(matches!(
            parse_line("NaN\n"),
            Err(AcquisitionError::Malformed(_))
        ));
    }

    #[test]
    fn absent_device_reports_transport_failure() {
        let mut source = SerialSource::new("/dev/does-not-exist-recal-test", 9600);
        assert!(matches!(
            source.try_sample(),
            Err(AcquisitionError::Transport(_))
        ));
        // And the degraded form stays quiet about it
        assert_eq!(source.sample(), None);
    }
}
