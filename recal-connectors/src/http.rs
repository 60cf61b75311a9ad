//! HTTP Acquisition - Polling a Sensor Gateway Endpoint
//!
//! Polls a REST endpoint for one reading at a time. The endpoint is
//! expected to answer `GET` with a JSON object carrying the raw value:
//!
//! ```json
//! { "sensor_value": 97.4 }
//! ```
//!
//! Extra fields are ignored so gateways can decorate the payload with
//! timestamps or quality flags without breaking acquisition.
//!
//! There is deliberately no in-call retry: the polling loop already retries
//! every cycle, so a failed request simply reports unavailable and lets the
//! cadence try again.

use std::time::Duration;

use serde::Deserialize;

use crate::{finite_reading, AcquisitionError, AcquisitionSource};

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Expected gateway payload; unknown fields are ignored
#[derive(Deserialize)]
struct Payload {
    sensor_value: f64,
}

/// HTTP polling source using the lightweight ureq client
pub struct HttpSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    /// Create a source polling the given URL.
    ///
    /// # Errors
    /// Rejects URLs that are not `http://` or `https://`.
    pub fn new(url: impl Into<String>) -> Result<Self, AcquisitionError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a source with an explicit per-request timeout
    pub fn with_timeout(
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AcquisitionError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AcquisitionError::Transport(format!(
                "endpoint must start with http:// or https://, got {url}"
            )));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(&format!("recal/{}", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self { url, agent })
    }

    /// The polled endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AcquisitionSource for HttpSource {
    fn try_sample(&mut self) -> Result<f64, AcquisitionError> {
        let response = self.agent.get(&self.url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => {
                AcquisitionError::Transport(format!("server returned status {code}"))
            }
            ureq::Error::Transport(transport) => {
                AcquisitionError::Transport(transport.to_string())
            }
        })?;

        let body = response
            .into_string()
            .map_err(|err| AcquisitionError::Transport(err.to_string()))?;
        decode_payload(&body)
    }

    fn description(&self) -> &str {
        &self.url
    }
}

/// Decode the gateway payload and validate the reading
fn decode_payload(body: &str) -> Result<f64, AcquisitionError> {
    let payload: Payload =
        serde_json::from_str(body).map_err(|err| AcquisitionError::Malformed(err.to_string()))?;
    finite_reading(payload.sensor_value)
}
