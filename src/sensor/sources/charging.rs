//! Charging state: one probe at start, re-probed on each sampling tick.

use anyhow::Result;
use chrono::Utc;

use crate::host::{Host, Probe};
use crate::sensor::{Sensor, SensorCore, SinkFactory};

const FILE_NAME: &str = "charging.csv";
const FILE_HEADER: &str = "TimeUnix,Value";

pub struct ChargingSensor {
    core: SensorCore,
}

impl ChargingSensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "Charging",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
        }
    }

    fn probe_and_emit(&self, host: &dyn Host) {
        let timestamp_ms = Utc::now().timestamp_millis();
        let plugged = host
            .probe(Probe::ChargingState)
            .unwrap_or_else(|| "unknown".to_string());
        self.core.emit(timestamp_ms, &plugged);
    }
}

impl Sensor for ChargingSensor {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn is_available(&self, _host: &dyn Host) -> bool {
        true
    }

    fn start(&mut self, host: &dyn Host) -> Result<()> {
        self.probe_and_emit(host);
        self.core.set_running(true);
        Ok(())
    }

    fn stop(&mut self, _host: &dyn Host) -> Result<()> {
        if !self.core.is_running() {
            return Ok(());
        }
        self.core.set_running(false);
        self.core.release_sink();
        Ok(())
    }

    fn sample(&mut self, host: &dyn Host) {
        if self.core.is_running() {
            self.probe_and_emit(host);
        }
    }

    fn periodic_sampling(&self) -> bool {
        true
    }

    fn continuous_logging(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Sensor;
    use crate::test_support::{MemorySink, TestHost};
    use std::sync::Arc;

    #[test]
    fn start_emits_the_probed_state_immediately() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = ChargingSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new().with_probe_answer(Probe::ChargingState, "true");

        sensor.start(&host).unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "true");
        assert!(sensor.is_running());
    }

    #[test]
    fn an_unanswered_probe_is_recorded_as_unknown() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = ChargingSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);

        sensor.start(&TestHost::new()).unwrap();
        assert_eq!(sink.lines()[0].1, "unknown");
    }

    #[test]
    fn sample_only_emits_while_running() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = ChargingSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new().with_probe_answer(Probe::ChargingState, "false");

        sensor.sample(&host);
        assert!(sink.lines().is_empty());

        sensor.start(&host).unwrap();
        sensor.sample(&host);
        assert_eq!(sink.lines().len(), 2);

        sensor.stop(&host).unwrap();
        sensor.sample(&host);
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn stop_when_already_stopped_is_a_no_op() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = ChargingSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new();

        sensor.stop(&host).unwrap();
        sensor.stop(&host).unwrap();
        assert!(!sensor.is_running());
    }
}
