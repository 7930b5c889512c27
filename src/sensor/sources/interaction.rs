//! Always-on logical source: interaction markers written by the hosting app.
//!
//! No host subscription; the surrounding study logic calls the marker methods
//! when an interaction session begins, is confirmed, or ends.

use anyhow::Result;
use chrono::Utc;

use crate::host::Host;
use crate::sensor::{Sensor, SensorCore, SinkFactory};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

const FILE_NAME: &str = "interaction_log.csv";
const FILE_HEADER: &str = "TimeUnix,Value";

pub struct InteractionSensor {
    core: SensorCore,
}

impl InteractionSensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "Interaction Log",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
        }
    }

    pub fn log_interaction_start(&self) {
        self.mark("start");
    }

    pub fn log_interaction_confirmed(&self) {
        self.mark("confirm");
    }

    pub fn log_interaction_end(&self) {
        self.mark("end");
    }

    pub fn log_no_interaction(&self) {
        self.mark("noInteraction");
    }

    pub fn log_interaction_asked(&self) {
        self.mark("asked");
    }

    fn mark(&self, value: &str) {
        if !self.core.is_running() {
            log_debug!("Interaction Log: marker '{value}' while stopped, dropped");
            return;
        }
        self.core.emit(Utc::now().timestamp_millis(), value);
    }
}

impl Sensor for InteractionSensor {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn is_available(&self, _host: &dyn Host) -> bool {
        true
    }

    fn start(&mut self, _host: &dyn Host) -> Result<()> {
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
}
