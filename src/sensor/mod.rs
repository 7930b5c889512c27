//! Sensor lifecycle framework.
//!
//! Every signal source implements [`Sensor`]: one availability/start/stop
//! contract over event-driven, polling and always-on sources alike. The set
//! of sources is fixed at build time, so they are carried as the closed
//! [`AnySensor`] enum rather than boxed trait objects.

pub mod dispatcher;
pub mod registry;
pub mod sampling;
pub mod sources;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;

use crate::host::Host;
use crate::store::RecordSink;

use sources::{
    charging::ChargingSensor, connectivity::ConnectivitySensor, interaction::InteractionSensor,
    motion::MotionSensor, screen::ScreenOrientationSensor, ui_events::UiEventsSensor,
};

const ENABLE_LOGS: bool = true;

use crate::log_error;

/// Builds the sink for a source from its `(file_name, header)` pair. Lets the
/// registry decide where records land (CSV directory in production, memory in
/// tests) without the sources knowing.
pub type SinkFactory<'a> = &'a dyn Fn(&'static str, &'static str) -> Arc<dyn RecordSink>;

/// Shared state every concrete sensor embeds: identity, channel tag, enabled
/// flag, running flag and the sink it emits into.
///
/// The running flag is an `Arc<AtomicBool>` so host-event handlers can hold a
/// clone and check it without touching the sensor itself; the sensor keeps
/// sole ownership of its state transitions.
pub struct SensorCore {
    name: &'static str,
    file_name: &'static str,
    header: &'static str,
    enabled: bool,
    running: Arc<AtomicBool>,
    sink: Arc<dyn RecordSink>,
}

impl SensorCore {
    pub fn new(
        name: &'static str,
        file_name: &'static str,
        header: &'static str,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            name,
            file_name,
            header,
            enabled: true,
            running: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn header(&self) -> &'static str {
        self.header
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Clone of the running flag for event handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Clone of the sink handle for event handlers.
    pub fn sink_handle(&self) -> Arc<dyn RecordSink> {
        Arc::clone(&self.sink)
    }

    /// Append one record. Fire-and-forget: a sink failure is logged, never
    /// propagated to whoever delivered the value.
    pub fn emit(&self, timestamp_ms: i64, value: &str) {
        if let Err(err) = self.sink.append(timestamp_ms, value) {
            log_error!("{}: sink append failed: {err:?}", self.name);
        }
    }

    /// Flush the sink on stop; failures are logged only.
    pub fn release_sink(&self) {
        if let Err(err) = self.sink.flush() {
            log_error!("{}: sink flush failed: {err:?}", self.name);
        }
    }
}

/// The uniform source contract.
///
/// `start` on an unavailable sensor is a no-op that leaves it `Stopped`;
/// `stop` when already stopped is a no-op. Calling `start` on an
/// already-running sensor is forbidden (it would double-subscribe), so the
/// dispatcher checks the running state first.
pub trait Sensor: Send {
    fn core(&self) -> &SensorCore;

    fn core_mut(&mut self) -> &mut SensorCore;

    /// Pure capability check against the host; no side effects.
    fn is_available(&self, host: &dyn Host) -> bool;

    fn start(&mut self, host: &dyn Host) -> Result<()>;

    fn stop(&mut self, host: &dyn Host) -> Result<()>;

    /// One-shot re-read for periodic sources; default does nothing.
    fn sample(&mut self, _host: &dyn Host) {}

    fn name(&self) -> &'static str {
        self.core().name()
    }

    fn is_enabled(&self) -> bool {
        self.core().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.core_mut().enabled = enabled;
    }

    fn is_running(&self) -> bool {
        self.core().is_running()
    }

    /// Whether an external scheduler may invoke `sample` on this sensor.
    fn periodic_sampling(&self) -> bool {
        false
    }

    /// Whether the sensor logs continuously while running.
    fn continuous_logging(&self) -> bool {
        true
    }
}

/// The closed set of sources this framework ships.
pub enum AnySensor {
    Motion(MotionSensor),
    Connectivity(ConnectivitySensor),
    Charging(ChargingSensor),
    Interaction(InteractionSensor),
    ScreenOrientation(ScreenOrientationSensor),
    UiEvents(UiEventsSensor),
}

impl AnySensor {
    fn as_sensor(&self) -> &dyn Sensor {
        match self {
            AnySensor::Motion(sensor) => sensor,
            AnySensor::Connectivity(sensor) => sensor,
            AnySensor::Charging(sensor) => sensor,
            AnySensor::Interaction(sensor) => sensor,
            AnySensor::ScreenOrientation(sensor) => sensor,
            AnySensor::UiEvents(sensor) => sensor,
        }
    }

    fn as_sensor_mut(&mut self) -> &mut dyn Sensor {
        match self {
            AnySensor::Motion(sensor) => sensor,
            AnySensor::Connectivity(sensor) => sensor,
            AnySensor::Charging(sensor) => sensor,
            AnySensor::Interaction(sensor) => sensor,
            AnySensor::ScreenOrientation(sensor) => sensor,
            AnySensor::UiEvents(sensor) => sensor,
        }
    }
}

impl Sensor for AnySensor {
    fn core(&self) -> &SensorCore {
        self.as_sensor().core()
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        self.as_sensor_mut().core_mut()
    }

    fn is_available(&self, host: &dyn Host) -> bool {
        self.as_sensor().is_available(host)
    }

    fn start(&mut self, host: &dyn Host) -> Result<()> {
        self.as_sensor_mut().start(host)
    }

    fn stop(&mut self, host: &dyn Host) -> Result<()> {
        self.as_sensor_mut().stop(host)
    }

    fn sample(&mut self, host: &dyn Host) {
        self.as_sensor_mut().sample(host)
    }

    fn periodic_sampling(&self) -> bool {
        self.as_sensor().periodic_sampling()
    }

    fn continuous_logging(&self) -> bool {
        self.as_sensor().continuous_logging()
    }
}
