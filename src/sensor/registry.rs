//! The fixed, ordered collection of all known sensors.
//!
//! Constructed once, explicitly, and handed to the dispatcher and scheduler
//! as a handle. Running/stopped state lives inside the registry's slots, so
//! repeated activation cycles of the hosting service see the same instances.
//! For processes that genuinely need one shared registry there is a single
//! guarded `initialize`/`instance` pair; nothing in this crate reaches for it
//! implicitly.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use crate::config::SensorToggles;
use crate::sensor::{
    sources::{
        charging::ChargingSensor, connectivity::ConnectivitySensor,
        interaction::InteractionSensor, motion::MotionSensor, screen::ScreenOrientationSensor,
        ui_events::UiEventsSensor,
    },
    AnySensor, Sensor, SinkFactory,
};
use crate::store::{csv::CsvSink, RecordSink};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// One registry entry. Each slot locks independently, so a stuck sensor
/// cannot block its siblings' start/stop.
pub struct SensorSlot {
    name: &'static str,
    sensor: Mutex<AnySensor>,
}

impl SensorSlot {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn lock(&self) -> MutexGuard<'_, AnySensor> {
        match self.sensor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub struct SensorRegistry {
    slots: Vec<SensorSlot>,
}

impl SensorRegistry {
    /// Build the full sensor list in declaration order, wiring each source's
    /// enabled flag from the injected toggles and its sink from the factory.
    pub fn new(toggles: &SensorToggles, make_sink: SinkFactory<'_>) -> Self {
        let sensors = [
            AnySensor::Motion(MotionSensor::new(make_sink)),
            AnySensor::Connectivity(ConnectivitySensor::new(make_sink)),
            AnySensor::Charging(ChargingSensor::new(make_sink)),
            AnySensor::Interaction(InteractionSensor::new(make_sink)),
            AnySensor::ScreenOrientation(ScreenOrientationSensor::new(make_sink)),
            AnySensor::UiEvents(UiEventsSensor::new(make_sink)),
        ];

        let slots = sensors
            .into_iter()
            .map(|mut sensor| {
                let name = sensor.name();
                sensor.set_enabled(toggles.is_enabled(name));
                SensorSlot {
                    name,
                    sensor: Mutex::new(sensor),
                }
            })
            .collect();

        Self { slots }
    }

    /// Convenience constructor: one CSV file per sensor under `dir`.
    pub fn with_csv_dir(toggles: &SensorToggles, dir: &Path) -> Self {
        let dir = dir.to_path_buf();
        let make_sink = move |file_name: &'static str, header: &'static str| {
            Arc::new(CsvSink::new(dir.join(file_name), header)) as Arc<dyn RecordSink>
        };
        Self::new(toggles, &make_sink)
    }

    pub fn slots(&self) -> &[SensorSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run a closure against one sensor by name.
    pub fn with_sensor<R>(&self, name: &str, f: impl FnOnce(&mut AnySensor) -> R) -> Option<R> {
        let slot = self.slots.iter().find(|slot| slot.name == name)?;
        Some(f(&mut slot.lock()))
    }
}

static INSTANCE: OnceLock<Arc<SensorRegistry>> = OnceLock::new();

/// Install the process-wide registry. First caller wins; later calls keep the
/// existing instance and drop the argument.
pub fn initialize(registry: SensorRegistry) -> Arc<SensorRegistry> {
    let registry = Arc::new(registry);
    match INSTANCE.set(Arc::clone(&registry)) {
        Ok(()) => registry,
        Err(_) => {
            log_warn!("Sensor registry already initialized, keeping the existing instance");
            Arc::clone(INSTANCE.get().expect("set only fails when already initialized"))
        }
    }
}

/// The process-wide registry, if one was installed.
pub fn instance() -> Option<Arc<SensorRegistry>> {
    INSTANCE.get().cloned()
}
