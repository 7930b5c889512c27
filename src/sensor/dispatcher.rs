//! Starts and stops the whole sensor set on service activation/deactivation.
//!
//! Failures are contained per sensor: an error (or panic) in one `start` or
//! `stop` is logged and the loop moves on, so every sensor gets its chance in
//! every cycle.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use uuid::Uuid;

use crate::host::Host;
use crate::sensor::{registry::SensorRegistry, Sensor};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct ActivationSummary {
    pub cycle_id: Uuid,
    pub started: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct DeactivationSummary {
    pub cycle_id: Uuid,
    pub stopped: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    host: Arc<dyn Host>,
}

impl Dispatcher {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Start every enabled-and-available sensor, in registry order.
    pub fn activate(&self, registry: &SensorRegistry) -> ActivationSummary {
        let cycle_id = Uuid::new_v4();
        log_info!(
            "Activation cycle {cycle_id}: {} sensors registered",
            registry.len()
        );

        let mut summary = ActivationSummary {
            cycle_id,
            started: 0,
            skipped: 0,
            failed: 0,
        };

        for slot in registry.slots() {
            let mut sensor = slot.lock();

            // Starting a running sensor would double-subscribe.
            if sensor.is_running() {
                summary.skipped += 1;
                continue;
            }

            if !sensor.is_enabled() || !sensor.is_available(self.host.as_ref()) {
                log_warn!("{} turned off", slot.name());
                summary.skipped += 1;
                continue;
            }

            let host = self.host.as_ref();
            let outcome = catch_unwind(AssertUnwindSafe(|| sensor.start(host)));
            match outcome {
                Ok(Ok(())) if sensor.is_running() => {
                    log_info!("{} turned on", slot.name());
                    summary.started += 1;
                }
                Ok(Ok(())) => {
                    // start no-oped (e.g. a permission gate); not an error.
                    log_warn!("{} did not come up", slot.name());
                    summary.skipped += 1;
                }
                Ok(Err(err)) => {
                    log_error!("{} failed to start: {err:?}", slot.name());
                    summary.failed += 1;
                }
                Err(_) => {
                    log_error!("{} panicked during start", slot.name());
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Stop every running sensor. Queued snapshot work is not drained here;
    /// records already in flight may still land after this returns.
    pub fn deactivate(&self, registry: &SensorRegistry) -> DeactivationSummary {
        let cycle_id = Uuid::new_v4();
        let mut summary = DeactivationSummary {
            cycle_id,
            stopped: 0,
            failed: 0,
        };

        for slot in registry.slots() {
            let mut sensor = slot.lock();
            if !sensor.is_running() {
                continue;
            }

            let host = self.host.as_ref();
            let outcome = catch_unwind(AssertUnwindSafe(|| sensor.stop(host)));
            match outcome {
                Ok(Ok(())) => {
                    log_info!("{} stopped", slot.name());
                    summary.stopped += 1;
                }
                Ok(Err(err)) => {
                    log_error!("{} failed to stop: {err:?}", slot.name());
                    summary.failed += 1;
                }
                Err(_) => {
                    log_error!("{} panicked during stop", slot.name());
                    summary.failed += 1;
                }
            }
        }

        log_info!(
            "Deactivation cycle {cycle_id}: {} stopped, {} failed",
            summary.stopped,
            summary.failed
        );
        summary
    }
}
