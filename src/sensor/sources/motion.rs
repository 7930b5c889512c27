//! Rotation-vector samples, delivered by the host's sensor callback stream.

use std::sync::{atomic::Ordering, Arc};

use anyhow::{Context, Result};

use crate::host::{Capability, EventHandler, EventTopic, Host, HostEvent, SubscriptionId};
use crate::sensor::{Sensor, SensorCore, SinkFactory};
use crate::store::RecordSink;

const ENABLE_LOGS: bool = true;

use crate::log_error;

const FILE_NAME: &str = "motion.csv";
const FILE_HEADER: &str = "TimeUnix,X,Y,Z,Reliable";

pub struct MotionSensor {
    core: SensorCore,
    subscription: Option<SubscriptionId>,
}

impl MotionSensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "Motion",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
            subscription: None,
        }
    }
}

impl Sensor for MotionSensor {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn is_available(&self, host: &dyn Host) -> bool {
        host.is_capability_available(Capability::RotationVector)
    }

    fn start(&mut self, host: &dyn Host) -> Result<()> {
        if !self.is_available(host) {
            return Ok(());
        }

        let sink = self.core.sink_handle();
        let running = self.core.running_flag();
        let handler: EventHandler = Arc::new(move |event: HostEvent| {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            let axis = |key: &str| event.fields.get(key).cloned().unwrap_or_default();
            let reliable = event
                .fields
                .get("reliable")
                .cloned()
                .unwrap_or_else(|| "false".to_string());
            let value = format!("{},{},{},{}", axis("x"), axis("y"), axis("z"), reliable);
            if let Err(err) = sink.append(event.timestamp_ms, &value) {
                log_error!("Motion: sink append failed: {err:?}");
            }
        });

        let id = host
            .subscribe(EventTopic::RotationVector, handler)
            .context("rotation vector subscription refused")?;
        self.subscription = Some(id);
        self.core.set_running(true);
        Ok(())
    }

    fn stop(&mut self, host: &dyn Host) -> Result<()> {
        if !self.core.is_running() {
            return Ok(());
        }
        self.core.set_running(false);
        if let Some(id) = self.subscription.take() {
            host.unsubscribe(id)
                .context("rotation vector unsubscribe failed")?;
        }
        self.core.release_sink();
        Ok(())
    }
}
