//! Screen orientation changes.

use std::sync::{atomic::Ordering, Arc};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::host::{EventHandler, EventTopic, Host, HostEvent, Probe, SubscriptionId};
use crate::sensor::{Sensor, SensorCore, SinkFactory};
use crate::store::RecordSink;

const ENABLE_LOGS: bool = true;

use crate::log_error;

const FILE_NAME: &str = "screen_orientation.csv";
const FILE_HEADER: &str = "TimeUnix,Value";

pub struct ScreenOrientationSensor {
    core: SensorCore,
    subscription: Option<SubscriptionId>,
}

impl ScreenOrientationSensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "Screen Orientation",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
            subscription: None,
        }
    }
}

impl Sensor for ScreenOrientationSensor {
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
        // Baseline reading; afterwards only changes arrive.
        if let Some(orientation) = host.probe(Probe::ScreenOrientation) {
            self.core.emit(Utc::now().timestamp_millis(), &orientation);
        }

        let sink = self.core.sink_handle();
        let running = self.core.running_flag();
        let handler: EventHandler = Arc::new(move |event: HostEvent| {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            let Some(orientation) = event.fields.get("orientation") else {
                return;
            };
            if let Err(err) = sink.append(event.timestamp_ms, orientation) {
                log_error!("Screen Orientation: sink append failed: {err:?}");
            }
        });

        let id = host
            .subscribe(EventTopic::ScreenOrientationChanged, handler)
            .context("screen orientation subscription refused")?;
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
                .context("screen orientation unsubscribe failed")?;
        }
        self.core.release_sink();
        Ok(())
    }
}
