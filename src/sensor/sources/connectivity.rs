//! Nearby-device discovery broadcasts.

use std::sync::{atomic::Ordering, Arc};

use anyhow::{Context, Result};

use crate::host::{Capability, EventHandler, EventTopic, Host, HostEvent, SubscriptionId};
use crate::sensor::{Sensor, SensorCore, SinkFactory};
use crate::store::RecordSink;

const ENABLE_LOGS: bool = true;

use crate::log_error;

const FILE_NAME: &str = "connectivity.csv";
const FILE_HEADER: &str = "TimeUnix,DeviceAddress";

pub struct ConnectivitySensor {
    core: SensorCore,
    subscription: Option<SubscriptionId>,
}

impl ConnectivitySensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "Connectivity",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
            subscription: None,
        }
    }
}

impl Sensor for ConnectivitySensor {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn is_available(&self, host: &dyn Host) -> bool {
        host.is_capability_available(Capability::DeviceDiscovery)
    }

    fn start(&mut self, host: &dyn Host) -> Result<()> {
        if !self.is_available(host) {
            return Ok(());
        }

        // Discovery needs the scan permission on top of the radio itself;
        // without it the sensor stays stopped and the cycle moves on.
        if !host.is_capability_available(Capability::ScanPermission) {
            log_error!("Connectivity: scan permission not granted");
            return Ok(());
        }

        let sink = self.core.sink_handle();
        let running = self.core.running_flag();
        let handler: EventHandler = Arc::new(move |event: HostEvent| {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            let Some(address) = event.fields.get("address") else {
                return;
            };
            if let Err(err) = sink.append(event.timestamp_ms, address) {
                log_error!("Connectivity: sink append failed: {err:?}");
            }
        });

        let id = host
            .subscribe(EventTopic::DeviceFound, handler)
            .context("device discovery subscription refused")?;
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
                .context("device discovery unsubscribe failed")?;
        }
        self.core.release_sink();
        Ok(())
    }
}
