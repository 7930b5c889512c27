//! Per-event UI interaction summaries.
//!
//! One line per UI event: classification, package and text. The deep tree
//! capture for the same events is the snapshot engine's job; this source only
//! keeps the lightweight event log.

use std::sync::{atomic::Ordering, Arc};

use anyhow::{Context, Result};

use crate::host::{Capability, EventHandler, EventTopic, Host, HostEvent, SubscriptionId};
use crate::sensor::{Sensor, SensorCore, SinkFactory};
use crate::store::RecordSink;

const ENABLE_LOGS: bool = true;

use crate::log_error;

const FILE_NAME: &str = "ui_events.csv";
const FILE_HEADER: &str = "TimeUnix,Type,Package,Text";

pub struct UiEventsSensor {
    core: SensorCore,
    subscription: Option<SubscriptionId>,
}

impl UiEventsSensor {
    pub fn new(make_sink: SinkFactory<'_>) -> Self {
        Self {
            core: SensorCore::new(
                "UI Events",
                FILE_NAME,
                FILE_HEADER,
                make_sink(FILE_NAME, FILE_HEADER),
            ),
            subscription: None,
        }
    }
}

impl Sensor for UiEventsSensor {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn is_available(&self, host: &dyn Host) -> bool {
        host.is_capability_available(Capability::UiEventStream)
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
            let get = |key: &str| event.fields.get(key).cloned().unwrap_or_default();
            let value = format!("{},{},{}", event.classification, get("package"), get("text"));
            if let Err(err) = sink.append(event.timestamp_ms, &value) {
                log_error!("UI Events: sink append failed: {err:?}");
            }
        });

        let id = host
            .subscribe(EventTopic::UiEvent, handler)
            .context("UI event subscription refused")?;
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
            host.unsubscribe(id).context("UI event unsubscribe failed")?;
        }
        self.core.release_sink();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Sensor;
    use crate::test_support::{MemorySink, TestHost};
    use std::collections::BTreeMap;

    fn fire_click(host: &TestHost, timestamp_ms: i64) {
        let mut fields = BTreeMap::new();
        fields.insert("package".to_string(), "com.example.app".to_string());
        fields.insert("text".to_string(), "Send".to_string());
        host.fire(
            EventTopic::UiEvent,
            HostEvent {
                timestamp_ms,
                classification: "TYPE_VIEW_CLICKED".to_string(),
                fields,
            },
        );
    }

    #[test]
    fn events_are_summarized_one_line_each() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = UiEventsSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new().with_capabilities([Capability::UiEventStream]);

        sensor.start(&host).unwrap();
        fire_click(&host, 5);

        assert_eq!(
            sink.lines(),
            vec![(5, "TYPE_VIEW_CLICKED,com.example.app,Send".to_string())]
        );
    }

    #[test]
    fn events_after_stop_are_ignored() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = UiEventsSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new().with_capabilities([Capability::UiEventStream]);

        sensor.start(&host).unwrap();
        fire_click(&host, 1);
        sensor.stop(&host).unwrap();
        fire_click(&host, 2);

        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn start_on_a_host_without_the_stream_is_a_no_op() {
        let sink = Arc::new(MemorySink::default());
        let sink_clone = Arc::clone(&sink);
        let mut sensor = UiEventsSensor::new(&move |_, _| Arc::clone(&sink_clone) as _);
        let host = TestHost::new();

        sensor.start(&host).unwrap();
        assert!(!sensor.is_running());
        assert_eq!(host.active_subscription_count(), 0);
    }
}
