//! Periodic sampling of sources that want polling on top of (or instead of)
//! event delivery.
//!
//! One controller owns one background loop; each tick re-samples every
//! running sensor whose `periodic_sampling` flag is set.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::host::Host;
use crate::sensor::{registry::SensorRegistry, Sensor};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub struct SamplingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(
        &mut self,
        registry: Arc<SensorRegistry>,
        host: Arc<dyn Host>,
        interval: Duration,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampling already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(sampling_loop(registry, host, interval, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SamplingController {
    fn default() -> Self {
        Self::new()
    }
}

async fn sampling_loop(
    registry: Arc<SensorRegistry>,
    host: Arc<dyn Host>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for slot in registry.slots() {
                    let mut sensor = slot.lock();
                    if !sensor.is_running() || !sensor.periodic_sampling() {
                        continue;
                    }
                    let host = host.as_ref();
                    if catch_unwind(AssertUnwindSafe(|| sensor.sample(host))).is_err() {
                        log_error!("{}: sampling tick panicked", slot.name());
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("Sampling loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorToggles;
    use crate::sensor::dispatcher::Dispatcher;
    use crate::test_support::{MemorySink, TestHost};

    #[tokio::test]
    async fn ticks_resample_running_periodic_sensors() {
        let charging_sink = Arc::new(MemorySink::default());
        let sink_for_factory = Arc::clone(&charging_sink);
        let registry = Arc::new(SensorRegistry::new(
            &SensorToggles::default(),
            &move |file_name, _| {
                if file_name == "charging.csv" {
                    Arc::clone(&sink_for_factory) as _
                } else {
                    Arc::new(MemorySink::default()) as _
                }
            },
        ));
        let host: Arc<dyn Host> = Arc::new(TestHost::new().with_probe_answer(
            crate::host::Probe::ChargingState,
            "true",
        ));

        Dispatcher::new(Arc::clone(&host)).activate(&registry);
        let after_start = charging_sink.lines().len();
        assert_eq!(after_start, 1); // immediate read at start

        let mut controller = SamplingController::new();
        controller
            .start(Arc::clone(&registry), host, Duration::from_millis(10))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.stop().await.unwrap();

        assert!(
            charging_sink.lines().len() > after_start,
            "periodic sampling should re-probe the charging state"
        );
    }

    #[tokio::test]
    async fn stopped_sensors_are_not_sampled() {
        let charging_sink = Arc::new(MemorySink::default());
        let sink_for_factory = Arc::clone(&charging_sink);
        let registry = Arc::new(SensorRegistry::new(
            &SensorToggles::default(),
            &move |file_name, _| {
                if file_name == "charging.csv" {
                    Arc::clone(&sink_for_factory) as _
                } else {
                    Arc::new(MemorySink::default()) as _
                }
            },
        ));
        let host: Arc<dyn Host> = Arc::new(TestHost::new());

        // Never activated: no sensor runs, so ticks must write nothing.
        let mut controller = SamplingController::new();
        controller
            .start(Arc::clone(&registry), host, Duration::from_millis(10))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.stop().await.unwrap();

        assert!(charging_sink.lines().is_empty());
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let registry = Arc::new(SensorRegistry::new(&SensorToggles::default(), &|_, _| {
            Arc::new(MemorySink::default())
        }));
        let host: Arc<dyn Host> = Arc::new(TestHost::new());

        let mut controller = SamplingController::new();
        controller
            .start(Arc::clone(&registry), Arc::clone(&host), Duration::from_secs(60))
            .unwrap();
        assert!(controller
            .start(registry, host, Duration::from_secs(60))
            .is_err());
        controller.stop().await.unwrap();
    }
}
