//! Arrival monitoring
//!
//! Runs one polling coordinator per stop and prints every sensor state as a
//! JSON line after each completed cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use application::ports::BusArrivalPort;
use application::{
    ArrivalSensor, CoordinatorState, ListenerHandle, PollingCoordinator, create_sensors,
};
use domain::{BusStopEntry, LineId, StopId};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Settings shared by every watched stop
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Interval override applied to every stop
    pub interval: Option<u64>,
    /// Fallback when neither the override nor the entry sets one
    pub default_interval_secs: u64,
    /// Print one round and exit
    pub once: bool,
}

impl WatchOptions {
    fn interval_for(&self, entry: &BusStopEntry) -> Duration {
        match self.interval.filter(|s| *s > 0) {
            Some(secs) => Duration::from_secs(secs),
            None => entry.scan_interval(self.default_interval_secs),
        }
    }
}

/// Build an unsaved entry from `--stop` and `--line` arguments
pub fn adhoc_entry(stop: &str, lines: &[String]) -> Result<BusStopEntry> {
    let stop_id = StopId::new(stop)?;
    let lines = lines
        .iter()
        .map(|l| LineId::new(l.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BusStopEntry {
        stop_id,
        lines,
        name: None,
        scan_interval_secs: None,
    })
}

/// One watched stop
struct Watched {
    coordinator: Arc<PollingCoordinator>,
    sensors: Arc<Vec<ArrivalSensor>>,
}

fn print_states(sensors: &[ArrivalSensor]) {
    for sensor in sensors {
        match serde_json::to_string(&sensor.state()) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(unique_id = %sensor.unique_id(), error = %e, "Failed to render sensor state"),
        }
    }
}

/// Poll every entry until Ctrl-C (or once)
pub async fn run(
    port: Arc<dyn BusArrivalPort>,
    entries: &[BusStopEntry],
    options: &WatchOptions,
) -> Result<()> {
    let mut watched = Vec::with_capacity(entries.len());
    for entry in entries {
        let query = entry
            .to_query()
            .with_context(|| format!("stop {}", entry.stop_id))?;
        let coordinator = Arc::new(PollingCoordinator::new(
            Arc::clone(&port),
            query,
            options.interval_for(entry),
        ));

        if let Err(e) = coordinator.first_refresh().await {
            if options.once {
                return Err(e).with_context(|| format!("fetching arrivals for {}", entry.stop_id));
            }
            warn!(stop_id = %entry.stop_id, error = %e, "First refresh failed, polling anyway");
        }

        let sensors = Arc::new(create_sensors(&coordinator, entry));
        watched.push(Watched {
            coordinator,
            sensors,
        });
    }

    for stop in &watched {
        print_states(&stop.sensors);
    }
    if options.once {
        return Ok(());
    }

    let mut subscriptions: Vec<ListenerHandle> = Vec::with_capacity(watched.len());
    let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(watched.len());
    for stop in &watched {
        let sensors = Arc::clone(&stop.sensors);
        subscriptions.push(stop.coordinator.subscribe(move |_state: &Arc<CoordinatorState>| {
            print_states(&sensors);
        }));
        tasks.push(stop.coordinator.spawn());
    }

    info!(stops = watched.len(), "Watching arrivals, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    info!("Shutting down");
    for task in &tasks {
        task.abort();
    }
    // Dropping the handles deregisters the listeners and releases the sensors.
    drop(subscriptions);
    Ok(())
}
