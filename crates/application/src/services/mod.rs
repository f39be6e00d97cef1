//! Application services - Use case implementations

mod arrival_sensor;
mod polling_coordinator;
mod setup_flow;

pub use arrival_sensor::{
    ArrivalAttributes, ArrivalSensor, DEVICE_CLASS, SensorState, create_sensors,
    format_collect_datetime, format_time_left,
};
pub use polling_coordinator::{
    CoordinatorListener, CoordinatorState, ListenerHandle, POLL_CYCLES_METRIC, PollingCoordinator,
    RefreshOutcome, SNAPSHOT_RECORDS_METRIC,
};
pub use setup_flow::{FormError, SetupFlow, set_scan_interval};
