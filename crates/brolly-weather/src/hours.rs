//! Clock labels for the forecast table.

use chrono::Timelike;

/// Number of hours shown on the forecast page
pub const FORECAST_HOURS: usize = 7;

/// `count` labels of the form `HH:00` starting at `start_hour`, wrapping
/// past midnight.
pub fn hour_labels(start_hour: u32, count: usize) -> Vec<String> {
    let start = (start_hour % 24) as usize;
    (0..count)
        .map(|offset| format!("{:02}:00", (start + offset) % 24))
        .collect()
}

/// Labels for the [`FORECAST_HOURS`] hours beginning with the hour of `now`.
pub fn upcoming_hour_labels<T: Timelike>(now: &T) -> Vec<String> {
    hour_labels(now.hour(), FORECAST_HOURS)
}
