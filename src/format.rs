//! Human readable strings for run reports.

/// Placeholder shown when a value cannot be displayed.
pub const NO_VALUE: &str = "—";

/// `"850 m"` below a kilometer, `"5.25 km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round())
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// `"mm:ss"`, or `"h:mm:ss"` once the run passes an hour.
pub fn format_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Pace per kilometer (`"5:30"`) from a speed in m/s.
pub fn format_pace(meters_per_second: f64) -> String {
    if !meters_per_second.is_finite() || meters_per_second <= 0.0 {
        return NO_VALUE.to_string();
    }
    let min_per_km = 1000.0 / meters_per_second / 60.0;
    let mut mins = min_per_km.floor() as u64;
    let mut secs = ((min_per_km - mins as f64) * 60.0).round() as u64;
    if secs == 60 {
        mins += 1;
        secs = 0;
    }
    format!("{}:{:02}", mins, secs)
}

/// Whole meters of climb; negative or non-finite values show the placeholder.
pub fn format_elevation(meters: f64) -> String {
    if !meters.is_finite() || meters < 0.0 {
        return NO_VALUE.to_string();
    }
    format!("{} m", meters.round())
}

/// Area in m² below a hectare, km² above.
pub fn format_area(square_meters: f64) -> String {
    if square_meters < 10_000.0 {
        format!("{} m²", square_meters.round())
    } else {
        format!("{:.3} km²", square_meters / 1e6)
    }
}
