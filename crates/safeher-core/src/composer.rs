//! Alert message composition

use crate::model::PositionFix;

/// Map link for a coordinate pair.
pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("http://maps.google.com/maps?q={},{}", latitude, longitude)
}

/// Message body for a fix. Pure: same fix, same text.
pub fn compose(fix: &PositionFix) -> String {
    format!(
        "🚨 EMERGENCY ALERT 🚨\n\nI need help! My location:\n{}\n\nPlease check on me immediately.",
        map_link(fix.latitude, fix.longitude)
    )
}
