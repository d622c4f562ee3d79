//! Headline figures over the whole delivery list

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use livraisons_types::DeliveryRecord;

use super::filter::total_weight;

pub const ACTIVE_TRUCK_DAYS: i64 = 30;
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_deliveries: usize,
    pub total_weight_kg: f64,
    /// Distinct plates loaded in the last 30 days
    pub active_trucks: usize,
    /// Deliveries entered in the last 7 days
    pub recent_activity: usize,
}

impl DashboardMetrics {
    pub fn compute(deliveries: &[DeliveryRecord], now: DateTime<Utc>) -> Self {
        let active_since = (now - Duration::days(ACTIVE_TRUCK_DAYS)).date_naive();
        let recent_since = now - Duration::days(RECENT_ACTIVITY_DAYS);

        let active_trucks = deliveries
            .iter()
            .filter(|d| d.loading_date >= active_since)
            .map(|d| d.truck_immatriculation.as_str())
            .collect::<HashSet<_>>()
            .len();

        // Records without a creation time count by their loading date
        let recent_activity = deliveries
            .iter()
            .filter(|d| match d.created_at {
                Some(created) => created >= recent_since,
                None => d.loading_date >= recent_since.date_naive(),
            })
            .count();

        Self {
            total_deliveries: deliveries.len(),
            total_weight_kg: total_weight(deliveries),
            active_trucks,
            recent_activity,
        }
    }
}
