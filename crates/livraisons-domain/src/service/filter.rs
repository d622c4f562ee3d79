//! Delivery filtering

use std::collections::BTreeSet;

use livraisons_types::{DeliveryRecord, FilterCriteria};

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Whether a delivery passes every active criterion
pub fn matches(delivery: &DeliveryRecord, criteria: &FilterCriteria) -> bool {
    if !criteria.search.is_empty() {
        let search = criteria.search.to_lowercase();
        let hit = contains_ci(&delivery.truck_immatriculation, &search)
            || contains_ci(&delivery.driver_names, &search)
            || contains_ci(&delivery.delivery_bond_number, &search)
            || contains_ci(&delivery.truck_owner, &search);
        if !hit {
            return false;
        }
    }

    if let Some(from) = criteria.date_from {
        if delivery.loading_date < from {
            return false;
        }
    }
    if let Some(to) = criteria.date_to {
        if delivery.loading_date > to {
            return false;
        }
    }

    if !criteria.plate_number.is_empty()
        && !contains_ci(
            &delivery.truck_immatriculation,
            &criteria.plate_number.to_lowercase(),
        )
    {
        return false;
    }

    if !criteria.owners.is_empty() && !criteria.owners.contains(&delivery.truck_owner) {
        return false;
    }

    if let Some(min) = criteria.weight_min {
        if delivery.weight_loaded < min {
            return false;
        }
    }
    if let Some(max) = criteria.weight_max {
        if delivery.weight_loaded > max {
            return false;
        }
    }

    true
}

/// Deliveries matching all criteria, in input order
pub fn filter_deliveries(deliveries: &[DeliveryRecord], criteria: &FilterCriteria) -> Vec<DeliveryRecord> {
    deliveries
        .iter()
        .filter(|d| matches(d, criteria))
        .cloned()
        .collect()
}

/// Sum of loaded weight in kilograms
pub fn total_weight(deliveries: &[DeliveryRecord]) -> f64 {
    deliveries.iter().map(|d| d.weight_loaded).sum()
}

/// Distinct owner names, sorted, for the owner picker
pub fn unique_owners(deliveries: &[DeliveryRecord]) -> Vec<String> {
    deliveries
        .iter()
        .map(|d| d.truck_owner.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
