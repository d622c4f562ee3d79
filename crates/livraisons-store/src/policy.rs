//! Row-level access policy
//!
//! Invoiced deliveries are frozen for deletion; the rejection message
//! carries the same policy wording the hosted backend uses.

use livraisons_types::{DeliveryRecord, Error, Result};

/// Reject deleting a delivery that has been stamped with a billing
pub fn check_delete_allowed(row: &DeliveryRecord) -> Result<()> {
    match row.billing_id {
        Some(billing_id) => Err(Error::remote(format!(
            "delete on \"deliveries\" violates row-level security policy: delivery #{} is invoiced under billing #{}",
            row.id, billing_id
        ))),
        None => Ok(()),
    }
}
