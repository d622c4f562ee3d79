//! Tonnage billing
//!
//! An invoice is `tons × price per ton` over a set of deliveries, where
//! `tons = total kg / 1000`. Invoice numbers are `INV-YYYYMMDD-NNNN` with a
//! random four-digit suffix; two invoices drawn on the same day can collide,
//! nothing here prevents it.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use livraisons_types::{
    Billing, BillingSortField, DeliveryRecord, Error, NewBilling, Result, SortDirection,
};

use super::filter::total_weight;

pub const KG_PER_TON: f64 = 1000.0;

pub fn kg_to_tons(kg: f64) -> f64 {
    kg / KG_PER_TON
}

/// Parse a user-typed rate from its leading number, ignoring trailing text.
///
/// `"12abc"` reads as 12; a rate with no leading number counts as zero.
pub fn parse_rate(text: &str) -> f64 {
    let text = text.trim_start();
    text.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok().filter(|rate| rate.is_finite()))
        .unwrap_or(0.0)
}

/// Live invoice estimate shown next to the rate input. Never fails.
pub fn estimate_amount(total_weight_kg: f64, rate_text: &str) -> f64 {
    kg_to_tons(total_weight_kg) * parse_rate(rate_text)
}

/// Invoice totals over a set of deliveries at a given rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingQuote {
    pub delivery_ids: Vec<i64>,
    pub total_weight_kg: f64,
    pub tons: f64,
    pub price_per_ton: f64,
    pub amount: f64,
}

impl BillingQuote {
    /// Compute invoice totals; the rate must be a positive number
    pub fn compute(deliveries: &[DeliveryRecord], price_per_ton: f64) -> Result<Self> {
        if !price_per_ton.is_finite() || price_per_ton <= 0.0 {
            return Err(Error::precondition(
                "Enter a valid price per ton (must be greater than 0)",
            ));
        }
        let total_weight_kg = total_weight(deliveries);
        let tons = kg_to_tons(total_weight_kg);
        Ok(Self {
            delivery_ids: deliveries.iter().map(|d| d.id).collect(),
            total_weight_kg,
            tons,
            price_per_ton,
            amount: tons * price_per_ton,
        })
    }

    pub fn delivery_count(&self) -> usize {
        self.delivery_ids.len()
    }

    /// Billing row to persist for this quote
    pub fn to_new_billing(&self, number: &InvoiceNumber) -> NewBilling {
        NewBilling {
            billing_number: number.to_string(),
            total_weight: self.tons,
            price_per_ton: self.price_per_ton,
            total_amount: self.amount,
            notes: Some(format!("Facture pour {} livraisons", self.delivery_count())),
        }
    }
}

/// Client-generated invoice label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Draw a number for the given day with a random suffix
    pub fn generate(date: NaiveDate) -> Self {
        let suffix = (Uuid::new_v4().as_u128() % 10_000) as u16;
        Self::with_suffix(date, suffix)
    }

    pub fn with_suffix(date: NaiveDate, suffix: u16) -> Self {
        Self(format!("INV-{}-{:04}", date.format("%Y%m%d"), suffix % 10_000))
    }

    /// Accept only the `INV-YYYYMMDD-NNNN` shape with a real calendar date
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("INV-")?;
        let (date, suffix) = rest.split_once('-')?;
        if date.len() != 8 || suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Issue date encoded in the number
    pub fn date(&self) -> Option<NaiveDate> {
        let date = self.0.get(4..12)?;
        NaiveDate::parse_from_str(date, "%Y%m%d").ok()
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn compare_billings(field: BillingSortField, a: &Billing, b: &Billing) -> Ordering {
    match field {
        BillingSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        BillingSortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
        BillingSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        BillingSortField::BillingNumber => a
            .billing_number
            .to_lowercase()
            .cmp(&b.billing_number.to_lowercase()),
    }
}

/// Billing history ordering; ties keep input order
pub fn sort_billings(billings: &[Billing], field: BillingSortField, direction: SortDirection) -> Vec<Billing> {
    let mut sorted = billings.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare_billings(field, a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Sum of invoiced amounts
pub fn total_billed_amount(billings: &[Billing]) -> f64 {
    billings.iter().map(|b| b.total_amount).sum()
}
