//! Printable plain-text invoice

use std::fmt;

use chrono::NaiveDate;

use livraisons_types::{DeliveryRecord, FilterCriteria};

use super::billing::{BillingQuote, InvoiceNumber};

const RULE_WIDTH: usize = 72;

/// Group thousands with spaces, rounding to whole units: `62500.4` -> `62 500`
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Everything printed on an invoice
pub struct InvoiceDocument<'a> {
    pub number: &'a InvoiceNumber,
    pub issued_on: NaiveDate,
    pub quote: &'a BillingQuote,
    pub deliveries: &'a [DeliveryRecord],
    /// Filters that produced the selection, used for client and period
    pub criteria: &'a FilterCriteria,
    pub currency: &'a str,
}

impl fmt::Display for InvoiceDocument<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self;
        let rule = "=".repeat(RULE_WIDTH);
        let thin = "-".repeat(RULE_WIDTH);

        let client = if doc.criteria.owners.is_empty() {
            "Sélection Multiple".to_string()
        } else {
            doc.criteria.owners.join(", ")
        };
        let from = doc
            .criteria
            .date_from
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "Début".to_string());
        let to = doc
            .criteria
            .date_to
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "Fin".to_string());

        writeln!(out, "{}", rule)?;
        writeln!(out, "FACTURE  {}", doc.number)?;
        writeln!(out, "Date: {}", doc.issued_on.format("%d/%m/%Y"))?;
        writeln!(out, "Client: {}", client)?;
        writeln!(out, "Période: {} -> {}", from, to)?;
        writeln!(out, "Voyages: {}", doc.deliveries.len())?;
        writeln!(out, "{}", rule)?;
        writeln!(
            out,
            "{:<12} {:<20} {:<18} {:<10} {:>8}",
            "Date", "Immatriculation", "Chauffeur", "Bon #", "Poids"
        )?;
        writeln!(out, "{}", thin)?;
        for d in doc.deliveries {
            writeln!(
                out,
                "{:<12} {:<20} {:<18} {:<10} {:>8}",
                d.loading_date.format("%d/%m/%Y"),
                truncate(&d.truck_immatriculation, 20),
                truncate(&d.driver_names, 18),
                truncate(&d.delivery_bond_number, 10),
                format_amount(d.weight_loaded),
            )?;
        }
        writeln!(out, "{}", thin)?;
        writeln!(
            out,
            "{:>60} {} kg",
            "Sous-total Poids:",
            format_amount(doc.quote.total_weight_kg)
        )?;
        writeln!(out)?;
        writeln!(out, "{:>40} {:.3}", "Poids Total (Tonnes):", doc.quote.tons)?;
        writeln!(
            out,
            "{:>40} {} {}",
            "Prix par Tonne:",
            format_amount(doc.quote.price_per_ton),
            doc.currency
        )?;
        writeln!(
            out,
            "{:>40} {} {}",
            "TOTAL:",
            format_amount(doc.quote.amount),
            doc.currency
        )?;
        writeln!(out, "{}", rule)?;
        writeln!(out, "Merci de votre confiance")?;
        Ok(())
    }
}

/// Printable invoice text
pub fn render_invoice(doc: &InvoiceDocument<'_>) -> String {
    doc.to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::delivery;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(755.0), "755");
        assert_eq!(format_amount(62500.4), "62 500");
        assert_eq!(format_amount(1234567.0), "1 234 567");
        assert_eq!(format_amount(-4200.0), "-4 200");
    }

    #[test]
    fn test_render_invoice() {
        let deliveries = vec![
            delivery(1, "AB-100-CD", "Transco", 10000.0),
            delivery(2, "AB-200-CD", "Transco", 2500.0),
        ];
        let quote = BillingQuote::compute(&deliveries, 5000.0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let number = InvoiceNumber::with_suffix(date, 12);
        let criteria = FilterCriteria {
            owners: vec!["Transco".to_string()],
            ..Default::default()
        };
        let text = render_invoice(&InvoiceDocument {
            number: &number,
            issued_on: date,
            quote: &quote,
            deliveries: &deliveries,
            criteria: &criteria,
            currency: "CFA",
        });

        assert!(text.contains("FACTURE  INV-20240701-0012"));
        assert!(text.contains("Client: Transco"));
        assert!(text.contains("Période: Début -> Fin"));
        assert!(text.contains("Voyages: 2"));
        assert!(text.contains("AB-200-CD"));
        assert!(text.contains("12 500 kg"));
        assert!(text.contains("12.500"));
        assert!(text.contains("5 000 CFA"));
        assert!(text.contains("62 500 CFA"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Amadou", 10), "Amadou");
        assert_eq!(truncate("Mamadou Lamine Diop", 8), "Mamadou…");
    }
}
