//! CSV export of delivery lists

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use tracing::{info, warn};

use livraisons_domain::service::delivery_expense_total;
use livraisons_types::{DeliveryRecord, Error, Result};

/// File name used when the caller does not pick one
pub const DEFAULT_EXPORT_FILE: &str = "livraisons_export.csv";

pub const CSV_HEADERS: [&str; 11] = [
    "ID",
    "Immatriculation",
    "Chauffeur",
    "Date Chargement",
    "Date Déchargement",
    "Poids",
    "Bon #",
    "Propriétaire",
    "Type",
    "Frais Totaux",
    "Facturé",
];

fn billed_label(delivery: &DeliveryRecord) -> &'static str {
    if delivery.is_billed() {
        "Oui"
    } else {
        "Non"
    }
}

/// Wrap a text field in quotes, doubling any quote inside it
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Write deliveries as CSV, one row each.
///
/// Every text column is quoted, even when it looks like a number; only the
/// id, weight and expense total are written bare.
pub fn write_deliveries_csv<W: io::Write>(deliveries: &[DeliveryRecord], writer: W) -> Result<usize> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    csv.write_record(CSV_HEADERS.iter().map(|h| quoted(h)))?;
    for d in deliveries {
        csv.write_record([
            d.id.to_string(),
            quoted(&d.truck_immatriculation),
            quoted(&d.driver_names),
            quoted(&d.loading_date.to_string()),
            quoted(&d.unloading_date.to_string()),
            d.weight_loaded.to_string(),
            quoted(&d.delivery_bond_number),
            quoted(&d.truck_owner),
            quoted(d.truck_type.label()),
            delivery_expense_total(d).to_string(),
            quoted(billed_label(d)),
        ])?;
    }
    csv.flush()?;
    Ok(deliveries.len())
}

/// Export deliveries to a CSV file.
///
/// An empty list is refused before any file is created.
pub fn export_deliveries_csv(deliveries: &[DeliveryRecord], path: &Path) -> Result<usize> {
    if deliveries.is_empty() {
        warn!("export refused: no deliveries");
        return Err(Error::precondition("No data to export"));
    }

    let file = File::create(path)?;
    let rows = write_deliveries_csv(deliveries, file)?;
    info!(rows, path = %path.display(), "deliveries exported");
    Ok(rows)
}
