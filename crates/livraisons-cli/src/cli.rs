//! CLI argument definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use livraisons_types::{
    BillingSortField, DeliveryFormData, FilterCriteria, OutputFormat, SortDirection, SortField,
    TruckType,
};

#[derive(Parser)]
#[command(name = "livraisons")]
#[command(version, about = "Fleet delivery records: expenses, tonnage billing and CSV export")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (overrides config)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logs on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Filter panel options shared by list, bill and export
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Free text matched against plate, drivers, owner and bond number
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// First loading date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last loading date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Plate number fragment
    #[arg(long, default_value = "")]
    pub plate: String,

    /// Truck owner (repeat for several)
    #[arg(long = "owner", short = 'o')]
    pub owners: Vec<String>,

    /// Minimum weight in kg
    #[arg(long)]
    pub min_weight: Option<f64>,

    /// Maximum weight in kg
    #[arg(long)]
    pub max_weight: Option<f64>,
}

impl FilterArgs {
    pub fn to_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search: self.search.clone(),
            date_from: self.from,
            date_to: self.to,
            plate_number: self.plate.clone(),
            owners: self.owners.clone(),
            weight_min: self.min_weight,
            weight_max: self.max_weight,
        }
    }
}

/// Fields of the delivery entry form
#[derive(Args, Debug, Clone)]
pub struct DeliveryArgs {
    /// Truck plate number
    #[arg(long)]
    pub plate: String,

    /// Driver name(s)
    #[arg(long)]
    pub drivers: String,

    /// Loading date (YYYY-MM-DD)
    #[arg(long)]
    pub loading: NaiveDate,

    /// Unloading date (YYYY-MM-DD)
    #[arg(long)]
    pub unloading: NaiveDate,

    /// Weight loaded in kg
    #[arg(long, short = 'w')]
    pub weight: f64,

    /// Delivery bond number
    #[arg(long)]
    pub bond: String,

    /// Truck owner
    #[arg(long)]
    pub owner: String,

    /// Truck type
    #[arg(long, value_enum, default_value_t = TruckType::SemiTruck)]
    pub truck_type: TruckType,
}

impl DeliveryArgs {
    pub fn to_form_data(&self) -> DeliveryFormData {
        DeliveryFormData {
            truck_immatriculation: self.plate.clone(),
            driver_names: self.drivers.clone(),
            loading_date: Some(self.loading),
            unloading_date: Some(self.unloading),
            weight_loaded: self.weight,
            delivery_bond_number: self.bond.clone(),
            truck_owner: self.owner.clone(),
            truck_type: self.truck_type,
        }
    }
}

/// Field changes for an existing delivery; omitted fields keep their value
#[derive(Args, Debug, Default, Clone)]
pub struct DeliveryChanges {
    #[arg(long)]
    pub plate: Option<String>,

    #[arg(long)]
    pub drivers: Option<String>,

    #[arg(long)]
    pub loading: Option<NaiveDate>,

    #[arg(long)]
    pub unloading: Option<NaiveDate>,

    #[arg(long, short = 'w')]
    pub weight: Option<f64>,

    #[arg(long)]
    pub bond: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long, value_enum)]
    pub truck_type: Option<TruckType>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List deliveries grouped by owner
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Sort column
        #[arg(long, value_enum)]
        sort: Option<SortField>,

        /// Sort direction
        #[arg(long, value_enum)]
        order: Option<SortDirection>,
    },

    /// Show one delivery with its expense breakdown
    Show {
        /// Delivery id
        id: i64,
    },

    /// Record a new delivery
    Add {
        #[command(flatten)]
        delivery: DeliveryArgs,
    },

    /// Edit an existing delivery
    Edit {
        /// Delivery id
        id: i64,

        #[command(flatten)]
        changes: DeliveryChanges,
    },

    /// Delete a delivery for good
    Delete {
        /// Delivery id
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Record or update the expenses of a delivery
    Expense {
        /// Delivery id
        id: i64,

        /// Road costs
        #[arg(long)]
        road: Option<f64>,

        /// Diesel liters
        #[arg(long)]
        diesel_liters: Option<f64>,

        /// Diesel unit price (0 means the default price)
        #[arg(long)]
        diesel_price: Option<f64>,

        /// Toll costs
        #[arg(long)]
        toll: Option<f64>,

        /// Other costs
        #[arg(long)]
        extra: Option<f64>,

        /// What the other costs were for
        #[arg(long)]
        extra_description: Option<String>,
    },

    /// Bill the filtered deliveries at a price per ton
    Bill {
        #[command(flatten)]
        filters: FilterArgs,

        /// Price per ton (defaults to the configured price)
        #[arg(long, short = 'r')]
        rate: Option<String>,

        /// Write the invoice text to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the invoice without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show billing history
    Billings {
        /// Sort column
        #[arg(long, value_enum)]
        sort: Option<BillingSortField>,

        /// Sort direction
        #[arg(long, value_enum)]
        order: Option<SortDirection>,
    },

    /// Export the filtered deliveries to CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show fleet summary figures
    Dashboard,

    /// List known truck owners
    Owners,

    /// Import a JSON dump from the hosted backend
    Import {
        /// Path to dump file
        file: PathBuf,

        /// Clear the store before importing
        #[arg(long)]
        refresh: bool,

        /// Dry run - show what would be imported without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage configuration
    Config {
        /// Show current config
        #[arg(long)]
        show: bool,

        /// Set store directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set currency label
        #[arg(long)]
        set_currency: Option<String>,

        /// Set default price per ton
        #[arg(long)]
        set_price: Option<f64>,

        /// Set log filter (e.g. "info", "livraisons_app=debug")
        #[arg(long)]
        set_log_level: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "livraisons", "list", "--owner", "A", "--owner", "B", "--from", "2024-01-01",
            "--sort", "weight", "--order", "asc", "-f", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::List { filters, sort, order } => {
                let criteria = filters.to_criteria();
                assert_eq!(criteria.owners, vec!["A", "B"]);
                assert_eq!(criteria.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(sort, Some(SortField::Weight));
                assert_eq!(order, Some(SortDirection::Asc));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "livraisons", "add", "--plate", "DK-1", "--drivers", "Awa Fall",
            "--loading", "2024-03-01", "--unloading", "2024-03-02", "-w", "1500",
            "--bond", "BL-1", "--owner", "Diop", "--truck-type", "box-truck",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { delivery } => {
                let data = delivery.to_form_data();
                assert_eq!(data.truck_type, TruckType::BoxTruck);
                assert_eq!(data.weight_loaded, 1500.0);
                assert_eq!(data.unloading_date, NaiveDate::from_ymd_opt(2024, 3, 2));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["livraisons", "list", "--from", "01/02/2024"]).is_err());
    }
}
