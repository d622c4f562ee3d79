//! Command handlers

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, Utc};
use tracing::debug;

use livraisons_app::repository::{open_record_store, open_record_store_at};
use livraisons_app::{Config, NoticeLevel, Workspace};
use livraisons_domain::service::DeliveryForm;
use livraisons_infra::backend_import::{load_dump, summarize_dump, ImportMode};
use livraisons_infra::csv_export::DEFAULT_EXPORT_FILE;
use livraisons_infra::FileRecordStore;
use livraisons_types::{
    BillingSortField, Error, FormField, OutputFormat, Result, SortDirection, SortField,
};

use crate::cli::{Cli, Commands, DeliveryArgs, DeliveryChanges, FilterArgs};
use crate::output::{
    output_billings, output_dashboard, output_details, output_grouped, output_import, print_json,
};

/// Execute CLI command
pub fn execute(cli: Cli, config: Config) -> Result<()> {
    let Cli {
        command,
        store_dir,
        format,
        ..
    } = cli;
    let format = format.unwrap_or(config.output_format);

    match command {
        Commands::Config {
            show,
            set_store_dir,
            set_output,
            set_currency,
            set_price,
            set_log_level,
            reset,
        } => cmd_config(
            show,
            set_store_dir,
            set_output,
            set_currency,
            set_price,
            set_log_level,
            reset,
        ),

        Commands::Import {
            file,
            refresh,
            dry_run,
        } => cmd_import(&open_store(store_dir, &config)?, file, refresh, dry_run, format),

        Commands::List {
            filters,
            sort,
            order,
        } => cmd_list(&mut open_workspace(store_dir, &config)?, &filters, sort, order, format),

        Commands::Show { id } => {
            let ws = open_workspace(store_dir, &config)?;
            output_details(format, ws.require(id)?, &config.currency)
        }

        Commands::Add { delivery } => {
            cmd_add(&mut open_workspace(store_dir, &config)?, &delivery, format)
        }

        Commands::Edit { id, changes } => cmd_edit(
            &mut open_workspace(store_dir, &config)?,
            id,
            changes,
            &config,
            format,
        ),

        Commands::Delete { id, yes } => {
            cmd_delete(&mut open_workspace(store_dir, &config)?, id, yes, format)
        }

        Commands::Expense {
            id,
            road,
            diesel_liters,
            diesel_price,
            toll,
            extra,
            extra_description,
        } => {
            let costs = ExpenseChanges {
                road,
                diesel_liters,
                diesel_price,
                toll,
                extra,
                extra_description,
            };
            cmd_expense(&mut open_workspace(store_dir, &config)?, id, costs, &config, format)
        }

        Commands::Bill {
            filters,
            rate,
            output,
            dry_run,
        } => cmd_bill(
            &mut open_workspace(store_dir, &config)?,
            &filters,
            rate,
            output,
            dry_run,
            &config,
            format,
        ),

        Commands::Billings { sort, order } => cmd_billings(
            &mut open_workspace(store_dir, &config)?,
            sort,
            order,
            &config,
            format,
        ),

        Commands::Export { filters, output } => {
            cmd_export(&mut open_workspace(store_dir, &config)?, &filters, output, format)
        }

        Commands::Dashboard => {
            let ws = open_workspace(store_dir, &config)?;
            output_dashboard(format, &ws.dashboard(Utc::now()))
        }

        Commands::Owners => cmd_owners(&open_workspace(store_dir, &config)?, format),
    }
}

fn open_store(store_dir: Option<PathBuf>, config: &Config) -> Result<FileRecordStore> {
    let store = match store_dir {
        Some(dir) => open_record_store_at(dir)?,
        None => open_record_store(config)?,
    };
    debug!(path = %store.path().display(), "record store opened");
    Ok(store)
}

fn open_workspace(store_dir: Option<PathBuf>, config: &Config) -> Result<Workspace<FileRecordStore>> {
    let mut ws = Workspace::new(open_store(store_dir, config)?);
    ws.refresh()?;
    Ok(ws)
}

/// Print the success notice left by the last action.
///
/// In JSON mode it goes to stderr so stdout stays parseable.
fn announce(ws: &mut Workspace<FileRecordStore>, format: OutputFormat) {
    if let Some(notice) = ws.take_notice() {
        if notice.level != NoticeLevel::Success {
            return;
        }
        match format {
            OutputFormat::Table => println!("{}", notice.message),
            OutputFormat::Json => eprintln!("{}", notice.message),
        }
    }
}

fn cmd_list(
    ws: &mut Workspace<FileRecordStore>,
    filters: &FilterArgs,
    sort: Option<SortField>,
    order: Option<SortDirection>,
    format: OutputFormat,
) -> Result<()> {
    ws.set_filters(filters.to_criteria());

    let current = ws.sort();
    let field = sort.unwrap_or(current.field);
    let direction = match order {
        Some(order) => order,
        None if field == current.field => current.direction,
        None => SortDirection::Asc,
    };
    ws.set_sort(field, direction);

    output_grouped(format, &ws.grouped_view())
}

fn cmd_add(
    ws: &mut Workspace<FileRecordStore>,
    delivery: &DeliveryArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut form = DeliveryForm::create(delivery.to_form_data());
    let record = ws.submit(&mut form)?;
    announce(ws, format);

    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Table => {
            println!(
                "#{} {} for {} ({} kg)",
                record.id, record.truck_immatriculation, record.truck_owner, record.weight_loaded
            );
            Ok(())
        }
    }
}

fn cmd_edit(
    ws: &mut Workspace<FileRecordStore>,
    id: i64,
    changes: DeliveryChanges,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let mut form = DeliveryForm::edit(ws.require(id)?);

    if let Some(plate) = changes.plate {
        form.update(FormField::Plate, |d| d.truck_immatriculation = plate);
    }
    if let Some(drivers) = changes.drivers {
        form.update(FormField::Drivers, |d| d.driver_names = drivers);
    }
    if let Some(date) = changes.loading {
        form.update(FormField::LoadingDate, |d| d.loading_date = Some(date));
    }
    if let Some(date) = changes.unloading {
        form.update(FormField::UnloadingDate, |d| d.unloading_date = Some(date));
    }
    if let Some(weight) = changes.weight {
        form.update(FormField::Weight, |d| d.weight_loaded = weight);
    }
    if let Some(bond) = changes.bond {
        form.update(FormField::BondNumber, |d| d.delivery_bond_number = bond);
    }
    if let Some(owner) = changes.owner {
        form.update(FormField::Owner, |d| d.truck_owner = owner);
    }
    if let Some(truck_type) = changes.truck_type {
        form.select_truck_type(truck_type);
    }

    let record = ws.submit(&mut form)?;
    announce(ws, format);
    output_details(format, &record, &config.currency)
}

fn cmd_delete(
    ws: &mut Workspace<FileRecordStore>,
    id: i64,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    if !yes {
        print!("{} [y/N] ", ws.delete_prompt(id));
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ws.delete(id)?;
    announce(ws, format);
    Ok(())
}

/// Cost fields given on the command line; omitted ones keep their value
struct ExpenseChanges {
    road: Option<f64>,
    diesel_liters: Option<f64>,
    diesel_price: Option<f64>,
    toll: Option<f64>,
    extra: Option<f64>,
    extra_description: Option<String>,
}

fn cmd_expense(
    ws: &mut Workspace<FileRecordStore>,
    id: i64,
    costs: ExpenseChanges,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    ws.require(id)?;
    let mut expense = ws.expense_draft(id);

    if let Some(road) = costs.road {
        expense.road_costs = road;
    }
    if let Some(liters) = costs.diesel_liters {
        expense.diesel_liters = liters;
    }
    if let Some(price) = costs.diesel_price {
        expense.diesel_price_unit = price;
    }
    if let Some(toll) = costs.toll {
        expense.toll_costs = toll;
    }
    if let Some(extra) = costs.extra {
        expense.extra_costs = extra;
    }
    if let Some(description) = costs.extra_description {
        expense.extra_description = description;
    }

    ws.save_expense(&expense)?;
    announce(ws, format);
    output_details(format, ws.require(id)?, &config.currency)
}

fn cmd_bill(
    ws: &mut Workspace<FileRecordStore>,
    filters: &FilterArgs,
    rate: Option<String>,
    output: Option<PathBuf>,
    dry_run: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    ws.set_filters(filters.to_criteria());
    let rate = rate
        .or_else(|| config.default_price_per_ton.map(|p| p.to_string()))
        .unwrap_or_default();
    ws.set_rate_text(rate);

    let draft = ws.draft_invoice(Local::now().date_naive())?;
    let text = ws.invoice_text(&draft, &config.currency);
    if let Some(ref path) = output {
        std::fs::write(path, &text)?;
        eprintln!("Invoice written to {}", path.display());
    }

    if dry_run {
        return match format {
            OutputFormat::Json => print_json(&draft.quote),
            OutputFormat::Table => {
                println!("{}", text);
                println!("(dry run: invoice not saved)");
                Ok(())
            }
        };
    }

    let billing = ws.save_billing(&draft)?;
    match format {
        OutputFormat::Json => {
            announce(ws, format);
            print_json(&billing)
        }
        OutputFormat::Table => {
            println!("{}", text);
            announce(ws, format);
            Ok(())
        }
    }
}

fn cmd_billings(
    ws: &mut Workspace<FileRecordStore>,
    sort: Option<BillingSortField>,
    order: Option<SortDirection>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    ws.refresh_billings()?;
    ws.set_billing_sort(sort.unwrap_or_default(), order.unwrap_or(SortDirection::Desc));
    output_billings(format, &ws.billings(), &config.currency)
}

fn cmd_export(
    ws: &mut Workspace<FileRecordStore>,
    filters: &FilterArgs,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    ws.set_filters(filters.to_criteria());
    let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    let rows = ws.export_csv(&path)?;
    announce(ws, format);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "rows": rows,
            "path": path.display().to_string(),
        })),
        OutputFormat::Table => {
            println!("{} row(s) written to {}", rows, path.display());
            Ok(())
        }
    }
}

fn cmd_owners(ws: &Workspace<FileRecordStore>, format: OutputFormat) -> Result<()> {
    let owners = ws.owners();
    match format {
        OutputFormat::Json => print_json(&owners),
        OutputFormat::Table => {
            for owner in &owners {
                println!("{}", owner);
            }
            Ok(())
        }
    }
}

fn cmd_import(
    store: &FileRecordStore,
    file: PathBuf,
    refresh: bool,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let dump = load_dump(&file)?;
    if format == OutputFormat::Table {
        println!("Reading dump: {}", file.display());
        print!("{}", summarize_dump(&dump));
    }

    let mode = if refresh {
        ImportMode::Refresh
    } else {
        ImportMode::Append
    };
    let result = store.import(&dump, mode, dry_run);
    output_import(format, &result)?;

    if result.is_success() {
        Ok(())
    } else {
        Err(Error::Import(format!(
            "{} row(s) could not be imported",
            result.errors.len()
        )))
    }
}

fn cmd_config(
    show: bool,
    set_store_dir: Option<PathBuf>,
    set_output: Option<OutputFormat>,
    set_currency: Option<String>,
    set_price: Option<f64>,
    set_log_level: Option<String>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(dir) = set_store_dir {
        config.store_dir = Some(dir);
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(currency) = set_currency {
        config.currency = currency;
        modified = true;
    }

    if let Some(price) = set_price {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::precondition(
                "Enter a valid price per ton (must be greater than 0)",
            ));
        }
        config.default_price_per_ton = Some(price);
        modified = true;
    }

    if let Some(level) = set_log_level {
        config.log_level = Some(level);
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
