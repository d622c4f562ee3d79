//! Output formatting module

use serde::Serialize;

use livraisons_domain::service::{
    delivery_expense_total, format_amount, total_billed_amount, DashboardMetrics,
    ExpenseBreakdown, GroupedView,
};
use livraisons_infra::backend_import::ImportResult;
use livraisons_types::{Billing, DeliveryRecord, OutputFormat, Result};

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cut(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

fn delivery_row(d: &DeliveryRecord, expenses: f64) -> String {
    format!(
        "{:>5}  {:<12} {:<18} {}  {}  {:>9.0}  {:<10} {:<12} {:>10}  {}",
        d.id,
        cut(&d.truck_immatriculation, 12),
        cut(&d.driver_names, 18),
        d.loading_date,
        d.unloading_date,
        d.weight_loaded,
        cut(&d.delivery_bond_number, 10),
        d.truck_type.label(),
        format_amount(expenses),
        if d.is_billed() { "billed" } else { "" }
    )
}

pub fn output_grouped(format: OutputFormat, view: &GroupedView) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    if view.groups.is_empty() {
        println!("No deliveries found.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<12} {:<18} {:<10}  {:<10}  {:>9}  {:<10} {:<12} {:>10}",
        "ID", "Plate", "Drivers", "Loaded", "Unloaded", "Kg", "Bond #", "Type", "Expenses"
    );
    for group in &view.groups {
        println!();
        println!(
            "== {} ({} deliveries, {} kg, expenses {})",
            group.owner,
            group.deliveries.len(),
            format_amount(group.total_weight_kg),
            format_amount(group.total_expenses)
        );
        for d in &group.deliveries {
            println!("{}", delivery_row(d, delivery_expense_total(d)));
        }
    }
    println!();
    println!(
        "Total: {} deliveries, {} kg, expenses {}",
        view.delivery_count,
        format_amount(view.total_weight_kg),
        format_amount(view.total_expenses)
    );
    Ok(())
}

#[derive(Serialize)]
struct DeliveryDetails<'a> {
    delivery: &'a DeliveryRecord,
    expenses: Option<ExpenseBreakdown>,
}

pub fn output_details(format: OutputFormat, delivery: &DeliveryRecord, currency: &str) -> Result<()> {
    let breakdown = ExpenseBreakdown::from_expense(delivery.expense.as_ref());
    if format == OutputFormat::Json {
        return print_json(&DeliveryDetails {
            delivery,
            expenses: breakdown,
        });
    }

    println!("\nDelivery #{}", delivery.id);
    println!("==============");
    println!("Plate:          {}", delivery.truck_immatriculation);
    println!("Drivers:        {}", delivery.driver_names);
    println!("Owner:          {}", delivery.truck_owner);
    println!("Truck type:     {}", delivery.truck_type);
    println!("Loading date:   {}", delivery.loading_date);
    println!("Unloading date: {}", delivery.unloading_date);
    println!("Weight:         {} kg", format_amount(delivery.weight_loaded));
    println!("Bond #:         {}", delivery.delivery_bond_number);
    match delivery.billing_id {
        Some(id) => println!("Billing:        #{}", id),
        None => println!("Billing:        not billed"),
    }

    match breakdown {
        Some(b) => {
            println!("\n--- Expenses ---");
            println!(
                "Diesel:         {} L x {} = {} {}",
                b.diesel_liters,
                format_amount(b.diesel_price_unit),
                format_amount(b.diesel_total),
                currency
            );
            println!("Road:           {} {}", format_amount(b.road_costs), currency);
            println!("Tolls:          {} {}", format_amount(b.toll_costs), currency);
            if b.extra_description.is_empty() {
                println!("Extra:          {} {}", format_amount(b.extra_costs), currency);
            } else {
                println!(
                    "Extra:          {} {} ({})",
                    format_amount(b.extra_costs),
                    currency,
                    b.extra_description
                );
            }
            println!("----------------");
            println!("Total:          {} {}", format_amount(b.total), currency);
        }
        None => println!("\nNo expenses recorded."),
    }
    Ok(())
}

pub fn output_billings(format: OutputFormat, billings: &[Billing], currency: &str) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(billings);
    }

    if billings.is_empty() {
        println!("No billings yet.");
        return Ok(());
    }

    println!(
        "{:<19} {:<17} {:>9} {:>10} {:>12}  {}",
        "Number", "Created", "Tons", "Rate", "Amount", "Status"
    );
    for b in billings {
        println!(
            "{:<19} {:<17} {:>9.3} {:>10} {:>12}  {}",
            b.billing_number,
            b.created_at.format("%Y-%m-%d %H:%M"),
            b.total_weight,
            format_amount(b.price_per_ton),
            format_amount(b.total_amount),
            b.status
        );
    }
    println!(
        "\n{} billing(s), {} {} billed",
        billings.len(),
        format_amount(total_billed_amount(billings)),
        currency
    );
    Ok(())
}

pub fn output_dashboard(format: OutputFormat, metrics: &DashboardMetrics) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(metrics);
    }

    println!("\nDashboard");
    println!("=========");
    println!("Total deliveries:     {}", metrics.total_deliveries);
    println!("Total weight:         {} kg", format_amount(metrics.total_weight_kg));
    println!("Active trucks (30d):  {}", metrics.active_trucks);
    println!("Recent activity (7d): {}", metrics.recent_activity);
    Ok(())
}

pub fn output_import(format: OutputFormat, result: &ImportResult) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(result);
    }

    if result.dry_run {
        println!("\n=== Dry Run Summary ===");
    } else {
        println!("\n=== Import Summary ===");
    }
    if result.cleared > 0 {
        println!("Cleared:             {}", result.cleared);
    }
    println!("Deliveries imported: {}", result.deliveries_imported);
    println!("  with expenses:     {}", result.expenses_imported);
    println!("Billings imported:   {}", result.billings_imported);
    println!("Skipped (existing):  {}", result.skipped);
    for err in &result.errors {
        println!("  ! {}", err);
    }
    Ok(())
}
