use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use orderflow_infra::{DeliveryLayout, ReferenceKind, ReferenceTables, read_table, write_delivery_file};
use orderflow_sales::{DeliveryLine, OrderLine};

use super::App;
use super::reference::refresh;

#[derive(Debug, Args)]
pub struct ShipArgs {
    /// Channel order export (needs Variant SKU and Quantity).
    #[arg(long)]
    pub orders: PathBuf,

    /// Replace the stored catalog with this file first.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Replace the stored exception table with this file first.
    #[arg(long)]
    pub exceptions: Option<PathBuf>,

    /// Delivery note CSV to write.
    #[arg(long)]
    pub out: PathBuf,

    /// plain | erp-template
    #[arg(long, default_value = "plain")]
    pub layout: DeliveryLayout,
}

pub fn run(app: &App, args: ShipArgs) -> Result<()> {
    let lines = build(app, &args)?;

    write_delivery_file(&args.out, &lines, args.layout)
        .with_context(|| format!("writing delivery note to {}", args.out.display()))?;

    let unmatched = lines.iter().filter(|line| !line.is_matched()).count();
    println!(
        "wrote {} delivery lines to {} ({unmatched} without a catalog match)",
        lines.len(),
        args.out.display()
    );
    Ok(())
}

fn build(app: &App, args: &ShipArgs) -> Result<Vec<DeliveryLine>> {
    refresh(&app.store, ReferenceKind::Catalog, args.catalog.as_deref())?;
    refresh(&app.store, ReferenceKind::Exceptions, args.exceptions.as_deref())?;
    let tables = ReferenceTables::load(&app.store)
        .context("loading reference tables (pass --catalog/--exceptions or run `orderflow reference import`)")?;

    let table = read_table(&args.orders, "orders")
        .with_context(|| format!("reading orders from {}", args.orders.display()))?;
    let orders = OrderLine::from_table(&table)?;

    Ok(app
        .settings
        .order_transformer()
        .transform(&orders, &tables.catalog, &tables.exceptions))
}
