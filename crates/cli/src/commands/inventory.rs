use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use orderflow_infra::{ReferenceKind, apply_on_hand, load_inventory_exceptions, read_table, write_table_file};
use orderflow_inventory::{ChannelInventoryRow, StockRecord, reconcile_inventory};

use super::App;
use super::reference::refresh;

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// ERP stock balance snapshot (needs Item Name and Balance Qty).
    #[arg(long)]
    pub stock: PathBuf,

    /// Channel inventory export (needs SKU); other columns pass through.
    #[arg(long)]
    pub channel: PathBuf,

    /// Replace the stored exception table with this file first.
    #[arg(long)]
    pub exceptions: Option<PathBuf>,

    /// Corrected channel inventory CSV to write.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(app: &App, args: InventoryArgs) -> Result<()> {
    refresh(&app.store, ReferenceKind::Exceptions, args.exceptions.as_deref())?;
    let exceptions = load_inventory_exceptions(&app.store)
        .context("loading exception table (pass --exceptions or run `orderflow reference import`)")?;

    let stock_table = read_table(&args.stock, "stock")
        .with_context(|| format!("reading stock from {}", args.stock.display()))?;
    let stock = StockRecord::from_table(&stock_table)?;

    let mut channel_table = read_table(&args.channel, "channel")
        .with_context(|| format!("reading channel inventory from {}", args.channel.display()))?;
    let channel = ChannelInventoryRow::from_table(&channel_table)?;

    let rows = reconcile_inventory(&stock, &channel, &exceptions);
    apply_on_hand(&mut channel_table, &rows)?;
    write_table_file(&args.out, &channel_table)
        .with_context(|| format!("writing channel inventory to {}", args.out.display()))?;

    let negative = rows.iter().filter(|row| row.on_hand < 0.0).count();
    if negative > 0 {
        tracing::warn!(negative, "some SKUs reconciled to a negative on-hand count");
    }
    println!("wrote {} inventory rows to {}", rows.len(), args.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_infra::{FsReferenceStore, Settings};
    use std::fs;

    #[test]
    fn inventory_overwrites_on_hand_only() {
        let dir = tempfile::tempdir().unwrap();
        let p = |name: &str| dir.path().join(name);
        fs::write(p("stock.csv"), "Item Name,Balance Qty\nY,10\nZ,4\n").unwrap();
        fs::write(p("channel.csv"), "Title,SKU,On hand\nWhy,Y,1\nZed,Z,1\n").unwrap();
        fs::write(
            p("exceptions.csv"),
            "Variant SKU,Quantity,Item Name,Fix Qty\nY,1,Other,20\nY-PART,1,Y,5\n",
        )
        .unwrap();

        let app = App {
            settings: Settings::default(),
            store: FsReferenceStore::open(p("refs")).unwrap(),
        };
        run(
            &app,
            InventoryArgs {
                stock: p("stock.csv"),
                channel: p("channel.csv"),
                exceptions: Some(p("exceptions.csv")),
                out: p("out.csv"),
            },
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(p("out.csv")).unwrap(),
            "Title,SKU,On hand\nWhy,Y,15\nZed,Z,4\n"
        );
    }

    #[test]
    fn inventory_refuses_exceptions_without_fix_qty() {
        let dir = tempfile::tempdir().unwrap();
        let p = |name: &str| dir.path().join(name);
        fs::write(p("stock.csv"), "Item Name,Balance Qty\nY,10\n").unwrap();
        fs::write(p("channel.csv"), "SKU,On hand\nY,1\n").unwrap();
        fs::write(p("exceptions.csv"), "Variant SKU,Quantity,Item Name\nY,2,Widget\n").unwrap();

        let app = App {
            settings: Settings::default(),
            store: FsReferenceStore::open(p("refs")).unwrap(),
        };
        let err = run(
            &app,
            InventoryArgs {
                stock: p("stock.csv"),
                channel: p("channel.csv"),
                exceptions: Some(p("exceptions.csv")),
                out: p("out.csv"),
            },
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("missing required column 'Fix Qty'"));
        assert!(!p("out.csv").exists());
    }

    #[test]
    fn inventory_refuses_without_exceptions() {
        let dir = tempfile::tempdir().unwrap();
        let app = App {
            settings: Settings::default(),
            store: FsReferenceStore::open(dir.path()).unwrap(),
        };
        let err = run(
            &app,
            InventoryArgs {
                stock: dir.path().join("stock.csv"),
                channel: dir.path().join("channel.csv"),
                exceptions: None,
                out: dir.path().join("out.csv"),
            },
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("exceptions table is not available"));
    }
}
