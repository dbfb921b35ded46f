use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use orderflow_infra::{ReferenceKind, ReferenceStore, read_table};

use super::App;

#[derive(Debug, Subcommand)]
pub enum ReferenceCommand {
    /// Replace the stored catalog and/or exception table
    Import(ImportArgs),

    /// List the stored tables and where they came from
    Show,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Item catalog (ID, Item Name, Amount, Default Unit of Measure).
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// SKU exception table (Variant SKU, Quantity, Item Name, Fix Qty).
    #[arg(long)]
    pub exceptions: Option<PathBuf>,
}

pub fn run(app: &App, command: ReferenceCommand) -> Result<()> {
    match command {
        ReferenceCommand::Import(args) => {
            if args.catalog.is_none() && args.exceptions.is_none() {
                bail!("nothing to import; pass --catalog and/or --exceptions");
            }
            refresh(&app.store, ReferenceKind::Catalog, args.catalog.as_deref())?;
            refresh(&app.store, ReferenceKind::Exceptions, args.exceptions.as_deref())?;
            Ok(())
        }
        ReferenceCommand::Show => show(app),
    }
}

/// Store the table at `path` as `kind`, if a path was given.
pub fn refresh(store: &dyn ReferenceStore, kind: ReferenceKind, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let table = read_table(path, kind.as_str())
        .with_context(|| format!("reading {kind} table from {}", path.display()))?;
    let entry = store
        .save(kind, &table, &path.display().to_string())
        .with_context(|| format!("storing {kind} table"))?;

    println!("imported {kind}: {} rows from {}", entry.rows, path.display());
    Ok(())
}

fn show(app: &App) -> Result<()> {
    let manifest = app.store.manifest().context("reading reference manifest")?;

    println!("reference store: {}", app.store.dir().display());
    for kind in ReferenceKind::ALL {
        match manifest.tables.get(&kind) {
            Some(entry) => println!(
                "  {:<10} {:>6} rows  imported {}  from {}",
                kind.as_str(),
                entry.rows,
                entry.imported_at.to_rfc3339(),
                entry.source
            ),
            None => println!("  {:<10} not imported", kind.as_str()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_infra::InMemoryReferenceStore;

    #[test]
    fn refresh_stores_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exceptions.csv");
        std::fs::write(&path, "Variant SKU,Quantity,Item Name,Fix Qty\nPACK,6,Widget,\n").unwrap();

        let store = InMemoryReferenceStore::new();
        refresh(&store, ReferenceKind::Exceptions, Some(&path)).unwrap();
        refresh(&store, ReferenceKind::Catalog, None).unwrap();

        assert_eq!(store.require(ReferenceKind::Exceptions).unwrap().len(), 1);
        assert_eq!(store.load(ReferenceKind::Catalog).unwrap(), None);
    }

    #[test]
    fn refresh_rejects_table_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "ID,Item Name\nI1,Widget\n").unwrap();

        let store = InMemoryReferenceStore::new();
        let err = refresh(&store, ReferenceKind::Catalog, Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("missing required column 'Amount'"));
    }
}
