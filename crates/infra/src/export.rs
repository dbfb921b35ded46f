//! Output writers for the delivery note and the reconciled channel feed.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use orderflow_core::{DomainResult, Table};
use orderflow_inventory::ReconciledInventoryRow;
use orderflow_inventory::stock::columns::ON_HAND;
use orderflow_sales::DeliveryLine;

use crate::table_io::{TableIoError, write_file_atomically};

/// Number of blank rows between the header block and the data in the ERP
/// delivery note import template.
const TEMPLATE_SPACER_ROWS: usize = 4;
/// Number of times the header row is repeated in the ERP template.
const TEMPLATE_HEADER_ROWS: usize = 3;

/// Layout of the delivery note CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryLayout {
    /// Single header row followed by data.
    #[default]
    Plain,
    /// ERP import template: header repeated three times, four blank rows,
    /// then data.
    ErpTemplate,
}

impl FromStr for DeliveryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "erp-template" => Ok(Self::ErpTemplate),
            other => Err(format!(
                "unknown delivery layout '{other}' (expected plain or erp-template)"
            )),
        }
    }
}

/// Write delivery lines as CSV in the given layout.
pub fn write_delivery<W: Write>(
    writer: W,
    lines: &[DeliveryLine],
    layout: DeliveryLayout,
) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    let header_rows = match layout {
        DeliveryLayout::Plain => 1,
        DeliveryLayout::ErpTemplate => TEMPLATE_HEADER_ROWS,
    };
    for _ in 0..header_rows {
        out.write_record(DeliveryLine::COLUMNS)?;
    }

    if layout == DeliveryLayout::ErpTemplate {
        let blank = [""; DeliveryLine::COLUMNS.len()];
        for _ in 0..TEMPLATE_SPACER_ROWS {
            out.write_record(blank)?;
        }
    }

    for line in lines {
        out.write_record(line.to_record())?;
    }
    out.flush()?;
    Ok(())
}

/// Write the delivery note to `path`, replacing any existing file.
pub fn write_delivery_file(
    path: &Path,
    lines: &[DeliveryLine],
    layout: DeliveryLayout,
) -> Result<(), TableIoError> {
    write_file_atomically(path, |file| {
        write_delivery(file, lines, layout).map_err(|source| TableIoError::Csv {
            path: path.to_path_buf(),
            source,
        })
    })?;
    tracing::info!(path = %path.display(), lines = lines.len(), ?layout, "wrote delivery note");
    Ok(())
}

/// Write reconciled on-hand values into the channel table's `On hand`
/// column, keeping every other column as it was.
///
/// `rows` must be the reconciliation of this table's rows, in order.
pub fn apply_on_hand(channel: &mut Table, rows: &[ReconciledInventoryRow]) -> DomainResult<()> {
    channel.set_column(ON_HAND, rows.iter().map(|r| r.on_hand.to_string()).collect())
}
