//! Searchable donor and patient tables.
//!
//! Tables are rebuilt from the stored collection on every call. The search
//! text is matched case-insensitively against the name and the blood group.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::record::{Donor, Patient, Record, RecordKind};
use crate::storage::{KeyValueStore, RecordStore};

const DONOR_HEADERS: &[&str] = &["Name", "Blood Group", "Units", "Contact", "Action"];
const PATIENT_HEADERS: &[&str] = &["Name", "Blood Group", "Units", "Contact", "Hospital"];

/// Something the user can do from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum RowAction {
    /// Remove the donor with this id.
    RemoveDonor(u64),
}

/// One rendered record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Id of the record behind the row.
    pub id: u64,
    /// Cell text, one per header. The action column is text too.
    pub cells: Vec<String>,
    /// Row action, if the table offers one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RowAction>,
}

/// A rendered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column headers.
    pub headers: Vec<&'static str>,
    /// Rows in stored order.
    pub rows: Vec<Row>,
}

/// Load a collection and render it through `filter`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn render_table<S: KeyValueStore>(
    store: &RecordStore<S>,
    kind: RecordKind,
    filter: &str,
) -> Result<Table> {
    Ok(match kind {
        RecordKind::Donor => donor_table(&store.donors()?, filter),
        RecordKind::Patient => patient_table(&store.patients()?, filter),
    })
}

/// Render donors; every row carries a removal action.
#[must_use]
pub fn donor_table(donors: &[Donor], filter: &str) -> Table {
    let rows = filtered(donors, filter)
        .map(|d| Row {
            id: d.id,
            cells: vec![
                d.name.clone(),
                d.blood_group.clone(),
                d.units.to_string(),
                d.contact.clone(),
                format!("remove {}", d.id),
            ],
            action: Some(RowAction::RemoveDonor(d.id)),
        })
        .collect();
    Table {
        headers: DONOR_HEADERS.to_vec(),
        rows,
    }
}

/// Render patients, read-only.
#[must_use]
pub fn patient_table(patients: &[Patient], filter: &str) -> Table {
    let rows = filtered(patients, filter)
        .map(|p| Row {
            id: p.id,
            cells: vec![
                p.name.clone(),
                p.blood_group.clone(),
                p.units.to_string(),
                p.contact.clone(),
                p.hospital.clone(),
            ],
            action: None,
        })
        .collect();
    Table {
        headers: PATIENT_HEADERS.to_vec(),
        rows,
    }
}

/// Whether `record` survives the search text `query` (already lowercased).
fn matches<R: Record>(record: &R, query: &str) -> bool {
    query.is_empty()
        || record.name().to_lowercase().contains(query)
        || record.blood_group_label().to_lowercase().contains(query)
}

fn filtered<'a, R: Record>(records: &'a [R], filter: &str) -> impl Iterator<Item = &'a R> + 'a {
    let query = filter.trim().to_lowercase();
    records.iter().filter(move |r| matches(*r, &query))
}

impl Table {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row survived the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One tab-separated line per row, no header.
    #[must_use]
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.cells.join("\t"));
            out.push('\n');
        }
        out
    }

    /// Column-aligned text with a header and separator line.
    #[must_use]
    pub fn to_aligned(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        write_line(&mut out, self.headers.iter().copied(), &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(&mut out, rule.iter().map(String::as_str), &widths);
        for row in &self.rows {
            write_line(&mut out, row.cells.iter().map(String::as_str), &widths);
        }
        out
    }
}

fn write_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let _ = write!(line, "{cell:<width$}");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
