// SPDX-License-Identifier: MIT

//! Display-ready breakdowns layered on the aggregator: rows of
//! (key, count, percent) for one group key over a filtered record
//! set, renderable as an aligned terminal table or JSON.

use std::io::Write;

use owo_colors::OwoColorize;

use crate::aggregate::{self, GroupKey};
use crate::prelude::*;
use crate::record::CaseRecord;

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    pub key: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    pub group_by: String,
    pub total: u64,
    pub rows: Vec<BreakdownRow>,
}

/// Build a breakdown over an already filtered record set. Percentages
/// are relative to that set, not the unfiltered total; an empty set
/// yields an empty breakdown.
pub fn breakdown(records: &[CaseRecord], key: &GroupKey, top: Option<usize>) -> Breakdown {
    let mut counts = aggregate::group_and_count(records, key);
    if let Some(n) = top {
        counts = aggregate::top_n(counts, n);
    }
    let total = counts.total;
    let rows = counts
        .rows
        .into_iter()
        .map(|(key, count)| BreakdownRow {
            key,
            count,
            percent: aggregate::percentage_of(count, total),
        })
        .collect();
    Breakdown {
        group_by: key.to_string(),
        total,
        rows,
    }
}

/// Render as an aligned table:
///
/// ```text
/// ATTACK_METHOD        COUNT    PERCENT
/// Phishing               412       67.4
/// Fake Store             123       20.1
/// ...
/// ```
pub fn render<W: Write>(breakdown: &Breakdown, writer: &mut W) -> Result<(), AppError> {
    let key_width = breakdown
        .rows
        .iter()
        .map(|row| row.key.len())
        .chain(std::iter::once(breakdown.group_by.len()))
        .max()
        .unwrap_or(0)
        .max(8);

    let header = format!(
        "{:<key_width$}  {:>7}  {:>7}",
        breakdown.group_by.to_uppercase(),
        "COUNT",
        "PERCENT",
    );
    writeln!(writer, "{}", header.bold())?;
    for row in &breakdown.rows {
        writeln!(
            writer,
            "{:<key_width$}  {:>7}  {:>7.1}",
            row.key, row.count, row.percent
        )?;
    }
    writeln!(writer, "Total: {}", breakdown.total.green())?;
    Ok(())
}
