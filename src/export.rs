// SPDX-License-Identifier: MIT

//! CSV export. One row per source record, not per aggregated group,
//! with a header row of human readable column names. Embedded quotes
//! survive through standard doubled-quote escaping.

use std::io::Write;
use std::path::Path;

use crate::prelude::*;
use crate::record::CaseRecord;

/// Column headers paired with the record field that feeds them.
const COLUMNS: &[(&str, &str)] = &[
    ("Case ID", "id"),
    ("Found On", "found_on"),
    ("Attack Method", "attack_method"),
    ("Attack Vector", "attack_vector"),
    ("Attack Goal", "attack_goal"),
    ("Attack Surface", "attack_surface"),
    ("Server", "server"),
    ("Region", "region"),
    ("URL", "url"),
    ("URL Status", "url_status"),
];

pub fn export<W: Write>(records: &[CaseRecord], writer: W) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS.iter().map(|(header, _)| *header))?;
    for record in records {
        csv.write_record(
            COLUMNS
                .iter()
                .map(|(_, field)| {
                    record
                        .field(field)
                        .map(|value| value.into_owned())
                        .unwrap_or_default()
                }),
        )?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_path<P: AsRef<Path>>(records: &[CaseRecord], path: P) -> Result<(), AppError> {
    let file = std::fs::File::create(path)?;
    export(records, file)
}
