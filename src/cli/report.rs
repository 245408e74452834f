// SPDX-License-Identifier: MIT

use crate::aggregate::{self, GroupKey};
use crate::prelude::*;
use crate::report;

use super::Context;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Dataset name or path to a local JSON file
    #[arg(short, long, value_name = "NAME|PATH")]
    pub dataset: String,

    /// Field name or date bucket (day, week, month, quarter) to group by
    #[arg(short, long, value_name = "FIELD", default_value = "attack_method")]
    pub group_by: String,

    /// Keep only the top N groups, folding the rest into "Other"
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Only include records from the last duration, e.g. 7d, 24h
    #[arg(long, value_name = "DURATION", conflicts_with = "from")]
    pub last: Option<String>,

    /// Lower date bound, inclusive
    #[arg(long, value_name = "TIME")]
    pub from: Option<String>,

    /// Upper date bound, inclusive
    #[arg(long, value_name = "TIME")]
    pub to: Option<String>,

    /// Query string, e.g. 'region:US -"fake store" @from:2024'
    #[arg(short, long, value_name = "QUERY")]
    pub query: Option<String>,

    /// Timezone offset applied to partial timestamps, e.g. +0200
    #[arg(long, value_name = "OFFSET")]
    pub tz_offset: Option<String>,

    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub(crate) async fn main(args: &Args, context: &Context) -> Result<()> {
    let records = super::load_records(context, &args.dataset).await?;
    let spec = super::build_filter(
        args.query.as_deref(),
        args.last.as_deref(),
        args.from.as_deref(),
        args.to.as_deref(),
        args.tz_offset.as_deref(),
    )?;

    let filtered = aggregate::filter(&records, &spec);
    debug!(
        "{} of {} records match the filter",
        filtered.len(),
        records.len()
    );

    let key = GroupKey::parse(&args.group_by);
    let top = args.top.or_else(|| {
        context
            .config
            .get_string("report.top")
            .and_then(|v| v.parse().ok())
    });
    let breakdown = report::breakdown(&filtered, &key, top);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        let stdout = std::io::stdout();
        report::render(&breakdown, &mut stdout.lock())?;
    }

    Ok(())
}
