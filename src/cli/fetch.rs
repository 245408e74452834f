// SPDX-License-Identifier: MIT

use crate::aggregate::GroupKey;
use crate::prelude::*;
use crate::report;
use crate::view::DatasetView;

use super::Context;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Remote dataset name
    #[arg(short, long, value_name = "NAME")]
    pub dataset: String,
}

pub(crate) async fn main(args: &Args, context: &Context) -> Result<()> {
    let client = context.client()?;
    let view = client.refresh(DatasetView::new(&args.dataset)).await;
    if let Some(err) = view.last_error() {
        bail!("failed to fetch dataset {}: {}", args.dataset, err);
    }

    let records = view.records();
    let mut dates: Vec<_> = records.iter().filter_map(|r| r.date.as_ref()).collect();
    dates.sort();

    println!("Dataset:  {}", view.name());
    println!("Records:  {}", records.len());
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!(
            "Range:    {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    println!();

    let breakdown = report::breakdown(records, &GroupKey::parse("url_status"), None);
    let stdout = std::io::stdout();
    report::render(&breakdown, &mut stdout.lock())?;

    Ok(())
}
