// SPDX-License-Identifier: MIT

use crate::aggregate;
use crate::export;
use crate::prelude::*;

use super::Context;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Dataset name or path to a local JSON file
    #[arg(short, long, value_name = "NAME|PATH")]
    pub dataset: String,

    /// Query string applied before export
    #[arg(short, long, value_name = "QUERY")]
    pub query: Option<String>,

    /// Only include records from the last duration, e.g. 7d, 24h
    #[arg(long, value_name = "DURATION", conflicts_with = "from")]
    pub last: Option<String>,

    /// Lower date bound, inclusive
    #[arg(long, value_name = "TIME")]
    pub from: Option<String>,

    /// Upper date bound, inclusive
    #[arg(long, value_name = "TIME")]
    pub to: Option<String>,

    /// Output filename, stdout when not given
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,
}

pub(crate) async fn main(args: &Args, context: &Context) -> Result<()> {
    let records = super::load_records(context, &args.dataset).await?;
    let spec = super::build_filter(
        args.query.as_deref(),
        args.last.as_deref(),
        args.from.as_deref(),
        args.to.as_deref(),
        None,
    )?;
    let filtered = aggregate::filter(&records, &spec);

    match &args.output {
        Some(filename) => {
            export::export_path(&filtered, filename)?;
            info!("Wrote {} records to {}", filtered.len(), filename);
        }
        None => {
            let stdout = std::io::stdout();
            export::export(&filtered, stdout.lock())?;
        }
    }

    Ok(())
}
