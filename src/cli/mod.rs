// SPDX-License-Identifier: MIT

pub mod export;
pub mod fetch;
pub mod report;

use clap::{Parser, Subcommand};

use crate::aggregate::FilterSpec;
use crate::config::Config;
use crate::prelude::*;
use crate::record::CaseRecord;
use crate::source;
use crate::version;

#[derive(Parser, Debug)]
#[command(name = "caseview", version, about = "Reporting over threat case datasets")]
pub struct Args {
    /// Increase verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration filename
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Base URL for remote datasets
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "CASEVIEW_BASE_URL",
        hide_env = true
    )]
    pub base_url: Option<String>,

    /// Disable TLS certificate validation
    #[arg(short = 'k', long, global = true)]
    pub no_check_certificate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate a dataset into a grouped breakdown
    Report(report::Args),

    /// Export a dataset to CSV
    Export(export::Args),

    /// Fetch a remote dataset and summarize it
    Fetch(fetch::Args),

    /// Display version
    Version,
}

pub(crate) struct Context {
    pub config: Config,
    pub base_url: Option<String>,
    pub no_check_certificate: bool,
}

impl Context {
    fn from_args(args: &Args) -> Self {
        let mut config = Config::empty();
        if let Some(filename) = &args.config {
            match Config::from_file(filename) {
                Ok(loaded) => config = loaded,
                Err(err) => {
                    fatal!("Failed to load configuration file {}: {}", filename, err);
                }
            }
        }
        let base_url = args
            .base_url
            .clone()
            .or_else(|| config.get_string("datasets.base-url"));
        let no_check_certificate =
            args.no_check_certificate || config.get_bool("datasets.no-verify-tls");
        Self {
            config,
            base_url,
            no_check_certificate,
        }
    }

    pub(crate) fn client(&self) -> Result<source::DatasetClient, AppError> {
        let base_url = self.base_url.as_deref().ok_or(AppError::NoBaseUrl)?;
        Ok(source::ClientBuilder::new(base_url)
            .disable_certificate_validation(self.no_check_certificate)
            .build())
    }
}

pub async fn main(args: Args) -> Result<()> {
    let context = Context::from_args(&args);
    match &args.command {
        Commands::Report(args) => report::main(args, &context).await,
        Commands::Export(args) => export::main(args, &context).await,
        Commands::Fetch(args) => fetch::main(args, &context).await,
        Commands::Version => {
            version::print_version();
            Ok(())
        }
    }
}

/// Load a dataset by name or path. An existing local path wins;
/// anything else is treated as a remote dataset name.
pub(crate) async fn load_records(
    context: &Context,
    dataset: &str,
) -> Result<Vec<CaseRecord>, AppError> {
    if std::path::Path::new(dataset).exists() {
        return source::load_path(dataset);
    }
    context.client()?.fetch(dataset).await
}

/// Build the filter from the command line: query string plus the
/// relative (`--last`) and absolute (`--from`/`--to`) range flags.
pub(crate) fn build_filter(
    query: Option<&str>,
    last: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    tz_offset: Option<&str>,
) -> Result<FilterSpec, AppError> {
    let mut spec = match query {
        Some(q) => FilterSpec::parse(q, tz_offset)?,
        None => FilterSpec::default(),
    };
    if let Some(last) = last {
        let duration = humantime::parse_duration(last)
            .map_err(|err| AppError::BadRequest(format!("time range: {err}")))?;
        let duration = chrono::Duration::from_std(duration)
            .map_err(|err| AppError::BadRequest(format!("time range: {err}")))?;
        spec.from = Some((chrono::Utc::now() - duration).fixed_offset());
    }
    if let Some(from) = from {
        spec.set_from_lenient(from, tz_offset);
    }
    if let Some(to) = to {
        spec.set_to_lenient(to, tz_offset);
    }
    Ok(spec)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_filter() {
        let spec = build_filter(Some("region:US"), None, Some("2024-01"), None, None).unwrap();
        assert_eq!(spec.fields.len(), 1);
        assert!(spec.from.is_some());
        assert!(spec.to.is_none());

        let spec = build_filter(None, Some("7d"), None, None, None).unwrap();
        assert!(spec.from.is_some());

        assert!(build_filter(None, Some("sometime"), None, None, None).is_err());

        // A malformed absolute bound clamps instead of failing.
        let spec = build_filter(None, None, Some("yesterday-ish"), None, None).unwrap();
        assert!(spec.from.is_none());
    }
}
