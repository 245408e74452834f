// SPDX-License-Identifier: MIT

//! Remote dataset source. Datasets are pre-built JSON resources named
//! `{base_url}/{name}.json`. One request may be in flight per client
//! at a time; a refresh issued while another is outstanding is
//! rejected rather than queued.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::prelude::*;
use crate::record::{self, CaseRecord};
use crate::view::DatasetView;

pub struct DatasetClient {
    base_url: String,
    disable_certificate_validation: bool,
    in_flight: AtomicBool,
}

impl DatasetClient {
    pub fn new(base_url: &str) -> Self {
        ClientBuilder::new(base_url).build()
    }

    fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if self.disable_certificate_validation {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build()
    }

    pub fn dataset_url(&self, name: &str) -> String {
        format!("{}/{}.json", self.base_url.trim_end_matches('/'), name)
    }

    /// Fetch and decode a dataset by name.
    pub async fn fetch(&self, name: &str) -> Result<Vec<CaseRecord>, AppError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::RefreshInProgress);
        }
        let result = self.fetch_inner(name).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn fetch_inner(&self, name: &str) -> Result<Vec<CaseRecord>, AppError> {
        let url = self.dataset_url(name);
        debug!("Fetching dataset {} from {}", name, url);
        let response = self.http_client()?.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchStatus(status.as_u16()));
        }
        let value: serde_json::Value = response.json().await?;
        let records = record::from_value(value)?;
        info!("Loaded {} records from dataset {}", records.len(), name);
        Ok(records)
    }

    /// Refresh a view from this source. On success a fresh snapshot
    /// is installed; on failure the previous records stay visible and
    /// the error is surfaced on the view. No retry is attempted.
    pub async fn refresh(&self, view: DatasetView) -> DatasetView {
        match self.fetch(view.name()).await {
            Ok(records) => view.with_records(records),
            Err(err) => {
                warn!("Failed to refresh dataset {}: {}", view.name(), err);
                view.with_error(err.to_string())
            }
        }
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    base_url: String,
    disable_certificate_validation: bool,
}

impl ClientBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    pub fn disable_certificate_validation(mut self, yes: bool) -> Self {
        self.disable_certificate_validation = yes;
        self
    }

    pub fn build(self) -> DatasetClient {
        DatasetClient {
            base_url: self.base_url,
            disable_certificate_validation: self.disable_certificate_validation,
            in_flight: AtomicBool::new(false),
        }
    }
}

/// Load a dataset from a local file, same formats as the remote
/// source.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Vec<CaseRecord>, AppError> {
    let file = std::fs::File::open(path.as_ref())?;
    let value: serde_json::Value = serde_json::from_reader(file)?;
    let records = record::from_value(value)?;
    debug!(
        "Loaded {} records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}
