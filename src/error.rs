// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::queryparser::QueryStringParseError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    StringError(String),

    /// An error resulting from bad input data, such as an invalid
    /// timestamp or an unparseable query string.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A dataset refresh was requested while one was already
    /// outstanding for the same source.
    #[error("a refresh is already in progress")]
    RefreshInProgress,

    #[error("no base URL configured for remote datasets")]
    NoBaseUrl,

    #[error("dataset fetch failed with status {0}")]
    FetchStatus(u16),

    #[error("{0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("serde: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("csv: {0}")]
    CsvError(#[from] csv::Error),

    #[error("io: {0}")]
    IoError(#[from] std::io::Error),

    #[error("time parser error: {0}")]
    DateTimeParse(#[from] crate::datetime::ParseError),
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::StringError(value.to_string())
    }
}

impl From<QueryStringParseError> for AppError {
    fn from(value: QueryStringParseError) -> Self {
        Self::BadRequest(format!("failed to parse query string: {}", value))
    }
}
