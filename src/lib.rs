// SPDX-License-Identifier: MIT

// Clippy suppressions. These are the global ones I don't care about.
#![allow(clippy::needless_return)]
#![allow(clippy::redundant_field_names)]

#[macro_use]
pub mod logger;

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod prelude;
pub mod queryparser;
pub mod record;
pub mod report;
pub mod source;
pub mod version;
pub mod view;

#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate serde_json;
