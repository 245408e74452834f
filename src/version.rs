// SPDX-License-Identifier: MIT

use crate::prelude::*;

pub const VERSION: &str = std::env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

pub fn log_version() {
    info!("This is Caseview version {}", version());
}

pub fn print_version() {
    println!("Caseview Version {}", VERSION);
}
