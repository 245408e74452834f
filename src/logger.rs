// SPDX-License-Identifier: MIT

use std::sync::OnceLock;

use time::macros::format_description;
use time::UtcOffset;
pub use tracing::debug;
pub use tracing::error;
pub use tracing::info;
pub use tracing::trace;
pub use tracing::warn;
use tracing::Level;
use tracing_subscriber::fmt::time::OffsetTime;

static OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Capture the local UTC offset. Must be called before any threads
/// are spawned or the local offset lookup will fail and UTC is used.
pub fn init_offset() {
    if let Ok(offset) = UtcOffset::current_local_offset() {
        let _ = OFFSET.set(offset);
    }
}

pub fn init_logger(level: Level) {
    let level = match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };

    let offset = OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    );

    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(format!("{level},hyper=off"))
        .with_writer(std::io::stderr)
        .with_timer(timer);

    #[cfg(target_os = "windows")]
    let builder = builder.with_ansi(false);

    tracing::subscriber::set_global_default(builder.finish())
        .expect("setting default subscriber failed");
}

pub fn init_stdlog() {
    tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Info)
        .init()
        .unwrap();
}

macro_rules! fatal {
    ($($arg:tt)+) => {
        error!($($arg)+);
        std::process::exit(1);
    };
}
