use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use std::path::PathBuf;
use usbwatch::catalog;

/// Lists attached USB devices, and optionally tracks insertions and removals.
#[derive(Parser, Debug)]
#[clap(about, version)]
pub struct Cli {
    /// Pass `track` to keep reporting devices as they come and go
    #[clap(value_enum)]
    pub mode: Option<CliMode>,

    /// Location of the cached USB ID database
    #[clap(long, default_value_os_t = default_ids_location())]
    pub ids_file: PathBuf,

    /// Where to fetch the USB ID database from
    #[clap(long, default_value = catalog::DEFAULT_URL)]
    pub ids_url: String,

    /// Don't check for a newer USB ID database; use the cached copy as-is
    #[clap(long)]
    pub offline: bool,

    /// Milliseconds to wait between polls while tracking
    #[clap(long, default_value = "100")]
    pub interval: u64,

    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "warn")]
    pub log_level: LevelFilter,
}

#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum CliMode {
    /// Keep watching for devices being attached and detached.
    Track,
}

fn default_ids_location() -> PathBuf {
    match ProjectDirs::from("org", "usbwatch", "usbwatch") {
        Some(dirs) => dirs.cache_dir().join("usb.ids"),
        None => PathBuf::from("usb.ids"),
    }
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        }
    }
}
