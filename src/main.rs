use std::io;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{info, warn};
use usbwatch::{Host, IdentifierCatalog, Mode, Tracker};

#[cfg(feature = "download")]
use usbwatch::catalog::download::CatalogSource;

use crate::cli::{Cli, CliMode};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),

        // Anything we don't understand just gets the usage line.
        Err(_) => {
            println!("{}", Cli::command().render_usage());
            return Ok(());
        }
    };

    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();

    let mode = match args.mode {
        Some(CliMode::Track) => Mode::Tracking,
        None => Mode::Listing,
    };

    // Create a "usb host" object, which is the top-level interface for finding USB devices.
    let host = Host::new()?;
    let catalog = load_catalog(&args);

    let mut tracker = Tracker::new(host, catalog, io::stdout().lock())
        .with_interval(Duration::from_millis(args.interval));
    tracker.run(mode)?;

    Ok(())
}

/// Loads the USB ID database, falling back to an empty one if we can't get it;
/// devices are then shown by bare VID:PID.
fn load_catalog(args: &Cli) -> IdentifierCatalog {
    info!("Using USB IDs cached at {}", args.ids_file.display());

    #[cfg(feature = "download")]
    let catalog = if args.offline {
        IdentifierCatalog::load(&args.ids_file)
    } else {
        CatalogSource::new(args.ids_url.as_str(), args.ids_file.as_path()).load()
    };

    #[cfg(not(feature = "download"))]
    let catalog = {
        if !args.offline {
            info!("Built without download support; not refreshing {}", args.ids_url);
        }
        IdentifierCatalog::load(&args.ids_file)
    };

    catalog.unwrap_or_else(|e| {
        warn!("USB IDs unavailable, showing bare IDs: {}", e);
        IdentifierCatalog::default()
    })
}
