//! Human-readable names for vendor and product IDs, from the `usb.ids` database.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::device::DeviceIdentity;

#[cfg(feature = "download")]
pub mod download;

/// Where the USB ID database is published.
pub const DEFAULT_URL: &str = "http://www.linux-usb.org/usb.ids";

/// Line that ends the vendor/product section of `usb.ids`; classes and friends follow it.
const END_OF_IDS: &str = "# List of known device classes, subclasses and protocols";

/// Description used when we know the vendor, but not the product.
const UNKNOWN_PRODUCT: &str = "Unknown device";

/// Every error that can occur while fetching or loading the catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// Reading or writing the local copy failed.
    Io(std::io::Error),

    /// The server answered a download with something other than 200 OK.
    Download(u16),

    /// The request itself failed.
    #[cfg(feature = "download")]
    Http(reqwest::Error),

    /// The server didn't tell us when the database was last modified.
    MissingTimestamp,

    /// The server's Last-Modified header wasn't a date we could read.
    BadTimestamp(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CatalogError::*;

        match self {
            Io(e) => write!(f, "could not access the USB ID database: {}", e)?,
            Download(status) => write!(f, "error downloading USB IDs, HTTP status {}", status)?,
            #[cfg(feature = "download")]
            Http(e) => write!(f, "error requesting USB IDs: {}", e)?,
            MissingTimestamp => write!(f, "USB ID server sent no Last-Modified header")?,
            BadTimestamp(value) => write!(f, "unreadable Last-Modified header {:?}", value)?,
        }

        Ok(())
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            #[cfg(feature = "download")]
            CatalogError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(error: std::io::Error) -> Self {
        CatalogError::Io(error)
    }
}

#[cfg(feature = "download")]
impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        CatalogError::Http(error)
    }
}

/// Everything we know about one vendor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Vendor {
    name: String,
    products: HashMap<u16, String>,
}

/// Read-only mapping from vendor/product IDs to names.
///
/// An empty catalog is perfectly usable; every lookup just comes back empty-handed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdentifierCatalog {
    vendors: HashMap<u16, Vendor>,
}

impl IdentifierCatalog {
    /// Loads the catalog from a local copy of `usb.ids`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        info!("Loading USB IDs from {}", path.display());

        let catalog = Self::parse(BufReader::new(File::open(path)?))?;

        info!("USB IDs loaded; {} vendor(s) known", catalog.len());
        Ok(catalog)
    }

    /// Parses the vendor/product section of a `usb.ids` database.
    ///
    /// Vendors sit at the start of a line, and their products follow on lines indented by a
    /// single tab; each is four hex digits, whitespace, then a name. Interfaces (two tabs),
    /// comments and blank lines are skipped, as is anything we can't make sense of.
    pub fn parse(mut reader: impl BufRead) -> Result<Self, CatalogError> {
        let mut vendors = HashMap::new();
        let mut current: Option<(u16, Vendor)> = None;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }

            // usb.ids isn't always valid UTF-8; a stray Latin-1 byte shouldn't cost us the file.
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end();

            if line == END_OF_IDS {
                break;
            }
            if line.is_empty() || line.starts_with('#') || line.starts_with("\t\t") {
                continue;
            }

            if let Some(product_line) = line.strip_prefix('\t') {
                // Products belong to the vendor above them.
                let Some((_, vendor)) = current.as_mut() else {
                    debug!("skipping product line with no vendor: {:?}", line);
                    continue;
                };

                match parse_entry(product_line) {
                    Some((product_id, name)) => {
                        vendor.products.insert(product_id, name.to_string());
                    }
                    None => debug!("skipping unreadable product line: {:?}", line),
                }
                continue;
            }

            // Anything else starts a new vendor, so file away the one we were building.
            let Some((vendor_id, name)) = parse_entry(line) else {
                // Its products mustn't end up under the previous vendor.
                if let Some((id, finished)) = current.take() {
                    vendors.insert(id, finished);
                }
                debug!("skipping unreadable vendor line: {:?}", line);
                continue;
            };

            let vendor = Vendor {
                name: name.to_string(),
                products: HashMap::new(),
            };
            if let Some((id, finished)) = current.replace((vendor_id, vendor)) {
                vendors.insert(id, finished);
            }
        }

        // ... and the last one.
        if let Some((id, finished)) = current {
            vendors.insert(id, finished);
        }

        Ok(Self { vendors })
    }

    /// Returns a description of the given device, e.g. `Logitech, Inc., Unifying Receiver`,
    /// or None if we don't know its vendor.
    pub fn lookup(&self, vendor_id: u16, product_id: u16) -> Option<String> {
        let vendor = self.vendors.get(&vendor_id)?;
        let product = vendor
            .products
            .get(&product_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_PRODUCT);

        Some(format!("{}, {}", vendor.name, product))
    }

    /// Shorthand for [IdentifierCatalog::lookup] on an identity.
    pub fn describe(&self, identity: &DeviceIdentity) -> Option<String> {
        self.lookup(identity.vendor_id, identity.product_id)
    }

    /// Returns the name of the given vendor, if we know it.
    pub fn vendor_name(&self, vendor_id: u16) -> Option<&str> {
        self.vendors.get(&vendor_id).map(|vendor| vendor.name.as_str())
    }

    /// Returns the number of vendors in the catalog.
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

/// Splits a `xxxx  Name` entry into its ID and name.
fn parse_entry(entry: &str) -> Option<(u16, &str)> {
    let (id, name) = entry.split_once(char::is_whitespace)?;
    if id.len() != 4 {
        return None;
    }

    let id = u16::from_str_radix(id, 16).ok()?;
    Some((id, name.trim_start()))
}
