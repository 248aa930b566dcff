//! usbwatch -- lists the USB devices attached to a host, and keeps track of them coming and going.

pub use catalog::IdentifierCatalog;
pub use device::DeviceIdentity;
pub use error::{Error, UsbResult};
pub use host::{all_devices, enumerate, Enumeration, Host};
pub use snapshot::{DeviceSnapshot, SnapshotDiff};
pub use tracker::{Mode, Tracker};

pub mod backend;
pub mod catalog;
pub mod device;
pub mod error;
pub mod host;
pub mod report;
pub mod snapshot;
pub mod tracker;
