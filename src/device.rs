//! Identities of USB devices, and extracting them from OS device paths.

use crate::error::{Error, UsbResult};

/// Marker that precedes the vendor ID in a device path.
const VENDOR_MARKER: &str = "vid_";

/// Marker that precedes the product ID in a device path.
const PRODUCT_MARKER: &str = "pid_";

/// Number of hex digits following each marker.
const ID_DIGITS: usize = 4;

/// The (vendor, product) pair that identifies a device model -- not a specific physical unit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceIdentity {
    /// The Vendor ID (idVendor) assigned to the device.
    pub vendor_id: u16,

    /// The Product ID (idProduct) associated with the device.
    pub product_id: u16,
}

impl DeviceIdentity {
    /// Placeholder identity for devices whose path carried no vid_/pid_ markers.
    ///
    /// This is also a perfectly valid-looking VID:PID, so use [DeviceIdentity::is_unknown]
    /// rather than assuming a real device can never report it.
    pub const UNKNOWN: Self = Self::new(0, 0);

    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Returns true iff this is the placeholder used for unidentifiable devices.
    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }

    /// Extracts a device's identity from an OS device path, e.g.
    /// `\\?\usb#vid_046d&pid_c52b#5&2e8d0ad4&0&2#{a5dcbf10-6530-11d2-901f-00c04fb951ed}`.
    ///
    /// Returns `Ok(None)` if either marker is missing, which is normal for some hubs and
    /// composite children; and an error if the markers are present but aren't followed by
    /// four hex digits.
    pub fn from_device_path(path: &str) -> UsbResult<Option<Self>> {
        let (vendor_position, product_position) =
            match (path.find(VENDOR_MARKER), path.find(PRODUCT_MARKER)) {
                (Some(vendor), Some(product)) => (vendor, product),
                _ => return Ok(None),
            };

        let vendor_id = parse_id_after(path, vendor_position + VENDOR_MARKER.len())?;
        let product_id = parse_id_after(path, product_position + PRODUCT_MARKER.len())?;

        Ok(Some(Self::new(vendor_id, product_id)))
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Parses the hex ID that starts at `start` in the given path.
fn parse_id_after(path: &str, start: usize) -> UsbResult<u16> {
    // NOTE: `get` rather than indexing; a truncated path or one with multi-byte characters
    // right after the marker should be an error, not a panic.
    path.get(start..start + ID_DIGITS)
        .and_then(|digits| u16::from_str_radix(digits, 16).ok())
        .ok_or_else(|| Error::MalformedIdentity(path.to_string()))
}
