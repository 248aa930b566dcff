//! Trait and factory for our per-OS backends.
//! Backends can (and will) contain unsafe code, but they expose a safe interface here.

use std::rc::Rc;

use crate::error::UsbResult;

#[cfg(not(windows))]
use crate::error::Error;

#[cfg(windows)]
mod win32;

/// Trait that unifies all of our OS-specific backends.
///
/// A backend only knows how to open an enumeration session over the OS's USB device-interface
/// registry; walking that session is done by the [Host](crate::Host), so the same scan logic
/// runs against every backend (and against fakes, in tests).
pub trait Backend: std::fmt::Debug {
    /// Opens a session over every present USB device interface.
    ///
    /// The session owns whatever OS handle backs it, and must release that handle when dropped.
    fn open_session(&self) -> UsbResult<Box<dyn InterfaceSession>>;
}

/// One open walk over the device-interface registry.
///
/// Interfaces are selected by increasing index; the remaining methods act on the interface
/// most recently selected. Fetching a device path is deliberately two calls: one to learn how
/// large the path is, and one to fetch it into a buffer of exactly that size.
pub trait InterfaceSession {
    /// Selects the interface at the given index.
    /// Returns `Ok(false)` once the index runs past the last interface.
    fn select_interface(&mut self, index: u32) -> UsbResult<bool>;

    /// Asks the OS how large the selected interface's device path is, in bytes.
    fn device_path_length(&mut self) -> UsbResult<usize>;

    /// Fetches the selected interface's device path into a buffer of exactly `length` bytes;
    /// `length` should be the value [InterfaceSession::device_path_length] just returned.
    fn device_path(&mut self, length: usize) -> UsbResult<String>;
}

/// Creates a default backend implementation for Windows machines.
#[cfg(windows)]
pub fn create_default_backend() -> UsbResult<Rc<dyn Backend>> {
    Ok(Rc::new(win32::Win32Backend::new()?))
}

/// We don't know how to talk to this platform's device registry, yet.
#[cfg(not(windows))]
pub fn create_default_backend() -> UsbResult<Rc<dyn Backend>> {
    Err(Error::UnsupportedPlatform)
}
