//! Abstraction over the OS/host's USB device registry.

use std::rc::Rc;

use log::{debug, error, trace};

use crate::backend::{create_default_backend, Backend, InterfaceSession};
use crate::device::DeviceIdentity;
use crate::error::{Error, UsbResult};
use crate::snapshot::DeviceSnapshot;

/// Representation of a USB host: that is, the thing (e.g. the OS) that knows which USB
/// devices are attached. This is typically an encapsulation of your OS connection.
#[derive(Debug)]
pub struct Host {
    /// The backend used to provide the functions for this Host.
    backend: Rc<dyn Backend>,
}

/// The outcome of one enumeration pass.
///
/// Enumeration never fails outright: when the OS gives up part-way through, we keep every
/// device we managed to identify, and note what went wrong alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Every device identified before the scan ended.
    pub snapshot: DeviceSnapshot,

    /// Why the scan ended early, if it did.
    pub error: Option<Error>,
}

impl Enumeration {
    /// Returns true iff every interface the OS offered was scanned.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true iff we never got as far as opening an enumeration session.
    pub fn session_failed(&self) -> bool {
        matches!(self.error, Some(Error::SessionOpenFailed(_)))
    }

    /// Converts this into a Result, discarding any partial snapshot on error.
    pub fn into_result(self) -> UsbResult<DeviceSnapshot> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.snapshot),
        }
    }
}

impl Host {
    /// Creates a new Host, using the backend appropriate for the current platform.
    pub fn new() -> UsbResult<Self> {
        let backend = create_default_backend()?;
        Self::new_from_backend(backend)
    }

    /// Creates a new Host, from a custom backend; this allows the library to be
    /// used in contexts we don't yet support, and lets tests stand in for the OS.
    ///
    /// Most of the time, you want [Host::new].
    pub fn new_from_backend(backend: Rc<dyn Backend>) -> UsbResult<Self> {
        Ok(Host { backend })
    }

    /// Takes a snapshot of every USB device currently attached to the system.
    ///
    /// Failures are logged and reported in the returned [Enumeration], never propagated;
    /// the OS session is always closed before this returns.
    pub fn enumerate(&self) -> Enumeration {
        let mut devices: Vec<DeviceIdentity> = vec![];

        // Open a session over the device-interface registry...
        let mut session = match self.backend.open_session() {
            Ok(session) => session,
            Err(e) => {
                error!("{}", e);
                return Enumeration {
                    snapshot: DeviceSnapshot::default(),
                    error: Some(e),
                };
            }
        };

        // ... walk it ...
        let result = scan_interfaces(session.as_mut(), &mut devices);

        // ... and close it before anyone sees the results.
        drop(session);

        if let Err(e) = &result {
            error!("{}; keeping the {} device(s) found so far", e, devices.len());
        }

        Enumeration {
            snapshot: DeviceSnapshot::new(devices),
            error: result.err(),
        }
    }

    /// Returns all devices currently connected to the system, or the first error encountered.
    pub fn all_devices(&self) -> UsbResult<DeviceSnapshot> {
        self.enumerate().into_result()
    }
}

/// Walks every interface in an open session, identifying each device as we go.
///
/// Identities are pushed onto `devices` as they're found, so a failure part-way through
/// leaves everything before it in place.
fn scan_interfaces(
    session: &mut dyn InterfaceSession,
    devices: &mut Vec<DeviceIdentity>,
) -> UsbResult<()> {
    for index in 0..=u32::MAX {
        if !session.select_interface(index)? {
            trace!("enumeration exhausted after {} interface(s)", index);
            return Ok(());
        }

        // Find out how long the device path is, and then fetch exactly that much of it.
        let length = session.device_path_length()?;
        let path = session.device_path(length)?;

        let identity = match DeviceIdentity::from_device_path(&path)? {
            Some(identity) => identity,
            None => {
                debug!("no vid_/pid_ markers in device path {:?}", path);
                DeviceIdentity::UNKNOWN
            }
        };

        trace!("interface {}: {} ({})", index, identity, path);
        devices.push(identity);
    }

    Ok(())
}

/// Takes a snapshot of every USB device currently attached to the system.
/// Convenience form that implicitly constructs (and destroys) a Host object.
pub fn enumerate() -> UsbResult<Enumeration> {
    Ok(Host::new()?.enumerate())
}

/// Returns all devices currently connected to the system.
/// Convenience form that implicitly constructs (and destroys) a Host object.
pub fn all_devices() -> UsbResult<DeviceSnapshot> {
    Host::new()?.all_devices()
}
