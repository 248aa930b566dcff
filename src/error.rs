//! Every error that can occur while enumerating devices.

/// Alias to simplify implementing the results of usbwatch functions.
pub type UsbResult<T> = Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The OS refused to open an enumeration session for the device-interface class.
    SessionOpenFailed(i64),

    /// Stepping to the next interface entry failed with something other than "no more items".
    EnumerationFailed(i64),

    /// The sizing probe or the sized fetch of a device path failed.
    PathRetrievalFailed(i64),

    /// A device path carried the vid_/pid_ markers, but not four hex digits after them.
    MalformedIdentity(String),

    /// There's no enumeration backend for the platform we were built for.
    UnsupportedPlatform,
}

impl Error {
    /// Returns the raw OS status code behind this error, if there is one.
    pub fn os_code(&self) -> Option<i64> {
        use Error::*;

        match self {
            SessionOpenFailed(code) | EnumerationFailed(code) | PathRetrievalFailed(code) => {
                Some(*code)
            }
            MalformedIdentity(_) | UnsupportedPlatform => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Error::*;

        match self {
            SessionOpenFailed(code) => {
                write!(f, "could not open an enumeration session, error code 0x{:x}", code)?
            }
            EnumerationFailed(code) => {
                write!(f, "could not enumerate device interfaces, error code 0x{:x}", code)?
            }
            PathRetrievalFailed(code) => {
                write!(f, "could not retrieve a device path, error code 0x{:x}", code)?
            }
            MalformedIdentity(path) => {
                write!(f, "malformed vendor/product id in device path {:?}", path)?
            }
            UnsupportedPlatform => write!(f, "device enumeration isn't supported on this platform")?,
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
