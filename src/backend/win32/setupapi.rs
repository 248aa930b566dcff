//! Helpers for working with the Win32 SetupAPI.

use std::mem::{offset_of, size_of};

use widestring::{U16CStr, U16Str};
use windows::core::{Error as WindowsError, GUID, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiGetClassDevsW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT,
    HDEVINFO, SP_DEVICE_INTERFACE_DETAIL_DATA_W,
};
use windows::Win32::Foundation::{ERROR_INVALID_HANDLE, WIN32_ERROR};

use log::warn;

use crate::error::{Error, UsbResult};

/// The USB device interface class, `GUID_DEVINTERFACE_USB_DEVICE`.
pub(crate) const GUID_DEVINTERFACE_USB_DEVICE: GUID =
    GUID::from_u128(0xa5dcbf10_6530_11d2_901f_00c04fb951ed);

/// Converts a windows-rs error into the status code we report.
///
/// SetupAPI reports failures through GetLastError, which windows-rs wraps up into an HRESULT;
/// we unwrap it again where we can, so codes read like e.g. 0x103 rather than 0x80070103.
pub(crate) fn os_code(error: &WindowsError) -> i64 {
    match WIN32_ERROR::from_error(error) {
        Some(code) => code.0 as i64,
        None => error.code().0 as u32 as i64,
    }
}

/// Returns true iff the given error carries the given Win32 error code.
pub(crate) fn is_win32_error(error: &WindowsError, code: WIN32_ERROR) -> bool {
    WIN32_ERROR::from_error(error) == Some(code)
}

/// Wrapper for a SetupAPI device information set that automatically destroys it.
#[derive(Debug)]
pub(crate) struct DeviceInfoSet {
    handle: HDEVINFO,
}

impl DeviceInfoSet {
    /// Opens an information set over every present device interface in the given class.
    pub(crate) fn open(interface_class: &GUID) -> UsbResult<Self> {
        let handle = unsafe {
            SetupDiGetClassDevsW(
                Some(interface_class as *const GUID),
                PCWSTR::null(),
                None,
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        }
        .map_err(|e| Error::SessionOpenFailed(os_code(&e)))?;

        // windows-rs should have turned INVALID_HANDLE_VALUE into an error for us,
        // but we'd rather not hand a bad handle to anyone.
        if handle.is_invalid() {
            return Err(Error::SessionOpenFailed(ERROR_INVALID_HANDLE.0 as i64));
        }

        Ok(Self { handle })
    }

    /// Fetches the inner handle for passing to SetupAPI functions.
    pub(crate) fn get(&self) -> HDEVINFO {
        self.handle
    }
}

impl Drop for DeviceInfoSet {
    fn drop(&mut self) {
        if let Err(e) = unsafe { SetupDiDestroyDeviceInfoList(self.handle) } {
            warn!("could not destroy device information set: {}", e);
        }
    }
}

/// Variable-length buffer for an SP_DEVICE_INTERFACE_DETAIL_DATA_W.
///
/// The struct is declared with a one-character DevicePath; the real path runs past the end
/// of it, into however many bytes SetupAPI asked for.
pub(crate) struct DetailBuffer {
    /// Backing storage; u32s so the header is suitably aligned.
    words: Vec<u32>,

    /// The size SetupAPI asked for, in bytes.
    length: usize,
}

impl DetailBuffer {
    /// Allocates a buffer of exactly `length` bytes, with its cbSize header filled in.
    /// Returns None if `length` can't even hold the header.
    pub(crate) fn new(length: usize) -> Option<Self> {
        if length < size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() {
            return None;
        }

        let words = vec![0u32; length.div_ceil(size_of::<u32>())];
        let mut buffer = Self { words, length };

        // NOTE: cbSize is the size of the fixed struct, not of the buffer; SetupAPI uses it as
        // a version check. (That's 8 on 64-bit targets and 6 on 32-bit ones, thanks to packing.)
        unsafe {
            let detail = buffer.as_mut_ptr();
            std::ptr::addr_of_mut!((*detail).cbSize)
                .write_unaligned(size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32);
        }

        Some(buffer)
    }

    /// The buffer's size in bytes, exactly as requested.
    pub(crate) fn len(&self) -> usize {
        self.length
    }

    /// Fetches the buffer as a pointer for passing to SetupAPI functions.
    pub(crate) fn as_mut_ptr(&mut self) -> *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W {
        self.words.as_mut_ptr() as *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W
    }

    /// Reads back the device path SetupAPI filled in.
    pub(crate) fn device_path(&self) -> String {
        let offset = offset_of!(SP_DEVICE_INTERFACE_DETAIL_DATA_W, DevicePath);
        let capacity = (self.length - offset) / size_of::<u16>();

        let units = unsafe {
            let start = (self.words.as_ptr() as *const u8).add(offset) as *const u16;
            std::slice::from_raw_parts(start, capacity)
        };

        // The path should be NUL-terminated within the buffer; if it somehow isn't,
        // take everything we were given.
        match U16CStr::from_slice_truncate(units) {
            Ok(path) => path.to_string_lossy(),
            Err(_) => U16Str::from_slice(units).to_string_lossy(),
        }
    }
}
