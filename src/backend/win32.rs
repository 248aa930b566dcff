//! Core, low-level functionality for Windows, by way of SetupAPI.

use std::mem::size_of;

use log::trace;
use windows::core::GUID;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiEnumDeviceInterfaces, SetupDiGetDeviceInterfaceDetailW, SP_DEVICE_INTERFACE_DATA,
};
use windows::Win32::Foundation::{
    ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_PARAMETER, ERROR_NO_MORE_ITEMS,
};

use super::{Backend, InterfaceSession};
use crate::error::{Error, UsbResult};

mod setupapi;

use setupapi::{is_win32_error, os_code, DetailBuffer, DeviceInfoSet, GUID_DEVINTERFACE_USB_DEVICE};

/// Per-OS data for the Windows backend.
#[derive(Debug)]
pub struct Win32Backend {
    /// The device-interface class we enumerate.
    interface_class: GUID,
}

impl Win32Backend {
    pub fn new() -> UsbResult<Win32Backend> {
        Ok(Win32Backend {
            interface_class: GUID_DEVINTERFACE_USB_DEVICE,
        })
    }
}

impl Backend for Win32Backend {
    fn open_session(&self) -> UsbResult<Box<dyn InterfaceSession>> {
        let devices = DeviceInfoSet::open(&self.interface_class)?;

        Ok(Box::new(Win32Session {
            devices,
            interface_class: self.interface_class,
            selected: None,
        }))
    }
}

/// An open SetupAPI enumeration; the information set is destroyed when this is dropped.
struct Win32Session {
    devices: DeviceInfoSet,
    interface_class: GUID,

    /// The interface picked by the last successful `select_interface`.
    selected: Option<SP_DEVICE_INTERFACE_DATA>,
}

impl Win32Session {
    /// Returns the selected interface, or an error if nothing's selected.
    fn selected(&self) -> UsbResult<SP_DEVICE_INTERFACE_DATA> {
        self.selected
            .ok_or(Error::PathRetrievalFailed(ERROR_INVALID_PARAMETER.0 as i64))
    }
}

impl InterfaceSession for Win32Session {
    fn select_interface(&mut self, index: u32) -> UsbResult<bool> {
        self.selected = None;

        let mut interface = SP_DEVICE_INTERFACE_DATA {
            cbSize: size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
            ..Default::default()
        };

        let result = unsafe {
            SetupDiEnumDeviceInterfaces(
                self.devices.get(),
                None,
                &self.interface_class,
                index,
                &mut interface,
            )
        };

        match result {
            Ok(()) => {
                self.selected = Some(interface);
                Ok(true)
            }

            // Running off the end of the list is how we know we're done.
            Err(e) if is_win32_error(&e, ERROR_NO_MORE_ITEMS) => Ok(false),
            Err(e) => Err(Error::EnumerationFailed(os_code(&e))),
        }
    }

    fn device_path_length(&mut self) -> UsbResult<usize> {
        let interface = self.selected()?;
        let mut required: u32 = 0;

        // Ask for the details with no buffer at all; SetupAPI should refuse, and tell us
        // how large the buffer needs to be.
        let result = unsafe {
            SetupDiGetDeviceInterfaceDetailW(
                self.devices.get(),
                &interface,
                None,
                0,
                Some(&mut required as *mut u32),
                None,
            )
        };

        match result {
            Err(e) if is_win32_error(&e, ERROR_INSUFFICIENT_BUFFER) && required != 0 => {
                trace!("device path for interface needs {} bytes", required);
                Ok(required as usize)
            }
            Err(e) => Err(Error::PathRetrievalFailed(os_code(&e))),

            // Succeeding with an empty buffer means there's no path for us to read.
            Ok(()) => Err(Error::PathRetrievalFailed(ERROR_INSUFFICIENT_BUFFER.0 as i64)),
        }
    }

    fn device_path(&mut self, length: usize) -> UsbResult<String> {
        let interface = self.selected()?;
        let insufficient = Error::PathRetrievalFailed(ERROR_INSUFFICIENT_BUFFER.0 as i64);

        let mut buffer = DetailBuffer::new(length).ok_or_else(|| insufficient.clone())?;
        let buffer_size = u32::try_from(buffer.len()).map_err(|_| insufficient)?;

        unsafe {
            SetupDiGetDeviceInterfaceDetailW(
                self.devices.get(),
                &interface,
                Some(buffer.as_mut_ptr()),
                buffer_size,
                None,
                None,
            )
        }
        .map_err(|e| Error::PathRetrievalFailed(os_code(&e)))?;

        Ok(buffer.device_path())
    }
}
