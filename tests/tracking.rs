//! End-to-end tests: a simulated device registry, driven through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use usbwatch::backend::{Backend, InterfaceSession};
use usbwatch::{DeviceIdentity, Error, Host, IdentifierCatalog, Tracker, UsbResult};

const USB_IDS: &str = "\
# usb.ids excerpt
046d  Logitech, Inc.
\tc52b  Unifying Receiver
1234  Example Corp.
";

/// Shared state for a simulated registry: what's plugged in, and how many sessions are open.
#[derive(Debug, Default)]
struct Registry {
    paths: RefCell<Vec<String>>,
    open_sessions: Cell<usize>,
    fail_next_open: Cell<bool>,
}

impl Registry {
    fn plug(&self, vendor_id: u16, product_id: u16) {
        let instance = self.paths.borrow().len();
        let path = format!(
            r"\\?\usb#vid_{:04x}&pid_{:04x}#{}#{{a5dcbf10-6530-11d2-901f-00c04fb951ed}}",
            vendor_id, product_id, instance
        );
        self.paths.borrow_mut().push(path);
    }

    fn unplug(&self, vendor_id: u16, product_id: u16) {
        let marker = format!("vid_{:04x}&pid_{:04x}", vendor_id, product_id);
        self.paths.borrow_mut().retain(|path| !path.contains(&marker));
    }
}

#[derive(Debug)]
struct SimulatedBackend(Rc<Registry>);

struct SimulatedSession {
    registry: Rc<Registry>,
    paths: Vec<String>,
    selected: usize,
}

impl Backend for SimulatedBackend {
    fn open_session(&self) -> UsbResult<Box<dyn InterfaceSession>> {
        if self.0.fail_next_open.replace(false) {
            return Err(Error::SessionOpenFailed(0x5));
        }

        self.0.open_sessions.set(self.0.open_sessions.get() + 1);
        Ok(Box::new(SimulatedSession {
            registry: Rc::clone(&self.0),
            paths: self.0.paths.borrow().clone(),
            selected: 0,
        }))
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.registry
            .open_sessions
            .set(self.registry.open_sessions.get() - 1);
    }
}

impl InterfaceSession for SimulatedSession {
    fn select_interface(&mut self, index: u32) -> UsbResult<bool> {
        self.selected = index as usize;
        Ok(self.selected < self.paths.len())
    }

    fn device_path_length(&mut self) -> UsbResult<usize> {
        Ok((self.paths[self.selected].encode_utf16().count() + 1) * 2 + 4)
    }

    fn device_path(&mut self, length: usize) -> UsbResult<String> {
        let path = &self.paths[self.selected];
        assert_eq!(length, (path.encode_utf16().count() + 1) * 2 + 4);
        Ok(path.clone())
    }
}

fn simulated_host() -> (Host, Rc<Registry>) {
    let registry = Rc::new(Registry::default());
    let host = Host::new_from_backend(Rc::new(SimulatedBackend(Rc::clone(&registry)))).unwrap();
    (host, registry)
}

#[test]
fn tracks_devices_coming_and_going() {
    let (host, registry) = simulated_host();
    let catalog = IdentifierCatalog::parse(USB_IDS.as_bytes()).unwrap();
    registry.plug(0x046d, 0xc52b);

    let mut tracker = Tracker::new(host, catalog, Vec::new());
    tracker.list().unwrap();

    // Nothing changes...
    assert_eq!(tracker.poll().unwrap(), None);

    // ... something arrives ...
    registry.plug(0x1234, 0x5678);
    let diff = tracker.poll().unwrap().unwrap();
    assert_eq!(diff.added, vec![DeviceIdentity::new(0x1234, 0x5678)]);
    assert!(diff.removed.is_empty());

    // ... and something leaves.
    registry.unplug(0x046d, 0xc52b);
    let diff = tracker.poll().unwrap().unwrap();
    assert!(diff.added.is_empty());
    assert_eq!(diff.removed, vec![DeviceIdentity::new(0x046d, 0xc52b)]);

    assert_eq!(registry.open_sessions.get(), 0);
    assert_eq!(
        String::from_utf8(tracker.into_output()).unwrap(),
        "Installed devices:\n\
         046d:c52b Logitech, Inc., Unifying Receiver\n\
         Added devices:\n\
         1234:5678 Example Corp., Unknown device\n\
         \n\
         Removed devices:\n\
         046d:c52b Logitech, Inc., Unifying Receiver\n\
         \n"
    );
}

#[test]
fn a_failed_session_does_not_stop_tracking() {
    let (host, registry) = simulated_host();
    registry.plug(0x046d, 0xc52b);

    let mut tracker = Tracker::new(host, IdentifierCatalog::default(), Vec::new());
    tracker.list().unwrap();

    registry.fail_next_open.set(true);
    assert_eq!(tracker.poll().unwrap(), None);

    registry.plug(0x1234, 0x5678);
    let diff = tracker.poll().unwrap().unwrap();
    assert_eq!(diff.added, vec![DeviceIdentity::new(0x1234, 0x5678)]);
}

#[test]
fn a_failed_session_is_reported_with_an_empty_snapshot() {
    let (host, registry) = simulated_host();
    registry.plug(0x046d, 0xc52b);
    registry.fail_next_open.set(true);

    let enumeration = host.enumerate();
    assert!(enumeration.snapshot.is_empty());
    assert_eq!(enumeration.error, Some(Error::SessionOpenFailed(0x5)));
    assert_eq!(host.all_devices().unwrap().len(), 1);
}

#[test]
fn back_to_back_enumerations_agree() {
    let (host, registry) = simulated_host();
    registry.plug(0x046d, 0xc52b);
    registry.plug(0x1234, 0x5678);
    registry.plug(0x1234, 0x5678);

    let first = host.all_devices().unwrap();
    let second = host.all_devices().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(registry.open_sessions.get(), 0);
}

#[cfg(not(windows))]
#[test]
fn other_platforms_have_no_default_backend() {
    assert_eq!(Host::new().unwrap_err(), Error::UnsupportedPlatform);
    assert_eq!(usbwatch::all_devices(), Err(Error::UnsupportedPlatform));
}
