//! Polls the host for devices, and reports whenever the set of attached devices changes.

use std::io::{self, Write};
use std::time::Duration;

use log::{debug, warn};

use crate::catalog::IdentifierCatalog;
use crate::host::Host;
use crate::report;
use crate::snapshot::{DeviceSnapshot, SnapshotDiff};

/// How long we wait between polls, by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the tracker does once it's printed the current devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the attached devices once, and stop.
    Listing,

    /// Print the attached devices, and then keep reporting insertions and removals forever.
    Tracking,
}

/// Holds the last-known device snapshot, and reports changes against it.
pub struct Tracker<W: Write> {
    host: Host,
    catalog: IdentifierCatalog,
    out: W,

    /// Delay between polls while tracking.
    interval: Duration,

    /// The snapshot we'll compare the next poll against.
    previous: DeviceSnapshot,
}

impl<W: Write> Tracker<W> {
    /// Creates a tracker that reports to `out`, describing devices using `catalog`.
    pub fn new(host: Host, catalog: IdentifierCatalog, out: W) -> Self {
        Self {
            host,
            catalog,
            out,
            interval: DEFAULT_POLL_INTERVAL,
            previous: DeviceSnapshot::default(),
        }
    }

    /// Changes the delay between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The snapshot the next poll will be compared against.
    pub fn previous(&self) -> &DeviceSnapshot {
        &self.previous
    }

    /// Gives back the output we've been writing to.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Takes the initial snapshot, and prints it as the list of installed devices.
    pub fn list(&mut self) -> io::Result<()> {
        self.previous = self.host.enumerate().snapshot;
        report::write_listing(&mut self.out, &self.previous, &self.catalog)?;
        self.out.flush()
    }

    /// Re-enumerates once, reporting and returning the difference if anything changed.
    ///
    /// If the device registry can't be opened at all, the poll is skipped: this returns
    /// `Ok(None)` and keeps the previous snapshot, rather than reporting every device as
    /// removed. Scans that fail partway through are still compared as they stand.
    pub fn poll(&mut self) -> io::Result<Option<SnapshotDiff>> {
        let enumeration = self.host.enumerate();

        // If we couldn't even open the registry, we know nothing about what's attached;
        // don't report every device as removed.
        if enumeration.session_failed() {
            warn!("skipping this poll; device registry unavailable");
            return Ok(None);
        }

        let current = enumeration.snapshot;
        if current == self.previous {
            return Ok(None);
        }

        // NOTE: the OS can also reorder devices without adding or removing any; that still
        // counts as a change, and gets reported as an empty diff.
        let diff = self.previous.diff(&current);
        debug!(
            "device list changed: {} added, {} removed",
            diff.added.len(),
            diff.removed.len()
        );

        report::write_diff(&mut self.out, &diff, &self.catalog)?;
        self.out.flush()?;

        self.previous = current;
        Ok(Some(diff))
    }

    /// Lists the attached devices, and then -- if asked to track -- polls forever.
    ///
    /// When tracking, this only returns if writing our output fails.
    pub fn run(&mut self, mode: Mode) -> io::Result<()> {
        self.list()?;

        if mode == Mode::Listing {
            return Ok(());
        }

        writeln!(self.out)?;
        loop {
            self.poll()?;
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::backend::{Backend, InterfaceSession};
    use crate::error::{Error, UsbResult};

    /// Backend that replays a fixed sequence of device-path lists, one per session.
    #[derive(Debug)]
    struct ReplayBackend {
        polls: RefCell<VecDeque<Option<Vec<String>>>>,
    }

    struct ReplaySession {
        paths: Vec<String>,
        selected: usize,
    }

    impl Backend for ReplayBackend {
        fn open_session(&self) -> UsbResult<Box<dyn InterfaceSession>> {
            match self.polls.borrow_mut().pop_front().flatten() {
                Some(paths) => Ok(Box::new(ReplaySession { paths, selected: 0 })),
                None => Err(Error::SessionOpenFailed(0x5)),
            }
        }
    }

    impl InterfaceSession for ReplaySession {
        fn select_interface(&mut self, index: u32) -> UsbResult<bool> {
            self.selected = index as usize;
            Ok(self.selected < self.paths.len())
        }

        fn device_path_length(&mut self) -> UsbResult<usize> {
            Ok(self.paths[self.selected].len())
        }

        fn device_path(&mut self, _length: usize) -> UsbResult<String> {
            Ok(self.paths[self.selected].clone())
        }
    }

    fn path(vid_pid: &str) -> String {
        let (vid, pid) = vid_pid.split_once(':').unwrap();
        format!(r"\\?\usb#vid_{}&pid_{}#1#{{a5dcbf10-6530-11d2-901f-00c04fb951ed}}", vid, pid)
    }

    fn tracker(polls: Vec<Option<Vec<&str>>>) -> Tracker<Vec<u8>> {
        let polls = polls
            .into_iter()
            .map(|poll| poll.map(|devices| devices.into_iter().map(path).collect()))
            .collect();
        let backend = ReplayBackend {
            polls: RefCell::new(polls),
        };
        let host = Host::new_from_backend(Rc::new(backend)).unwrap();
        Tracker::new(host, IdentifierCatalog::default(), Vec::new())
    }

    fn output(tracker: Tracker<Vec<u8>>) -> String {
        String::from_utf8(tracker.into_output()).unwrap()
    }

    #[test]
    fn listing_prints_installed_devices() {
        let mut tracker = tracker(vec![Some(vec!["046d:c52b", "1234:5678"])]);
        tracker.run(Mode::Listing).unwrap();
        assert_eq!(
            output(tracker),
            "Installed devices:\n046d:c52b\n1234:5678\n"
        );
    }

    #[test]
    fn unchanged_polls_report_nothing() {
        let mut tracker = tracker(vec![Some(vec!["046d:c52b"]), Some(vec!["046d:c52b"])]);
        tracker.list().unwrap();
        assert_eq!(tracker.poll().unwrap(), None);
        assert_eq!(output(tracker), "Installed devices:\n046d:c52b\n");
    }

    #[test]
    fn insertions_and_removals_are_reported() {
        let mut tracker = tracker(vec![
            Some(vec!["046d:c52b"]),
            Some(vec!["046d:c52b", "1234:5678"]),
            Some(vec!["1234:5678"]),
        ]);
        tracker.list().unwrap();

        let added = tracker.poll().unwrap().unwrap();
        assert_eq!(added.added.len(), 1);
        let removed = tracker.poll().unwrap().unwrap();
        assert_eq!(removed.removed.len(), 1);

        assert_eq!(
            output(tracker),
            "Installed devices:\n046d:c52b\n\
             Added devices:\n1234:5678\n\n\
             Removed devices:\n046d:c52b\n\n"
        );
    }

    #[test]
    fn reordering_is_reported_as_an_empty_change() {
        let mut tracker = tracker(vec![
            Some(vec!["046d:c52b", "1234:5678"]),
            Some(vec!["1234:5678", "046d:c52b"]),
        ]);
        tracker.list().unwrap();

        assert_eq!(tracker.poll().unwrap(), Some(SnapshotDiff::default()));
        assert_eq!(tracker.previous().len(), 2);
    }

    #[test]
    fn unavailable_registry_keeps_the_previous_snapshot() {
        let mut tracker = tracker(vec![Some(vec!["046d:c52b"]), None, Some(vec!["046d:c52b"])]);
        tracker.list().unwrap();

        assert_eq!(tracker.poll().unwrap(), None);
        assert_eq!(tracker.previous().len(), 1);
        assert_eq!(tracker.poll().unwrap(), None);
    }
}
