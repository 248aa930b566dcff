//! Point-in-time lists of attached devices, and the differences between them.

use crate::device::DeviceIdentity;

/// Every device identity seen in one enumeration pass, in the order the OS reported them.
///
/// The same identity can appear more than once, when several attached devices share a VID:PID.
/// Comparing snapshots with `==` is list equality, so a reordering counts as a change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    devices: Vec<DeviceIdentity>,
}

impl DeviceSnapshot {
    pub fn new(devices: Vec<DeviceIdentity>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[DeviceIdentity] {
        &self.devices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceIdentity> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn contains(&self, identity: &DeviceIdentity) -> bool {
        self.devices.contains(identity)
    }

    /// Computes what changed between this snapshot and a newer one.
    pub fn diff(&self, newer: &DeviceSnapshot) -> SnapshotDiff {
        // Anything we had that the newer snapshot doesn't know about was removed...
        let removed = self
            .iter()
            .filter(|device| !newer.contains(device))
            .copied()
            .collect();

        // ... and anything it has that we didn't was added.
        let added = newer
            .iter()
            .filter(|device| !self.contains(device))
            .copied()
            .collect();

        SnapshotDiff { added, removed }
    }
}

impl FromIterator<DeviceIdentity> for DeviceSnapshot {
    fn from_iter<I: IntoIterator<Item = DeviceIdentity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DeviceSnapshot {
    type Item = &'a DeviceIdentity;
    type IntoIter = std::slice::Iter<'a, DeviceIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Devices that appeared or disappeared between two snapshots.
///
/// This is a membership test, not a multiset subtraction: plugging in a second unit of a model
/// that's already attached shows up in neither list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Identities present only in the newer snapshot, in its order.
    pub added: Vec<DeviceIdentity>,

    /// Identities present only in the older snapshot, in its order.
    pub removed: Vec<DeviceIdentity>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIVER: DeviceIdentity = DeviceIdentity::new(0x046d, 0xc52b);
    const GADGET: DeviceIdentity = DeviceIdentity::new(0x1234, 0x5678);
    const HUB: DeviceIdentity = DeviceIdentity::new(0x05e3, 0x0610);

    fn snapshot(devices: &[DeviceIdentity]) -> DeviceSnapshot {
        devices.iter().copied().collect()
    }

    #[test]
    fn insertion_shows_up_as_added() {
        let diff = snapshot(&[RECEIVER]).diff(&snapshot(&[RECEIVER, GADGET]));
        assert_eq!(diff.added, vec![GADGET]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn removal_shows_up_as_removed() {
        let diff = snapshot(&[RECEIVER, GADGET]).diff(&snapshot(&[GADGET]));
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, vec![RECEIVER]);
    }

    #[test]
    fn identical_snapshots_have_an_empty_diff() {
        let devices = snapshot(&[RECEIVER, GADGET, HUB]);
        assert!(devices.diff(&devices.clone()).is_empty());
        assert!(DeviceSnapshot::default().diff(&DeviceSnapshot::default()).is_empty());
    }

    #[test]
    fn diff_is_symmetric() {
        let cases = [
            (snapshot(&[RECEIVER]), snapshot(&[RECEIVER, GADGET])),
            (snapshot(&[RECEIVER, HUB]), snapshot(&[GADGET])),
            (snapshot(&[]), snapshot(&[HUB, HUB])),
            (snapshot(&[GADGET, RECEIVER, HUB]), snapshot(&[HUB, GADGET])),
        ];

        for (a, b) in cases {
            let forward = a.diff(&b);
            let backward = b.diff(&a);
            assert_eq!(forward.added, backward.removed);
            assert_eq!(forward.removed, backward.added);
        }
    }

    #[test]
    fn results_keep_source_order() {
        let diff = snapshot(&[HUB, RECEIVER]).diff(&snapshot(&[GADGET, DeviceIdentity::UNKNOWN]));
        assert_eq!(diff.removed, vec![HUB, RECEIVER]);
        assert_eq!(diff.added, vec![GADGET, DeviceIdentity::UNKNOWN]);
    }

    #[test]
    fn duplicates_are_a_membership_test() {
        // A second unit of an already-attached model isn't an addition.
        let diff = snapshot(&[RECEIVER]).diff(&snapshot(&[RECEIVER, RECEIVER]));
        assert!(diff.is_empty());

        // Losing every unit of a duplicated model reports each one that was listed.
        let diff = snapshot(&[RECEIVER, RECEIVER, GADGET]).diff(&snapshot(&[GADGET]));
        assert_eq!(diff.removed, vec![RECEIVER, RECEIVER]);
    }

    #[test]
    fn reordering_is_a_change_with_an_empty_diff() {
        let before = snapshot(&[RECEIVER, GADGET]);
        let after = snapshot(&[GADGET, RECEIVER]);
        assert_ne!(before, after);
        assert!(before.diff(&after).is_empty());
    }
}
