//! Text output for device lists and the changes between them.

use std::io::{self, Write};

use crate::catalog::IdentifierCatalog;
use crate::device::DeviceIdentity;
use crate::snapshot::{DeviceSnapshot, SnapshotDiff};

/// Writes one device as `vvvv:pppp`, followed by its description if the catalog has one.
pub fn write_device(
    out: &mut impl Write,
    identity: &DeviceIdentity,
    catalog: &IdentifierCatalog,
) -> io::Result<()> {
    match catalog.describe(identity) {
        Some(description) => writeln!(out, "{} {}", identity, description),
        None => writeln!(out, "{}", identity),
    }
}

/// Writes one line per device.
pub fn write_devices<'a>(
    out: &mut impl Write,
    devices: impl IntoIterator<Item = &'a DeviceIdentity>,
    catalog: &IdentifierCatalog,
) -> io::Result<()> {
    for identity in devices {
        write_device(out, identity, catalog)?;
    }
    Ok(())
}

/// Writes the initial device listing, under an `Installed devices:` header.
pub fn write_listing(
    out: &mut impl Write,
    snapshot: &DeviceSnapshot,
    catalog: &IdentifierCatalog,
) -> io::Result<()> {
    writeln!(out, "Installed devices:")?;
    write_devices(out, snapshot, catalog)
}

/// Writes the added and removed sections of a diff -- each only if it has anything in it --
/// followed by a blank separator line.
pub fn write_diff(
    out: &mut impl Write,
    diff: &SnapshotDiff,
    catalog: &IdentifierCatalog,
) -> io::Result<()> {
    if !diff.added.is_empty() {
        writeln!(out, "Added devices:")?;
        write_devices(out, &diff.added, catalog)?;
    }
    if !diff.removed.is_empty() {
        writeln!(out, "Removed devices:")?;
        write_devices(out, &diff.removed, catalog)?;
    }
    writeln!(out)
}
