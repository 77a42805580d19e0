use tracing::{debug, warn};

use crate::error::{DeviceError, FatalError, OsStatus};
use crate::model::{
    DiskGeometry, DiskReport, DriveLayout, PartitionEntry, ProbeRow, ReportBody, VolumeExtent,
};
use crate::target::{partition_device_path, DriveIndex, Target, MAX_PARTITION_PROBES};

pub const OP_GEOMETRY: &str = "IOCTL_DISK_GET_DRIVE_GEOMETRY_EX";
pub const OP_LAYOUT: &str = "IOCTL_DISK_GET_DRIVE_LAYOUT_EX";
pub const OP_PARTITION_INFO: &str = "IOCTL_DISK_GET_PARTITION_INFO_EX";
pub const OP_EXTENTS: &str = "IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS";
pub const OP_IS_DYNAMIC: &str = "IOCTL_VOLUME_IS_DYNAMIC";

/// An open device. Dropping it releases the underlying handle.
pub trait DiskDevice {
    fn geometry(&self) -> Result<DiskGeometry, DeviceError>;
    fn drive_layout(&self) -> Result<DriveLayout, DeviceError>;
    fn partition_info(&self) -> Result<PartitionEntry, DeviceError>;
    fn volume_extents(&self) -> Result<Vec<VolumeExtent>, DeviceError>;
    fn is_dynamic(&self) -> Result<bool, DeviceError>;
}

pub trait DeviceOpener {
    type Device: DiskDevice;

    /// Opens `path` for shared read access.
    fn open(&self, path: &str) -> Result<Self::Device, OsStatus>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// One layout query plus the volume extent and dynamic volume queries.
    #[default]
    Layout,
    /// Open every `Harddisk<n>\Partition<i>` sub-device in turn.
    ProbePartitions,
}

pub fn collect_report<O: DeviceOpener>(
    opener: &O,
    target: &Target,
    mode: ScanMode,
) -> Result<DiskReport, FatalError> {
    let probe_disk = match mode {
        ScanMode::ProbePartitions => Some(
            target
                .drive_index()
                .cloned()
                .ok_or_else(|| FatalError::ProbeNeedsDriveIndex(target.device_path()))?,
        ),
        ScanMode::Layout => None,
    };

    let device_path = target.device_path();
    debug!(path = %device_path, "opening device");
    let device = opener.open(&device_path).map_err(|status| FatalError::Open {
        path: device_path.clone(),
        status,
    })?;

    debug!(op = OP_GEOMETRY, "querying");
    let geometry = device.geometry().map_err(FatalError::Geometry)?;

    let body = match probe_disk {
        Some(disk) => {
            drop(device);
            ReportBody::Probed {
                rows: probe_partitions(opener, &disk),
            }
        }
        None => ReportBody::Layout {
            layout: optional(OP_LAYOUT, device.drive_layout()),
            extents: optional(OP_EXTENTS, device.volume_extents()),
            dynamic: optional(OP_IS_DYNAMIC, device.is_dynamic()),
        },
    };

    Ok(DiskReport {
        target: target.clone(),
        device_path,
        geometry,
        body,
    })
}

fn optional<T>(op: &'static str, result: Result<T, DeviceError>) -> Result<T, DeviceError> {
    debug!(op, ok = result.is_ok(), "query finished");
    if let Err(err) = &result {
        warn!(op, error = %err, "optional query failed");
    }
    result
}

/// Opens partition sub-devices 1..=256 until one reports `FILE_NOT_FOUND`.
/// Any other open failure is recorded and the scan moves on. Each handle is
/// released before the next index is tried.
pub fn probe_partitions<O: DeviceOpener>(opener: &O, disk: &DriveIndex) -> Vec<ProbeRow> {
    let mut rows = Vec::new();

    for index in 1..=MAX_PARTITION_PROBES {
        let path = partition_device_path(disk, index);
        let device = match opener.open(&path) {
            Ok(device) => device,
            Err(OsStatus::FILE_NOT_FOUND) => {
                debug!(%path, "no more partitions");
                break;
            }
            Err(status) => {
                warn!(%path, %status, "failed to open partition");
                rows.push(ProbeRow::OpenFailed { index, status });
                continue;
            }
        };

        let row = match device.partition_info() {
            Ok(entry) => ProbeRow::Partition(entry),
            Err(error) => {
                warn!(%path, %error, "partition query failed");
                ProbeRow::QueryFailed { index, error }
            }
        };
        drop(device);
        rows.push(row);
    }

    rows
}
