pub mod classify;
pub mod decode;
pub mod error;
pub mod model;
pub mod sequence;
pub mod target;

use time::format_description::well_known::Rfc3339;

pub use error::{DecodeError, DeviceError, FatalError, OsStatus};
pub use model::{
    DiskGeometry, DiskReport, DriveLayout, LayoutStyle, MediaKind, PartitionEntry, PartitionKind,
    PartitionStyle, ProbeRow, ReportBody, VolumeExtent, REPORT_SCHEMA_VERSION,
};
pub use sequence::{collect_report, probe_partitions, DeviceOpener, DiskDevice, ScanMode};
pub use target::{resolve_target, DriveIndex, DriveLetter, Target, TargetError};

pub fn now_utc_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
