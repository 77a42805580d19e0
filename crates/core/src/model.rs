use serde::Serialize;
use uuid::Uuid;

use crate::classify::{gpt_type_label, mbr_type_label};
use crate::error::{DeviceError, OsStatus};
use crate::target::Target;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// GPT attribute bit that hides a basic data partition from mount manager.
pub const GPT_ATTRIBUTE_HIDDEN: u64 = 0x4000_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Removable,
    Fixed,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Removable => "Removable",
            MediaKind::Fixed => "Fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskGeometry {
    pub cylinders: u64,
    pub tracks_per_cylinder: u32,
    pub sectors_per_track: u32,
    pub bytes_per_sector: u32,
    pub media: MediaKind,
    pub disk_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartitionStyle {
    #[serde(rename = "MBR")]
    Mbr,
    #[serde(rename = "GPT")]
    Gpt,
    #[serde(rename = "RAW")]
    Raw,
}

impl PartitionStyle {
    pub fn label(self) -> &'static str {
        match self {
            PartitionStyle::Mbr => "MBR",
            PartitionStyle::Gpt => "GPT",
            PartitionStyle::Raw => "RAW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "UPPERCASE")]
pub enum LayoutStyle {
    Mbr {
        signature: u32,
        checksum: u32,
    },
    Gpt {
        disk_id: Uuid,
        starting_usable_offset: u64,
        usable_length: u64,
        max_partition_count: u32,
    },
    Raw,
}

impl LayoutStyle {
    pub fn style(&self) -> PartitionStyle {
        match self {
            LayoutStyle::Mbr { .. } => PartitionStyle::Mbr,
            LayoutStyle::Gpt { .. } => PartitionStyle::Gpt,
            LayoutStyle::Raw => PartitionStyle::Raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "UPPERCASE")]
pub enum PartitionKind {
    Mbr {
        type_code: u8,
        boot: bool,
        recognized: bool,
        hidden_sectors: u32,
    },
    Gpt {
        type_id: Uuid,
        partition_id: Uuid,
        attributes: u64,
        name: String,
    },
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionEntry {
    pub number: u32,
    pub starting_offset: u64,
    pub length: u64,
    pub kind: PartitionKind,
}

impl PartitionEntry {
    pub fn style(&self) -> PartitionStyle {
        match self.kind {
            PartitionKind::Mbr { .. } => PartitionStyle::Mbr,
            PartitionKind::Gpt { .. } => PartitionStyle::Gpt,
            PartitionKind::Raw => PartitionStyle::Raw,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match &self.kind {
            PartitionKind::Mbr { type_code, .. } => mbr_type_label(*type_code),
            PartitionKind::Gpt { type_id, .. } => gpt_type_label(type_id),
            PartitionKind::Raw => "N/A",
        }
    }

    pub fn hidden(&self) -> Option<bool> {
        match &self.kind {
            PartitionKind::Mbr { recognized, .. } => Some(!recognized),
            PartitionKind::Gpt { attributes, .. } => Some(attributes & GPT_ATTRIBUTE_HIDDEN != 0),
            PartitionKind::Raw => None,
        }
    }

    pub fn boot(&self) -> Option<bool> {
        match &self.kind {
            PartitionKind::Mbr { boot, .. } => Some(*boot),
            PartitionKind::Gpt { .. } | PartitionKind::Raw => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveLayout {
    pub style: LayoutStyle,
    pub partitions: Vec<PartitionEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeExtent {
    pub disk_number: u32,
    pub starting_offset: u64,
    pub length: u64,
}

/// One row of the per-partition probe of a physical drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeRow {
    Partition(PartitionEntry),
    OpenFailed { index: u32, status: OsStatus },
    QueryFailed { index: u32, error: DeviceError },
}

impl ProbeRow {
    pub fn index(&self) -> u32 {
        match self {
            ProbeRow::Partition(entry) => entry.number,
            ProbeRow::OpenFailed { index, .. } | ProbeRow::QueryFailed { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportBody {
    Layout {
        #[serde(with = "section")]
        layout: Result<DriveLayout, DeviceError>,
        #[serde(with = "section")]
        extents: Result<Vec<VolumeExtent>, DeviceError>,
        #[serde(with = "section")]
        dynamic: Result<bool, DeviceError>,
    },
    Probed {
        rows: Vec<ProbeRow>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskReport {
    pub target: Target,
    pub device_path: String,
    pub geometry: DiskGeometry,
    pub body: ReportBody,
}

/// Serializes a query outcome as `{"ok": ..}` or `{"error": ..}`.
mod section {
    use serde::ser::{SerializeMap, Serializer};
    use serde::Serialize;

    pub fn serialize<T, E, S>(value: &Result<T, E>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        E: Serialize,
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        match value {
            Ok(ok) => map.serialize_entry("ok", ok)?,
            Err(err) => map.serialize_entry("error", err)?,
        }
        map.end()
    }
}
