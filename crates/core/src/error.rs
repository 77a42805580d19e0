use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Raw Win32 status code as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OsStatus(pub u32);

impl OsStatus {
    pub const INVALID_FUNCTION: OsStatus = OsStatus(1);
    pub const FILE_NOT_FOUND: OsStatus = OsStatus(2);
    pub const PATH_NOT_FOUND: OsStatus = OsStatus(3);
    pub const ACCESS_DENIED: OsStatus = OsStatus(5);
    pub const NOT_SUPPORTED: OsStatus = OsStatus(50);
    pub const INSUFFICIENT_BUFFER: OsStatus = OsStatus(122);
    pub const MORE_DATA: OsStatus = OsStatus(234);

    /// The driver does not implement the request for this kind of device.
    pub fn is_not_supported(self) -> bool {
        self == Self::INVALID_FUNCTION || self == Self::NOT_SUPPORTED
    }

    pub fn is_buffer_too_small(self) -> bool {
        self == Self::INSUFFICIENT_BUFFER || self == Self::MORE_DATA
    }
}

impl fmt::Display for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer holds {actual} bytes, {needed} required")]
    Truncated { needed: usize, actual: usize },
    #[error("unknown partition style {0}")]
    UnknownStyle(u32),
    #[error("negative value {value} at offset {offset}")]
    NegativeLength { offset: usize, value: i64 },
}

/// Failure of a single device-control query.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceError {
    #[error("{op} failed with error {status}")]
    Failed { op: &'static str, status: OsStatus },
    #[error("{op} is not supported for this device (error {status})")]
    NotSupported { op: &'static str, status: OsStatus },
    #[error("{op} returned a malformed result: {reason}")]
    Malformed { op: &'static str, reason: String },
}

impl DeviceError {
    pub fn from_status(op: &'static str, status: OsStatus) -> Self {
        if status.is_not_supported() {
            DeviceError::NotSupported { op, status }
        } else {
            DeviceError::Failed { op, status }
        }
    }

    pub fn malformed(op: &'static str, err: DecodeError) -> Self {
        DeviceError::Malformed {
            op,
            reason: err.to_string(),
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            DeviceError::Failed { op, .. }
            | DeviceError::NotSupported { op, .. }
            | DeviceError::Malformed { op, .. } => op,
        }
    }
}

/// Conditions that end the report before any section is printed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("CreateFileW failed for {path} with error {status}")]
    Open { path: String, status: OsStatus },
    #[error(transparent)]
    Geometry(DeviceError),
    #[error("partition probing requires a physical drive number, got {0}")]
    ProbeNeedsDriveIndex(String),
}
