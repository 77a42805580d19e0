use diskinfo_core::decode::{
    decode_drive_layout, decode_geometry, decode_partition_info, drive_layout_size,
    PARTITION_INFO_EX_SIZE,
};
use diskinfo_core::sequence::{OP_GEOMETRY, OP_LAYOUT, OP_PARTITION_INFO};
use diskinfo_core::{
    DeviceError, DeviceOpener, DiskDevice, DiskGeometry, DriveLayout, OsStatus, PartitionEntry,
    VolumeExtent,
};
use std::ffi::c_void;
use tracing::debug;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_GENERIC_READ, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};
use windows::Win32::System::Ioctl::{
    IOCTL_DISK_GET_DRIVE_GEOMETRY_EX, IOCTL_DISK_GET_DRIVE_LAYOUT_EX,
    IOCTL_DISK_GET_PARTITION_INFO_EX,
};
use windows::Win32::System::IO::DeviceIoControl;

/// Largest partition table read from a drive (GPT allows 128 by default).
const MAX_LAYOUT_ENTRIES: usize = 256;

/// Doubles the layout buffer, clamped so the last attempt holds exactly
/// `MAX_LAYOUT_ENTRIES` records.
fn next_layout_size(len: usize) -> Option<usize> {
    Some((len * 2).min(drive_layout_size(MAX_LAYOUT_ENTRIES))).filter(|size| *size > len)
}

fn wide(s: &str) -> Vec<u16> {
    use std::os::windows::prelude::*;
    std::ffi::OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Recovers the Win32 code from an `HRESULT_FROM_WIN32` value.
pub(crate) fn os_status(err: &windows::core::Error) -> OsStatus {
    let hr = err.code().0 as u32;
    if hr & 0xFFFF_0000 == 0x8007_0000 {
        OsStatus(hr & 0xFFFF)
    } else {
        OsStatus(hr)
    }
}

/// Owned device handle, closed on drop.
pub struct DeviceHandle {
    handle: HANDLE,
    path: String,
}

impl DeviceHandle {
    pub fn open(path: &str) -> Result<Self, OsStatus> {
        let w = wide(path);

        let handle = unsafe {
            CreateFileW(
                PCWSTR(w.as_ptr()),
                FILE_GENERIC_READ.0,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                None,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                HANDLE::default(),
            )
        }
        .map_err(|err| os_status(&err))?;

        debug!(%path, "opened device");
        Ok(Self {
            handle,
            path: path.to_string(),
        })
    }

    /// Issues a control code with no input buffer and returns the byte count written.
    pub(crate) fn ioctl(&self, code: u32, out: &mut [u8]) -> Result<usize, OsStatus> {
        let mut returned = 0u32;
        unsafe {
            DeviceIoControl(
                self.handle,
                code,
                None,
                0,
                Some(out.as_mut_ptr() as *mut c_void),
                out.len() as u32,
                Some(&mut returned),
                None,
            )
        }
        .map_err(|err| os_status(&err))?;
        Ok(returned as usize)
    }

    /// Retries a variable-length query while the driver reports a short
    /// buffer. `next_size` sees the partial output and proposes a larger size,
    /// or `None` to give up.
    pub(crate) fn ioctl_growing(
        &self,
        code: u32,
        initial: usize,
        next_size: impl Fn(&[u8], usize) -> Option<usize>,
    ) -> Result<Vec<u8>, OsStatus> {
        let mut buf = vec![0u8; initial];
        loop {
            match self.ioctl(code, &mut buf) {
                Ok(written) => {
                    buf.truncate(written);
                    return Ok(buf);
                }
                Err(status) if status.is_buffer_too_small() => {
                    let Some(size) = next_size(&buf, buf.len()).filter(|size| *size > buf.len())
                    else {
                        return Err(status);
                    };
                    debug!(path = %self.path, code, size, "growing output buffer");
                    buf = vec![0u8; size];
                }
                Err(status) => return Err(status),
            }
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl DiskDevice for DeviceHandle {
    fn geometry(&self) -> Result<DiskGeometry, DeviceError> {
        let mut out = [0u8; 1024];
        let written = self
            .ioctl(IOCTL_DISK_GET_DRIVE_GEOMETRY_EX, &mut out)
            .map_err(|status| DeviceError::from_status(OP_GEOMETRY, status))?;
        decode_geometry(&out[..written]).map_err(|err| DeviceError::malformed(OP_GEOMETRY, err))
    }

    fn drive_layout(&self) -> Result<DriveLayout, DeviceError> {
        let out = self
            .ioctl_growing(IOCTL_DISK_GET_DRIVE_LAYOUT_EX, drive_layout_size(16), |_, len| {
                next_layout_size(len)
            })
            .map_err(|status| DeviceError::from_status(OP_LAYOUT, status))?;
        decode_drive_layout(&out).map_err(|err| DeviceError::malformed(OP_LAYOUT, err))
    }

    fn partition_info(&self) -> Result<PartitionEntry, DeviceError> {
        let mut out = [0u8; PARTITION_INFO_EX_SIZE];
        let written = self
            .ioctl(IOCTL_DISK_GET_PARTITION_INFO_EX, &mut out)
            .map_err(|status| DeviceError::from_status(OP_PARTITION_INFO, status))?;
        decode_partition_info(&out[..written])
            .map_err(|err| DeviceError::malformed(OP_PARTITION_INFO, err))
    }

    fn volume_extents(&self) -> Result<Vec<VolumeExtent>, DeviceError> {
        self.query_volume_extents()
    }

    fn is_dynamic(&self) -> Result<bool, DeviceError> {
        self.query_is_dynamic()
    }
}

/// Opens devices through `CreateFileW`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsDevices;

impl DeviceOpener for WindowsDevices {
    type Device = DeviceHandle;

    fn open(&self, path: &str) -> Result<DeviceHandle, OsStatus> {
        DeviceHandle::open(path)
    }
}
