use diskinfo_core::decode::{decode_volume_extents, extent_count, volume_extents_size};
use diskinfo_core::sequence::{OP_EXTENTS, OP_IS_DYNAMIC};
use diskinfo_core::{DeviceError, VolumeExtent};

use windows::Win32::System::Ioctl::{IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS, IOCTL_VOLUME_IS_DYNAMIC};

use crate::win::DeviceHandle;

impl DeviceHandle {
    /// Disk extents backing the volume. On a physical drive handle this
    /// usually fails with `ERROR_INVALID_FUNCTION`.
    pub(crate) fn query_volume_extents(&self) -> Result<Vec<VolumeExtent>, DeviceError> {
        let out = self
            .ioctl_growing(
                IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS,
                volume_extents_size(1),
                |partial, _| extent_count(partial).ok().map(volume_extents_size),
            )
            .map_err(|status| DeviceError::from_status(OP_EXTENTS, status))?;
        decode_volume_extents(&out).map_err(|err| DeviceError::malformed(OP_EXTENTS, err))
    }

    pub(crate) fn query_is_dynamic(&self) -> Result<bool, DeviceError> {
        let mut out = [0u8; 1];
        let written = self
            .ioctl(IOCTL_VOLUME_IS_DYNAMIC, &mut out)
            .map_err(|status| DeviceError::from_status(OP_IS_DYNAMIC, status))?;
        if written < out.len() {
            return Err(DeviceError::Malformed {
                op: OP_IS_DYNAMIC,
                reason: "no BOOLEAN returned".to_string(),
            });
        }
        Ok(out[0] != 0)
    }
}
