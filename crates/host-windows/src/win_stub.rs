use diskinfo_core::{
    DeviceError, DeviceOpener, DiskDevice, DiskGeometry, DriveLayout, OsStatus, PartitionEntry,
    VolumeExtent,
};

/// No device can be opened off Windows, so neither type has values.
pub enum DeviceHandle {}

pub enum WindowsDevices {}

impl DiskDevice for DeviceHandle {
    fn geometry(&self) -> Result<DiskGeometry, DeviceError> {
        match *self {}
    }

    fn drive_layout(&self) -> Result<DriveLayout, DeviceError> {
        match *self {}
    }

    fn partition_info(&self) -> Result<PartitionEntry, DeviceError> {
        match *self {}
    }

    fn volume_extents(&self) -> Result<Vec<VolumeExtent>, DeviceError> {
        match *self {}
    }

    fn is_dynamic(&self) -> Result<bool, DeviceError> {
        match *self {}
    }
}

impl DeviceOpener for WindowsDevices {
    type Device = DeviceHandle;

    fn open(&self, _path: &str) -> Result<DeviceHandle, OsStatus> {
        match *self {}
    }
}
