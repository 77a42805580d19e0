use anyhow::Result;

#[cfg(windows)]
mod volumes;
#[cfg(windows)]
mod win;
#[cfg(not(windows))]
mod win_stub;

#[cfg(windows)]
pub use win::{DeviceHandle, WindowsDevices};
#[cfg(not(windows))]
pub use win_stub::{DeviceHandle, WindowsDevices};

/// The device opener for the running system.
pub fn system_devices() -> Result<WindowsDevices> {
    #[cfg(windows)]
    {
        Ok(WindowsDevices)
    }
    #[cfg(not(windows))]
    {
        Err(anyhow::anyhow!("disk queries require Windows"))
    }
}
