mod refresh_device_data;

pub use refresh_device_data::RefreshDeviceData;
