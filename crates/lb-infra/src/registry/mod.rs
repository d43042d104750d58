mod in_memory;
mod json_file;

pub use in_memory::InMemoryDeviceRegistry;
pub use json_file::JsonFileDeviceRegistry;
