pub mod registry;
pub mod settings;
pub mod sinks;

pub use registry::{InMemoryDeviceRegistry, JsonFileDeviceRegistry};
pub use sinks::{TracingErrorLog, TracingEventLog, TracingNotifier};
