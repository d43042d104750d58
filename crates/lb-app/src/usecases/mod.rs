pub mod connection;
pub mod pairing;
pub mod refresh;
pub mod registry;
pub mod session;
