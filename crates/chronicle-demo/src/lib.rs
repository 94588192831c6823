//! Chronicle demo: wires the registry, store, bus and the user accounts
//! context together and runs a create, rename and query scenario.

pub mod config;
pub mod error;
pub mod scenario;
