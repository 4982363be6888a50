//! Common test utilities shared by the integration tests.
//!
//! - Fixtures (projects, configs, managers)
//! - Custom assertions on snapshots
//! - Scripted providers

pub mod assertions;
pub mod fixtures;
pub mod providers;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use providers::*;
