//! Generation provider adapter implementations.

pub mod mock_provider;

pub use mock_provider::{MockCall, MockOperation, MockProvider};
