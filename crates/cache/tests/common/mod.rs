//! Common test utilities and fixtures.

pub mod cache;
pub mod fixtures;

#[allow(unused_imports)]
pub use cache::*;
#[allow(unused_imports)]
pub use fixtures::*;
