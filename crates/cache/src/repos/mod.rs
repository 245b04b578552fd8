//! Repository traits for board operations.

pub mod boards;
pub mod stats;

pub use boards::BoardRepo;
pub use stats::StatRepo;
