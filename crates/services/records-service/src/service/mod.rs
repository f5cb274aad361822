//! Service layer - application container.

mod records;

pub use records::Records;
