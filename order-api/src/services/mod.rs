//! Service implementations
//!
//! Real implementations of the store and clock traits

pub mod clock;
pub mod memory_store;
pub mod rest_store;

#[cfg(test)]
mod tests;

// Re-export service implementations
pub use clock::SystemClock;
pub use memory_store::InMemoryKvStore;
pub use rest_store::RestKvStore;
