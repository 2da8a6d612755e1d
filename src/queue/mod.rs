//! Work queue shared by the factory and its workers.

mod bounded;

pub use bounded::BoundedQueue;
