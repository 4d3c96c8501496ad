//! Shared helpers: input validation, content hashing and the chunked worker pool.

pub mod pool;
pub mod validation;
