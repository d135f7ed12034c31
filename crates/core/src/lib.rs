//! Domain types for the crisis verification service.
//!
//! Holds everything that does not perform I/O: the identifier presence check,
//! the typed incident record, the fake-report prompt and the (optional)
//! decoding of the model's verdict.

pub mod crisis_id;
pub mod error;
pub mod incident;
pub mod types;
pub mod verification;
