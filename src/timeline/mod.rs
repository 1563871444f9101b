//! Timeline core: data model, aggregation, labels and payload decoding.
//!
//! Everything in here is synchronous and free of I/O.

mod bucketizer;
mod labels;
mod models;
mod payload;

pub use bucketizer::*;
pub use labels::*;
pub use models::*;
pub use payload::*;
