//! Adapters applied, in order, between a raw suite environment and the scoring logger.

pub mod canonical;
pub mod concat;
pub mod single_precision;

pub use canonical::CanonicalSpec;
pub use concat::ConcatObservation;
pub use single_precision::SinglePrecision;
