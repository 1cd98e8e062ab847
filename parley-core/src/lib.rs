#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod chat_completion;
mod document;
mod metadata;

pub use crate::chat_completion::traits::*;
pub use crate::document::Document;
pub use crate::metadata::Metadata;

/// Commonly used types, traits and stream extensions
pub mod prelude;

#[cfg(feature = "metrics")]
pub mod metrics;

