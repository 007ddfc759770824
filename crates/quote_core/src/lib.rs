//! Fetch orchestration for the quote dashboard: the provider trait seam,
//! the multi-symbol fan-out, and the one-month history fetch.

pub mod aggregate;
pub mod history;
pub mod source;

pub use source::QuoteSource;
