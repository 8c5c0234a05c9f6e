//! Search proxy module
//!
//! Gates each search behind validation and the per-client limiter, then
//! serves it from the result cache or the upstream API.

mod proxy;

pub use proxy::SearchProxy;
