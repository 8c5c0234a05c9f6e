//! Upstream video search API
//!
//! The search proxy talks to the remote API through the [`VideoSearch`]
//! trait; [`YouTubeClient`] is the HTTP implementation.

mod traits;
mod youtube;

pub use traits::*;
pub use youtube::YouTubeClient;
