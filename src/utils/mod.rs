//! Utility modules supporting retrieval.
//!
//! - [`HttpClient`]: shared reqwest client with the configured timeouts
//! - [`Throttle`] / [`FixedDelay`]: the fixed pause between record fetches
//!
//! # Throttling
//!
//! ```rust,no_run
//! use hcls_research::utils::{FixedDelay, Throttle};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let throttle = FixedDelay::new(Duration::from_millis(500));
//! throttle.pause().await;
//! # }
//! ```

mod http;
mod throttle;

pub use http::HttpClient;
pub use throttle::{FixedDelay, Throttle};
