//! Client for the AcFun live-streaming platform.
//!
//! Tracks which broadcasters are currently live via the paginated
//! channel-list API and resolves playable HLS/FLV stream URLs through the
//! anonymous session-negotiation and manifest protocol.
//!
//! ```rust,ignore
//! use acfun_live::{AcfunConfig, AcfunLive};
//!
//! # async fn doc() -> Result<(), acfun_live::AcfunError> {
//! let client = AcfunLive::new(AcfunConfig::default());
//! client.refresh_directory().await?;
//!
//! if client.is_live(23512) {
//!     println!("{}", client.current_title(23512));
//!     let urls = client.resolve_stream_urls(23512).await?;
//!     println!("hls: {} flv: {}", urls.hls, urls.flv);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
mod identity;
mod manifest;
pub mod models;
pub mod retry;
mod session;

pub use cache::{DirectorySnapshot, LiveRoomCache};
pub use client::AcfunLive;
pub use config::AcfunConfig;
pub use error::AcfunError;
pub use models::{LiveRoom, Representation, SessionToken, StreamUrls, Streamer};
pub use retry::RetryPolicy;
