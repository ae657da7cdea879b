//! # lasthook
//!
//! Watches Last.fm for what you are listening to and tells your other
//! things about it.
//!
//! This crate provides:
//! - A Last.fm `user.getrecenttracks` client with a typed track model
//! - Multi-user selection that prefers whoever is actively playing
//! - Change detection on the `Artist - Title` display string
//! - A poll loop that fans changes out to pluggable hooks
//!
//! ## Hooks
//!
//! - `file-dump` - write the current track to a text file
//! - `http-server` - serve the current track as JSON
//! - `mqtt` - publish the current track to an MQTT topic
//! - `geek-magic` - push the album cover to a GeekMagic display

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod display;
pub mod error;
pub mod hooks;
pub mod lastfm;
pub mod poller;
pub mod track;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Config, Overrides, Settings};
pub use error::{Error, Result};
pub use hooks::{Hook, HookDispatcher};
pub use lastfm::LastFmClient;
pub use poller::{Poller, StopHandle};
pub use track::Track;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "lasthook";
