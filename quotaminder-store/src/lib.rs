// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotaminder Store
//!
//! Settings persistence for Quotaminder.
//!
//! This crate provides:
//!
//! - **Settings**: user preferences with command-line edit validation
//! - **SettingsStore**: persistence with change notification
//! - **Persistence**: file I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use quotaminder_store::SettingsStore;
//!
//! let store = SettingsStore::load_default().await?;
//! let settings = store.get().await;
//!
//! store.update(|s| s.apply("interval", "120").unwrap()).await;
//! store.save().await?;
//! ```

pub mod error;
pub mod persistence;
pub mod settings;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, load_json, load_json_or_default, save_json,
};
pub use settings::{NotifyChannel, Settings, SettingsStore, KEYS, TOKEN_ENV};
