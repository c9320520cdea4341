//! Chatterbox: a sign-in gated chat demo with a canned-reply bot.
//!
//! The core modules (`session`, `auth`, `transcript`, `responder`) are
//! renderer-agnostic and persist through a [`storage::KeyValueStore`]. The
//! Dioxus front end lives behind the `ui` feature.

pub mod auth;
pub mod config;
pub mod context;
pub mod responder;
pub mod session;
pub mod storage;
pub mod transcript;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;

pub use auth::{AuthError, AuthGate};
pub use config::AppConfig;
pub use context::ChatContext;
pub use responder::{MockResponder, Responder};
pub use session::SessionStore;
pub use storage::{KeyValueStore, MemoryStore, SharedStore, StorageError};
pub use transcript::{ChatError, Quota, TranscriptManager};
pub use types::{ChatMessage, Origin, Session, Transcript, UserRole};
