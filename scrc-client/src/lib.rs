//! SCRC Client Library
//!
//! Exposes the session manager and configuration for the launcher and for
//! integration testing.

pub mod config;
pub mod session;

pub use config::{ClientConfig, ConfigError, Stage};
pub use session::{EpisodeEnd, EpisodeSummary, Session, SessionError, SessionState, SessionSummary};
