//! Pulso client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard UI drives everything through [`state::auth::AuthSession`],
//! which calls the session-aware [`net::client::ApiClient`]. The client reads
//! and writes credentials in the [`storage::tokens::TokenStore`] and, when a
//! session cannot be recovered, notifies every listener through the
//! [`session::broadcast::SessionBroadcaster`].
//!
//! ```text
//! UI action -> AuthSession -> ApiClient -> TokenStore
//!                  ^              |
//!                  |              v (refresh failed)
//!                  +------ SessionBroadcaster
//! ```

pub mod config;
pub mod net;
pub mod session;
pub mod state;
pub mod storage;
pub mod validation;

pub use config::PulsoConfig;
pub use net::client::{ApiClient, RequestOptions};
pub use net::error::ApiError;
pub use net::types::{Profile, User};
pub use session::broadcast::{SessionBroadcaster, SessionEvent};
pub use state::auth::{AuthPhase, AuthSession, AuthState};
pub use storage::tokens::TokenStore;
