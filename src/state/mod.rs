//! Client-side session state: who is signed in and which profile is active.
//!
//! DESIGN
//! ======
//! [`auth::AuthSession`] is the only writer of [`auth::AuthState`]. The
//! profile selector in [`profile`] is a second `impl` block on the same
//! controller so profile changes go through the same state channel.

pub mod auth;
pub mod profile;
