//! Session keys.
//!
//! The API itself is stateless (bearer tokens); the session only carries
//! the CSRF state of an in-flight Google sign-in.

/// Session keys for the OAuth handshake.
pub mod keys {
    /// Key for the Google OAuth `state` parameter.
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";
}
