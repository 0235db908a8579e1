//! Storage keys shared with the login flow.

/// Bearer token, or [`AUTHENTICATED_SENTINEL`] when no real token was issued.
pub const USER_TOKEN: &str = "userToken";
/// Plain role string written by logins that do not carry a token.
pub const USER_ROLE: &str = "userRole";
/// Opaque user-profile JSON. Never parsed here.
pub const USER_DATA: &str = "userData";

/// Placeholder token value meaning "logged in, nothing to decode".
pub const AUTHENTICATED_SENTINEL: &str = "authenticated";

/// Every key owned by a session, in the order they are cleared.
pub const SESSION_KEYS: [&str; 3] = [USER_TOKEN, USER_ROLE, USER_DATA];
