use serde::Serialize;
use tracing::debug;

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::keys::{AUTHENTICATED_SENTINEL, SESSION_KEYS, USER_DATA, USER_ROLE, USER_TOKEN};
use crate::roles::is_shop_role;
use crate::storage::SessionStore;

/// Snapshot of the current session. Recomputed on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_authenticated: bool,
    pub role: Option<String>,
    pub shop_id: Option<i64>,
    pub is_valid: bool,
}

/// Answers "who is signed in, and is it still good" from stored session data.
///
/// Nothing is cached: each call re-reads storage, so a token written or
/// cleared elsewhere is seen on the next call.
#[derive(Debug, Clone)]
pub struct SessionReader<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SessionStore> SessionReader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: SessionStore, C: Clock> SessionReader<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Raw stored token, including the sentinel. Blank counts as absent.
    pub fn token(&self) -> Option<String> {
        self.store
            .get(USER_TOKEN)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn get_claims(&self) -> Option<Claims> {
        let token = self.token()?;
        if token == AUTHENTICATED_SENTINEL {
            debug!("session holds the sentinel token, nothing to decode");
            return None;
        }
        codec::decode(&token)
    }

    pub fn get_role(&self) -> Option<String> {
        self.role_from(self.get_claims().as_ref())
    }

    pub fn get_shop_id(&self) -> Option<i64> {
        shop_id_from(self.get_claims().as_ref())
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(self.clock.now_epoch_seconds())
    }

    pub fn is_valid_at(&self, now_epoch_seconds: i64) -> bool {
        self.get_claims()
            .map(|claims| claims.is_live_at(now_epoch_seconds))
            .unwrap_or(false)
    }

    pub fn has_shop_role(&self) -> bool {
        self.get_role().map(|role| is_shop_role(&role)).unwrap_or(false)
    }

    pub fn clear_session(&self) {
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
    }

    /// Store what a login produced. Keys left as `None` are cleared so a
    /// previous user's role or profile cannot leak into the new session.
    pub fn begin_session(&self, token: &str, role: Option<&str>, user_data: Option<&str>) {
        self.store.set(USER_TOKEN, token);
        match role {
            Some(role) => self.store.set(USER_ROLE, role),
            None => self.store.remove(USER_ROLE),
        }
        match user_data {
            Some(data) => self.store.set(USER_DATA, data),
            None => self.store.remove(USER_DATA),
        }
    }

    pub fn user_data(&self) -> Option<String> {
        self.store.get(USER_DATA)
    }

    pub fn session(&self) -> Session {
        let claims = self.get_claims();
        let now = self.clock.now_epoch_seconds();
        Session {
            is_authenticated: self.token().is_some(),
            role: self.role_from(claims.as_ref()),
            shop_id: shop_id_from(claims.as_ref()),
            is_valid: claims
                .as_ref()
                .map(|claims| claims.is_live_at(now))
                .unwrap_or(false),
        }
    }

    fn role_from(&self, claims: Option<&Claims>) -> Option<String> {
        claims
            .and_then(|claims| claims.role.as_ref())
            .and_then(|role| role.preferred())
            .or_else(|| self.stored_role())
    }

    fn stored_role(&self) -> Option<String> {
        let role = self
            .store
            .get(USER_ROLE)
            .filter(|value| !value.trim().is_empty());
        if role.is_some() {
            debug!("using stored role fallback");
        }
        role
    }
}

fn shop_id_from(claims: Option<&Claims>) -> Option<i64> {
    let raw = claims?.shop_id.as_deref()?;
    parse_leading_int(raw)
}

/// Base-10 parse of the leading integer in `raw`: whitespace is skipped, a
/// sign is honoured, and anything after the digits is ignored. No digits, or
/// a value outside `i64`, yields `None`.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    format!("{sign}{}", &rest[..digits_len]).parse().ok()
}
