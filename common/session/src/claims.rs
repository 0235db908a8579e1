use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::roles::{is_shop_role, ROLE_SHOP};

const ROLE_KEY: &str = "role";
const ROLE_URI_KEY: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
const SHOP_ID_KEY: &str = "ShopId";
const SHOP_ID_CAMEL_KEY: &str = "shopId";

/// Payload segment of a bearer token. Nothing here has been verified.
///
/// Reading is lenient per claim: any JSON object decodes, and a claim of an
/// unexpected type falls back to its default instead of failing the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "sub")]
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleClaim>,
    #[serde(rename = "ShopId", skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "aud")]
    pub audience: Audience,
    /// Payload fields without a dedicated slot, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for Claims {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Claims::from_fields(fields))
    }
}

impl Claims {
    pub fn new(
        email: impl Into<String>,
        subject_id: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            email: email.into(),
            subject_id: subject_id.into(),
            role: None,
            shop_id: None,
            expires_at,
            issuer: String::new(),
            audience: Audience::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_role(mut self, role: RoleClaim) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_shop_id(mut self, shop_id: impl Into<String>) -> Self {
        self.shop_id = Some(shop_id.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>, audience: Audience) -> Self {
        self.issuer = issuer.into();
        self.audience = audience;
        self
    }

    /// Take every known claim out of `fields`; whatever is left becomes
    /// `extra`. `role` wins over the role URI and `ShopId` over `shopId`;
    /// the losing key stays in `extra`.
    pub fn from_fields(mut fields: BTreeMap<String, Value>) -> Self {
        let role_value = fields
            .remove(ROLE_KEY)
            .or_else(|| fields.remove(ROLE_URI_KEY));
        let shop_id_value = fields
            .remove(SHOP_ID_KEY)
            .or_else(|| fields.remove(SHOP_ID_CAMEL_KEY));

        Self {
            email: text_claim(fields.remove("email")),
            subject_id: text_claim(fields.remove("sub")),
            role: role_value.and_then(RoleClaim::from_json),
            shop_id: shop_id_value.and_then(scalar_text),
            expires_at: epoch_claim(fields.remove("exp")),
            issuer: text_claim(fields.remove("iss")),
            audience: fields
                .remove("aud")
                .map(Audience::from_json)
                .unwrap_or_default(),
            extra: fields,
        }
    }

    /// Case-insensitive membership check across single and multi-valued roles.
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_ref()
            .map(|claim| claim.entries().any(|value| value.eq_ignore_ascii_case(role)))
            .unwrap_or(false)
    }

    /// Expiry as a timestamp, or `None` when `exp` is out of chrono's range.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at, 0).single()
    }

    /// `exp` must lie strictly after `now`; equal counts as expired.
    pub fn is_live_at(&self, now_epoch_seconds: i64) -> bool {
        self.expires_at > now_epoch_seconds
    }
}

/// Issuers emit either one role or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    Single(String),
    Many(Vec<String>),
}

impl RoleClaim {
    /// A string, or an array whose non-string entries are dropped.
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::String(role) => Some(RoleClaim::Single(role)),
            Value::Array(items) => Some(RoleClaim::Many(strings_only(items))),
            _ => None,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            RoleClaim::Single(role) => std::slice::from_ref(role),
            RoleClaim::Many(roles) => roles,
        };
        slice.iter().map(String::as_str)
    }

    /// Collapse to the role that drives navigation.
    ///
    /// A shop role anywhere in a list wins over list order, so shop-owner
    /// screens stay reachable however the issuer sorts roles. Blank values
    /// resolve to `None` so callers can fall back to a stored role.
    pub fn preferred(&self) -> Option<String> {
        match self {
            RoleClaim::Single(role) => non_blank(role),
            RoleClaim::Many(roles) => {
                if roles.iter().any(|role| is_shop_role(role)) {
                    return Some(ROLE_SHOP.to_string());
                }
                roles.first().and_then(|role| non_blank(role))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Default for Audience {
    fn default() -> Self {
        Audience::Single(String::new())
    }
}

impl Audience {
    fn from_json(value: Value) -> Self {
        match value {
            Value::String(audience) => Audience::Single(audience),
            Value::Array(items) => Audience::Many(strings_only(items)),
            _ => Audience::default(),
        }
    }

    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(value) => value == audience,
            Audience::Many(values) => values.iter().any(|value| value == audience),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn strings_only(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            _ => None,
        })
        .collect()
}

// Strings as-is, numbers as their decimal text, anything else absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn text_claim(value: Option<Value>) -> String {
    value.and_then(scalar_text).unwrap_or_default()
}

/// Whole seconds from an integer, a fractional number (floored) or a numeric
/// string. Anything else reads as 0, which is always expired.
fn epoch_claim(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(floor_seconds))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|seconds| seconds.is_finite())
                        .map(floor_seconds)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

// `as` saturates at the i64 bounds.
fn floor_seconds(seconds: f64) -> i64 {
    seconds.floor() as i64
}
