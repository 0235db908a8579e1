use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Args;
use common_media::{ImageUrlNormalizer, MediaConfig, ProductImageFields};
use common_session::{
    encode, try_decode, Audience, Claims, FileStore, RoleClaim, SessionReader,
    AUTHENTICATED_SENTINEL,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct MockTokenArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "1")]
    pub subject: String,
    /// Repeat for several roles
    #[arg(long = "role")]
    pub roles: Vec<String>,
    #[arg(long)]
    pub shop_id: Option<String>,
    #[arg(long, default_value_t = 3600)]
    pub ttl_seconds: i64,
    #[arg(long, default_value = "nova-dev")]
    pub issuer: String,
    #[arg(long, default_value = "nova-web")]
    pub audience: String,
}

pub fn decode(token: &str) -> Result<()> {
    let claims = try_decode(token).context("token could not be decoded")?;
    let now = Utc::now().timestamp();
    let report = json!({
        "claims": claims,
        "expiresAt": claims
            .expires_at_utc()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        "expired": !claims.is_live_at(now),
    });
    print_json(&report)
}

pub fn mock_token(args: &MockTokenArgs) -> Result<()> {
    let expires_at = Utc::now()
        .timestamp()
        .checked_add(args.ttl_seconds)
        .ok_or_else(|| anyhow!("--ttl-seconds {} overflows the expiry", args.ttl_seconds))?;

    let mut claims = Claims::new(&args.email, &args.subject, expires_at)
        .with_issuer(&args.issuer, Audience::Single(args.audience.clone()));
    claims.role = role_claim(&args.roles);
    claims.shop_id = args.shop_id.clone();

    let token = encode(&claims).context("failed to encode claims")?;
    println!("{token}");
    Ok(())
}

pub fn login(
    store: &Path,
    token: &str,
    role: Option<&str>,
    user_data: Option<&str>,
) -> Result<()> {
    if let Some(data) = user_data {
        serde_json::from_str::<Value>(data).context("--user-data must be valid JSON")?;
    }
    if token != AUTHENTICATED_SENTINEL {
        if let Err(err) = try_decode(token) {
            warn!(error = %err, "storing a token that will not decode");
        }
    }

    let reader = SessionReader::new(FileStore::new(store));
    reader.begin_session(token, role, user_data);
    info!(store = %store.display(), "session stored");
    print_json(&reader.session())
}

pub fn whoami(store: &Path) -> Result<()> {
    let reader = SessionReader::new(FileStore::new(store));
    print_json(&reader.session())
}

pub fn logout(store: &Path) -> Result<()> {
    SessionReader::new(FileStore::new(store)).clear_session();
    println!("session cleared");
    Ok(())
}

pub fn image(reference: &str) -> Result<()> {
    let normalizer = normalizer_from_env()?;
    match normalizer.normalize(reference) {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => bail!("reference does not name an image"),
    }
}

pub fn product_images(path: &Path) -> Result<()> {
    let text = read_input(path)?;
    let record: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let fields = ProductImageFields::from_value(&record);

    let normalizer = normalizer_from_env()?;
    let report = json!({
        "primary": normalizer.product_image_url(&fields),
        "all": normalizer.all_product_images(&fields),
    });
    print_json(&report)
}

fn normalizer_from_env() -> Result<ImageUrlNormalizer> {
    let config = MediaConfig::from_env().context("failed to load media configuration")?;
    info!(
        mode = config.mode.as_str(),
        backend = %config.backend_base_url(),
        "media configuration loaded"
    );
    Ok(ImageUrlNormalizer::new(config))
}

fn role_claim(roles: &[String]) -> Option<RoleClaim> {
    match roles {
        [] => None,
        [single] => Some(RoleClaim::Single(single.clone())),
        many => Some(RoleClaim::Many(many.to_vec())),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
