//! Application configuration loaded from environment variables.
//!
//! - `CONCIERGE_API_URL` — backend base URL (default `http://localhost:4000/api`)
//! - `CONCIERGE_SOCKET_URL` — socket.io server URL (http(s) or ws(s)); live updates are off without it
//! - `CONCIERGE_AUTH_TOKEN` — optional bearer token
//! - `CONCIERGE_DATA_DIR` — where the cart and session are saved (default `.concierge`)
//! - `CONCIERGE_MIN_ORDER` — smallest room-service subtotal (default `15.00`)
//! - `CONCIERGE_OPEN_HOUR` / `CONCIERGE_CLOSE_HOUR` — restaurant hours (default 11–21)

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use zeroize::Zeroizing;

use crate::ConciergeError;
use crate::hours::{BusinessHours, DEFAULT_CLOSE_HOUR, DEFAULT_OPEN_HOUR};

/// Default backend base URL.
const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Default directory for local snapshots.
const DEFAULT_DATA_DIR: &str = ".concierge";

/// Default minimum room-service subtotal, in cents.
const DEFAULT_MIN_ORDER_CENTS: i64 = 1500;

/// Top-level application configuration.
pub struct AppConfig {
    pub api_url: String,
    pub socket_url: Option<String>,
    pub auth_token: Option<Zeroizing<String>>,
    pub data_dir: PathBuf,
    pub minimum_order: Decimal,
    pub hours: BusinessHours,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &self.api_url)
            .field("socket_url", &self.socket_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("data_dir", &self.data_dir)
            .field("minimum_order", &self.minimum_order)
            .field("hours", &self.hours)
            .finish()
    }
}

/// Loads the application configuration from environment variables.
///
/// Empty variables are treated as absent.
///
/// # Errors
///
/// Returns [`ConciergeError::Config`] if a numeric variable does not parse,
/// the minimum order is negative, or the hours are not `open < close <= 24`.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let api_url = non_empty_var("CONCIERGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let socket_url = non_empty_var("CONCIERGE_SOCKET_URL");
    let auth_token = non_empty_var("CONCIERGE_AUTH_TOKEN").map(Zeroizing::new);
    let data_dir = non_empty_var("CONCIERGE_DATA_DIR")
        .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

    let minimum_order = parsed_var("CONCIERGE_MIN_ORDER")?
        .unwrap_or_else(|| Decimal::new(DEFAULT_MIN_ORDER_CENTS, 2));
    if minimum_order.is_sign_negative() {
        return Err(ConciergeError::Config(
            "CONCIERGE_MIN_ORDER must not be negative".to_string(),
        ));
    }

    let open_hour = parsed_var("CONCIERGE_OPEN_HOUR")?.unwrap_or(DEFAULT_OPEN_HOUR);
    let close_hour = parsed_var("CONCIERGE_CLOSE_HOUR")?.unwrap_or(DEFAULT_CLOSE_HOUR);
    if open_hour >= close_hour || close_hour > 24 {
        return Err(ConciergeError::Config(format!(
            "restaurant hours {open_hour}-{close_hour} are invalid"
        )));
    }

    Ok(AppConfig {
        api_url,
        socket_url,
        auth_token,
        data_dir,
        minimum_order,
        hours: BusinessHours {
            open_hour,
            close_hour,
        },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses a non-empty environment variable.
fn parsed_var<T: FromStr>(name: &str) -> crate::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ConciergeError::Config(format!("{name}={raw}: {e}")))
        })
        .transpose()
}
