use std::{env, str::FromStr, time::Duration};
use tracing::warn;

/// Which view `/` serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeView {
    Landing,
    Today,
}

impl FromStr for HomeView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "landing" => Ok(Self::Landing),
            "today" => Ok(Self::Today),
            other => Err(format!("unknown home view '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub geocoder_url: String,
    pub home_view: HomeView,
    /// Hosted checkout page to send subscribers to instead of `/payment`.
    pub checkout_url: Option<String>,
    pub payment_delay: Duration,
    pub payment_success_rate: f64,
    /// Checkout sessions expire this long after they were last written.
    pub session_idle: Duration,
    /// Marks the session cookie `Secure`; enable behind HTTPS.
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            upstream_url: "http://127.0.0.1:8081".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            home_view: HomeView::Landing,
            checkout_url: None,
            payment_delay: Duration::from_millis(2000),
            payment_success_rate: 0.9,
            session_idle: Duration::from_secs(30 * 60),
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: parsed(&text, "PORT", defaults.port),
            upstream_url: text("UPSTREAM_API_URL").unwrap_or(defaults.upstream_url),
            geocoder_url: text("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            home_view: parsed(&text, "HOME_VIEW", defaults.home_view),
            checkout_url: text("CHECKOUT_URL"),
            payment_delay: Duration::from_millis(parsed(
                &text,
                "PAYMENT_DELAY_MS",
                defaults.payment_delay.as_millis() as u64,
            )),
            payment_success_rate: success_rate(&text, defaults.payment_success_rate),
            session_idle: idle_minutes(&text, defaults.session_idle),
            secure_cookies: parsed(&text, "SECURE_COOKIES", defaults.secure_cookies),
        }
    }
}

/// A probability in `0..=1`. `clamp` passes NaN through, so non-finite
/// values are refused before clamping.
fn success_rate(text: &impl Fn(&str) -> Option<String>, default: f64) -> f64 {
    let rate: f64 = parsed(text, "PAYMENT_SUCCESS_RATE", default);
    if !rate.is_finite() {
        warn!("ignoring PAYMENT_SUCCESS_RATE={rate}: not a finite number");
        return default;
    }
    rate.clamp(0.0, 1.0)
}

fn idle_minutes(text: &impl Fn(&str) -> Option<String>, default: Duration) -> Duration {
    let minutes: u16 = parsed(text, "SESSION_IDLE_MINUTES", (default.as_secs() / 60) as u16);
    Duration::from_secs(u64::from(minutes.max(1)) * 60)
}

fn parsed<T>(text: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match text(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!("ignoring {key}={raw}: {err}");
            default
        }),
        None => default,
    }
}
