//! Checkout context carried in the visitor's `tower_sessions::Session`.
//!
//! The layer sets no expiry of its own: an inactivity expiry makes every
//! request save its copy of the record, and a polling read could then write a
//! stale `Processing` over the settled outcome. Instead each write of a
//! [`Visit`] pushes the expiry out by the configured idle time.

use crate::checkout::CheckoutState;
use crate::config::Config;
use crate::models::Subscriber;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, session};

pub const SESSION_COOKIE: &str = "sd_session";

const VISIT_KEY: &str = "visit";

/// What the funnel remembers about a visitor: the subscriber hand-off and
/// where the payment attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub handoff: Option<Subscriber>,
    pub checkout: CheckoutState,
}

impl Visit {
    /// Unknown, expired and fresh sessions all read as the default visit.
    pub async fn load(session: &Session) -> Result<Self, session::Error> {
        Ok(session.get(VISIT_KEY).await?.unwrap_or_default())
    }

    /// Stages the visit on the session. The session layer persists it once
    /// the response is built; writers outside a request call `Session::save`.
    pub async fn store(&self, session: &Session, idle: Duration) -> Result<(), session::Error> {
        session.set_expiry(Some(Expiry::AtDateTime(OffsetDateTime::now_utc() + idle)));
        session.insert(VISIT_KEY, self).await
    }
}

pub fn layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
}
