use crate::checkout::Checkout;
use crate::config::Config;
use crate::gateway::{PaymentGateway, SimulatedGateway};
use crate::geo::Geocoder;
use crate::upstream::{ContentClient, Notifier};
use reqwest::Client;
use std::{sync::Arc, time::Duration};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: ContentClient,
    pub geocoder: Geocoder,
    pub checkout: Checkout,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        let geo_http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()?;

        let content = ContentClient::new(http, config.upstream_url.clone());
        let gateway: Arc<dyn PaymentGateway> = Arc::new(SimulatedGateway::new(
            config.payment_delay,
            config.payment_success_rate,
        ));
        let notifier: Arc<dyn Notifier> = Arc::new(content.clone());
        let geocoder = Geocoder::new(geo_http, config.geocoder_url.clone());

        Ok(Self::with_parts(config, content, geocoder, gateway, notifier))
    }

    pub fn with_parts(
        config: Config,
        content: ContentClient,
        geocoder: Geocoder,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let checkout = Checkout::new(gateway, notifier, config.session_idle);
        Self {
            config: Arc::new(config),
            content,
            geocoder,
            checkout,
        }
    }
}
