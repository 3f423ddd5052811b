use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::{
    clients::{
        google::GoogleOAuthClient,
        razorpay::{DemoGateway, PaymentGateway, RazorpayClient},
        sms::{HttpSmsSender, LogSmsSender, SmsSender},
    },
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub sms: Arc<dyn SmsSender>,
    pub google: Option<GoogleOAuthClient>,
}

impl AppState {
    /// Build the state from a live pool, choosing real or fallback integrations
    /// depending on which credentials are configured.
    pub fn new(pool: DbPool, config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        let gateway: Arc<dyn PaymentGateway> = match &config.razorpay {
            Some(rzp) => Arc::new(RazorpayClient::new(
                http.clone(),
                rzp.clone(),
                config.upstream_timeout,
            )),
            None => {
                tracing::warn!("payment gateway credentials missing, using demo gateway");
                Arc::new(DemoGateway)
            }
        };

        let sms: Arc<dyn SmsSender> = match &config.sms {
            Some(sms) => Arc::new(HttpSmsSender::new(
                http.clone(),
                sms.clone(),
                config.upstream_timeout,
            )),
            None => {
                tracing::warn!("sms provider not configured, OTP codes will be logged");
                Arc::new(LogSmsSender)
            }
        };

        let google = config
            .google
            .clone()
            .map(|g| GoogleOAuthClient::new(http, g, config.upstream_timeout));

        Ok(Self {
            orm: orm_from_pool(pool.clone()),
            pool,
            config: Arc::new(config),
            gateway,
            sms,
            google,
        })
    }

    /// State backed by a lazily-connected pool; nothing touches the database
    /// until a query runs.
    pub fn lazy(config: AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url)?;
        Self::new(pool, config)
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_sms(mut self, sms: Arc<dyn SmsSender>) -> Self {
        self.sms = sms;
        self
    }
}
