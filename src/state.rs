//! Shared application state.

use moka::future::Cache;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dispatch::{
    DirectorySink, DocumentSink, DownloadSink, NoShareTarget, OutputDispatcher, ShareTarget,
    WebhookShareTarget,
};
use crate::form::FormSession;
use crate::geo::{AddressLookup, ReverseGeocodeClient};
use crate::photo::PreviewStore;
use crate::report::ReportBuilder;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Cache<Uuid, Arc<FormSession>>,
    pub previews: Arc<PreviewStore>,
    pub builder: ReportBuilder,
    pub dispatcher: OutputDispatcher,
    pub address_lookup: AddressLookup,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .timeout(config.geocoder_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let share_target: Arc<dyn ShareTarget> = match &config.share_webhook_url {
            Some(url) => {
                log::info!("Sharing reports to webhook {}", url);
                Arc::new(WebhookShareTarget::new(
                    http_client.clone(),
                    url.clone(),
                    config.share_max_bytes,
                ))
            }
            None => Arc::new(NoShareTarget),
        };

        let sink: Arc<dyn DocumentSink> = match &config.report_output_dir {
            Some(dir) => {
                log::info!("Saving reports to {}", dir.display());
                Arc::new(DirectorySink::new(dir.clone()))
            }
            None => Arc::new(DownloadSink),
        };

        Ok(Self::with_components(config, http_client, share_target, sink))
    }

    /// Assemble state around explicit share and save backends.
    pub fn with_components(
        config: AppConfig,
        http_client: reqwest::Client,
        share_target: Arc<dyn ShareTarget>,
        sink: Arc<dyn DocumentSink>,
    ) -> Self {
        let previews = Arc::new(PreviewStore::new());

        // Expired sessions give their preview back.
        let listener_previews = previews.clone();
        let sessions = Cache::builder()
            .time_to_idle(config.session_ttl)
            .eviction_listener(move |id, session: Arc<FormSession>, cause| {
                log::debug!("Session {} evicted ({:?})", id, cause);
                session.clear_image(listener_previews.as_ref());
            })
            .build();

        let geocoder = ReverseGeocodeClient::new(http_client, config.geocoder_base_url.clone());

        Self {
            config: Arc::new(config),
            sessions,
            previews,
            builder: ReportBuilder::default(),
            dispatcher: OutputDispatcher::new(share_target, sink),
            address_lookup: AddressLookup::new(geocoder),
        }
    }

    pub async fn create_session(&self) -> Arc<FormSession> {
        let session = Arc::new(FormSession::new());
        self.sessions.insert(session.id(), session.clone()).await;
        log::info!("Form session {} opened", session.id());
        session
    }

    pub async fn session(&self, id: &Uuid) -> Option<Arc<FormSession>> {
        self.sessions.get(id).await
    }
}
