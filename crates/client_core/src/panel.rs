use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::PanelData;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel data request failed: {0}")]
    Transport(String),
    #[error("panel data endpoint returned status {0}")]
    Status(u16),
    #[error("panel data is not valid JSON: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PanelDataSource: Send + Sync {
    async fn fetch_panel_data(&self) -> Result<PanelData, PanelError>;
}

pub struct HttpPanelDataSource {
    http: Client,
    url: Url,
}

impl HttpPanelDataSource {
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(http: Client, url: Url) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl PanelDataSource for HttpPanelDataSource {
    async fn fetch_panel_data(&self) -> Result<PanelData, PanelError> {
        let res = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| PanelError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(PanelError::Status(status.as_u16()));
        }

        let raw = res
            .text()
            .await
            .map_err(|err| PanelError::Transport(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| PanelError::Decode(err.to_string()))
    }
}

/// Single attempt, no retry. Any failure, including a panicking source, yields [`PanelData::empty`].
pub async fn load_panel_data(source: Arc<dyn PanelDataSource>) -> PanelData {
    let fetch = tokio::spawn(async move { source.fetch_panel_data().await });

    match fetch.await {
        Ok(Ok(data)) => {
            info!(
                news = data.news.len(),
                weather = data.weather.is_some(),
                flights = data.flights.is_some(),
                "panel: data loaded"
            );
            data
        }
        Ok(Err(err)) => {
            warn!(error = %err, "panel: failed to load data; showing empty widgets");
            PanelData::empty()
        }
        Err(err) => {
            warn!(error = %err, "panel: loader task aborted; showing empty widgets");
            PanelData::empty()
        }
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
