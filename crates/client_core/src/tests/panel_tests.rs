use super::*;

use axum::http::StatusCode;
use serde_json::json;
use shared::protocol::{FlightStatusKind, NewsItemId};

use crate::test_support::{StubReply, StubServer};

struct FailingSource;

#[async_trait]
impl PanelDataSource for FailingSource {
    async fn fetch_panel_data(&self) -> Result<PanelData, PanelError> {
        Err(PanelError::Transport("connection refused".into()))
    }
}

struct PanickingSource;

#[async_trait]
impl PanelDataSource for PanickingSource {
    async fn fetch_panel_data(&self) -> Result<PanelData, PanelError> {
        panic!("widget backend exploded");
    }
}

#[tokio::test]
async fn loads_panel_data_from_endpoint() {
    let server = StubServer::start(
        Vec::new(),
        Some(StubReply::json(json!({
            "weather": { "location": "Chennai", "temperature": 33, "condition": "Humid" },
            "news": [{ "id": "n1", "title": "Metro line opens", "source": "DT Next" }],
            "flights": {
                "arrivals": [{ "flight": "AI 540", "from": "DEL", "time": "10:05", "status": "Landed" }],
                "departures": []
            }
        }))),
    )
    .await;

    let data = load_panel_data(Arc::new(HttpPanelDataSource::new(server.panel_url()))).await;

    let weather = data.weather.expect("weather");
    assert_eq!(weather.location, "Chennai");
    assert_eq!(weather.temperature, 33.0);
    assert_eq!(data.news[0].id, NewsItemId::Text("n1".into()));
    let flights = data.flights.expect("flights");
    assert_eq!(flights.arrivals[0].counterpart(), "DEL");
    assert_eq!(flights.arrivals[0].status_kind(), FlightStatusKind::OnTime);
    assert!(flights.departures.is_empty());
}

#[tokio::test]
async fn malformed_weather_keeps_news_and_flights() {
    let server = StubServer::start(
        Vec::new(),
        Some(StubReply::json(json!({
            "weather": { "location": "Chennai", "temperature": null, "condition": "Humid" },
            "news": [{ "id": 7, "title": "Metro line opens", "source": "DT Next" }],
            "flights": { "arrivals": [], "departures": [] }
        }))),
    )
    .await;

    let data = load_panel_data(Arc::new(HttpPanelDataSource::new(server.panel_url()))).await;

    assert!(data.weather.is_none());
    assert_eq!(data.news.len(), 1);
    assert!(data.flights.is_some());
}

#[tokio::test]
async fn non_success_status_yields_empty_panel() {
    let server = StubServer::start(
        Vec::new(),
        Some(StubReply::raw(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"weather":{"location":"x","temperature":1,"condition":"y"}}"#,
        )),
    )
    .await;

    let data = load_panel_data(Arc::new(HttpPanelDataSource::new(server.panel_url()))).await;
    assert_eq!(data, PanelData::empty());
}

#[tokio::test]
async fn failing_source_yields_empty_panel() {
    let data = load_panel_data(Arc::new(FailingSource)).await;
    assert_eq!(data, PanelData::empty());
    assert!(data.weather.is_none());
    assert!(data.news.is_empty());
    assert!(data.flights.is_none());
}

#[tokio::test]
async fn panicking_source_does_not_escape() {
    let data = load_panel_data(Arc::new(PanickingSource)).await;
    assert_eq!(data, PanelData::empty());
}
