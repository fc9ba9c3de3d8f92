use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    domain::{AssistantReply, Message, MessageContent, Sender, SourceTag, TableContent},
    error::ContentError,
};

/// Body of `POST /handlechat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn from_message(message: &Message) -> Self {
        let sender = match message.sender {
            Sender::User => "user",
            Sender::Assistant => "ai",
        };
        Self {
            sender: sender.to_string(),
            text: message.content.as_plain_text(),
        }
    }
}

/// Body of a successful `POST /handlechat` reply.
///
/// `response` is either a bare string (legacy backends) or a
/// `{type, data}` object; [`ChatReplyBody::normalize`] folds both into a
/// single [`AssistantReply`].
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReplyBody {
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub source: Option<String>,
}

impl ChatReplyBody {
    pub fn normalize(self) -> Result<AssistantReply, ContentError> {
        let content = match self.response {
            Value::Null => return Err(ContentError::MissingResponse),
            Value::String(text) => MessageContent::text(text),
            Value::Object(mut payload) => {
                let kind = match payload.remove("type") {
                    Some(Value::String(kind)) => kind,
                    Some(_) | None => return Err(ContentError::MissingType),
                };
                let data = payload.remove("data").unwrap_or(Value::Null);
                match kind.as_str() {
                    "text" => match data {
                        Value::String(text) => MessageContent::text(text),
                        _ => return Err(ContentError::InvalidText),
                    },
                    // A malformed table is shown as an empty one, not as a failed request.
                    "table" => MessageContent::Table(parse_table(data).unwrap_or_else(|err| {
                        warn!(error = %err, "chat: malformed table reply; showing empty table");
                        TableContent::default()
                    })),
                    other => return Err(ContentError::UnsupportedType(other.to_string())),
                }
            }
            other => {
                return Err(ContentError::UnsupportedType(
                    json_kind(&other).to_string(),
                ))
            }
        };

        Ok(AssistantReply {
            content,
            source_tag: self.source.as_deref().map(SourceTag::from_wire),
        })
    }
}

fn parse_table(data: Value) -> Result<TableContent, ContentError> {
    let mut data = match data {
        Value::Object(map) => map,
        Value::Null => return Ok(TableContent::default()),
        other => {
            return Err(ContentError::invalid_table(format!(
                "expected object, got {}",
                json_kind(&other)
            )))
        }
    };

    let headers = match data.remove("headers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(cell_text)
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ContentError::invalid_table(format!(
                "headers must be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    let rows = match data.remove("rows") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows
            .into_iter()
            .map(|row| match row {
                Value::Array(cells) => cells.into_iter().map(cell_text).collect(),
                other => Err(ContentError::invalid_table(format!(
                    "row must be an array, got {}",
                    json_kind(&other)
                ))),
            })
            .collect::<Result<Vec<Vec<String>>, _>>()?,
        Some(other) => {
            return Err(ContentError::invalid_table(format!(
                "rows must be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(TableContent { headers, rows })
}

fn cell_text(value: Value) -> Result<String, ContentError> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(ContentError::invalid_table(format!(
            "cell must be a scalar, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Body of `GET /getpaneldata`.
///
/// Each widget decodes on its own: a malformed field, or a malformed news
/// entry, is dropped without discarding the rest of the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPanelData")]
pub struct PanelData {
    pub weather: Option<WeatherReport>,
    pub news: Vec<NewsItem>,
    pub flights: Option<FlightBoard>,
}

impl PanelData {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Deserialize)]
struct RawPanelData {
    #[serde(default)]
    weather: Value,
    #[serde(default)]
    news: Value,
    #[serde(default)]
    flights: Value,
}

impl From<RawPanelData> for PanelData {
    fn from(raw: RawPanelData) -> Self {
        let news = match raw.news {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| decode_widget("news", item))
                .collect(),
            Value::Null => Vec::new(),
            other => {
                warn!(kind = json_kind(&other), "panel: news is not a list; ignoring");
                Vec::new()
            }
        };
        Self {
            weather: decode_widget("weather", raw.weather),
            news,
            flights: decode_widget("flights", raw.flights),
        }
    }
}

fn decode_widget<T: serde::de::DeserializeOwned>(widget: &str, value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(widget, error = %err, "panel: malformed widget data; ignoring");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub temperature: f64,
    pub condition: String,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Number(value) => Ok(value),
        Loose::Text(raw) => raw
            .trim()
            .trim_end_matches(['C', '°'])
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid temperature '{raw}'"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewsItemId {
    Number(i64),
    Text(String),
}

impl Default for NewsItemId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub id: NewsItemId,
    pub title: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightBoard {
    #[serde(default)]
    pub arrivals: Vec<FlightStatus>,
    #[serde(default)]
    pub departures: Vec<FlightStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightStatus {
    pub flight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl FlightStatus {
    /// Origin for arrivals, destination for departures.
    pub fn counterpart(&self) -> &str {
        self.from
            .as_deref()
            .or(self.to.as_deref())
            .unwrap_or_default()
    }

    pub fn status_kind(&self) -> FlightStatusKind {
        FlightStatusKind::classify(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatusKind {
    OnTime,
    Delayed,
    Scheduled,
    Other,
}

impl FlightStatusKind {
    pub fn classify(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return Self::Other;
        };
        match status.trim().to_ascii_lowercase().as_str() {
            "landed" | "arrived" | "on-time" => Self::OnTime,
            "delayed" => Self::Delayed,
            "scheduled" | "active" => Self::Scheduled,
            _ => Self::Other,
        }
    }
}
