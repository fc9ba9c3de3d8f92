//! Pure projection from session state to a UI tree. No I/O, no mutation.

use shared::{
    domain::{Message, MessageContent, MessageId, Sender, SourceTag, VoiceState},
    protocol::{FlightBoard, FlightStatus, FlightStatusKind, NewsItem, PanelData, WeatherReport},
};

use crate::session::SessionView;

pub const APP_TITLE: &str = "Kyndryl-GPT";
pub const CHAT_TITLE: &str = "AI Chat";
pub const TYPING_PLACEHOLDER: &str = "Typing...";
pub const INPUT_PLACEHOLDER: &str = "Ask me anything about Chennai...";
pub const INPUT_PLACEHOLDER_WAITING: &str = "Waiting for response...";
pub const EMPTY_TABLE_NOTICE: &str = "No table data was returned for this answer.";
pub const TRAVEL_EMPTY_NOTICE: &str = "No data available.";
pub const TRAVEL_TITLE: &str = "Live Airport Status (JFK)";
pub const NEWS_TITLE: &str = "Local Headlines";
pub const TRAVEL_MAX_ROWS: usize = 5;

/// View-model preferences the user toggles from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiPrefs {
    pub dark_mode: bool,
    pub sidebar_open: bool,
}

impl UiPrefs {
    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Default,
    Muted,
    Accent,
    UserBubble,
    AssistantBubble,
    Success,
    Warning,
    Info,
    Danger,
}

/// Concrete tones a front-end maps [`Color`] roles onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub user_bubble: &'static str,
    pub assistant_bubble: &'static str,
}

impl Theme {
    pub fn from_prefs(prefs: &UiPrefs) -> Self {
        if prefs.dark_mode {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                text: "gray-800",
                muted: "gray-500",
                accent: "blue-600",
                user_bubble: "blue-600",
                assistant_bubble: "white",
            },
            Self::Dark => Palette {
                text: "gray-200",
                muted: "gray-400",
                accent: "blue-400",
                user_bubble: "blue-600",
                assistant_bubble: "gray-800",
            },
        }
    }

    /// Label of the header control that switches to the other theme.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "Dark mode",
            Self::Dark => "Light mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    KnowledgeBase,
    Generative,
    Default,
}

impl Badge {
    pub fn for_source(tag: Option<SourceTag>) -> Self {
        match tag {
            Some(SourceTag::KnowledgeBase) => Self::KnowledgeBase,
            Some(SourceTag::Generative) => Self::Generative,
            Some(SourceTag::Unknown) | None => Self::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::KnowledgeBase => "Knowledge base",
            Self::Generative => "Generative",
            Self::Default => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    EmptyTable {
        notice: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub key: MessageId,
    pub sender: Sender,
    pub badge: Option<Badge>,
    pub bubble: Color,
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBarView {
    pub value: String,
    pub placeholder: &'static str,
    pub input_enabled: bool,
    pub send_enabled: bool,
    pub mic_enabled: bool,
    pub listening: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetView<T> {
    /// Skeleton shown until there is data to display.
    Loading,
    Ready(T),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub location: String,
    pub temperature: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineView {
    pub title: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelRowView {
    pub flight: String,
    pub counterpart: String,
    pub time: String,
    pub status: String,
    pub status_color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelTableView {
    pub title: &'static str,
    pub headers: [&'static str; 4],
    pub rows: Vec<TravelRowView>,
    pub empty_notice: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelView {
    pub title: &'static str,
    pub arrivals: TravelTableView,
    pub departures: TravelTableView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarView {
    pub title: &'static str,
    pub weather: WidgetView<WeatherView>,
    pub news_title: &'static str,
    pub news: WidgetView<Vec<HeadlineView>>,
    pub travel: WidgetView<TravelView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenView {
    pub theme: Theme,
    pub palette: Palette,
    pub title: &'static str,
    pub theme_toggle_label: &'static str,
    pub sidebar: Option<SidebarView>,
    pub messages: Vec<MessageView>,
    pub typing_indicator: Option<&'static str>,
    pub input: InputBarView,
    pub voice_notice: Option<String>,
}

/// `panel` is `None` until the startup load has finished.
pub fn project(session: &SessionView, panel: Option<&PanelData>, prefs: &UiPrefs) -> ScreenView {
    let theme = Theme::from_prefs(prefs);
    let awaiting = session.is_awaiting_response;

    ScreenView {
        theme,
        palette: theme.palette(),
        title: CHAT_TITLE,
        theme_toggle_label: theme.toggle_label(),
        sidebar: prefs.sidebar_open.then(|| project_sidebar(panel)),
        messages: session.transcript.iter().map(project_message).collect(),
        typing_indicator: awaiting.then_some(TYPING_PLACEHOLDER),
        input: InputBarView {
            value: session.pending_input.clone(),
            placeholder: if awaiting {
                INPUT_PLACEHOLDER_WAITING
            } else {
                INPUT_PLACEHOLDER
            },
            input_enabled: !awaiting,
            send_enabled: !awaiting && !session.pending_input.trim().is_empty(),
            mic_enabled: !awaiting,
            listening: session.voice_state == VoiceState::Listening,
        },
        voice_notice: match &session.voice_state {
            VoiceState::Error(message) => Some(message.clone()),
            VoiceState::Idle | VoiceState::Listening => None,
        },
    }
}

pub fn project_message(message: &Message) -> MessageView {
    let (badge, bubble) = match message.sender {
        Sender::User => (None, Color::UserBubble),
        Sender::Assistant => (
            Some(Badge::for_source(message.source_tag)),
            Color::AssistantBubble,
        ),
    };
    MessageView {
        key: message.id,
        sender: message.sender,
        badge,
        bubble,
        body: project_content(&message.content),
    }
}

pub fn project_content(content: &MessageContent) -> MessageBody {
    match content {
        MessageContent::Text { value } => MessageBody::Text(value.clone()),
        MessageContent::Table(table) if table.is_empty() => MessageBody::EmptyTable {
            notice: EMPTY_TABLE_NOTICE,
        },
        MessageContent::Table(table) => MessageBody::Table {
            headers: table.headers.clone(),
            rows: table.rows.clone(),
        },
    }
}

fn project_sidebar(panel: Option<&PanelData>) -> SidebarView {
    let weather = panel
        .and_then(|panel| panel.weather.as_ref())
        .map_or(WidgetView::Loading, |weather| {
            WidgetView::Ready(project_weather(weather))
        });
    let news = match panel {
        Some(panel) if !panel.news.is_empty() => {
            WidgetView::Ready(panel.news.iter().map(project_headline).collect())
        }
        _ => WidgetView::Loading,
    };
    let travel = panel
        .and_then(|panel| panel.flights.as_ref())
        .map_or(WidgetView::Loading, |board| {
            WidgetView::Ready(project_travel(board))
        });

    SidebarView {
        title: APP_TITLE,
        weather,
        news_title: NEWS_TITLE,
        news,
        travel,
    }
}

fn project_weather(weather: &WeatherReport) -> WeatherView {
    WeatherView {
        location: weather.location.clone(),
        temperature: format!("{}°C", weather.temperature),
        condition: weather.condition.clone(),
    }
}

fn project_headline(item: &NewsItem) -> HeadlineView {
    HeadlineView {
        title: item.title.clone(),
        source: item.source.clone(),
    }
}

fn project_travel(board: &FlightBoard) -> TravelView {
    TravelView {
        title: TRAVEL_TITLE,
        arrivals: project_travel_table(
            "Arrivals",
            ["Flight", "From", "Time", "Status"],
            &board.arrivals,
        ),
        departures: project_travel_table(
            "Departures",
            ["Flight", "To", "Time", "Status"],
            &board.departures,
        ),
    }
}

fn project_travel_table(
    title: &'static str,
    headers: [&'static str; 4],
    flights: &[FlightStatus],
) -> TravelTableView {
    let rows: Vec<TravelRowView> = flights
        .iter()
        .take(TRAVEL_MAX_ROWS)
        .map(|flight| TravelRowView {
            flight: flight.flight.clone(),
            counterpart: flight.counterpart().to_string(),
            time: flight.time.clone(),
            status: flight.status.clone().unwrap_or_default(),
            status_color: status_color(flight.status_kind()),
        })
        .collect();
    TravelTableView {
        title,
        headers,
        empty_notice: rows.is_empty().then_some(TRAVEL_EMPTY_NOTICE),
        rows,
    }
}

fn status_color(kind: FlightStatusKind) -> Color {
    match kind {
        FlightStatusKind::OnTime => Color::Success,
        FlightStatusKind::Delayed => Color::Warning,
        FlightStatusKind::Scheduled => Color::Info,
        FlightStatusKind::Other => Color::Muted,
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
