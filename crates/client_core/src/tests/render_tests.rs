use super::*;

use shared::domain::AssistantReply;
use shared::protocol::NewsItemId;

fn session(transcript: Vec<Message>) -> SessionView {
    SessionView {
        transcript,
        pending_input: String::new(),
        is_awaiting_response: false,
        voice_state: VoiceState::Idle,
    }
}

fn table_reply(headers: &[&str], rows: &[&[&str]], source: Option<SourceTag>) -> AssistantReply {
    AssistantReply {
        content: MessageContent::table(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        ),
        source_tag: source,
    }
}

fn flight(code: &str, from: Option<&str>, to: Option<&str>, status: &str) -> FlightStatus {
    FlightStatus {
        flight: code.into(),
        from: from.map(Into::into),
        to: to.map(Into::into),
        time: "10:00".into(),
        status: Some(status.into()),
    }
}

#[test]
fn text_message_renders_as_text() {
    let view = project_message(&Message::user(MessageId(7), "hello"));
    assert_eq!(view.key, MessageId(7));
    assert_eq!(view.sender, Sender::User);
    assert_eq!(view.badge, None);
    assert_eq!(view.bubble, Color::UserBubble);
    assert_eq!(view.body, MessageBody::Text("hello".into()));
}

#[test]
fn table_message_renders_headers_and_rows_in_order() {
    let reply = table_reply(
        &["District", "HQ"],
        &[&["Chennai", "Chennai"], &["Vellore", "Vellore"]],
        Some(SourceTag::KnowledgeBase),
    );
    let view = project_message(&Message::assistant(MessageId(3), reply));

    assert_eq!(view.badge, Some(Badge::KnowledgeBase));
    assert_eq!(
        view.body,
        MessageBody::Table {
            headers: vec!["District".into(), "HQ".into()],
            rows: vec![
                vec!["Chennai".into(), "Chennai".into()],
                vec!["Vellore".into(), "Vellore".into()],
            ],
        }
    );
}

#[test]
fn table_without_rows_or_headers_shows_placeholder() {
    let no_rows = table_reply(&["District"], &[], None);
    let no_headers = table_reply(&[], &[&["x"]], None);

    for reply in [no_rows, no_headers] {
        assert_eq!(
            project_content(&reply.content),
            MessageBody::EmptyTable {
                notice: EMPTY_TABLE_NOTICE
            }
        );
    }
}

#[test]
fn badge_follows_source_tag() {
    let badge_of = |tag| {
        project_message(&Message::assistant(
            MessageId(2),
            AssistantReply {
                content: MessageContent::text("x"),
                source_tag: tag,
            },
        ))
        .badge
    };

    assert_eq!(badge_of(Some(SourceTag::Generative)), Some(Badge::Generative));
    assert_eq!(badge_of(Some(SourceTag::Unknown)), Some(Badge::Default));
    assert_eq!(badge_of(None), Some(Badge::Default));
    assert_eq!(Badge::KnowledgeBase.label(), "Knowledge base");
}

#[test]
fn awaiting_response_disables_input_and_shows_typing() {
    let mut view = session(vec![Message::user(MessageId(1), "hi")]);
    view.is_awaiting_response = true;
    view.pending_input = "next".into();

    let screen = project(&view, None, &UiPrefs::default());
    assert_eq!(screen.typing_indicator, Some(TYPING_PLACEHOLDER));
    assert_eq!(screen.input.placeholder, INPUT_PLACEHOLDER_WAITING);
    assert!(!screen.input.input_enabled);
    assert!(!screen.input.send_enabled);
    assert!(!screen.input.mic_enabled);
}

#[test]
fn send_is_enabled_only_for_non_blank_input() {
    let mut view = session(Vec::new());
    view.pending_input = "   ".into();
    let screen = project(&view, None, &UiPrefs::default());
    assert!(!screen.input.send_enabled);
    assert_eq!(screen.input.placeholder, INPUT_PLACEHOLDER);
    assert_eq!(screen.typing_indicator, None);

    view.pending_input = "weather?".into();
    let screen = project(&view, None, &UiPrefs::default());
    assert!(screen.input.send_enabled);
    assert_eq!(screen.input.value, "weather?");
}

#[test]
fn voice_state_drives_mic_and_notice() {
    let mut view = session(Vec::new());
    view.voice_state = VoiceState::Listening;
    let screen = project(&view, None, &UiPrefs::default());
    assert!(screen.input.listening);
    assert_eq!(screen.voice_notice, None);

    view.voice_state = VoiceState::Error("mic denied".into());
    let screen = project(&view, None, &UiPrefs::default());
    assert!(!screen.input.listening);
    assert_eq!(screen.voice_notice.as_deref(), Some("mic denied"));
}

#[test]
fn dark_mode_switches_palette() {
    let mut prefs = UiPrefs::default();
    let light = project(&session(Vec::new()), None, &prefs);
    assert_eq!(light.theme, Theme::Light);
    assert_eq!(light.theme_toggle_label, "Dark mode");

    prefs.toggle_dark_mode();
    let dark = project(&session(Vec::new()), None, &prefs);
    assert_eq!(dark.theme, Theme::Dark);
    assert_eq!(dark.palette, Theme::Dark.palette());
    assert_ne!(light.palette, dark.palette);
}

#[test]
fn closed_sidebar_is_not_projected() {
    let screen = project(&session(Vec::new()), Some(&PanelData::empty()), &UiPrefs::default());
    assert!(screen.sidebar.is_none());
}

#[test]
fn sidebar_shows_loading_until_data_arrives() {
    let mut prefs = UiPrefs::default();
    prefs.toggle_sidebar();

    for panel in [None, Some(PanelData::empty())] {
        let screen = project(&session(Vec::new()), panel.as_ref(), &prefs);
        let sidebar = screen.sidebar.expect("sidebar open");
        assert_eq!(sidebar.title, APP_TITLE);
        assert_eq!(sidebar.weather, WidgetView::Loading);
        assert_eq!(sidebar.news, WidgetView::Loading);
        assert_eq!(sidebar.travel, WidgetView::Loading);
    }
}

#[test]
fn sidebar_widgets_render_panel_data() {
    let prefs = UiPrefs {
        dark_mode: false,
        sidebar_open: true,
    };
    let panel = PanelData {
        weather: Some(WeatherReport {
            location: "Chennai".into(),
            temperature: 31.5,
            condition: "Sunny".into(),
        }),
        news: vec![NewsItem {
            id: NewsItemId::Number(1),
            title: "Metro phase 2 update".into(),
            source: "The Hindu".into(),
        }],
        flights: Some(FlightBoard {
            arrivals: (0..7)
                .map(|n| flight(&format!("AI {n}"), Some("DEL"), None, "Delayed"))
                .collect(),
            departures: Vec::new(),
        }),
    };

    let sidebar = project(&session(Vec::new()), Some(&panel), &prefs)
        .sidebar
        .expect("sidebar open");

    let WidgetView::Ready(weather) = sidebar.weather else {
        panic!("weather should be ready");
    };
    assert_eq!(weather.temperature, "31.5°C");
    assert_eq!(
        sidebar.news,
        WidgetView::Ready(vec![HeadlineView {
            title: "Metro phase 2 update".into(),
            source: "The Hindu".into(),
        }])
    );

    let WidgetView::Ready(travel) = sidebar.travel else {
        panic!("travel should be ready");
    };
    assert_eq!(travel.title, TRAVEL_TITLE);
    assert_eq!(travel.arrivals.rows.len(), TRAVEL_MAX_ROWS);
    assert_eq!(travel.arrivals.headers[1], "From");
    assert_eq!(travel.arrivals.rows[0].counterpart, "DEL");
    assert_eq!(travel.arrivals.rows[0].status_color, Color::Warning);
    assert_eq!(travel.arrivals.empty_notice, None);
    assert_eq!(travel.departures.headers[1], "To");
    assert!(travel.departures.rows.is_empty());
    assert_eq!(travel.departures.empty_notice, Some(TRAVEL_EMPTY_NOTICE));
}

#[test]
fn messages_keep_transcript_order_and_ids() {
    let transcript = vec![
        Message::assistant(MessageId(1), AssistantReply::text("Hola!")),
        Message::user(MessageId(2), "List districts"),
        Message::assistant(
            MessageId(3),
            table_reply(&["District"], &[&["Chennai"]], Some(SourceTag::Generative)),
        ),
    ];
    let screen = project(&session(transcript), None, &UiPrefs::default());
    let keys: Vec<_> = screen.messages.iter().map(|m| m.key).collect();
    assert_eq!(keys, vec![MessageId(1), MessageId(2), MessageId(3)]);
    assert!(matches!(screen.messages[2].body, MessageBody::Table { .. }));
}
