use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_panel_data, load_settings, project, settings::timeout_from_secs, HistoryMode,
    HttpCompletionClient, HttpPanelDataSource, MissingSpeechRecognizer, SessionController,
    SessionEvent, SessionOptions, SubmitRejected, UiPrefs,
};
use shared::protocol::PanelData;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::Terminal;

#[derive(Parser, Debug)]
#[command(name = "chennai-chat", about = "Terminal client for the Chennai assistant")]
struct Args {
    #[arg(long, default_value = "client.toml")]
    config: PathBuf,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    /// `full` replays the transcript with every request, `server_memory` sends only the query.
    #[arg(long)]
    history_mode: Option<HistoryMode>,
    /// 0 disables the timeout.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    dark: bool,
    #[arg(long)]
    sidebar: bool,
    #[arg(long)]
    no_color: bool,
}

enum Command {
    Quit,
    Mic,
    Dark,
    Sidebar,
    History,
    Say(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/mic" => Self::Mic,
            "/dark" => Self::Dark,
            "/sidebar" => Self::Sidebar,
            "/history" => Self::History,
            _ => Self::Say(line.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(user_id) = args.user_id {
        settings.user_id = user_id;
    }
    if let Some(mode) = args.history_mode {
        settings.history_mode = mode;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout = timeout_from_secs(secs);
    }
    info!(
        api_base_url = %settings.api_base_url,
        history_mode = ?settings.history_mode,
        "client: starting"
    );

    let controller = SessionController::new(
        Arc::new(HttpCompletionClient::new(settings.chat_url()?)),
        Arc::new(MissingSpeechRecognizer),
        SessionOptions::from(&settings),
    );
    let mut panel_task = tokio::spawn(load_panel_data(Arc::new(HttpPanelDataSource::new(
        settings.panel_data_url()?,
    ))));
    let mut panel: Option<PanelData> = None;

    let mut prefs = UiPrefs {
        dark_mode: args.dark,
        sidebar_open: args.sidebar,
    };
    let color = !args.no_color && std::io::stdout().is_terminal();
    let mut terminal = Terminal::stdout(color);
    let mut events = controller.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    terminal.reprint(&project(&controller.view(), panel.as_ref(), &prefs))?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Mic => {
                        controller.toggle_listening().await;
                        continue;
                    }
                    Command::Dark => {
                        prefs.toggle_dark_mode();
                        terminal.reprint(&project(&controller.view(), panel.as_ref(), &prefs))?;
                        continue;
                    }
                    Command::Sidebar => {
                        prefs.toggle_sidebar();
                        let screen = project(&controller.view(), panel.as_ref(), &prefs);
                        if let Some(sidebar) = &screen.sidebar {
                            terminal.render_sidebar(screen.theme, &screen.palette, sidebar)?;
                        }
                    }
                    Command::History => {
                        terminal.reprint(&project(&controller.view(), panel.as_ref(), &prefs))?;
                        continue;
                    }
                    Command::Say(text) => {
                        controller.edit_pending(text);
                        match controller.submit_pending() {
                            // The session events drive the redraw.
                            Ok(_) => continue,
                            Err(SubmitRejected::EmptyInput) => {}
                            Err(rejected) => {
                                debug!(reason = %rejected, "client: input not sent");
                                terminal.notice(&rejected.to_string())?;
                            }
                        }
                    }
                }
            }
            event = events.recv() => match event {
                // Every append is followed by an awaiting change, redraw on that instead.
                Ok(SessionEvent::TranscriptAppended(message)) => {
                    debug!(message_id = message.id.0, "client: transcript updated");
                    continue;
                }
                Ok(SessionEvent::AwaitingChanged(_) | SessionEvent::VoiceStateChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "client: session events lagged");
                }
                Err(RecvError::Closed) => break,
            },
            loaded = &mut panel_task, if panel.is_none() => {
                let data = loaded.unwrap_or_else(|err| {
                    warn!(error = %err, "client: panel loader task failed");
                    PanelData::empty()
                });
                panel = Some(data);
                let screen = project(&controller.view(), panel.as_ref(), &prefs);
                if let Some(sidebar) = &screen.sidebar {
                    terminal.render_sidebar(screen.theme, &screen.palette, sidebar)?;
                }
            }
        }

        terminal.render(&project(&controller.view(), panel.as_ref(), &prefs))?;
    }

    controller.dispose().await;
    info!("client: session closed");
    Ok(())
}
