//! Line-oriented rendering of [`ScreenView`] for the terminal front-end.

use std::io::{self, Write};

use client_core::render::{
    Badge, Color, InputBarView, MessageBody, MessageView, Palette, ScreenView, SidebarView,
    Theme, TravelTableView, WidgetView,
};
use crossterm::style::{ContentStyle, Stylize};
use shared::domain::{MessageId, Sender};
use unicode_width::UnicodeWidthChar;

const LOADING: &str = "Loading...";

/// Tracks what has already been printed so each redraw only appends.
pub struct Terminal<W: Write> {
    out: W,
    color: bool,
    printed_up_to: Option<MessageId>,
    typing_shown: bool,
    last_notice: Option<String>,
}

impl Terminal<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            printed_up_to: None,
            typing_shown: false,
            last_notice: None,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, screen: &ScreenView) -> io::Result<()> {
        for message in &screen.messages {
            if self.printed_up_to.is_some_and(|last| message.key <= last) {
                continue;
            }
            self.write_message(screen.theme, &screen.palette, message)?;
            self.printed_up_to = Some(message.key);
            self.typing_shown = false;
        }

        if let Some(typing) = screen.typing_indicator {
            if !self.typing_shown {
                let line = self.paint(screen.theme, &screen.palette, Color::Muted, typing);
                writeln!(self.out, "{line}")?;
                self.typing_shown = true;
            }
        }

        if screen.voice_notice != self.last_notice {
            if let Some(notice) = &screen.voice_notice {
                let line = self.paint(screen.theme, &screen.palette, Color::Danger, notice);
                writeln!(self.out, "{line}")?;
            }
            self.last_notice = screen.voice_notice.clone();
        }

        self.write_prompt(screen.theme, &screen.palette, &screen.input)?;
        self.out.flush()
    }

    /// Reprints the whole conversation, e.g. after a theme switch.
    pub fn reprint(&mut self, screen: &ScreenView) -> io::Result<()> {
        self.printed_up_to = None;
        self.typing_shown = false;
        let title = self.paint(screen.theme, &screen.palette, Color::Accent, screen.title);
        writeln!(self.out, "\n== {title} ==")?;
        self.render(screen)
    }

    pub fn render_sidebar(
        &mut self,
        theme: Theme,
        palette: &Palette,
        sidebar: &SidebarView,
    ) -> io::Result<()> {
        let title = self.paint(theme, palette, Color::Accent, sidebar.title);
        writeln!(self.out, "\n-- {title} --")?;

        match &sidebar.weather {
            WidgetView::Loading => writeln!(self.out, "Weather: {LOADING}")?,
            WidgetView::Ready(weather) => writeln!(
                self.out,
                "Weather: {} {} {}",
                weather.location, weather.temperature, weather.condition
            )?,
        }

        writeln!(self.out, "{}:", sidebar.news_title)?;
        match &sidebar.news {
            WidgetView::Loading => writeln!(self.out, "  {LOADING}")?,
            WidgetView::Ready(headlines) => {
                for headline in headlines {
                    let source = self.paint(theme, palette, Color::Muted, &headline.source);
                    writeln!(self.out, "  * {} ({source})", headline.title)?;
                }
            }
        }

        match &sidebar.travel {
            WidgetView::Loading => writeln!(self.out, "Travel: {LOADING}")?,
            WidgetView::Ready(travel) => {
                writeln!(self.out, "{}", travel.title)?;
                self.write_travel_table(theme, palette, &travel.arrivals)?;
                self.write_travel_table(theme, palette, &travel.departures)?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "({text})")?;
        self.out.flush()
    }

    fn write_message(
        &mut self,
        theme: Theme,
        palette: &Palette,
        message: &MessageView,
    ) -> io::Result<()> {
        let label = match (message.sender, message.badge) {
            (Sender::User, _) => "You".to_string(),
            (Sender::Assistant, Some(Badge::Default) | None) => Badge::Default.label().to_string(),
            (Sender::Assistant, Some(badge)) => format!("Assistant [{}]", badge.label()),
        };
        let label = self.paint(theme, palette, message.bubble, &label);

        match &message.body {
            MessageBody::Text(text) => {
                let text = self.paint(theme, palette, Color::Default, text);
                writeln!(self.out, "{label}: {text}")
            }
            MessageBody::EmptyTable { notice } => {
                let notice = self.paint(theme, palette, Color::Muted, notice);
                writeln!(self.out, "{label}: {notice}")
            }
            MessageBody::Table { headers, rows } => {
                writeln!(self.out, "{label}:")?;
                for line in format_table(headers, rows) {
                    writeln!(self.out, "  {line}")?;
                }
                Ok(())
            }
        }
    }

    fn write_travel_table(
        &mut self,
        theme: Theme,
        palette: &Palette,
        table: &TravelTableView,
    ) -> io::Result<()> {
        writeln!(self.out, "  {}", table.title)?;
        if let Some(notice) = table.empty_notice {
            let notice = self.paint(theme, palette, Color::Muted, notice);
            return writeln!(self.out, "    {notice}");
        }
        let headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.flight.clone(),
                    row.counterpart.clone(),
                    row.time.clone(),
                    self.paint(theme, palette, row.status_color, &row.status),
                ]
            })
            .collect();
        for line in format_table(&headers, &rows) {
            writeln!(self.out, "    {line}")?;
        }
        Ok(())
    }

    fn write_prompt(
        &mut self,
        theme: Theme,
        palette: &Palette,
        input: &InputBarView,
    ) -> io::Result<()> {
        let mic = if input.listening { " [mic on]" } else { "" };
        let hint = self.paint(theme, palette, Color::Muted, input.placeholder);
        write!(self.out, "{hint}{mic}\n> ")
    }

    fn paint(&self, theme: Theme, palette: &Palette, color: Color, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        style(theme, palette, color).apply(text).to_string()
    }
}

/// Pads every column to its widest cell. Short rows are padded with blanks.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (idx, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(visible_width(cell(row, idx)));
        }
    }

    let render_row = |row: &[String]| {
        widths
            .iter()
            .enumerate()
            .map(|(idx, width)| {
                let text = cell(row, idx);
                let pad = width.saturating_sub(visible_width(text));
                format!("{text}{}", " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(rows.iter().map(|row| render_row(row)));
    lines
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Display columns, ignoring ANSI escape sequences.
fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in text.chars() {
        match (in_escape, ch) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, ch) => width += ch.width().unwrap_or(0),
        }
    }
    width
}

fn style(theme: Theme, palette: &Palette, color: Color) -> ContentStyle {
    let tone = match color {
        Color::Default => palette.text,
        Color::Muted => palette.muted,
        Color::Accent => palette.accent,
        Color::UserBubble => palette.user_bubble,
        Color::AssistantBubble => palette.assistant_bubble,
        Color::Success => return ContentStyle::new().green(),
        Color::Warning => return ContentStyle::new().yellow(),
        Color::Info => return ContentStyle::new().blue(),
        Color::Danger => return ContentStyle::new().red(),
    };
    match (theme, tone) {
        (_, tone) if tone.starts_with("blue") => ContentStyle::new().blue().bold(),
        (Theme::Dark, "white") | (Theme::Dark, "gray-200") => ContentStyle::new().white(),
        (Theme::Light, "white") => ContentStyle::new().bold(),
        (_, "gray-400") | (_, "gray-500") => ContentStyle::new().dark_grey(),
        (Theme::Dark, _) => ContentStyle::new().grey(),
        (Theme::Light, _) => ContentStyle::new().black(),
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
