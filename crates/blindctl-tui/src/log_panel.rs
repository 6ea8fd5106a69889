//! Device log widget.

use blindctl_panel::{LogStream, LogStreamState};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Scrollable view of the log buffer.
///
/// `scroll` counts lines up from the newest one; 0 follows the tail.
pub struct LogPanel<'a> {
    stream: &'a LogStream,
    theme: &'a Theme,
    focused: bool,
    scroll: usize,
    timestamps: bool,
}

impl<'a> LogPanel<'a> {
    pub fn new(stream: &'a LogStream, theme: &'a Theme) -> Self {
        Self {
            stream,
            theme,
            focused: false,
            scroll: 0,
            timestamps: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Prefix each line with its local arrival time.
    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    fn state_style(&self) -> Style {
        let colors = &self.theme.colors;
        match self.stream.state() {
            LogStreamState::Open => Style::default().fg(colors.status_ok),
            LogStreamState::Connecting { .. } | LogStreamState::Disconnected => {
                Style::default().fg(colors.status_warning)
            }
            LogStreamState::Closed { .. } => Style::default().fg(colors.status_error),
        }
    }

    /// One line describing a connection that is not open, if any.
    fn connection_line(&self) -> Option<Line<'static>> {
        let text = match self.stream.state() {
            LogStreamState::Open => return None,
            LogStreamState::Connecting { attempt: 0 } => "Connecting...".to_string(),
            LogStreamState::Connecting { attempt } => format!("Reconnecting (attempt {attempt})..."),
            LogStreamState::Disconnected => match self.stream.last_disconnect() {
                Some((reason, retry_in)) => {
                    format!("Connection lost: {reason}. Retrying in {}s.", retry_in.as_secs())
                }
                None => "Not connected.".to_string(),
            },
            LogStreamState::Closed { reason } => match reason {
                Some(reason) => format!("Log stream closed: {reason}. [o] Reconnect"),
                None => "Log stream closed. [o] Reconnect".to_string(),
            },
        };
        Some(Line::from(Span::styled(text, self.state_style())))
    }

    fn block(&self) -> Block<'static> {
        let colors = &self.theme.colors;
        let buffer = self.stream.buffer();
        let (border_type, border_style) = if self.focused {
            (
                BorderType::Double,
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            )
        } else {
            (BorderType::Plain, Style::default().fg(colors.border_dim))
        };

        let mut title = vec![
            Span::styled(" Device Log ", Style::default().fg(colors.header)),
            Span::styled(format!("[{}] ", self.stream.state().label()), self.state_style()),
            Span::styled(
                format!("{}/{} ", buffer.len(), buffer.capacity()),
                Style::default().fg(colors.text_dim),
            ),
        ];
        if self.scroll > 0 {
            title.push(Span::styled(
                format!("↑{} ", self.scroll),
                Style::default().fg(colors.hotkey),
            ));
        }

        Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(border_style)
            .title(Line::from(title))
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut height = area.height.saturating_sub(2) as usize;
        let mut lines = Vec::with_capacity(height);

        if let Some(line) = self.connection_line() {
            lines.push(line);
            height = height.saturating_sub(1);
        }

        let buffer = self.stream.buffer();
        if buffer.is_empty() && self.stream.state().is_open() {
            lines.push(Line::from(Span::styled(
                "Waiting for log lines...",
                Style::default().fg(colors.text_dim),
            )));
        }

        let end = buffer.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        for entry in buffer.iter().skip(start).take(end - start) {
            let mut spans = Vec::with_capacity(2);
            if self.timestamps {
                spans.push(Span::styled(
                    entry.received_at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(colors.text_dim),
                ));
            }
            spans.push(Span::styled(entry.line.clone(), Style::default().fg(colors.text)));
            lines.push(Line::from(spans));
        }

        Paragraph::new(lines).block(self.block()).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindctl_client::SocketEvent;
    use std::time::Duration;

    fn render(panel: LogPanel<'_>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        panel.render(area, &mut buf);
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn open_stream(lines: &[&str]) -> LogStream {
        let mut stream = LogStream::new(100);
        stream.apply(SocketEvent::Opened);
        for line in lines {
            stream.apply(SocketEvent::Line(line.to_string()));
        }
        stream
    }

    #[test]
    fn test_tail_shows_newest_lines() {
        let stream = open_stream(&["one", "two", "three", "four", "five"]);
        let theme = Theme::default();
        // Three content rows
        let text = render(LogPanel::new(&stream, &theme), 40, 5);

        assert!(text.contains("[open]"));
        assert!(text.contains("5/100"));
        assert!(text.contains("five"));
        assert!(text.contains("three"));
        assert!(!text.contains("two"));
    }

    #[test]
    fn test_scrolled_back() {
        let stream = open_stream(&["one", "two", "three", "four", "five"]);
        let theme = Theme::default();
        let text = render(LogPanel::new(&stream, &theme).scroll(2), 40, 5);

        assert!(text.contains("one"));
        assert!(text.contains("three"));
        assert!(!text.contains("five"));
        assert!(text.contains("↑2"));
    }

    #[test]
    fn test_closed_stream_offers_reconnect() {
        let mut stream = open_stream(&["boot"]);
        stream.apply(SocketEvent::Closed {
            reason: Some("connection refused".to_string()),
        });
        let theme = Theme::default();
        let text = render(LogPanel::new(&stream, &theme), 80, 6);

        assert!(text.contains("[closed]"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("[o] Reconnect"));
        // Lines received before the close stay visible
        assert!(text.contains("boot"));
    }

    #[test]
    fn test_disconnect_shows_backoff() {
        let mut stream = open_stream(&[]);
        stream.apply(SocketEvent::Disconnected {
            reason: "reset by peer".to_string(),
            retry_in: Duration::from_secs(4),
        });
        let theme = Theme::default();
        let text = render(LogPanel::new(&stream, &theme), 80, 6);

        assert!(text.contains("Connection lost: reset by peer. Retrying in 4s."));
    }
}
