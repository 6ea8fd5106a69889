//! Network view widget: station config and Wi-Fi scan results.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Widget},
};

use crate::network::NetworkState;
use crate::theme::Theme;

pub struct NetworkPanel<'a> {
    state: &'a NetworkState,
    theme: &'a Theme,
    selected_index: usize,
}

impl<'a> NetworkPanel<'a> {
    pub fn new(state: &'a NetworkState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            selected_index: 0,
        }
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    fn config_lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let label = Style::default().fg(colors.text_dim);
        let value = Style::default().fg(colors.text);

        match self.state.config() {
            Some(config) => vec![
                Line::from(vec![
                    Span::styled("SSID:     ", label),
                    Span::styled(config.ssid.clone(), value),
                ]),
                Line::from(vec![
                    Span::styled("Password: ", label),
                    Span::styled(mask(&config.password), value),
                ]),
            ],
            None => vec![Line::from(Span::styled("Configuration not loaded.", label))],
        }
    }

    fn render_config(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut lines = self.config_lines();
        lines.push(Line::from(Span::styled(
            "[e] Edit  [B] Restart device",
            Style::default().fg(colors.hotkey),
        )));

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.border_dim))
                    .title(Span::styled(" Station ", Style::default().fg(colors.header))),
            )
            .render(area, buf);
    }

    fn render_scan(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = if self.state.is_scanning() {
            " Networks (scanning...) ".to_string()
        } else {
            format!(" Networks ({}) ", self.state.networks().len())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(colors.header).add_modifier(Modifier::BOLD))
            .title(Span::styled(
                title,
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            ));

        if self.state.networks().is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No scan results. [r] Scan",
                Style::default().fg(colors.text_dim),
            )))
            .block(block)
            .render(area, buf);
            return;
        }

        let visible = area.height.saturating_sub(3).max(1) as usize;
        let offset = self.selected_index.saturating_sub(visible - 1);

        let rows: Vec<Row> = self
            .state
            .networks()
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, network)| {
                let selected = idx == self.selected_index;
                let style = if selected {
                    Style::default().fg(colors.selection).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.text)
                };
                Row::new(vec![
                    Span::raw(if selected { "▶" } else { " " }),
                    Span::raw(network.ssid.clone()),
                    Span::styled(
                        format!("{} dBm", network.rssi),
                        Style::default().fg(self.theme.rssi_color(network.rssi)),
                    ),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(vec!["", "SSID", "Signal"]).style(
            Style::default()
                .fg(colors.text_dim)
                .add_modifier(Modifier::BOLD),
        );
        let widths = [
            Constraint::Length(1),
            Constraint::Min(20),
            Constraint::Length(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(block);
        Widget::render(table, area, buf);
    }
}

impl Widget for NetworkPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(4)])
            .split(area);

        self.render_config(chunks[0], buf);
        self.render_scan(chunks[1], buf);
    }
}

/// Hide a password, keeping only its length visible.
fn mask(password: &str) -> String {
    if password.is_empty() {
        "(none)".to_string()
    } else {
        "•".repeat(password.chars().count())
    }
}
