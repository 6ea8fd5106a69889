//! Channel table widget.
//!
//! One row per channel in store order: id, name, rolling code, enabled
//! state and the number of requests still in flight for that channel.

use blindctl_core::Channel;
use blindctl_panel::Dispatcher;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Widget},
};

use crate::theme::Theme;

pub struct ChannelPanel<'a> {
    dispatcher: &'a Dispatcher,
    theme: &'a Theme,
    focused: bool,
    selected_index: usize,
}

impl<'a> ChannelPanel<'a> {
    pub fn new(dispatcher: &'a Dispatcher, theme: &'a Theme) -> Self {
        Self {
            dispatcher,
            theme,
            focused: false,
            selected_index: 0,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    fn row(&self, idx: usize, channel: &Channel) -> Row<'static> {
        let colors = &self.theme.colors;
        let is_selected = idx == self.selected_index;
        let pending = self.dispatcher.in_flight(channel.id);

        let style = if is_selected && self.focused {
            Style::default().fg(colors.selection).add_modifier(Modifier::BOLD)
        } else if !channel.enabled {
            Style::default().fg(colors.channel_disabled)
        } else {
            Style::default().fg(colors.text)
        };

        let marker = if is_selected && self.focused { "▶" } else { " " };
        let state = if channel.enabled { "on" } else { "off" };
        let pending = if pending > 0 {
            format!("⟳{pending}")
        } else {
            String::new()
        };

        Row::new(vec![
            marker.to_string(),
            channel.id.to_string(),
            channel.name.clone(),
            channel.rolling_code.to_string(),
            state.to_string(),
            pending,
        ])
        .style(style)
    }

    fn block(&self) -> Block<'static> {
        let colors = &self.theme.colors;
        let (border_type, border_style, title_style) = if self.focused {
            (
                BorderType::Double,
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
                Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
            )
        } else {
            (
                BorderType::Plain,
                Style::default().fg(colors.border_dim),
                Style::default().fg(colors.text_dim),
            )
        };

        let title = format!(" Channels ({}) ", self.dispatcher.store().len());
        Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(border_style)
            .title(Span::styled(title, title_style))
    }
}

impl Widget for ChannelPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let store = self.dispatcher.store();
        let block = self.block();

        if store.is_empty() {
            let hint = Paragraph::new(vec![
                Line::from(Span::styled(
                    "No channels.",
                    Style::default().fg(self.theme.colors.text_dim),
                )),
                Line::raw(""),
                Line::from(Span::styled(
                    "[a] Add a channel  [r] Reload from device",
                    Style::default().fg(self.theme.colors.hotkey),
                )),
            ])
            .block(block);
            hint.render(area, buf);
            return;
        }

        // Borders plus header row
        let visible = area.height.saturating_sub(3).max(1) as usize;
        let offset = self.selected_index.saturating_sub(visible - 1);

        let rows: Vec<Row> = store
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, channel)| self.row(idx, channel))
            .collect();

        let header = Row::new(vec!["", "ID", "Name", "Code", "State", ""]).style(
            Style::default()
                .fg(self.theme.colors.text_dim)
                .add_modifier(Modifier::BOLD),
        );

        let widths = [
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(4),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(block);

        Widget::render(table, area, buf);
    }
}
