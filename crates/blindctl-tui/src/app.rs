//! Main application state and logic for the blindctl TUI.
//!
//! The `App` owns the channel dispatcher, the log stream and the network
//! view state, plus the tokio runtime their requests run on. All state is
//! mutated on the UI thread: each loop iteration applies finished requests
//! and queued log events, then redraws if anything changed.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blindctl_client::{DeviceApi, HttpTransport, LogSocket, SocketEvent, Transport};
use blindctl_config::PanelConfig;
use blindctl_core::{Channel, ChannelId, PanelError};
use blindctl_panel::{DispatchError, DispatchOutcome, Dispatcher, LogStream, Movement};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::channel_panel::ChannelPanel;
use crate::dialog::{PendingConfirm, PromptKind, TextPrompt};
use crate::event::{AppEvent, InputHandler, InputMode};
use crate::log_panel::LogPanel;
use crate::network::{DeviceNotice, NetworkState};
use crate::network_panel::NetworkPanel;
use crate::theme::ThemeManager;
use crate::view::{LayoutMode, View};

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// How long a status line message stays up.
const STATUS_TTL: Duration = Duration::from_secs(5);

const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Transient message for the status line.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    shown_at: Instant,
}

/// Main application state.
pub struct App {
    current_view: View,
    input_handler: InputHandler,
    should_quit: bool,
    show_help: bool,
    /// Device address shown in the header
    device_label: String,
    dispatcher: Dispatcher,
    network: NetworkState,
    /// Scan and config are fetched the first time the network view opens
    network_loaded: bool,
    log_stream: LogStream,
    log_socket: Option<LogSocket>,
    log_rx: Option<mpsc::Receiver<SocketEvent>>,
    log_task: Option<JoinHandle<()>>,
    selected_channel: usize,
    selected_network: usize,
    /// Lines scrolled back from the newest; 0 follows the tail
    log_scroll: usize,
    /// `total_received` of the log buffer at the last tick
    log_seen: u64,
    prompt: Option<TextPrompt>,
    confirm: Option<PendingConfirm>,
    status: Option<StatusMessage>,
    theme_manager: ThemeManager,
    dirty: bool,
    last_revision: u64,
    // Dropped last, after every task handle above
    runtime: Runtime,
}

impl App {
    /// Build the app for the device described by `config`.
    pub fn new(config: &PanelConfig) -> AppResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("blindctl-net")
            .enable_all()
            .build()?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            config.base_url.clone(),
            config.request_timeout(),
        )?);
        let socket = LogSocket::new(config.resolved_ws_url()?, config.reconnect_policy());

        let mut app = Self::with_parts(runtime, transport, Some(socket), config.log_capacity);
        app.device_label = config.base_url.clone();
        Ok(app)
    }

    /// Build the app from explicit parts. `log_socket` of `None` leaves the
    /// log view disconnected.
    pub fn with_parts(
        runtime: Runtime,
        transport: Arc<dyn Transport>,
        log_socket: Option<LogSocket>,
        log_capacity: usize,
    ) -> Self {
        let handle = runtime.handle().clone();
        let dispatcher = Dispatcher::new(Arc::clone(&transport), handle.clone());
        let network = NetworkState::new(DeviceApi::new(transport), handle);

        Self {
            current_view: View::default(),
            input_handler: InputHandler::new(),
            should_quit: false,
            show_help: false,
            device_label: String::new(),
            dispatcher,
            network,
            network_loaded: false,
            log_stream: LogStream::new(log_capacity),
            log_socket,
            log_rx: None,
            log_task: None,
            selected_channel: 0,
            selected_network: 0,
            log_scroll: 0,
            log_seen: 0,
            prompt: None,
            confirm: None,
            status: None,
            theme_manager: ThemeManager::new(),
            dirty: true,
            last_revision: 0,
            runtime,
        }
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn log_stream(&self) -> &LogStream {
        &self.log_stream
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        self.dispatcher.store().get_index(self.selected_channel)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            shown_at: Instant::now(),
        });
        self.mark_dirty();
    }

    /// Load the channel list and open the log socket.
    ///
    /// Blocks until the initial fetch answers or times out.
    pub fn start(&mut self) {
        match self.runtime.block_on(self.dispatcher.load_initial()) {
            Ok(count) => self.set_status(format!("Loaded {count} channels"), StatusLevel::Info),
            Err(e) => self.set_status(e.friendly_message(), StatusLevel::Error),
        }
        self.last_revision = self.dispatcher.store().revision();
        self.connect_log();
    }

    /// Spawn the log socket task, replacing any previous one.
    fn connect_log(&mut self) {
        let Some(socket) = self.log_socket.clone() else {
            return;
        };
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        info!(url = %socket.url(), "opening log socket");
        self.log_stream.reopen();
        let (task, rx) = socket.spawn(self.runtime.handle());
        self.log_task = Some(task);
        self.log_rx = Some(rx);
        self.mark_dirty();
    }

    /// Apply finished requests and queued log events. Returns whether
    /// anything visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;

        for outcome in self.dispatcher.poll_completions() {
            self.report_outcome(outcome);
            changed = true;
        }
        for notice in self.network.poll() {
            self.report_notice(notice);
            changed = true;
        }

        if let Some(rx) = self.log_rx.as_mut() {
            let was_closed = self.log_stream.state().is_closed();
            if self.log_stream.drain(rx) > 0 || self.log_stream.state().is_closed() != was_closed {
                changed = true;
            }
        }
        if self.log_stream.take_scroll_request() {
            let total = self.log_stream.buffer().total_received();
            if self.log_scroll > 0 {
                // Hold a scrolled-back view still while lines arrive
                let arrived = total.saturating_sub(self.log_seen) as usize;
                self.log_scroll = (self.log_scroll + arrived)
                    .min(self.log_stream.buffer().len().saturating_sub(1));
            }
            self.log_seen = total;
            changed = true;
        }

        let revision = self.dispatcher.store().revision();
        if revision != self.last_revision {
            self.last_revision = revision;
            self.clamp_selection();
            changed = true;
        }

        if self
            .status
            .as_ref()
            .is_some_and(|s| s.shown_at.elapsed() >= STATUS_TTL)
        {
            self.status = None;
            changed = true;
        }

        if changed {
            self.mark_dirty();
        }
        changed
    }

    fn report_outcome(&mut self, outcome: DispatchOutcome) {
        match &outcome {
            DispatchOutcome::Failed { .. } => {
                self.set_status(capitalize(&outcome.to_string()), StatusLevel::Error);
            }
            DispatchOutcome::Created(channel) => {
                if let Some(pos) = self.dispatcher.store().position(channel.id) {
                    self.selected_channel = pos;
                }
                self.set_status(format!("Created '{}'", channel.name), StatusLevel::Success);
            }
            DispatchOutcome::Refreshed { count } => {
                self.set_status(format!("Loaded {count} channels"), StatusLevel::Info);
            }
            DispatchOutcome::Acknowledged(_) | DispatchOutcome::Dropped(_) => {
                debug!(%outcome, "request finished");
            }
        }
    }

    fn report_notice(&mut self, notice: DeviceNotice) {
        let level = match notice {
            DeviceNotice::Failed { .. } => StatusLevel::Error,
            DeviceNotice::ConfigLoaded => return,
            DeviceNotice::Scanned { .. } => {
                let len = self.network.networks().len();
                self.selected_network = self.selected_network.min(len.saturating_sub(1));
                StatusLevel::Info
            }
            _ => StatusLevel::Success,
        };
        self.set_status(notice.to_string(), level);
    }

    fn report_refusal(&mut self, error: DispatchError) {
        debug!(%error, "command refused");
        self.set_status(error.friendly_message(), StatusLevel::Error);
    }

    fn clamp_selection(&mut self) {
        let len = self.dispatcher.store().len();
        self.selected_channel = self.selected_channel.min(len.saturating_sub(1));
    }

    pub fn switch_view(&mut self, view: View) {
        self.current_view = view;
        if view == View::Network && !self.network_loaded {
            self.network_loaded = true;
            self.network.scan();
            self.network.load_config();
        }
        self.mark_dirty();
    }

    pub fn next_view(&mut self) {
        self.switch_view(self.current_view.next());
    }

    pub fn prev_view(&mut self) {
        self.switch_view(self.current_view.prev());
    }

    fn open_prompt(&mut self, prompt: TextPrompt) {
        self.prompt = Some(prompt);
        self.input_handler.set_mode(InputMode::Text);
        self.mark_dirty();
    }

    fn open_confirm(&mut self, confirm: PendingConfirm) {
        self.confirm = Some(confirm);
        self.input_handler.set_mode(InputMode::Confirm);
        self.mark_dirty();
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        // Any key closes the help overlay
        if self.show_help {
            self.show_help = false;
            self.mark_dirty();
            return;
        }
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SwitchView(view) => self.switch_view(view),
            AppEvent::NextView => self.next_view(),
            AppEvent::PrevView => self.prev_view(),
            AppEvent::ShowHelp => {
                self.show_help = true;
                self.mark_dirty();
            }
            AppEvent::HideHelp => {
                self.show_help = false;
                self.mark_dirty();
            }
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,
            AppEvent::Refresh => self.refresh(),
            AppEvent::Cancel => self.cancel(),
            AppEvent::NavigateUp => self.navigate(-1),
            AppEvent::NavigateDown => self.navigate(1),
            AppEvent::PageUp => self.navigate(-(PAGE_SIZE as isize)),
            AppEvent::PageDown => self.navigate(PAGE_SIZE as isize),
            AppEvent::GoToTop => self.navigate(isize::MIN),
            AppEvent::GoToBottom => self.navigate(isize::MAX),
            AppEvent::Select => self.select(),
            AppEvent::Move(movement) => self.move_selected(movement),
            AppEvent::ToggleEnabled => self.toggle_selected(),
            AppEvent::Prog => self.ask_remote(false),
            AppEvent::ResetRollingCode => self.ask_remote(true),
            AppEvent::Rename => self.start_rename(),
            AppEvent::Create => {
                if self.current_view == View::Channels {
                    self.open_prompt(TextPrompt::new(PromptKind::Create));
                }
            }
            AppEvent::Delete => self.ask_delete(),
            AppEvent::RestartDevice => self.open_confirm(PendingConfirm::Restart),
            AppEvent::ReconnectLog => {
                if self.log_stream.state().is_closed() {
                    self.connect_log();
                    self.set_status("Reconnecting log stream", StatusLevel::Info);
                } else {
                    self.set_status("Log stream is already connected", StatusLevel::Info);
                }
            }
            AppEvent::CycleTheme => {
                let theme = self.theme_manager.cycle_theme();
                self.set_status(format!("Theme: {}", theme.display_name()), StatusLevel::Info);
            }
            AppEvent::Confirm => self.confirm(),
            AppEvent::TextInput(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.push(c);
                    self.mark_dirty();
                }
            }
            AppEvent::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.backspace();
                    self.mark_dirty();
                }
            }
            AppEvent::Submit => self.submit(),
            AppEvent::None => {}
        }
    }

    fn refresh(&mut self) {
        if self.current_view == View::Network {
            if self.network.scan() {
                self.set_status("Scanning for networks...", StatusLevel::Info);
            }
        } else {
            self.dispatcher.refresh();
            self.set_status("Reloading channels...", StatusLevel::Info);
        }
    }

    fn cancel(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.prompt.take().is_some() {
            debug!("prompt cancelled");
        } else if let Some(confirm) = self.confirm.take() {
            if let PendingConfirm::Remote(prompt) = confirm {
                prompt.dismiss();
            }
        }
        self.input_handler.set_mode(InputMode::Normal);
        self.mark_dirty();
    }

    /// Move the cursor of the current view by `delta` rows.
    fn navigate(&mut self, delta: isize) {
        match self.current_view {
            View::Channels => {
                let len = self.dispatcher.store().len();
                self.selected_channel = step(self.selected_channel, delta, len);
            }
            View::Network => {
                let len = self.network.networks().len();
                self.selected_network = step(self.selected_network, delta, len);
            }
            View::Logs => {
                // Up scrolls back in time
                let len = self.log_stream.buffer().len();
                self.log_scroll = step(self.log_scroll, delta.saturating_neg(), len);
                self.log_seen = self.log_stream.buffer().total_received();
            }
        }
        self.mark_dirty();
    }

    fn select(&mut self) {
        if self.current_view == View::Network {
            if let Some(network) = self.network.networks().get(self.selected_network) {
                let ssid = network.ssid.clone();
                self.open_prompt(TextPrompt::new(PromptKind::WifiSsid).with_input(ssid));
            }
        }
    }

    fn selected_id(&self) -> Option<ChannelId> {
        if self.current_view != View::Channels {
            return None;
        }
        self.selected_channel().map(|c| c.id)
    }

    fn move_selected(&mut self, movement: Movement) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.dispatcher.move_channel(id, movement) {
            Ok(()) => self.mark_dirty(),
            Err(e) => self.report_refusal(e),
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.dispatcher.toggle(id) {
            Ok(enabled) => {
                let verb = if enabled { "Enabled" } else { "Disabled" };
                self.set_status(format!("{verb} channel {id}"), StatusLevel::Info);
            }
            Err(e) => self.report_refusal(e),
        }
    }

    fn ask_remote(&mut self, reset: bool) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let prompt = if reset {
            self.dispatcher.confirm_reset(id)
        } else {
            self.dispatcher.confirm_prog(id)
        };
        match prompt {
            Ok(prompt) => self.open_confirm(PendingConfirm::Remote(prompt)),
            Err(e) => self.report_refusal(e),
        }
    }

    fn start_rename(&mut self) {
        match self.current_view {
            View::Channels => {
                if let Some(channel) = self.selected_channel() {
                    let prompt =
                        TextPrompt::new(PromptKind::Rename(channel.id)).with_input(&channel.name);
                    self.open_prompt(prompt);
                }
            }
            View::Network => {
                let ssid = self
                    .network
                    .config()
                    .map(|c| c.ssid.clone())
                    .unwrap_or_default();
                self.open_prompt(TextPrompt::new(PromptKind::WifiSsid).with_input(ssid));
            }
            View::Logs => {}
        }
    }

    fn ask_delete(&mut self) {
        if self.current_view != View::Channels {
            return;
        }
        if let Some(channel) = self.selected_channel() {
            let confirm = PendingConfirm::Delete {
                id: channel.id,
                name: channel.name.clone(),
            };
            self.open_confirm(confirm);
        }
    }

    fn confirm(&mut self) {
        self.input_handler.set_mode(InputMode::Normal);
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        match confirm {
            PendingConfirm::Remote(prompt) => {
                let action = prompt.action();
                let id = prompt.channel();
                match self.dispatcher.execute(prompt.accept()) {
                    Ok(()) => self.set_status(
                        format!("Sent {} to channel {id}", action.as_str().to_uppercase()),
                        StatusLevel::Info,
                    ),
                    Err(e) => self.report_refusal(e),
                }
            }
            PendingConfirm::Delete { id, name } => {
                self.dispatcher.delete(id);
                self.set_status(format!("Deleted '{name}'"), StatusLevel::Info);
            }
            PendingConfirm::Restart => {
                self.network.restart();
                self.set_status("Restarting device...", StatusLevel::Info);
            }
        }
        self.mark_dirty();
    }

    fn submit(&mut self) {
        self.input_handler.set_mode(InputMode::Normal);
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let (kind, input) = prompt.into_parts();
        match kind {
            PromptKind::Rename(id) => match self.dispatcher.rename(id, &input) {
                Ok(name) => self.set_status(format!("Renamed to '{name}'"), StatusLevel::Info),
                Err(e) => self.report_refusal(e),
            },
            PromptKind::Create => match self.dispatcher.create(&input) {
                Ok(()) => self.set_status("Creating channel...", StatusLevel::Info),
                Err(e) => self.report_refusal(e),
            },
            PromptKind::WifiSsid => {
                let ssid = input.trim().to_string();
                if ssid.is_empty() {
                    self.set_status("SSID cannot be empty.", StatusLevel::Error);
                } else {
                    self.open_prompt(TextPrompt::new(PromptKind::WifiPassword { ssid }));
                }
            }
            PromptKind::WifiPassword { ssid } => {
                self.network.save_config(ssid, input);
                self.set_status("Saving network configuration...", StatusLevel::Info);
            }
        }
        self.mark_dirty();
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode().map_err(|e| PanelError::TerminalInit {
            message: e.to_string(),
        })?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        self.set_status("Connecting to device...", StatusLevel::Info);
        terminal.draw(|frame| self.draw(frame))?;
        self.start();

        while !self.should_quit {
            let frame_start = Instant::now();

            self.tick();
            if self.take_dirty() {
                terminal.draw(|frame| self.draw(frame))?;
            }

            let elapsed = frame_start.elapsed();
            let event_timeout = FRAME_DURATION
                .checked_sub(elapsed)
                .unwrap_or(Duration::from_millis(10));

            if event::poll(event_timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_event(key),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }
        }

        info!("shutting down");
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status line
                Constraint::Length(2), // Footer
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_content(frame, chunks[1]);
        self.draw_status(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        if let Some(prompt) = &self.prompt {
            self.draw_prompt_overlay(frame, area, prompt);
        }
        if let Some(confirm) = &self.confirm {
            self.draw_confirm_overlay(frame, area, confirm);
        }
        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let title = format!(" blindctl - {} ", self.current_view.title());

        let log_state = self.log_stream.state();
        let log_color = if log_state.is_open() {
            theme.colors.status_ok
        } else if log_state.is_closed() {
            theme.colors.status_error
        } else {
            theme.colors.status_warning
        };

        let pending = self.dispatcher.pending() + self.network.pending();
        let mut right = vec![Span::styled(
            self.device_label.clone(),
            Style::default().fg(theme.colors.text_dim),
        )];
        if pending > 0 {
            right.push(Span::raw("  "));
            right.push(Span::styled(
                format!("⟳ {pending}"),
                Style::default().fg(theme.colors.status_warning),
            ));
        }
        right.push(Span::raw("  "));
        right.push(Span::styled(
            format!("[log: {}]", log_state.label()),
            Style::default().fg(log_color),
        ));

        let right_len: usize = right.iter().map(|s| s.content.chars().count()).sum();
        let spacing = (area.width as usize).saturating_sub(title.chars().count() + right_len + 2);

        let mut spans = vec![
            Span::styled(
                title,
                Style::default()
                    .fg(theme.colors.header)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" ".repeat(spacing)),
        ];
        spans.extend(right);

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.colors.border_dim)),
        );
        frame.render_widget(header, area);
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        match self.current_view {
            View::Channels => {
                let direction = match LayoutMode::from_width(area.width) {
                    LayoutMode::Wide => Direction::Horizontal,
                    LayoutMode::Narrow => Direction::Vertical,
                };
                let constraints = match direction {
                    Direction::Horizontal => [Constraint::Percentage(55), Constraint::Percentage(45)],
                    Direction::Vertical => [Constraint::Min(6), Constraint::Length(8)],
                };
                let chunks = Layout::default()
                    .direction(direction)
                    .constraints(constraints)
                    .split(area);

                frame.render_widget(
                    ChannelPanel::new(&self.dispatcher, theme)
                        .focused(true)
                        .selected(self.selected_channel),
                    chunks[0],
                );
                frame.render_widget(LogPanel::new(&self.log_stream, theme), chunks[1]);
            }
            View::Logs => frame.render_widget(
                LogPanel::new(&self.log_stream, theme)
                    .focused(true)
                    .timestamps(true)
                    .scroll(self.log_scroll),
                area,
            ),
            View::Network => frame.render_widget(
                NetworkPanel::new(&self.network, theme).selected(self.selected_network),
                area,
            ),
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let Some(status) = &self.status else {
            return;
        };
        let color = match status.level {
            StatusLevel::Info => theme.colors.text,
            StatusLevel::Success => theme.colors.status_ok,
            StatusLevel::Error => theme.colors.status_error,
        };
        let line = Paragraph::new(Line::from(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color),
        )));
        frame.render_widget(line, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let hotkey_style = Style::default().fg(theme.colors.hotkey);

        let keys: &[(&str, &str)] = match self.current_view {
            View::Channels => &[
                ("u/d/s", "Up/Down/Stop "),
                ("Space", "Enable "),
                ("p", "Prog "),
                ("z", "Reset "),
                ("e", "Rename "),
                ("a", "Add "),
                ("x", "Delete "),
                ("r", "Reload "),
            ],
            View::Logs => &[("↑↓", "Scroll "), ("G", "Follow "), ("o", "Reconnect ")],
            View::Network => &[
                ("r", "Scan "),
                ("Enter", "Use network "),
                ("e", "Edit "),
                ("B", "Restart "),
            ],
        };

        let mut hints = Vec::with_capacity(keys.len() * 2 + 6);
        for (key, label) in keys {
            hints.push(Span::styled(format!("[{key}]"), hotkey_style));
            hints.push(Span::raw(*label));
        }
        for (key, label) in [("Tab", "View "), ("?", "Help "), ("q", "Quit")] {
            hints.push(Span::styled(format!("[{key}]"), hotkey_style));
            hints.push(Span::raw(label));
        }

        let footer = Paragraph::new(Line::from(hints))
            .style(Style::default().fg(theme.colors.text_dim))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }

    fn draw_prompt_overlay(&self, frame: &mut Frame, area: Rect, prompt: &TextPrompt) {
        let theme = self.theme_manager.current();
        let overlay = centered_rect(area, 56, 6);
        frame.render_widget(Clear, overlay);

        let lines = vec![
            Line::from(vec![
                Span::styled("> ", Style::default().fg(theme.colors.hotkey)),
                Span::styled(prompt.display_input(), Style::default().fg(theme.colors.text)),
                Span::styled("_", Style::default().fg(theme.colors.hotkey)),
            ]),
            Line::raw(""),
            Line::from(Span::styled(
                prompt.hint(),
                Style::default().fg(theme.colors.text_dim),
            )),
        ];

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.colors.header))
                    .title(Span::styled(
                        format!(" {} ", prompt.title()),
                        Style::default()
                            .fg(theme.colors.header)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, overlay);
    }

    fn draw_confirm_overlay(&self, frame: &mut Frame, area: Rect, confirm: &PendingConfirm) {
        let theme = self.theme_manager.current();
        let overlay = centered_rect(area, 60, 8);
        frame.render_widget(Clear, overlay);

        let lines = vec![
            Line::from(Span::styled(
                confirm.message(),
                Style::default().fg(theme.colors.text),
            )),
            Line::raw(""),
            Line::from(vec![
                Span::styled("[y]", Style::default().fg(theme.colors.status_error)),
                Span::raw(" Yes   "),
                Span::styled("[n]", Style::default().fg(theme.colors.hotkey)),
                Span::raw(" No"),
            ])
            .alignment(Alignment::Center),
        ];

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.colors.status_warning))
                    .title(Span::styled(
                        format!(" {} ", confirm.title()),
                        Style::default()
                            .fg(theme.colors.status_warning)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, overlay);
    }

    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.current();
        let overlay = centered_rect(area, 60, 30);
        frame.render_widget(Clear, overlay);

        let help_text = "\
blindctl Hotkey Reference

Views:
  c        Channels
  l        Device log
  n        Network
  Tab      Cycle views forward
  Shift+Tab Cycle views backward

Channels:
  u d s    Up / Down / Stop
  Space    Enable or disable
  p        Prog (asks first)
  z        Reset rolling code (asks first)
  e        Rename
  a        Add channel
  x Del    Delete (asks first)
  r        Reload from device

Network and device:
  r        Scan networks
  Enter    Use selected network
  e        Edit station config
  B        Restart device (asks first)
  o        Reconnect closed log stream

General:
  ↑ k ↓ j  Move    g G  Top / Bottom
  t        Cycle theme
  Esc      Cancel    q  Quit

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(theme.colors.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.colors.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default()
                            .fg(theme.colors.header)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(help, overlay);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
    }
}

/// Move `current` by `delta` within `0..len`, saturating at both ends.
fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs()).min(max)
    } else {
        current.saturating_add(delta as usize).min(max)
    }
}

/// A `width` x `height` rect centered in `area`, shrunk to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindctl_client::{Endpoint, MockTransport};
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use serde_json::json;

    fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    fn render_app(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = test_terminal(width, height);
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_contains(buffer: &Buffer, text: &str) -> bool {
        buffer_to_string(buffer).contains(text)
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut result = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                result.push_str(buffer[(x, y)].symbol());
            }
            result.push('\n');
        }
        result
    }

    fn mock_device() -> Arc<MockTransport> {
        Arc::new(
            MockTransport::new()
                .with_response(
                    Endpoint::Remotes,
                    json!([
                        {"id": 1, "name": "Kitchen", "rolling_code": 10},
                        {"id": 2, "name": "Patio", "rolling_code": 4, "enabled": false},
                        {"id": 3, "name": "Office", "rolling_code": 0}
                    ]),
                )
                .with_response(
                    Endpoint::WifiNetworks,
                    json!([{"ssid": "home", "rssi": -48}, {"ssid": "garage", "rssi": -81}]),
                )
                .with_response(Endpoint::WifiConfig, json!({"ssid": "home", "password": "pw"})),
        )
    }

    fn test_app(mock: Arc<MockTransport>) -> App {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let mut app = App::with_parts(runtime, mock, None, 100);
        app.start();
        app
    }

    /// Wait for every request, then apply the results like the run loop does.
    fn settle(app: &mut App) {
        let outcomes = app.runtime.block_on(app.dispatcher.settle());
        for outcome in outcomes {
            app.report_outcome(outcome);
        }
        let notices = app.runtime.block_on(app.network.settle());
        for notice in notices {
            app.report_notice(notice);
        }
        app.tick();
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn action_payloads(mock: &MockTransport) -> Vec<serde_json::Value> {
        mock.payloads(Endpoint::RemoteAction)
    }

    // ============================================================
    // Rendering
    // ============================================================

    #[test]
    fn test_channels_view_renders_table_and_log() {
        let mut app = test_app(mock_device());
        let buffer = render_app(&mut app, 120, 30);

        assert!(buffer_contains(&buffer, "blindctl - Channels"));
        assert!(buffer_contains(&buffer, "Channels (3)"));
        assert!(buffer_contains(&buffer, "Kitchen"));
        assert!(buffer_contains(&buffer, "Device Log"));
        assert!(buffer_contains(&buffer, "Loaded 3 channels"));
    }

    #[test]
    fn test_narrow_layout_still_shows_both_panels() {
        let mut app = test_app(mock_device());
        let buffer = render_app(&mut app, 80, 30);

        assert!(buffer_contains(&buffer, "Kitchen"));
        assert!(buffer_contains(&buffer, "Device Log"));
    }

    #[test]
    fn test_footer_shows_view_hotkeys() {
        let mut app = test_app(mock_device());
        let buffer = render_app(&mut app, 140, 30);
        assert!(buffer_contains(&buffer, "[p]Prog"));

        app.switch_view(View::Logs);
        let buffer = render_app(&mut app, 140, 30);
        assert!(buffer_contains(&buffer, "[o]Reconnect"));
    }

    #[test]
    fn test_help_overlay_renders() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());
        app.handle_app_event(AppEvent::ShowHelp);
        let buffer = render_app(&mut app, 100, 40);

        assert!(app.show_help());
        assert!(buffer_contains(&buffer, "Hotkey Reference"));

        // Any key closes it without acting
        press(&mut app, KeyCode::Char('u'));
        assert!(!app.show_help());
        assert!(action_payloads(&mock).is_empty());
    }

    #[test]
    fn test_initial_load_failure_shows_friendly_message() {
        let mock = Arc::new(MockTransport::new().with_failure(Endpoint::Remotes));
        let mut app = test_app(mock);
        let buffer = render_app(&mut app, 100, 30);

        assert!(buffer_contains(&buffer, "Device unreachable. Check the network."));
        assert!(buffer_contains(&buffer, "No channels."));
    }

    // ============================================================
    // Channel commands
    // ============================================================

    #[test]
    fn test_move_keys_send_actions() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.selected_channel().map(|c| c.rolling_code), Some(12));
        settle(&mut app);

        assert_eq!(
            action_payloads(&mock),
            vec![
                json!({"remote_id": 1, "action": "up"}),
                json!({"remote_id": 1, "action": "stop"})
            ]
        );
    }

    #[test]
    fn test_disabled_channel_refuses_movement() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));

        assert!(action_payloads(&mock).is_empty());
        assert_eq!(
            app.status().map(|s| s.text.as_str()),
            Some("Channel 2 is disabled. Enable it first.")
        );
    }

    #[test]
    fn test_prog_asks_first() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('p'));
        let buffer = render_app(&mut app, 120, 30);
        assert!(buffer_contains(&buffer, "Program channel"));
        assert!(action_payloads(&mock).is_empty());

        // Movement keys do nothing while the question is open
        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('n'));
        settle(&mut app);
        assert!(action_payloads(&mock).is_empty());

        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app);
        assert_eq!(
            action_payloads(&mock),
            vec![json!({"remote_id": 1, "action": "prog"})]
        );
        assert_eq!(app.selected_channel().map(|c| c.rolling_code), Some(11));
    }

    #[test]
    fn test_reset_zeroes_rolling_code() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('z'));
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.selected_channel().map(|c| c.rolling_code), Some(0));
        assert_eq!(
            action_payloads(&mock),
            vec![json!({"remote_id": 1, "action": "reset"})]
        );
    }

    #[test]
    fn test_escape_dismisses_confirmation() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('z'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app);

        assert!(action_payloads(&mock).is_empty());
        assert_eq!(app.selected_channel().map(|c| c.rolling_code), Some(10));
    }

    #[test]
    fn test_toggle_enables_disabled_channel() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        settle(&mut app);

        assert_eq!(app.selected_channel().map(|c| c.enabled), Some(true));
        assert_eq!(
            action_payloads(&mock),
            vec![json!({"remote_id": 2, "action": "enable"})]
        );
    }

    #[test]
    fn test_rename_flow() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('e'));
        let buffer = render_app(&mut app, 120, 30);
        assert!(buffer_contains(&buffer, "Rename channel 1"));

        for _ in 0.."Kitchen".len() {
            press(&mut app, KeyCode::Backspace);
        }
        // Hotkeys are plain text while typing
        type_text(&mut app, "  Den  ");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.selected_channel().map(|c| c.name.as_str()), Some("Den"));
        assert_eq!(
            mock.payloads(Endpoint::RemoteUpdate),
            vec![json!({"remote_id": 1, "data": {"name": "Den"}})]
        );
    }

    #[test]
    fn test_create_selects_new_channel() {
        let mock = mock_device();
        mock.push_response(
            Endpoint::RemoteCreate,
            json!({"id": 9, "name": "Garage", "rolling_code": 0}),
        );
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Garage");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.dispatcher().store().len(), 4);
        assert_eq!(app.selected_channel().map(|c| c.id), Some(ChannelId(9)));
        assert_eq!(app.status().map(|s| s.text.as_str()), Some("Created 'Garage'"));
    }

    #[test]
    fn test_blank_create_is_refused() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(mock.payloads(Endpoint::RemoteCreate).is_empty());
        assert_eq!(
            app.status().map(|s| s.text.as_str()),
            Some("Name cannot be empty.")
        );
    }

    #[test]
    fn test_delete_after_confirmation() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app);

        assert_eq!(app.dispatcher().store().len(), 2);
        // Selection stays on the last row
        assert_eq!(app.selected_channel().map(|c| c.id), Some(ChannelId(2)));
        assert_eq!(
            mock.payloads(Endpoint::RemoteDelete),
            vec![json!({"remote_id": 3})]
        );
    }

    #[test]
    fn test_failed_request_reports_on_status_line() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());
        mock.set_failing(Endpoint::RemoteAction, true);

        press(&mut app, KeyCode::Char('u'));
        settle(&mut app);

        let buffer = render_app(&mut app, 120, 30);
        assert!(buffer_contains(
            &buffer,
            "Up on channel 1 failed: Device unreachable. Check the network."
        ));
        // The optimistic update stays
        assert_eq!(app.selected_channel().map(|c| c.rolling_code), Some(11));
    }

    // ============================================================
    // Network view
    // ============================================================

    #[test]
    fn test_network_view_scans_on_first_open() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('n'));
        settle(&mut app);
        let buffer = render_app(&mut app, 100, 30);

        assert!(buffer_contains(&buffer, "Networks (2)"));
        assert!(buffer_contains(&buffer, "garage"));
        assert!(buffer_contains(&buffer, "-81 dBm"));
        assert!(buffer_contains(&buffer, "SSID:     home"));
        assert!(!buffer_contains(&buffer, "pw"));

        // Coming back does not rescan
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('n'));
        settle(&mut app);
        let scans = mock
            .requests()
            .iter()
            .filter(|(e, _)| *e == Endpoint::WifiNetworks)
            .count();
        assert_eq!(scans, 1);
    }

    #[test]
    fn test_pick_network_and_save() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('n'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        // SSID prefilled from the scan
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "s3cret");
        let buffer = render_app(&mut app, 100, 30);
        assert!(buffer_contains(&buffer, "Password for garage"));
        assert!(!buffer_contains(&buffer, "s3cret"));

        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(
            mock.payloads(Endpoint::WifiConfig),
            vec![json!({"ssid": "garage", "password": "s3cret"})]
        );
        assert_eq!(
            app.status().map(|s| s.text.as_str()),
            Some("Saved network garage")
        );
    }

    #[test]
    fn test_restart_needs_confirmation() {
        let mock = mock_device();
        let mut app = test_app(mock.clone());

        press(&mut app, KeyCode::Char('B'));
        press(&mut app, KeyCode::Char('n'));
        settle(&mut app);
        assert!(mock.payloads(Endpoint::CoreRestart).is_empty());

        press(&mut app, KeyCode::Char('B'));
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app);
        assert_eq!(mock.payloads(Endpoint::CoreRestart), vec![json!({})]);
    }

    // ============================================================
    // Log stream
    // ============================================================

    fn attach_log(app: &mut App) -> mpsc::Sender<SocketEvent> {
        let (tx, rx) = mpsc::channel(16);
        app.log_rx = Some(rx);
        tx
    }

    #[test]
    fn test_log_lines_reach_the_view() {
        let mut app = test_app(mock_device());
        let tx = attach_log(&mut app);

        tx.try_send(SocketEvent::Opened).unwrap();
        tx.try_send(SocketEvent::Line("remote 1 up".to_string())).unwrap();
        assert!(app.tick());

        app.switch_view(View::Logs);
        let buffer = render_app(&mut app, 100, 30);
        assert!(buffer_contains(&buffer, "[open]"));
        assert!(buffer_contains(&buffer, "remote 1 up"));
        assert!(buffer_contains(&buffer, "[log: open]"));
    }

    #[test]
    fn test_scrolled_log_holds_position() {
        let mut app = test_app(mock_device());
        let tx = attach_log(&mut app);
        tx.try_send(SocketEvent::Opened).unwrap();
        for i in 0..5 {
            tx.try_send(SocketEvent::Line(format!("line {i}"))).unwrap();
        }
        app.tick();

        app.switch_view(View::Logs);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.log_scroll, 2);

        tx.try_send(SocketEvent::Line("line 5".to_string())).unwrap();
        app.tick();
        assert_eq!(app.log_scroll, 3);

        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn test_reconnect_only_when_closed() {
        let mut app = test_app(mock_device());
        let tx = attach_log(&mut app);
        tx.try_send(SocketEvent::Opened).unwrap();
        app.tick();

        press(&mut app, KeyCode::Char('o'));
        assert_eq!(
            app.status().map(|s| s.text.as_str()),
            Some("Log stream is already connected")
        );

        drop(tx);
        assert!(app.tick());
        assert!(app.log_stream().state().is_closed());
    }

    // ============================================================
    // Navigation
    // ============================================================

    #[test]
    fn test_view_cycling() {
        let mut app = test_app(mock_device());
        assert_eq!(app.current_view(), View::Channels);

        app.next_view();
        assert_eq!(app.current_view(), View::Logs);
        app.prev_view();
        assert_eq!(app.current_view(), View::Channels);
    }

    #[test]
    fn test_selection_saturates() {
        let mut app = test_app(mock_device());

        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_channel, 0);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected_channel, 2);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.selected_channel, 0);
    }

    #[test]
    fn test_quit_handling() {
        let mut app = test_app(mock_device());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_step() {
        assert_eq!(step(0, -1, 3), 0);
        assert_eq!(step(1, 1, 3), 2);
        assert_eq!(step(2, isize::MAX, 3), 2);
        assert_eq!(step(2, isize::MIN, 3), 0);
        assert_eq!(step(5, 1, 0), 0);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("up on channel 1"), "Up on channel 1");
        assert_eq!(capitalize(""), "");
    }
}
