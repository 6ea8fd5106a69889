//! Terminal UI for blindctl.
//!
//! Ratatui front end over the channel dispatcher, the device log stream
//! and the controller's network settings.
//!
//! ## Hotkeys
//!
//! - `c` - Channels view
//! - `l` - Device log view
//! - `n` - Network view
//! - `u` / `d` / `s` - Move the selected blind up, down or stop it
//! - `Space` - Enable or disable the selected channel
//! - `p` / `z` - Prog / reset rolling code (both ask first)
//! - `e` - Rename channel, or edit the station config on the network view
//! - `a` / `x` - Add / delete channel
//! - `r` - Reload channels, or rescan on the network view
//! - `B` - Restart the controller
//! - `o` - Reconnect a closed log stream
//! - `?` or `h` - Help
//! - `q` - Quit
//! - `Tab` - Cycle views
//! - `Esc` - Cancel

pub mod app;
pub mod channel_panel;
pub mod dialog;
pub mod event;
pub mod log_panel;
pub mod network;
pub mod network_panel;
pub mod theme;
pub mod view;

pub use app::{App, AppResult};
pub use network::{DeviceNotice, NetworkState};
pub use theme::{Theme, ThemeManager, ThemeName};
pub use view::View;
