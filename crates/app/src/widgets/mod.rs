//! Panels and widgets of the main window.

pub mod chat;
pub mod command_panel;
pub mod drag_drop;
pub mod navbar;

pub use command_panel::CommandPanelUi;
pub use navbar::{NavAction, NavbarView};
