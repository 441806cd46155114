//! UI layer for the desktop app: policy list shell and modal dialogs.

pub mod app;
pub mod modals;

pub use app::PolicyDeskApp;
