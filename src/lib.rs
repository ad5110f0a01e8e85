//! Shared media list engine: date-sectioned, windowed media lists with
//! viewport-driven loading, scroll anchoring and mouse selection.

pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod ui;

pub use config::ListConfig;
pub use error::{ListError, Result};
pub use ui::ListWidget;
