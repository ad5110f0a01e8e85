use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ListError, Result};
use crate::layout::ListStyle;

/// Configuration for the media list engine.
///
/// Every field has a default, so a config document only needs the values
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Screens kept loaded on each side of the viewport (default: 4)
    pub preloaded_screens: i32,
    /// Load more once the viewport is this many screens from an edge (default: 2)
    pub preload_if_less_than_screens: i32,
    /// Half-window size of the first slice request (default: 16)
    pub minimal_ids_limit: usize,
    /// Search is offered once the list holds more items than this (default: 10)
    pub media_count_for_search: usize,
    /// Cap on selected items (default: 100)
    pub max_selected_items: usize,
    /// Manhattan distance a press must travel before it drags (default: 4)
    pub start_drag_distance: i32,
    /// Window for double and triple clicks in milliseconds (default: 400)
    pub double_click_interval_ms: u64,
    pub style: ListStyle,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            preloaded_screens: 4,
            preload_if_less_than_screens: 2,
            minimal_ids_limit: 16,
            media_count_for_search: 10,
            max_selected_items: 100,
            start_drag_distance: 4,
            double_click_interval_ms: 400,
            style: ListStyle::default(),
        }
    }
}

impl ListConfig {
    /// Screens in the whole preload window: behind, visible, ahead.
    pub fn preloaded_screens_full(&self) -> i32 {
        self.preloaded_screens + 1 + self.preloaded_screens
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), "Loaded list config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| Err(ListError::InvalidConfig(what.to_string()));
        if self.preloaded_screens < 1 {
            return invalid("preloaded_screens must be at least 1");
        }
        if !(0..=self.preloaded_screens).contains(&self.preload_if_less_than_screens) {
            return invalid("preload_if_less_than_screens must be within 0..=preloaded_screens");
        }
        if self.minimal_ids_limit == 0 {
            return invalid("minimal_ids_limit must be positive");
        }
        if self.max_selected_items == 0 {
            return invalid("max_selected_items must be positive");
        }
        if self.start_drag_distance < 0 {
            return invalid("start_drag_distance must not be negative");
        }
        let style = &self.style;
        if style.min_grid_size <= 0 || style.media_skip < 0 {
            return invalid("grid metrics must be positive");
        }
        if style.char_width <= 0 || style.line_height <= 0 {
            return invalid("text metrics must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ListConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preloaded_screens_full(), 9);
    }

    #[test]
    fn test_partial_document() {
        let config =
            ListConfig::from_json_str(r#"{"max_selected_items": 5, "style": {"min_grid_size": 80}}"#)
                .unwrap();
        assert_eq!(config.max_selected_items, 5);
        assert_eq!(config.minimal_ids_limit, 16);
        assert_eq!(config.style.min_grid_size, 80);
        assert_eq!(config.style.media_skip, 2);
    }

    #[test]
    fn test_rejects_zero_limits() {
        let err = ListConfig::from_json_str(r#"{"minimal_ids_limit": 0}"#).unwrap_err();
        assert!(matches!(err, ListError::InvalidConfig(_)));
        let err = ListConfig::from_json_str(r#"{"style": {"char_width": 0}}"#).unwrap_err();
        assert!(matches!(err, ListError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = ListConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ListError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"start_drag_distance": 10}}"#).unwrap();
        let config = ListConfig::load(file.path()).unwrap();
        assert_eq!(config.start_drag_distance, 10);

        let missing = ListConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ListError::Io(_))));
    }
}
