//! Circular navigation menu layout

use serde::Serialize;
use studio_core::{ContentKind, utils::circular_positions};

/// Default radius of the menu circle in pixels
pub const DEFAULT_RADIUS: f64 = 120.0;

/// One placed menu entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    /// Label shown on the button
    pub label: String,
    /// Horizontal offset from the centre
    pub x: f64,
    /// Vertical offset from the centre, growing downwards
    pub y: f64,
}

/// Place `labels` around a circle, the first at the top
#[must_use]
pub fn layout<I, S>(labels: I, radius: f64) -> Vec<MenuEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    circular_positions(labels.len(), radius)
        .into_iter()
        .zip(labels)
        .map(|((x, y), label)| MenuEntry { label, x, y })
        .collect()
}

/// Menu over the dashboard, every content page and the profile page
#[must_use]
pub fn console_menu(radius: f64) -> Vec<MenuEntry> {
    let pages = std::iter::once("dashboard".to_string())
        .chain(ContentKind::ALL.iter().map(ToString::to_string))
        .chain(std::iter::once("profile".to_string()));
    layout(pages, radius)
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_entry_at_top() {
        let entries = layout(["a", "b", "c", "d"], 10.0);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].label, "a");
        assert!(entries[0].x.abs() < 1e-9);
        assert!((entries[0].y + 10.0).abs() < 1e-9);
        assert!((entries[1].x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_console_menu_lists_every_page() {
        let menu = console_menu(DEFAULT_RADIUS);

        assert_eq!(menu.len(), ContentKind::ALL.len() + 2);
        assert_eq!(menu[0].label, "dashboard");
        assert_eq!(menu[menu.len() - 1].label, "profile");
    }
}
