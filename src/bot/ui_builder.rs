//! UI Builder module for creating keyboards

use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Label of the search button; the handler treats it like a bare `/parse`
pub const SEARCH_BUTTON: &str = "🔎 Поиск";

/// Persistent reply keyboard shown after `/start`
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(SEARCH_BUTTON)]]).resize_keyboard()
}
