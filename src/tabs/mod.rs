use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{layout::Rect, Frame};

pub mod browse;
pub mod history;
pub mod logs;

pub use browse::BrowseTab;
pub use history::HistoryTab;
pub use logs::LogsTab;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabId {
    Browse,
    History,
    Logs,
}

impl TabId {
    pub const ALL: [TabId; 3] = [TabId::Browse, TabId::History, TabId::Logs];

    pub fn title(self) -> &'static str {
        match self {
            TabId::Browse => "Browse",
            TabId::History => "History",
            TabId::Logs => "Logs",
        }
    }

    pub fn number(self) -> usize {
        match self {
            TabId::Browse => 1,
            TabId::History => 2,
            TabId::Logs => 3,
        }
    }

    pub fn from_number(n: usize) -> Option<Self> {
        match n {
            1 => Some(TabId::Browse),
            2 => Some(TabId::History),
            3 => Some(TabId::Logs),
            _ => None,
        }
    }
}

pub enum UiCommand {
    None,
    Quit,
    SwitchTab(TabId),
}

pub trait Tab {
    fn id(&self) -> TabId;
    fn draw(&mut self, f: &mut Frame, area: Rect, app: &mut App);
    fn on_key(&mut self, _key: KeyEvent, _app: &mut App) -> UiCommand {
        UiCommand::None
    }
    fn on_mouse(&mut self, _mouse: MouseEvent, _area: Rect, _app: &mut App) -> UiCommand {
        UiCommand::None
    }
}

pub fn top_row_char_to_number(c: char) -> Option<usize> {
    // QWERTY digits, their shifted symbols, and the AZERTY top row.
    match c {
        '1' | '&' | '!' => Some(1),
        '2' | 'é' | '@' => Some(2),
        '3' | '"' | '#' => Some(3),
        _ => None,
    }
}

/// Quit and tab switching. Single-character binds are off while the address
/// input is being edited; Ctrl+C always quits.
pub fn global_keybind(key: KeyEvent, editing: bool) -> UiCommand {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return UiCommand::Quit;
    }
    if editing {
        return UiCommand::None;
    }
    match key.code {
        KeyCode::Char('q') => UiCommand::Quit,
        KeyCode::Char(c) => {
            if let Some(n) = top_row_char_to_number(c) {
                if let Some(tab) = TabId::from_number(n) {
                    return UiCommand::SwitchTab(tab);
                }
            }
            UiCommand::None
        }
        _ => UiCommand::None,
    }
}
