use crate::app::App;
use crate::format::sanitize_label;
use crate::tabs::{Tab, TabId, UiCommand};
use crate::widgets::{mouse_in, Button};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// "Recent Addresses": pick one to browse it again.
pub struct HistoryTab {
    list_state: ListState,
    list_area: Rect,
    clear_area: Rect,
    clear_hovered: bool,
}

impl HistoryTab {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            list_state,
            list_area: Rect::default(),
            clear_area: Rect::default(),
            clear_hovered: false,
        }
    }

    fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        self.list_state.select(Some(next));
    }

    fn open_selected(&mut self, app: &mut App) -> UiCommand {
        let Some(addr) = self
            .list_state
            .selected()
            .and_then(|i| app.history.get(i).cloned())
        else {
            return UiCommand::None;
        };
        if app.submit(&addr) {
            return UiCommand::SwitchTab(TabId::Browse);
        }
        UiCommand::None
    }
}

impl Default for HistoryTab {
    fn default() -> Self {
        Self::new()
    }
}

impl Tab for HistoryTab {
    fn id(&self) -> TabId {
        TabId::History
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, app: &mut App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);
        self.list_area = chunks[0];

        if app.history.is_empty() {
            self.list_state.select(None);
            let p = Paragraph::new("No recent addresses yet.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Recent Addresses").borders(Borders::ALL));
            f.render_widget(p, chunks[0]);
        } else {
            if self.list_state.selected().is_none() {
                self.list_state.select(Some(0));
            }
            let current = app.listing.address();
            let items: Vec<ListItem> = app
                .history
                .iter()
                .map(|a| {
                    let style = if Some(a.as_str()) == current {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    ListItem::new(Line::styled(sanitize_label(a), style))
                })
                .collect();
            let list = List::new(items)
                .block(Block::default().title("Recent Addresses").borders(Borders::ALL))
                .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));
            f.render_stateful_widget(list, chunks[0], &mut self.list_state);
        }

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(18)])
            .split(chunks[1]);
        let help = Paragraph::new("Enter browse | c clear | j/k move")
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(help, bottom[0]);

        self.clear_area = bottom[1];
        let clear = Button::new("Clear history").enabled(!app.history.is_empty());
        clear.draw(f, self.clear_area, self.clear_hovered);
    }

    fn on_key(&mut self, key: KeyEvent, app: &mut App) -> UiCommand {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1, app.history.len()),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1, app.history.len()),
            KeyCode::Enter => return self.open_selected(app),
            KeyCode::Char('c') => app.clear_history(),
            _ => {}
        }
        UiCommand::None
    }

    fn on_mouse(&mut self, mouse: MouseEvent, _area: Rect, app: &mut App) -> UiCommand {
        self.clear_hovered = mouse_in(self.clear_area, &mouse);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.clear_hovered {
                    app.clear_history();
                    return UiCommand::None;
                }
                if mouse_in(self.list_area, &mouse) {
                    // +1 for the top border.
                    let row = mouse.row.saturating_sub(self.list_area.y + 1) as usize
                        + self.list_state.offset();
                    if row < app.history.len() {
                        let already = self.list_state.selected() == Some(row);
                        self.list_state.select(Some(row));
                        if already {
                            return self.open_selected(app);
                        }
                    }
                }
            }
            MouseEventKind::ScrollDown if mouse_in(self.list_area, &mouse) => {
                self.move_selection(1, app.history.len())
            }
            MouseEventKind::ScrollUp if mouse_in(self.list_area, &mouse) => {
                self.move_selection(-1, app.history.len())
            }
            _ => {}
        }
        UiCommand::None
    }
}
