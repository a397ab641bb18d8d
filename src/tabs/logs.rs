use crate::app::App;
use crate::tabs::{Tab, TabId, UiCommand};
use crate::widgets::mouse_in;
use chrono::{Local, TimeZone};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct LogsTab {
    scroll: u16,
    follow: bool,
    last_viewport_rows: u16,
}

impl LogsTab {
    pub fn new() -> Self {
        Self {
            scroll: 0,
            follow: true,
            last_viewport_rows: 10,
        }
    }

    fn max_scroll(&self, app: &App) -> u16 {
        // One line per entry.
        let n = app.logs.len().min(u16::MAX as usize) as u16;
        n.saturating_sub(self.last_viewport_rows)
    }

    fn scroll_by(&mut self, delta: i32, app: &App) {
        let max = self.max_scroll(app) as i32;
        let next = (self.scroll as i32 + delta).clamp(0, max);
        self.scroll = next as u16;
        self.follow = self.scroll == max as u16;
    }
}

impl Default for LogsTab {
    fn default() -> Self {
        Self::new()
    }
}

fn level_color(level: &str) -> Color {
    match level {
        "error" => Color::Red,
        "warn" => Color::Yellow,
        "info" => Color::Gray,
        _ => Color::DarkGray,
    }
}

impl Tab for LogsTab {
    fn id(&self) -> TabId {
        TabId::Logs
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, app: &mut App) {
        self.last_viewport_rows = area.height.saturating_sub(2).max(1);
        if self.follow {
            self.scroll = self.max_scroll(app);
        }

        let lines: Vec<Line> = app
            .logs
            .iter()
            .map(|e| {
                let ts = Local
                    .timestamp_opt(e.ts, 0)
                    .single()
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(format!("{} ", ts), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("[{}] ", e.level),
                        Style::default().fg(level_color(&e.level)),
                    ),
                    Span::raw(e.message.clone()),
                ])
            })
            .collect();

        let title = if self.follow { "Logs (following)" } else { "Logs" };
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title(title).borders(Borders::ALL))
            .scroll((self.scroll, 0));

        f.render_widget(p, area);
    }

    fn on_key(&mut self, key: KeyEvent, app: &mut App) -> UiCommand {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1, app),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1, app),
            KeyCode::PageUp => self.scroll_by(-10, app),
            KeyCode::PageDown => self.scroll_by(10, app),
            KeyCode::Char('g') => {
                self.scroll = 0;
                self.follow = false;
            }
            KeyCode::Char('G') => {
                self.scroll = self.max_scroll(app);
                self.follow = true;
            }
            _ => {}
        }
        UiCommand::None
    }

    fn on_mouse(&mut self, mouse: MouseEvent, area: Rect, app: &mut App) -> UiCommand {
        if !mouse_in(area, &mouse) {
            return UiCommand::None;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-3, app),
            MouseEventKind::ScrollDown => self.scroll_by(3, app),
            _ => {}
        }

        UiCommand::None
    }
}
