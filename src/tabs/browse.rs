use crate::app::App;
use crate::format::{
    format_date, format_size, kind_glyph, sanitize_label, sanitize_text, suggestions,
};
use crate::preview::{
    display_text, ContentKind, PreviewSlot, PreviewState, PreviewStatus, MAX_RETRIES,
};
use crate::tabs::{Tab, TabId, UiCommand};
use crate::types::FileRecord;
use crate::widgets::{dropdown_below, mouse_in, truncate_middle, Button};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use std::ops::Range;

const MAX_SUGGESTIONS: usize = 6;

/// Address input, file table and preview pane.
pub struct BrowseTab {
    table_state: TableState,
    suggestion: Option<usize>,

    // Cached from the last draw for mouse routing and paging.
    input_area: Rect,
    button_area: Rect,
    table_area: Rect,
    detail_area: Rect,
    suggestion_area: Rect,
    last_viewport_rows: usize,
    button_hovered: bool,

    /// Rows drawn in the last frame.
    visible: Range<usize>,
    /// Listing session the selection and `visible` belong to.
    session: u64,
}

impl BrowseTab {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
            suggestion: None,
            input_area: Rect::default(),
            button_area: Rect::default(),
            table_area: Rect::default(),
            detail_area: Rect::default(),
            suggestion_area: Rect::default(),
            last_viewport_rows: 10,
            button_hovered: false,
            visible: 0..0,
            session: 0,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    /// Drops selection and scroll position when the listing moved on to a new
    /// session, whichever tab submitted it.
    fn follow_session(&mut self, session: u64) {
        if session != self.session {
            self.session = session;
            self.table_state = TableState::default();
            self.visible = 0..0;
        }
    }

    /// Acts on what the last frame showed: starts previews for visible rows
    /// and asks for the next page once the last row is on screen.
    pub fn sync_visibility(&mut self, app: &mut App) {
        self.follow_session(app.listing.session());
        let files = app.listing.files();
        let end = self.visible.end.min(files.len());
        let start = self.visible.start.min(end);
        if start == end {
            return;
        }
        let cids: Vec<String> = files[start..end].iter().map(|f| f.cid.clone()).collect();
        let tail_visible = end == files.len();

        app.ensure_previews(cids.iter().map(String::as_str));
        if tail_visible {
            app.on_tail_visible();
        }
    }

    fn selected_file<'a>(&self, app: &'a App) -> Option<&'a FileRecord> {
        let idx = self.table_state.selected()?;
        app.listing.files().get(idx)
    }

    fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let cur = self.table_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        self.table_state.select(Some(next));
    }

    fn start_editing(&mut self, app: &mut App) {
        app.ui.editing = true;
        self.suggestion = None;
    }

    fn stop_editing(&mut self, app: &mut App) {
        app.ui.editing = false;
        self.suggestion = None;
    }

    fn submit(&mut self, app: &mut App) {
        if let Some(idx) = self.suggestion {
            let picked = suggestions(&app.history, &app.input)
                .get(idx)
                .map(|s| s.to_string());
            if let Some(addr) = picked {
                app.input = addr;
            }
        }
        if app.submit_input() {
            self.follow_session(app.listing.session());
            self.stop_editing(app);
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent, app: &mut App) {
        let count = suggestions(&app.history, &app.input)
            .len()
            .min(MAX_SUGGESTIONS);
        match key.code {
            KeyCode::Esc | KeyCode::Tab => self.stop_editing(app),
            KeyCode::Enter => self.submit(app),
            KeyCode::Backspace => {
                app.input.pop();
                self.suggestion = None;
            }
            KeyCode::Down if count > 0 => {
                self.suggestion = Some(match self.suggestion {
                    None => 0,
                    Some(i) => (i + 1).min(count - 1),
                });
            }
            KeyCode::Up => {
                self.suggestion = match self.suggestion {
                    None | Some(0) => None,
                    Some(i) => Some(i - 1),
                };
            }
            KeyCode::Char(c) => {
                app.input.push(c);
                self.suggestion = None;
            }
            _ => {}
        }
    }

    fn draw_header(&mut self, f: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(15)])
            .split(area);
        self.input_area = chunks[0];
        self.button_area = chunks[1];

        let editing = app.ui.editing;
        let border = if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let text = if app.input.is_empty() && !editing {
            Line::styled(
                "Enter Crust Network address (press / to edit)",
                Style::default().fg(Color::DarkGray),
            )
        } else if editing {
            Line::from(format!("{}_", sanitize_label(&app.input)))
        } else {
            Line::from(sanitize_label(&app.input))
        };
        let input = Paragraph::new(text).block(
            Block::default()
                .title("Address")
                .borders(Borders::ALL)
                .border_style(border),
        );
        f.render_widget(input, self.input_area);

        let first_page_loading = app.listing.is_loading() && app.listing.page() == 0;
        let label = if first_page_loading { "Loading..." } else { "Fetch Files" };
        Button::new(label)
            .enabled(!first_page_loading)
            .draw(f, self.button_area, self.button_hovered);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect, app: &App) {
        let line = if let Some(err) = app.listing.error() {
            Line::styled(err.to_string(), Style::default().fg(Color::Red))
        } else {
            let mut spans = Vec::new();
            if let Some(summary) = app.listing.summary() {
                spans.push(Span::styled(summary, Style::default().fg(Color::Gray)));
            }
            if app.listing.is_loading() {
                if !spans.is_empty() {
                    spans.push(Span::raw("  "));
                }
                spans.push(Span::styled(
                    "Loading more files...",
                    Style::default().fg(Color::Yellow),
                ));
            } else if !app.listing.has_more() && !app.listing.files().is_empty() {
                if !spans.is_empty() {
                    spans.push(Span::raw("  "));
                }
                spans.push(Span::styled("All files loaded.", Style::default().fg(Color::Green)));
            }
            Line::from(spans)
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_table(&mut self, f: &mut Frame, area: Rect, app: &App) {
        self.table_area = area;
        // Borders (2) + header (1).
        self.last_viewport_rows = area.height.saturating_sub(3).max(1) as usize;

        let files = app.listing.files();
        if files.is_empty() {
            self.visible = 0..0;
            let msg = if app.listing.is_loading() {
                "Loading..."
            } else {
                "No files found. Enter an address to start browsing."
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Files").borders(Borders::ALL));
            f.render_widget(p, area);
            return;
        }

        if self.table_state.selected().is_none() {
            self.table_state.select(Some(0));
        }

        let header = Row::new(vec!["#", "CID", "Size", "Replicas", "Date", "Preview"])
            .style(Style::default().fg(Color::Yellow));

        let rows = files.iter().enumerate().map(|(i, file)| {
            let (mark, color) = preview_mark(app.previews.get(&file.cid));
            Row::new(vec![
                Span::raw((i + 1).to_string()),
                Span::raw(truncate_middle(&file.cid, 24)),
                Span::raw(format_size(file.file_size)),
                Span::raw(file.replicas.to_string()),
                Span::raw(format_date(file.block_timestamp)),
                Span::styled(mark, Style::default().fg(color)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(24),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(Block::default().title("Files").borders(Borders::ALL))
        .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));

        f.render_stateful_widget(table, area, &mut self.table_state);

        let offset = self.table_state.offset();
        self.visible = offset..(offset + self.last_viewport_rows).min(files.len());
    }

    fn open_selected(&self, app: &App) {
        if let Some(file) = self.selected_file(app) {
            app.open_in_browser(&file.cid);
        }
    }

    fn draw_detail(&mut self, f: &mut Frame, area: Rect, app: &App) {
        self.detail_area = area;
        let block = Block::default().title("Preview").borders(Borders::ALL);
        let Some(file) = self.selected_file(app) else {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        };
        let slot = app.previews.get(&file.cid);

        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(Span::styled(
                sanitize_label(&file.cid),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("size ", label),
                Span::raw(format_size(file.file_size)),
                Span::styled("  replicas ", label),
                Span::raw(file.replicas.to_string()),
                Span::styled("  date ", label),
                Span::raw(format_date(file.block_timestamp)),
            ]),
        ];
        if let Some(ct) = slot.and_then(|s| s.state.content_type.as_deref()) {
            lines.push(Line::from(vec![
                Span::styled("type ", label),
                Span::raw(sanitize_label(ct)),
            ]));
        }
        if let Some(memo) = &file.memo {
            lines.push(Line::from(vec![
                Span::styled("memo ", label),
                Span::raw(sanitize_label(memo)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("url ", label),
            Span::raw(app.gateway_url(&file.cid)),
        ]));
        lines.push(Line::from(""));
        lines.extend(preview_lines(slot));

        let p = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(p, area);
    }

    fn draw_suggestions(&mut self, f: &mut Frame, bounds: Rect, app: &App) {
        self.suggestion_area = Rect::default();
        if !app.ui.editing {
            return;
        }
        let list = suggestions(&app.history, &app.input);
        if list.is_empty() {
            return;
        }
        let shown = list.len().min(MAX_SUGGESTIONS);
        let area = dropdown_below(self.input_area, shown as u16 + 2, bounds);
        if area.height < 3 {
            return;
        }
        self.suggestion_area = area;

        let items: Vec<ListItem> = list
            .iter()
            .take(shown)
            .enumerate()
            .map(|(i, addr)| {
                let style = if Some(i) == self.suggestion {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::styled(sanitize_label(addr), style))
            })
            .collect();

        f.render_widget(Clear, area);
        f.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            ),
            area,
        );
    }
}

impl Default for BrowseTab {
    fn default() -> Self {
        Self::new()
    }
}

fn preview_mark(slot: Option<&PreviewSlot>) -> (String, Color) {
    let Some(slot) = slot else {
        return ("".to_string(), Color::DarkGray);
    };
    let s = &slot.state;
    match s.status {
        PreviewStatus::Loading if s.retry_count > 0 => {
            (format!("{}/{}", s.retry_count, MAX_RETRIES), Color::Yellow)
        }
        PreviewStatus::Loading => ("...".to_string(), Color::DarkGray),
        PreviewStatus::Error => ("error".to_string(), Color::Red),
        PreviewStatus::Ready => match s.content_kind {
            ContentKind::Text if s.payload.is_some() => ("text".to_string(), Color::Green),
            ContentKind::Image if s.payload.is_some() => ("image".to_string(), Color::Green),
            _ => (kind_glyph(s.content_type.as_deref()).to_string(), Color::Gray),
        },
    }
}

/// Body of the preview pane for one file.
pub fn preview_lines(slot: Option<&PreviewSlot>) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let Some(slot) = slot else {
        return vec![Line::styled("Scroll to this row to load its preview.", dim)];
    };
    let s = &slot.state;

    match s.status {
        PreviewStatus::Loading => {
            let mut out = vec![Line::styled("Loading preview...", dim)];
            if s.retry_count > 0 {
                out.push(Line::styled(
                    format!("Retry {}/{}", s.retry_count, MAX_RETRIES),
                    Style::default().fg(Color::Yellow),
                ));
            }
            out
        }
        PreviewStatus::Error => {
            let mut out = vec![Line::styled(
                s.last_error.clone().unwrap_or_else(|| "Failed to load preview".into()),
                Style::default().fg(Color::Red),
            )];
            if s.retry_count > 0 {
                out.push(Line::styled(
                    format!("Failed after {} retries", s.retry_count),
                    dim,
                ));
            }
            out.push(Line::styled("Press p to refresh.", dim));
            out
        }
        PreviewStatus::Ready => {
            let mut out = ready_lines(s, dim);
            if s.retry_count > 0 {
                out.push(Line::styled(format!("Retried {} times", s.retry_count), dim));
            }
            out
        }
    }
}

fn ready_lines(s: &PreviewState, dim: Style) -> Vec<Line<'static>> {
    match (&s.content_kind, &s.payload) {
        (ContentKind::Text, Some(text)) => sanitize_text(&display_text(text))
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect(),
        (ContentKind::Image, Some(url)) if url.starts_with("data:") => vec![
            Line::from(format!("{} inline image", kind_glyph(s.content_type.as_deref()))),
            Line::styled(format!("{} bytes as data URL", url.len()), dim),
        ],
        (ContentKind::Image, Some(url)) => vec![
            Line::from(format!("{} image", kind_glyph(s.content_type.as_deref()))),
            Line::styled(url.clone(), dim),
        ],
        _ => vec![
            Line::from(kind_glyph(s.content_type.as_deref())),
            Line::styled(
                s.content_type
                    .as_deref()
                    .map(sanitize_label)
                    .unwrap_or_else(|| "Unknown type".into()),
                dim,
            ),
        ],
    }
}

impl Tab for BrowseTab {
    fn id(&self) -> TabId {
        TabId::Browse
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, app: &mut App) {
        self.follow_session(app.listing.session());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
            ])
            .split(area);

        self.draw_header(f, chunks[0], app);
        self.draw_status(f, chunks[1], app);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);
        self.draw_table(f, body[0], app);
        self.draw_detail(f, body[1], app);

        self.draw_suggestions(f, area, app);
    }

    fn on_key(&mut self, key: KeyEvent, app: &mut App) -> UiCommand {
        if app.ui.editing {
            self.on_edit_key(key, app);
            return UiCommand::None;
        }

        let len = app.listing.files().len();
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Tab => self.start_editing(app),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1, len),
            KeyCode::PageDown => self.move_selection(self.last_viewport_rows as i32, len),
            KeyCode::PageUp => self.move_selection(-(self.last_viewport_rows as i32), len),
            KeyCode::Char('g') | KeyCode::Home => self.move_selection(-(len as i32), len),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(len as i32, len),
            KeyCode::Char('r') => app.retry_page(),
            KeyCode::Char('o') => self.open_selected(app),
            KeyCode::Char('p') => {
                if let Some(cid) = self.selected_file(app).map(|f| f.cid.clone()) {
                    app.refresh_preview(&cid);
                }
            }
            KeyCode::Enter => self.submit(app),
            _ => {}
        }
        UiCommand::None
    }

    fn on_mouse(&mut self, mouse: MouseEvent, _area: Rect, app: &mut App) -> UiCommand {
        self.button_hovered = mouse_in(self.button_area, &mouse);
        let len = app.listing.files().len();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if mouse_in(self.suggestion_area, &mouse) {
                    // +1 for the top border.
                    let idx = mouse.row.saturating_sub(self.suggestion_area.y + 1) as usize;
                    if idx < suggestions(&app.history, &app.input).len().min(MAX_SUGGESTIONS) {
                        self.suggestion = Some(idx);
                        self.submit(app);
                    }
                } else if self.button_hovered {
                    self.submit(app);
                } else if mouse_in(self.input_area, &mouse) {
                    self.start_editing(app);
                } else if mouse_in(self.detail_area, &mouse) {
                    self.stop_editing(app);
                    self.open_selected(app);
                } else if mouse_in(self.table_area, &mouse) {
                    self.stop_editing(app);
                    // Border + header.
                    let row = mouse.row.saturating_sub(self.table_area.y + 2) as usize
                        + self.table_state.offset();
                    if row < len {
                        self.table_state.select(Some(row));
                    }
                } else {
                    self.stop_editing(app);
                }
            }
            MouseEventKind::ScrollDown if mouse_in(self.table_area, &mouse) => {
                self.move_selection(3, len)
            }
            MouseEventKind::ScrollUp if mouse_in(self.table_area, &mouse) => {
                self.move_selection(-3, len)
            }
            _ => {}
        }
        UiCommand::None
    }
}
