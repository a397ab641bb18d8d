use crate::app::{App, TabHitbox};
use crate::tabs::TabId;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct LayoutAreas {
    pub tab_bar: Rect,
    pub content: Rect,
    pub footer: Rect,
}

pub fn layout(area: Rect) -> LayoutAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);

    LayoutAreas {
        tab_bar: chunks[0],
        content: chunks[1],
        footer: chunks[2],
    }
}

pub fn draw_tab_bar(f: &mut Frame, area: Rect, app: &mut App) {
    let mut spans: Vec<Span> = vec![Span::styled(
        "Crust Files ",
        Style::default().fg(Color::Cyan),
    )];
    let mut hitboxes: Vec<TabHitbox> = Vec::new();

    let mut x = area.x + 12;
    let y0 = area.y;

    for (i, tab) in TabId::ALL.iter().enumerate() {
        if i > 0 {
            let sep = " | ";
            spans.push(Span::raw(sep));
            x += sep.len() as u16;
        }

        let label = format!("{} {}", tab.number(), tab.title());
        let style = if *tab == app.active_tab {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };

        let w = label.len() as u16;
        hitboxes.push(TabHitbox {
            tab: *tab,
            x0: x,
            x1: x.saturating_add(w),
            y0,
            y1: y0 + 1,
        });

        spans.push(Span::styled(label, style));
        x += w;
    }

    app.ui.tab_hitboxes = hitboxes;

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn footer_hint(app: &App) -> &'static str {
    if app.ui.editing {
        return "Enter fetch | Up/Down suggestions | Esc leave input | Ctrl+C quit";
    }
    match app.active_tab {
        TabId::Browse => "/ edit address | j/k move | p refresh preview | r retry | 1-3 tabs | q quit",
        TabId::History => "Enter browse | c clear | 1-3 tabs | q quit",
        TabId::Logs => "j/k scroll | g/G top/follow | 1-3 tabs | q quit",
    }
}

pub fn draw_footer(f: &mut Frame, area: Rect, app: &mut App) {
    let p = Paragraph::new(footer_hint(app))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}

/// Tab under a click on the tab bar, if any.
pub fn tab_at(app: &App, col: u16, row: u16) -> Option<TabId> {
    app.ui
        .tab_hitboxes
        .iter()
        .find(|hb| col >= hb.x0 && col < hb.x1 && row >= hb.y0 && row < hb.y1)
        .map(|hb| hb.tab)
}
