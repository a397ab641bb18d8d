use crossterm::event::MouseEvent;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

pub fn mouse_in(rect: Rect, mouse: &MouseEvent) -> bool {
    contains(rect, mouse.column, mouse.row)
}

/// Shortens `s` to `max` characters by cutting out the middle, which keeps
/// both ends of a CID recognisable.
pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max || max < 5 {
        return s.to_string();
    }
    let keep = max - 1;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let mut out: String = s.chars().take(head).collect();
    out.push('…');
    out.extend(s.chars().skip(n - tail));
    out
}

/// Rect of `height` rows directly below `anchor`, clipped to `bounds`.
pub fn dropdown_below(anchor: Rect, height: u16, bounds: Rect) -> Rect {
    let y = anchor.y.saturating_add(anchor.height);
    let max_h = bounds.y.saturating_add(bounds.height).saturating_sub(y);
    Rect {
        x: anchor.x,
        y,
        width: anchor.width,
        height: height.min(max_h),
    }
}

#[derive(Debug, Clone)]
pub struct Button {
    pub label: String,
    pub enabled: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, hovered: bool) {
        let base = if self.enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let style = if hovered && self.enabled {
            base.bg(Color::Blue)
        } else {
            base
        };

        let p = Paragraph::new(Line::from(self.label.clone()).centered())
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 3, 4, 2);
        assert!(contains(r, 2, 3));
        assert!(contains(r, 5, 4));
        assert!(!contains(r, 6, 4));
        assert!(!contains(r, 2, 5));
    }

    #[test]
    fn truncate_middle_keeps_ends() {
        let cid = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        let t = truncate_middle(cid, 21);
        assert_eq!(t.chars().count(), 21);
        assert!(t.starts_with("bafybeigdy"));
        assert!(t.ends_with("y55fbzdi"));
        assert_eq!(truncate_middle("short", 21), "short");
    }

    #[test]
    fn dropdown_is_clipped() {
        let anchor = Rect::new(0, 0, 20, 3);
        let bounds = Rect::new(0, 0, 80, 6);
        assert_eq!(dropdown_below(anchor, 10, bounds), Rect::new(0, 3, 20, 3));
    }
}
