use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear},
};

#[derive(Clone, Copy, Debug)]
pub struct ModalLayout {
    pub area: Rect,
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
}

/// Clear a centered dialog, draw its border and split the inside into
/// header, body and footer rows.
#[allow(clippy::too_many_arguments)]
pub fn render_modal(
    frame: &mut Frame,
    area: Rect,
    max_width: u16,
    max_height: u16,
    header_height: u16,
    footer_height: u16,
    title: &str,
    border_style: Style,
) -> ModalLayout {
    let dialog = centered_area(area, max_width, max_height);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(title)
        .title_style(border_style.bold())
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(0),
            Constraint::Length(footer_height),
        ])
        .split(inner);

    ModalLayout {
        area: dialog,
        header: chunks[0],
        body: chunks[1],
        footer: chunks[2],
    }
}

pub fn centered_area(area: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = area.width.min(max_width);
    let height = area.height.min(max_height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_area_is_clamped_to_the_screen() {
        let screen = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_area(screen, 20, 6), Rect::new(10, 2, 20, 6));
        assert_eq!(centered_area(screen, 100, 100), screen);
    }
}
