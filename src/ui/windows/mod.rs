pub mod help;
pub mod toc;

use ratatui::layout::Rect;

/// A `width` x `height` rectangle centered in `area`, clipped to it.
pub fn centered_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
