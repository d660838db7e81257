use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::error::RecordError;
use crate::grade::Grade;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// `[key] action` pair for footer instructions.
pub(crate) fn key_hint(key: &str, action: &str) -> [Span<'static>; 2] {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    [
        Span::styled(format!("[{key}]"), key_style),
        Span::raw(format!(" {action}   ")),
    ]
}

/// Colour used for a grade in the roster and the distribution chart.
pub(crate) fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::APlus | Grade::A => Color::Green,
        Grade::B | Grade::C => Color::Cyan,
        Grade::D => Color::Yellow,
        Grade::F => Color::Red,
    }
}

/// Message for the footer. Record errors already read well on their own; for
/// anything else show the innermost cause.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(record) = err.downcast_ref::<RecordError>() {
        return record.to_string();
    }
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 10);
    }

    #[test]
    fn record_errors_surface_their_own_message() {
        let err = Error::new(RecordError::NotFound {
            roll_no: "R9".into(),
        });
        assert_eq!(surface_error(&err), "No student with roll number 'R9'.");

        let err = Error::msg("disk full").context("failed to write export");
        assert_eq!(surface_error(&err), "disk full");
    }
}
