use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar: selected path on the left, key hints on the right, with
/// transient status messages taking over the full line.
pub struct StatusBarWidget<'a> {
    selected_path: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(selected_path: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            selected_path,
            theme,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };

            // Pad or truncate message to fill full width.
            let display: String = if msg.len() >= width {
                msg[..width].to_string()
            } else {
                format!("{:<width$}", msg, width = width)
            };

            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let path_display = if self.selected_path.is_empty() {
            "(no selection)"
        } else {
            self.selected_path
        };

        let key_hints = " j/k:move  enter:select  q:quit ";
        let hints_len = key_hints.len();
        let path_budget = width.saturating_sub(hints_len);

        let path_trimmed = if path_display.len() > path_budget && path_budget > 3 {
            format!(
                "...{}",
                &path_display[path_display.len() - (path_budget - 3)..]
            )
        } else {
            path_display.to_string()
        };

        let gap = width
            .saturating_sub(path_trimmed.len())
            .saturating_sub(hints_len);

        let path_style = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.status_fg);
        let hints_style = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let spans = vec![
            Span::styled(path_trimmed, path_style),
            Span::raw(" ".repeat(gap)),
            Span::styled(key_hints, hints_style),
        ];

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
