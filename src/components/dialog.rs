use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogState};
use crate::config::Labels;
use crate::theme::ThemeColors;

/// Centered modal for entering a new folder name.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    labels: &'a Labels,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(
        mode: &'a AppMode,
        dialog_state: &'a DialogState,
        labels: &'a Labels,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            mode,
            dialog_state,
            labels,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let parent = match &self.mode {
            AppMode::CreateFolder { parent } => parent,
            _ => return,
        };

        let dialog_width = 50.min(area.width.saturating_sub(4));
        let dialog_height = 5;
        let rect = Self::centered_rect(dialog_width, dialog_height, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(format!(" {} in {} ", self.labels.create_folder, parent))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dialog_border_fg))
            .padding(Padding::horizontal(1));

        let inner = block.inner(rect);
        block.render(rect, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let input_y = inner.y + inner.height / 2;

        if input.is_empty() {
            // Placeholder until the first character arrives.
            let placeholder = Line::from(vec![
                Span::styled(
                    " ",
                    Style::default()
                        .bg(Color::White)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    self.labels.folder_name.as_str(),
                    Style::default()
                        .fg(self.theme.dim_fg)
                        .add_modifier(Modifier::DIM),
                ),
            ]);
            buf.set_line(inner.x, input_y, &placeholder, inner.width);
        } else {
            // Render input line with cursor.
            let cursor_pos = self.dialog_state.cursor_position;
            let max_width = inner.width as usize;

            let (before, cursor_char, after) = if cursor_pos < input.len() {
                let ch = &input[cursor_pos..cursor_pos + 1];
                (&input[..cursor_pos], ch, &input[cursor_pos + 1..])
            } else {
                (input.as_str(), " ", "")
            };

            // Truncate from left if input is too long.
            let total_len = before.len() + 1 + after.len();
            let before_display =
                if total_len > max_width && before.len() > max_width.saturating_sub(2) {
                    let skip = before.len().saturating_sub(max_width.saturating_sub(2));
                    &before[skip..]
                } else {
                    before
                };

            let input_style = Style::default().fg(Color::White);
            let cursor_style = Style::default()
                .bg(Color::White)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD);

            let spans = vec![
                Span::styled(before_display, input_style),
                Span::styled(cursor_char, cursor_style),
                Span::styled(after, input_style),
            ];
            buf.set_line(inner.x, input_y, &Line::from(spans), inner.width);
        }

        // Hint at the bottom.
        let hint = format!("[Enter] {}  [Esc] {}", self.labels.create_folder, self.labels.cancel);
        let hint_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);
        let hint_line = Line::from(Span::styled(hint, hint_style));
        if inner.height > 1 {
            buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
        }
    }
}
