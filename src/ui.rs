use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let [tree_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    // Keep the cursor row visible inside the bordered pane.
    let visible_height = tree_area.height.saturating_sub(2) as usize;
    app.update_scroll(visible_height);

    let title = if app.picker.is_replaying() {
        " Directories (loading…) "
    } else {
        " Directories "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));

    let tree_widget = TreeWidget::new(
        &app.flat,
        app.cursor,
        app.scroll_offset,
        app.picker.labels(),
        &app.theme,
    )
    .block(block);
    frame.render_widget(tree_widget, tree_area);

    let mut status = StatusBarWidget::new(app.picker.selected_path(), &app.theme);
    if let Some((msg, is_error, _)) = &app.status_message {
        status = status.status_message(msg, *is_error);
    }
    frame.render_widget(status, status_area);

    if matches!(app.mode, AppMode::CreateFolder { .. }) {
        let dialog = DialogWidget::new(&app.mode, &app.dialog, app.picker.labels(), &app.theme);
        frame.render_widget(dialog, tree_area);
    }
}
