use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode};

/// Handle a key event according to the current mode.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.mode {
        AppMode::Normal => handle_normal_key(app, key),
        AppMode::CreateFolder { .. } => handle_dialog_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter => app.activate_cursor(),
        _ => {}
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => app.confirm_create(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PickerConfig;
    use crate::service::{DirEntry, DirListing, EntryKind};
    use crate::worker::ServiceTask;
    use tokio::sync::mpsc::unbounded_channel;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> App {
        let (task_tx, mut task_rx) = unbounded_channel();
        let mut app = App::new(&PickerConfig::default(), task_tx, Box::new(|_| {}));
        let generation = match task_rx.try_recv().unwrap() {
            ServiceTask::List { generation, .. } => generation,
            other => panic!("expected root listing, got {other:?}"),
        };
        app.handle_listing(
            generation,
            "/",
            Ok(DirListing {
                files: vec![DirEntry {
                    name: "alpha".into(),
                    path: "/alpha".into(),
                    kind: EntryKind::Directory,
                }],
                error: None,
            }),
        );
        app
    }

    #[test]
    fn q_quits_in_normal_mode() {
        let mut app = setup();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let mut app = setup();
        app.open_create_dialog("/".to_string());
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys_move_cursor() {
        let mut app = setup();
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.cursor, 1);
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.cursor, 0);
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        assert_eq!(app.cursor, app.flat.len() - 1);
        handle_key_event(&mut app, key(KeyCode::Char('g')));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn q_types_into_the_dialog() {
        let mut app = setup();
        app.open_create_dialog("/".to_string());
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.dialog.input, "q");
    }

    #[test]
    fn esc_closes_the_dialog() {
        let mut app = setup();
        app.open_create_dialog("/".to_string());
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn enter_activates_cursor_row() {
        let mut app = setup();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.picker.selected_path(), "/");
    }
}
