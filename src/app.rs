use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::PickerConfig;
use crate::picker::{CreateOutcome, PathChangeFn, Picker};
use crate::service::{DirListing, ServiceError};
use crate::theme::{resolve_theme, ThemeColors};
use crate::tree::{FlatItem, FlatKind};
use crate::worker::ServiceTask;

/// Application mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    /// The create-folder input dialog is open for this parent path.
    CreateFolder { parent: String },
}

/// State for the dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// Main application state: the picker plus UI chrome.
pub struct App {
    pub picker: Picker,
    /// Cached row projection; recomputed via `refresh` after every mutation.
    pub flat: Vec<FlatItem>,
    /// Cursor over `flat` (keyboard focus, distinct from the selection).
    pub cursor: usize,
    pub scroll_offset: usize,
    pub mode: AppMode,
    pub dialog: DialogState,
    /// Transient message: text, error flag, creation time.
    pub status_message: Option<(String, bool, Instant)>,
    pub should_quit: bool,
    pub theme: ThemeColors,
}

impl App {
    /// Build the app from a resolved configuration. The picker immediately
    /// begins its initial replay through `tasks`.
    pub fn new(
        config: &PickerConfig,
        tasks: UnboundedSender<ServiceTask>,
        on_path_change: PathChangeFn,
    ) -> Self {
        let theme = resolve_theme(&config.theme);
        let picker = Picker::new(config.options(), tasks, on_path_change);
        let mut app = Self {
            picker,
            flat: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            mode: AppMode::Normal,
            dialog: DialogState::default(),
            status_message: None,
            should_quit: false,
            theme,
        };
        app.refresh();
        app
    }

    /// Recompute the row projection and keep the cursor in range.
    pub fn refresh(&mut self) {
        self.flat = self.picker.flat_items();
        if !self.flat.is_empty() && self.cursor >= self.flat.len() {
            self.cursor = self.flat.len() - 1;
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Move the cursor down by one row.
    pub fn select_next(&mut self) {
        if !self.flat.is_empty() && self.cursor < self.flat.len() - 1 {
            self.cursor += 1;
        }
    }

    /// Move the cursor up by one row.
    pub fn select_previous(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Jump to the first row.
    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    /// Jump to the last row.
    pub fn select_last(&mut self) {
        if !self.flat.is_empty() {
            self.cursor = self.flat.len() - 1;
        }
    }

    /// Activate the row under the cursor: directories are selected and
    /// expanded/collapsed/loaded; a create-folder row opens the dialog.
    pub fn activate_cursor(&mut self) {
        let Some(item) = self.flat.get(self.cursor) else {
            return;
        };
        match item.kind.clone() {
            FlatKind::Directory { .. } => {
                let path = item.path.clone();
                self.picker.activate(&path);
                self.refresh();
            }
            FlatKind::CreateFolder { parent } => self.open_create_dialog(parent),
        }
    }

    /// Open the create-folder dialog for `parent`.
    pub fn open_create_dialog(&mut self, parent: String) {
        self.dialog = DialogState::default();
        self.mode = AppMode::CreateFolder { parent };
    }

    /// Close the dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog = DialogState::default();
    }

    /// Submit the dialog input. The name is forwarded to the service as
    /// typed; the dialog stays open until the completion arrives.
    pub fn confirm_create(&mut self) {
        if let AppMode::CreateFolder { parent } = &self.mode {
            let parent = parent.clone();
            let name = self.dialog.input.clone();
            self.picker.create_folder(&parent, &name);
        }
    }

    /// Apply a listing completion from the worker.
    pub fn handle_listing(
        &mut self,
        generation: u64,
        path: &str,
        result: Result<DirListing, ServiceError>,
    ) {
        self.picker.handle_listing(generation, path, result);
        self.refresh();
    }

    /// Apply a folder-creation completion from the worker.
    pub fn handle_folder_created(
        &mut self,
        generation: u64,
        parent: &str,
        name: &str,
        result: Result<(), ServiceError>,
    ) {
        match self
            .picker
            .handle_folder_created(generation, parent, name, result)
        {
            CreateOutcome::Created => {
                self.close_dialog();
                self.set_status(format!("Created {}", crate::tree::join_path(parent, name)), false);
            }
            CreateOutcome::Failed => {
                // Dialog stays open so the user can fix the name and retry.
                self.set_status("Could not create folder".to_string(), true);
            }
            CreateOutcome::Stale => {}
        }
        self.refresh();
    }

    // ── Dialog input editing ─────────────────────────────────────────────────

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog.input.insert(self.dialog.cursor_position, c);
        self.dialog.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        if self.dialog.cursor_position > 0 {
            let byte_pos = self.dialog.cursor_position;
            let prev_char = self.dialog.input[..byte_pos]
                .chars()
                .next_back()
                .expect("cursor > 0 guarantees at least one char");
            self.dialog.cursor_position -= prev_char.len_utf8();
            self.dialog.input.remove(self.dialog.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        if self.dialog.cursor_position > 0 {
            let prev_char = self.dialog.input[..self.dialog.cursor_position]
                .chars()
                .next_back()
                .expect("cursor > 0 guarantees at least one char");
            self.dialog.cursor_position -= prev_char.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        if self.dialog.cursor_position < self.dialog.input.len() {
            let next_char = self.dialog.input[self.dialog.cursor_position..]
                .chars()
                .next()
                .expect("cursor < len guarantees at least one char");
            self.dialog.cursor_position += next_char.len_utf8();
        }
    }

    /// Move cursor to the beginning of the input.
    pub fn dialog_cursor_home(&mut self) {
        self.dialog.cursor_position = 0;
    }

    /// Move cursor to the end of the input.
    pub fn dialog_cursor_end(&mut self) {
        self.dialog.cursor_position = self.dialog.input.len();
    }

    // ── Status line ──────────────────────────────────────────────────────────

    /// Set a status message with the current timestamp.
    pub fn set_status(&mut self, msg: String, is_error: bool) {
        self.status_message = Some((msg, is_error, Instant::now()));
    }

    /// Clear the status message once it has been shown for a few seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, _, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Update the scroll offset to keep the cursor visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor - visible_height + 1;
        }
    }
}
