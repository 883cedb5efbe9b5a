//! Picker orchestration: lazy loads, initial-path replay, selection and
//! folder creation over the directory-service boundary.
//!
//! All state lives on the event loop. Service calls are dispatched as
//! [`ServiceTask`]s and their completions come back through
//! [`handle_listing`](Picker::handle_listing) and
//! [`handle_folder_created`](Picker::handle_folder_created). Every rebuild
//! bumps a generation counter; completions carrying a stale generation are
//! discarded, so a superseded tree can never be written to.

use std::collections::VecDeque;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::config::{Labels, Options};
use crate::service::{DirListing, ServiceError};
use crate::tree::{ancestor_prefixes, join_path, FlatItem, LoadState, TreeState};
use crate::worker::ServiceTask;

/// Host callback invoked on every user selection.
pub type PathChangeFn = Box<dyn FnMut(&str)>;

/// Outcome of a folder-creation completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The folder exists; the tree is rebuilding rooted at it.
    Created,
    /// The service refused; nothing changed, the caller may retry.
    Failed,
    /// The completion targeted a superseded tree and was discarded.
    Stale,
}

pub struct Picker {
    tree: TreeState,
    options: Options,
    /// Tags every dispatched task; bumped on each rebuild.
    generation: u64,
    /// Ancestor prefixes still to auto-expand, front-to-back.
    pending_replay: VecDeque<String>,
    /// The prefix whose load the replay is currently awaiting.
    replay_step: Option<String>,
    /// Path announced once the current replay completes (armed by a
    /// successful folder creation).
    notify_after_replay: Option<String>,
    tasks: UnboundedSender<ServiceTask>,
    on_path_change: PathChangeFn,
}

impl Picker {
    /// Build the picker and begin loading toward `options.initial_path`.
    pub fn new(
        options: Options,
        tasks: UnboundedSender<ServiceTask>,
        on_path_change: PathChangeFn,
    ) -> Self {
        let mut picker = Self {
            tree: TreeState::new(),
            generation: 0,
            pending_replay: VecDeque::new(),
            replay_step: None,
            notify_after_replay: None,
            tasks,
            on_path_change,
            options,
        };
        let initial = picker.options.initial_path.clone();
        picker.reinitialize(&initial);
        picker
    }

    /// Discard the tree and rebuild it rooted at `path`, replaying every
    /// ancestor prefix. Also used internally after folder creation.
    pub fn reinitialize(&mut self, path: &str) {
        self.generation += 1;
        debug!(path, generation = self.generation, "rebuilding tree");
        self.tree = TreeState::new();
        self.pending_replay = ancestor_prefixes(path).into();
        self.replay_step = Some("/".to_string());
        self.notify_after_replay = None;
        self.dispatch_load("/");
    }

    /// Select a row and expand, collapse or load it as its state allows.
    ///
    /// Selection always happens: the path becomes the selected one and the
    /// host callback fires exactly once, whatever the load state. The
    /// virtual root is selection-only; its children are loaded at
    /// construction and it never collapses.
    pub fn activate(&mut self, path: &str) {
        self.tree.selected_path = path.to_string();
        (self.on_path_change)(path);

        if path == "/" {
            return;
        }
        let Some(state) = self.tree.find_node(path).map(|n| n.load_state) else {
            return;
        };
        match state {
            LoadState::Loaded => {
                if let Some(node) = self.tree.find_node_mut(path) {
                    node.expanded = !node.expanded;
                }
            }
            // A load is already in flight; its completion will expand.
            LoadState::Loading => {}
            LoadState::Unloaded => self.dispatch_load(path),
        }
    }

    /// Ask the service for a folder named `name` under `parent`. The
    /// completion arrives via [`handle_folder_created`](Self::handle_folder_created).
    pub fn create_folder(&mut self, parent: &str, name: &str) {
        debug!(parent, name, "dispatching folder creation");
        let _ = self.tasks.send(ServiceTask::CreateDir {
            generation: self.generation,
            parent: parent.to_string(),
            name: name.to_string(),
        });
    }

    /// Apply a listing completion.
    pub fn handle_listing(
        &mut self,
        generation: u64,
        path: &str,
        result: Result<DirListing, ServiceError>,
    ) {
        if generation != self.generation {
            debug!(
                path,
                generation,
                current = self.generation,
                "discarding listing for a superseded tree"
            );
            return;
        }

        let listing = match result {
            Ok(listing) => {
                if let Some(error) = &listing.error {
                    debug!(path, %error, "listing reported an error, leaving branch empty");
                    self.degrade(path);
                    return;
                }
                listing
            }
            Err(err) => {
                debug!(path, error = %err, "listing failed, leaving branch empty");
                self.degrade(path);
                return;
            }
        };

        let Some(node) = self.tree.find_node_mut(path) else {
            return;
        };
        node.apply_listing(&listing.files);
        node.expanded = true;

        if self.replay_step.as_deref() == Some(path) {
            self.advance_replay();
        }
    }

    /// Apply a folder-creation completion.
    pub fn handle_folder_created(
        &mut self,
        generation: u64,
        parent: &str,
        name: &str,
        result: Result<(), ServiceError>,
    ) -> CreateOutcome {
        if generation != self.generation {
            debug!(parent, name, "discarding folder creation for a superseded tree");
            return CreateOutcome::Stale;
        }
        match result {
            Ok(()) => {
                let new_path = join_path(parent, name);
                self.reinitialize(&new_path);
                self.notify_after_replay = Some(new_path);
                CreateOutcome::Created
            }
            Err(err) => {
                debug!(parent, name, error = %err, "folder creation failed");
                CreateOutcome::Failed
            }
        }
    }

    /// Silent degrade: the failed load leaves the branch collapsed and
    /// empty, and re-arms the node for a later retry.
    fn degrade(&mut self, path: &str) {
        if let Some(node) = self.tree.find_node_mut(path) {
            if node.load_state == LoadState::Loading {
                node.load_state = LoadState::Unloaded;
            }
        }
        if self.replay_step.as_deref() == Some(path) {
            self.abort_replay();
        }
    }

    fn abort_replay(&mut self) {
        self.pending_replay.clear();
        self.replay_step = None;
        self.notify_after_replay = None;
    }

    /// Move the replay to the next pending prefix. Prefixes that are
    /// already loaded (a user got there first) are expanded and skipped;
    /// a prefix the service never reported ends the replay.
    fn advance_replay(&mut self) {
        loop {
            let Some(next) = self.pending_replay.pop_front() else {
                self.replay_step = None;
                if let Some(path) = self.notify_after_replay.take() {
                    self.tree.selected_path = path.clone();
                    (self.on_path_change)(&path);
                }
                return;
            };
            match self.tree.find_node_mut(&next) {
                None => {
                    debug!(path = %next, "replay target missing from parent listing, stopping");
                    self.abort_replay();
                    return;
                }
                Some(node) if node.is_loaded() => {
                    node.expanded = true;
                    continue;
                }
                Some(_) => {
                    self.replay_step = Some(next.clone());
                    self.dispatch_load(&next);
                    return;
                }
            }
        }
    }

    /// Request a listing for `path` unless one already happened or is in
    /// flight. The synchronous state check plus the `Loading` marker make
    /// rapid repeated activations issue at most one request.
    fn dispatch_load(&mut self, path: &str) {
        let Some(node) = self.tree.find_node_mut(path) else {
            return;
        };
        if node.load_state != LoadState::Unloaded {
            return;
        }
        node.load_state = LoadState::Loading;
        debug!(path, generation = self.generation, "dispatching listing request");
        let _ = self.tasks.send(ServiceTask::List {
            generation: self.generation,
            path: path.to_string(),
        });
    }

    // ── Accessors for the view layer ─────────────────────────────────────────

    pub fn selected_path(&self) -> &str {
        &self.tree.selected_path
    }

    pub fn labels(&self) -> &Labels {
        &self.options.labels
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the initial-path replay is still in progress.
    pub fn is_replaying(&self) -> bool {
        self.replay_step.is_some()
    }

    /// Current rows, a pure projection of the tree state.
    pub fn flat_items(&self) -> Vec<FlatItem> {
        self.tree.flatten(self.options.allow_create_folder)
    }

    #[cfg(test)]
    pub fn tree(&self) -> &TreeState {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PickerConfig;
    use crate::service::{DirEntry, EntryKind};
    use crate::tree::FlatKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn options(initial_path: &str) -> Options {
        let mut options = PickerConfig::default().options();
        options.initial_path = initial_path.to_string();
        options
    }

    fn listing(dirs: &[(&str, &str)]) -> DirListing {
        DirListing {
            files: dirs
                .iter()
                .map(|(name, path)| DirEntry {
                    name: name.to_string(),
                    path: path.to_string(),
                    kind: EntryKind::Directory,
                })
                .collect(),
            error: None,
        }
    }

    struct Fixture {
        picker: Picker,
        tasks: UnboundedReceiver<ServiceTask>,
        changes: Rc<RefCell<Vec<String>>>,
    }

    fn fixture(initial_path: &str) -> Fixture {
        let (task_tx, tasks) = unbounded_channel();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&changes);
        let picker = Picker::new(
            options(initial_path),
            task_tx,
            Box::new(move |path| recorder.borrow_mut().push(path.to_string())),
        );
        Fixture {
            picker,
            tasks,
            changes,
        }
    }

    fn expect_list(fix: &mut Fixture, path: &str) -> u64 {
        match fix.tasks.try_recv() {
            Ok(ServiceTask::List { generation, path: p }) => {
                assert_eq!(p, path, "expected a listing request for {path}");
                generation
            }
            other => panic!("expected a listing request for {path}, got {other:?}"),
        }
    }

    fn expect_no_task(fix: &mut Fixture) {
        assert!(fix.tasks.try_recv().is_err(), "expected no pending task");
    }

    #[test]
    fn replay_loads_each_prefix_in_order() {
        let mut fix = fixture("/a/b");

        let generation = expect_list(&mut fix, "/");
        expect_no_task(&mut fix);
        assert!(fix.picker.is_replaying());

        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a"), ("c", "/c")])));
        // The next step is dispatched only after the previous completed.
        assert_eq!(expect_list(&mut fix, "/a"), generation);
        expect_no_task(&mut fix);

        fix.picker
            .handle_listing(generation, "/a", Ok(listing(&[("b", "/a/b")])));
        assert_eq!(expect_list(&mut fix, "/a/b"), generation);

        fix.picker.handle_listing(generation, "/a/b", Ok(listing(&[])));
        expect_no_task(&mut fix);
        assert!(!fix.picker.is_replaying());

        let tree = fix.picker.tree();
        assert!(tree.find_node("/a").unwrap().expanded);
        assert!(tree.find_node("/a/b").unwrap().expanded);
        assert!(tree.find_node("/c").is_some());
        // The replay is not a selection.
        assert_eq!(fix.picker.selected_path(), "");
        assert!(fix.changes.borrow().is_empty());
    }

    #[test]
    fn replay_of_root_only_loads_root() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));
        expect_no_task(&mut fix);
        assert!(!fix.picker.is_replaying());
        assert!(!fix.picker.tree().find_node("/a").unwrap().expanded);
    }

    #[test]
    fn replay_stops_when_prefix_is_missing() {
        let mut fix = fixture("/gone/deep");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));
        // "/gone" never appeared in root's listing.
        expect_no_task(&mut fix);
        assert!(!fix.picker.is_replaying());
    }

    #[test]
    fn replay_aborts_silently_on_load_failure() {
        let mut fix = fixture("/a/b");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));
        expect_list(&mut fix, "/a");
        fix.picker.handle_listing(
            generation,
            "/a",
            Err(ServiceError::Remote("boom".into())),
        );
        expect_no_task(&mut fix);
        assert!(!fix.picker.is_replaying());
        let node = fix.picker.tree().find_node("/a").unwrap();
        assert_eq!(node.load_state, LoadState::Unloaded);
        assert!(node.children.is_empty());
        assert!(!node.expanded);
    }

    #[test]
    fn listing_error_field_degrades_like_a_failure() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker.handle_listing(
            generation,
            "/",
            Ok(DirListing {
                files: Vec::new(),
                error: Some("cannot access".into()),
            }),
        );
        assert_eq!(
            fix.picker.tree().find_node("/").unwrap().load_state,
            LoadState::Unloaded
        );
    }

    #[test]
    fn activation_selects_and_fires_callback_exactly_once() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));

        fix.picker.activate("/a");
        assert_eq!(fix.picker.selected_path(), "/a");
        assert_eq!(*fix.changes.borrow(), vec!["/a".to_string()]);
        // The unloaded node also got a load dispatched.
        expect_list(&mut fix, "/a");
    }

    #[test]
    fn activating_root_is_selection_only() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));

        fix.picker.activate("/");
        assert_eq!(fix.picker.selected_path(), "/");
        assert_eq!(*fix.changes.borrow(), vec!["/".to_string()]);
        expect_no_task(&mut fix);
        assert!(fix.picker.tree().find_node("/").unwrap().expanded);
    }

    #[test]
    fn rapid_double_activation_issues_one_request() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));

        fix.picker.activate("/a");
        fix.picker.activate("/a");
        expect_list(&mut fix, "/a");
        expect_no_task(&mut fix);
        // Both activations still announced the selection.
        assert_eq!(fix.changes.borrow().len(), 2);
    }

    #[test]
    fn collapse_and_reexpand_does_not_refetch() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));

        fix.picker.activate("/a");
        expect_list(&mut fix, "/a");
        fix.picker
            .handle_listing(generation, "/a", Ok(listing(&[("x", "/a/x")])));
        assert!(fix.picker.tree().find_node("/a").unwrap().expanded);

        // Collapse, then expand again: pure view-state flips.
        fix.picker.activate("/a");
        assert!(!fix.picker.tree().find_node("/a").unwrap().expanded);
        fix.picker.activate("/a");
        assert!(fix.picker.tree().find_node("/a").unwrap().expanded);
        expect_no_task(&mut fix);
    }

    #[test]
    fn concurrent_sibling_loads_resolve_in_any_order() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a"), ("b", "/b")])));

        fix.picker.activate("/a");
        fix.picker.activate("/b");
        expect_list(&mut fix, "/a");
        expect_list(&mut fix, "/b");

        // Resolve in reverse dispatch order.
        fix.picker
            .handle_listing(generation, "/b", Ok(listing(&[("y", "/b/y")])));
        fix.picker
            .handle_listing(generation, "/a", Ok(listing(&[("x", "/a/x")])));

        let tree = fix.picker.tree();
        let a = tree.find_node("/a").unwrap();
        let b = tree.find_node("/b").unwrap();
        assert!(a.is_loaded() && a.expanded);
        assert!(b.is_loaded() && b.expanded);
        assert_eq!(a.children[0].path, "/a/x");
        assert_eq!(b.children[0].path, "/b/y");
    }

    #[test]
    fn stale_generation_results_are_discarded() {
        let mut fix = fixture("/");
        let old_generation = expect_list(&mut fix, "/");

        fix.picker.reinitialize("/");
        let new_generation = expect_list(&mut fix, "/");
        assert_ne!(old_generation, new_generation);

        // The old load resolves into the rebuilt tree: nothing changes.
        fix.picker
            .handle_listing(old_generation, "/", Ok(listing(&[("ghost", "/ghost")])));
        assert_eq!(
            fix.picker.tree().find_node("/").unwrap().load_state,
            LoadState::Loading
        );
        assert!(fix.picker.tree().find_node("/ghost").is_none());
    }

    #[test]
    fn create_folder_rebuilds_and_notifies_after_replay() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("x", "/x")])));

        fix.picker.activate("/x");
        expect_list(&mut fix, "/x");
        fix.picker.handle_listing(generation, "/x", Ok(listing(&[])));
        fix.changes.borrow_mut().clear();

        fix.picker.create_folder("/x", "new");
        match fix.tasks.try_recv() {
            Ok(ServiceTask::CreateDir {
                generation: g,
                parent,
                name,
            }) => {
                assert_eq!(g, generation);
                assert_eq!(parent, "/x");
                assert_eq!(name, "new");
            }
            other => panic!("expected a creation request, got {other:?}"),
        }

        let outcome = fix.picker.handle_folder_created(generation, "/x", "new", Ok(()));
        assert_eq!(outcome, CreateOutcome::Created);

        // Full rebuild: a fresh generation replays toward the new folder.
        let rebuilt = expect_list(&mut fix, "/");
        assert_ne!(rebuilt, generation);
        assert!(fix.changes.borrow().is_empty());

        fix.picker.handle_listing(
            rebuilt,
            "/",
            Ok(listing(&[("new-sibling", "/new-sibling"), ("x", "/x")])),
        );
        expect_list(&mut fix, "/x");
        fix.picker
            .handle_listing(rebuilt, "/x", Ok(listing(&[("new", "/x/new")])));
        expect_list(&mut fix, "/x/new");
        fix.picker
            .handle_listing(rebuilt, "/x/new", Ok(listing(&[])));

        // Exactly one notification, after the replay completed.
        assert_eq!(*fix.changes.borrow(), vec!["/x/new".to_string()]);
        assert_eq!(fix.picker.selected_path(), "/x/new");
        assert!(fix.picker.tree().find_node("/x/new").unwrap().expanded);
    }

    #[test]
    fn failed_creation_changes_nothing() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("x", "/x")])));

        let outcome = fix.picker.handle_folder_created(
            generation,
            "/x",
            "new",
            Err(ServiceError::Remote("denied".into())),
        );
        assert_eq!(outcome, CreateOutcome::Failed);
        assert_eq!(fix.picker.generation(), generation);
        assert!(fix.changes.borrow().is_empty());
        expect_no_task(&mut fix);
    }

    #[test]
    fn stale_creation_is_ignored() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker.reinitialize("/");
        let outcome = fix.picker.handle_folder_created(generation, "/", "new", Ok(()));
        assert_eq!(outcome, CreateOutcome::Stale);
    }

    #[test]
    fn replay_skips_prefix_a_user_already_loaded() {
        let mut fix = fixture("/a/b");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));
        expect_list(&mut fix, "/a");

        // The user activates "/a" while its replay load is in flight:
        // no duplicate request is issued.
        fix.picker.activate("/a");
        expect_no_task(&mut fix);

        fix.picker
            .handle_listing(generation, "/a", Ok(listing(&[("b", "/a/b")])));
        expect_list(&mut fix, "/a/b");
        fix.picker.handle_listing(generation, "/a/b", Ok(listing(&[])));
        assert!(!fix.picker.is_replaying());
    }

    #[test]
    fn create_rows_follow_allow_create_option() {
        let mut fix = fixture("/");
        let generation = expect_list(&mut fix, "/");
        fix.picker
            .handle_listing(generation, "/", Ok(listing(&[("a", "/a")])));
        assert!(fix
            .picker
            .flat_items()
            .iter()
            .any(|i| matches!(i.kind, FlatKind::CreateFolder { .. })));

        let (task_tx, _tasks) = unbounded_channel();
        let mut opts = options("/");
        opts.allow_create_folder = false;
        let mut quiet = Picker::new(opts, task_tx, Box::new(|_| {}));
        quiet.handle_listing(quiet.generation(), "/", Ok(listing(&[("a", "/a")])));
        assert!(!quiet
            .flat_items()
            .iter()
            .any(|i| matches!(i.kind, FlatKind::CreateFolder { .. })));
    }
}
