//! Lazy directory tree state.
//!
//! The tree is the system of record: load and visibility flags live on the
//! owned nodes, and the rendered rows are a pure projection recomputed via
//! [`TreeState::flatten`]. Paths are plain `/`-joined strings because they
//! identify entries on a remote filesystem, not on the host.

use crate::service::{DirEntry, EntryKind};

/// Load lifecycle of a node's children. One-way except for the silent
/// reset of a failed load (`Loading` back to `Unloaded`), which re-arms
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// One directory in the in-memory tree.
#[derive(Debug)]
pub struct TreeNode {
    /// Absolute path, unique per node; root is `"/"`. Never mutated.
    pub path: String,
    /// Display label (basename of `path`).
    pub name: String,
    /// Child directories in service response order; empty until loaded.
    pub children: Vec<TreeNode>,
    pub load_state: LoadState,
    /// View state only; meaningful once loaded.
    pub expanded: bool,
}

impl TreeNode {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = basename(&path).to_string();
        Self {
            path,
            name,
            children: Vec::new(),
            load_state: LoadState::Unloaded,
            expanded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    /// Populate children from a listing and mark the node loaded.
    ///
    /// Only directory entries are kept; the `.` and `..` pseudo-entries
    /// are dropped, as is any entry whose path already has a child node.
    /// Ordering follows the service response.
    pub fn apply_listing(&mut self, files: &[DirEntry]) {
        for entry in files {
            if entry.kind != EntryKind::Directory {
                continue;
            }
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            let child_path = if entry.path.is_empty() {
                join_path(&self.path, &entry.name)
            } else {
                entry.path.clone()
            };
            if self.children.iter().any(|c| c.path == child_path) {
                continue;
            }
            self.children.push(TreeNode::new(child_path));
        }
        self.load_state = LoadState::Loaded;
    }
}

/// Kind of a flattened row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatKind {
    Directory {
        load_state: LoadState,
        expanded: bool,
    },
    /// The create-folder affordance projected under a loaded, expanded node.
    CreateFolder { parent: String },
}

/// A flattened representation of a tree row for rendering.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub kind: FlatKind,
    pub is_last_sibling: bool,
    /// Single-selection view marker; at most one row carries it.
    pub is_selected: bool,
}

/// Tree state for one picker instance.
#[derive(Debug)]
pub struct TreeState {
    /// Owns the full node graph.
    pub root: TreeNode,
    /// Last path the user activated; empty before the first selection.
    pub selected_path: String,
}

impl TreeState {
    /// Fresh state with an unloaded root. Root is always expanded; it
    /// never collapses.
    pub fn new() -> Self {
        let mut root = TreeNode::new("/");
        root.expanded = true;
        Self {
            root,
            selected_path: String::new(),
        }
    }

    /// Find a node by path.
    pub fn find_node(&self, target: &str) -> Option<&TreeNode> {
        Self::find_in(&self.root, target)
    }

    /// Find a mutable reference to a node by path.
    pub fn find_node_mut(&mut self, target: &str) -> Option<&mut TreeNode> {
        Self::find_in_mut(&mut self.root, target)
    }

    fn find_in<'a>(node: &'a TreeNode, target: &str) -> Option<&'a TreeNode> {
        if node.path == target {
            return Some(node);
        }
        node.children
            .iter()
            .find_map(|child| Self::find_in(child, target))
    }

    fn find_in_mut<'a>(node: &'a mut TreeNode, target: &str) -> Option<&'a mut TreeNode> {
        if node.path == target {
            return Some(node);
        }
        for child in node.children.iter_mut() {
            if let Some(found) = Self::find_in_mut(child, target) {
                return Some(found);
            }
        }
        None
    }

    /// Project the tree into renderable rows.
    ///
    /// Children of collapsed nodes are omitted. When `with_create_rows` is
    /// set, every loaded, expanded node gets a trailing create-folder row.
    pub fn flatten(&self, with_create_rows: bool) -> Vec<FlatItem> {
        let mut items = Vec::new();
        self.flatten_node(&self.root, 0, true, with_create_rows, &mut items);
        items
    }

    fn flatten_node(
        &self,
        node: &TreeNode,
        depth: usize,
        is_last: bool,
        with_create_rows: bool,
        items: &mut Vec<FlatItem>,
    ) {
        items.push(FlatItem {
            path: node.path.clone(),
            name: node.name.clone(),
            depth,
            kind: FlatKind::Directory {
                load_state: node.load_state,
                expanded: node.expanded,
            },
            is_last_sibling: is_last,
            is_selected: !self.selected_path.is_empty() && node.path == self.selected_path,
        });

        if !node.expanded {
            return;
        }

        let create_row = with_create_rows && node.is_loaded();
        let child_count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let is_last_child = i == child_count - 1 && !create_row;
            self.flatten_node(child, depth + 1, is_last_child, with_create_rows, items);
        }
        if create_row {
            items.push(FlatItem {
                path: node.path.clone(),
                name: String::new(),
                depth: depth + 1,
                kind: FlatKind::CreateFolder {
                    parent: node.path.clone(),
                },
                is_last_sibling: true,
                is_selected: false,
            });
        }
    }
}

/// Basename of a remote path; root maps to itself.
pub fn basename(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Join a child name onto a parent path with a single `/`.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Ordered ancestor prefixes of a path, excluding the implicit root:
/// `/a/b/c` yields `["/a", "/a/b", "/a/b/c"]`; `/` yields nothing.
pub fn ancestor_prefixes(path: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut acc = String::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        acc.push('/');
        acc.push_str(part);
        prefixes.push(acc.clone());
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(name: &str, path: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::Directory,
        }
    }

    fn file(name: &str, path: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
        }
    }

    #[test]
    fn basename_of_root_and_nested() {
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("/a"), "a");
        assert_eq!(basename("/a/b/c"), "c");
    }

    #[test]
    fn join_path_handles_root_parent() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "b"), "/a/b");
    }

    #[test]
    fn ancestor_prefixes_of_nested_path() {
        assert_eq!(ancestor_prefixes("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn ancestor_prefixes_of_root_is_empty() {
        assert!(ancestor_prefixes("/").is_empty());
    }

    #[test]
    fn ancestor_prefixes_ignores_trailing_slash() {
        assert_eq!(ancestor_prefixes("/a/b/"), vec!["/a", "/a/b"]);
    }

    #[test]
    fn apply_listing_keeps_only_real_directories() {
        let mut node = TreeNode::new("/x");
        node.apply_listing(&[
            dir(".", ""),
            dir("..", ""),
            dir("y", "/x/y"),
            file("f.txt", "/x/f.txt"),
        ]);
        assert!(node.is_loaded());
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].path, "/x/y");
        assert_eq!(node.children[0].name, "y");
    }

    #[test]
    fn apply_listing_preserves_service_order() {
        let mut node = TreeNode::new("/");
        node.apply_listing(&[dir("zeta", "/zeta"), dir("alpha", "/alpha")]);
        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn apply_listing_skips_existing_children() {
        let mut node = TreeNode::new("/");
        node.apply_listing(&[dir("a", "/a")]);
        node.children[0].expanded = true;
        node.apply_listing(&[dir("a", "/a"), dir("b", "/b")]);
        assert_eq!(node.children.len(), 2);
        // The pre-existing node was not recreated.
        assert!(node.children[0].expanded);
    }

    #[test]
    fn apply_listing_derives_path_when_missing() {
        let mut node = TreeNode::new("/a");
        node.apply_listing(&[DirEntry {
            name: "b".to_string(),
            path: String::new(),
            kind: EntryKind::Directory,
        }]);
        assert_eq!(node.children[0].path, "/a/b");
    }

    #[test]
    fn find_node_walks_the_tree() {
        let mut state = TreeState::new();
        state.root.apply_listing(&[dir("a", "/a")]);
        state
            .find_node_mut("/a")
            .unwrap()
            .apply_listing(&[dir("b", "/a/b")]);
        assert!(state.find_node("/a/b").is_some());
        assert!(state.find_node("/a/c").is_none());
    }

    #[test]
    fn flatten_skips_collapsed_branches() {
        let mut state = TreeState::new();
        state.root.apply_listing(&[dir("a", "/a"), dir("b", "/b")]);
        state
            .find_node_mut("/a")
            .unwrap()
            .apply_listing(&[dir("x", "/a/x")]);
        // "/a" is loaded but collapsed: its child stays hidden.
        let paths: Vec<String> = state
            .flatten(false)
            .into_iter()
            .map(|i| i.path)
            .collect();
        assert_eq!(paths, vec!["/", "/a", "/b"]);

        state.find_node_mut("/a").unwrap().expanded = true;
        let paths: Vec<String> = state
            .flatten(false)
            .into_iter()
            .map(|i| i.path)
            .collect();
        assert_eq!(paths, vec!["/", "/a", "/a/x", "/b"]);
    }

    #[test]
    fn flatten_appends_create_rows_under_loaded_nodes() {
        let mut state = TreeState::new();
        state.root.apply_listing(&[dir("a", "/a")]);
        let items = state.flatten(true);
        // root, /a, create-row under root
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[2].kind,
            FlatKind::CreateFolder {
                parent: "/".to_string()
            }
        );
        assert!(items[2].is_last_sibling);
        assert!(!items[1].is_last_sibling);
    }

    #[test]
    fn flatten_has_no_create_row_for_unloaded_nodes() {
        let state = TreeState::new();
        // Root is expanded but not yet loaded.
        let items = state.flatten(true);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn flatten_marks_single_selection() {
        let mut state = TreeState::new();
        state.root.apply_listing(&[dir("a", "/a"), dir("b", "/b")]);
        state.selected_path = "/b".to_string();
        let items = state.flatten(false);
        let selected: Vec<&str> = items
            .iter()
            .filter(|i| i.is_selected)
            .map(|i| i.path.as_str())
            .collect();
        assert_eq!(selected, vec!["/b"]);
    }

    #[test]
    fn flatten_marks_nothing_before_first_selection() {
        let mut state = TreeState::new();
        state.root.apply_listing(&[dir("a", "/a")]);
        assert!(state.flatten(false).iter().all(|i| !i.is_selected));
    }
}
