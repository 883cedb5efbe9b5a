use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::config::Labels;
use crate::theme::ThemeColors;
use crate::tree::{FlatItem, FlatKind, LoadState};

/// Tree widget that renders the directory rows with box-drawing characters.
pub struct TreeWidget<'a> {
    items: &'a [FlatItem],
    cursor: usize,
    scroll_offset: usize,
    labels: &'a Labels,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(
        items: &'a [FlatItem],
        cursor: usize,
        scroll_offset: usize,
        labels: &'a Labels,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            items,
            cursor,
            scroll_offset,
            labels,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing
    /// characters. Ancestor levels draw continuation lines unless their
    /// branch already ended.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();

        for d in 1..item.depth {
            // Walk backwards to find the ancestor at depth d.
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            if ancestor_is_last {
                parts.push("   ");
            } else {
                parts.push("│  ");
            }
        }

        if item.is_last_sibling {
            parts.push("└──");
        } else {
            parts.push("├──");
        }

        parts.join("")
    }

    /// Expansion/load marker for a row.
    fn item_indicator(item: &FlatItem) -> &'static str {
        match &item.kind {
            FlatKind::Directory {
                load_state: LoadState::Loading,
                ..
            } => "⋯ ",
            FlatKind::Directory { expanded: true, .. } => "▾ ",
            FlatKind::Directory { .. } => "▸ ",
            FlatKind::CreateFolder { .. } => "+ ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.items.is_empty() || visible_height == 0 {
            return;
        }

        let visible_items = self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(item, self.items, idx);
            let indicator = Self::item_indicator(item);
            let label = match &item.kind {
                FlatKind::Directory { .. } => item.name.as_str(),
                FlatKind::CreateFolder { .. } => self.labels.create_folder.as_str(),
            };

            let is_cursor = idx == self.cursor;
            let marker = if item.is_selected { "» " } else { "" };
            let line = if is_cursor {
                let style = Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD);
                Line::from(Span::styled(
                    format!("{prefix}{marker}{indicator}{label}"),
                    style,
                ))
            } else {
                let label_style = if item.is_selected {
                    Style::default()
                        .fg(self.theme.info_fg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    match item.kind {
                        FlatKind::Directory { .. } => Style::default().fg(self.theme.tree_dir_fg),
                        FlatKind::CreateFolder { .. } => Style::default()
                            .fg(self.theme.tree_create_fg)
                            .add_modifier(Modifier::ITALIC),
                    }
                };
                Line::from(vec![
                    Span::styled(prefix, Style::default().fg(self.theme.tree_fg)),
                    Span::styled(format!("{marker}{indicator}{label}"), label_style),
                ])
            };
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
