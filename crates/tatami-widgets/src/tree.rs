//! Tree view with expand/collapse.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::Rect;

use crate::widget::{DrawContext, Reaction, Widget};

/// A node in the tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
    pub expanded: bool,
}

impl TreeNode {
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
            expanded: false,
        }
    }

    #[must_use]
    pub fn branch(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            children,
            expanded: true,
        }
    }
}

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VisibleRow {
    depth: usize,
    label: String,
    has_children: bool,
    expanded: bool,
}

/// Scrollable tree with keyboard navigation.
#[derive(Debug, Clone)]
pub struct TreeView {
    bounds: Rect,
    roots: Vec<TreeNode>,
    selected: usize,
    top: usize,
}

impl TreeView {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u16, height: u16, roots: Vec<TreeNode>) -> Self {
        Self {
            bounds: Rect::new(x, y, width.max(1), height.max(1)),
            roots,
            selected: 0,
            top: 0,
        }
    }

    fn flatten(&self) -> Vec<VisibleRow> {
        fn walk(nodes: &[TreeNode], depth: usize, out: &mut Vec<VisibleRow>) {
            for node in nodes {
                out.push(VisibleRow {
                    depth,
                    label: node.label.clone(),
                    has_children: !node.children.is_empty(),
                    expanded: node.expanded,
                });
                if node.expanded {
                    walk(&node.children, depth + 1, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.roots, 0, &mut out);
        out
    }

    /// The visible node at flat index, for mutation.
    fn node_at_mut(&mut self, index: usize) -> Option<&mut TreeNode> {
        fn walk<'a>(
            nodes: &'a mut [TreeNode],
            remaining: &mut usize,
        ) -> Option<&'a mut TreeNode> {
            for node in nodes {
                if *remaining == 0 {
                    return Some(node);
                }
                *remaining -= 1;
                if node.expanded
                    && let Some(found) = walk(&mut node.children, remaining)
                {
                    return Some(found);
                }
            }
            None
        }
        let mut remaining = index;
        walk(&mut self.roots, &mut remaining)
    }

    /// Label of the selected row.
    #[must_use]
    pub fn selected_label(&self) -> Option<String> {
        self.flatten().get(self.selected).map(|r| r.label.clone())
    }

    fn clamp_and_scroll(&mut self, visible: usize) {
        self.selected = self.selected.min(visible.saturating_sub(1));
        let height = self.bounds.height as usize;
        if self.selected < self.top {
            self.top = self.selected;
        }
        if self.selected >= self.top + height {
            self.top = self.selected + 1 - height;
        }
    }

    fn toggle_selected(&mut self, expand: Option<bool>) {
        let index = self.selected;
        if let Some(node) = self.node_at_mut(index) {
            node.expanded = expand.unwrap_or(!node.expanded);
        }
    }
}

impl Widget for TreeView {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn focusable(&self) -> bool {
        true
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let rows = self.flatten();
        for y in 0..self.bounds.height as usize {
            let Some(row) = rows.get(self.top + y) else {
                break;
            };
            let attrs = if ctx.focused && self.top + y == self.selected {
                ctx.theme.selection
            } else {
                ctx.theme.label
            };
            let marker = if !row.has_children {
                ' '
            } else if row.expanded {
                '▼'
            } else {
                '▶'
            };
            let text = format!("{}{marker} {}", "  ".repeat(row.depth), row.label);
            ctx.screen.put_str(0, y as i32, &text, attrs);
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        let rows = self.flatten();
        if rows.is_empty() {
            return Reaction::Unhandled;
        }
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected += 1,
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = rows.len() - 1,
            KeyCode::Right | KeyCode::Char('+') => self.toggle_selected(Some(true)),
            KeyCode::Left | KeyCode::Char('-') => self.toggle_selected(Some(false)),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(None),
            _ => return Reaction::Unhandled,
        }
        let visible = self.flatten().len();
        self.clamp_and_scroll(visible);
        Reaction::Handled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        if ev.y >= 0 {
            let index = self.top + ev.y as usize;
            let visible = self.flatten().len();
            if index < visible {
                if self.selected == index {
                    self.toggle_selected(None);
                } else {
                    self.selected = index;
                }
                self.clamp_and_scroll(self.flatten().len());
            }
        }
        Reaction::Handled
    }
}
