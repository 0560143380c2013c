//! Menu bar and drop-down menus.

use tatami_core::cell::CellAttrs;
use tatami_core::event::{KeyCode, KeyEvent};
use tatami_core::geometry::Rect;
use tatami_render::{BorderStyle, Screen};

use crate::theme::Theme;
use crate::widget::{Command, Reaction};

/// An entry in a drop-down menu.
#[derive(Debug, Clone)]
pub struct MenuItem {
    label: String,
    command: Command,
    enabled: bool,
    separator: bool,
    /// Accelerator hint shown right-aligned (display only; the application
    /// binds the actual key).
    accel: Option<String>,
}

impl MenuItem {
    #[must_use]
    pub fn new(label: impl Into<String>, command: Command) -> Self {
        Self {
            label: label.into(),
            command,
            enabled: true,
            separator: false,
            accel: None,
        }
    }

    /// A horizontal separator row.
    #[must_use]
    pub fn separator() -> Self {
        Self {
            label: String::new(),
            command: Command(u16::MAX),
            enabled: false,
            separator: true,
            accel: None,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn with_accel(mut self, accel: impl Into<String>) -> Self {
        self.accel = Some(accel.into());
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A titled drop-down.
#[derive(Debug, Clone)]
pub struct Menu {
    title: String,
    items: Vec<MenuItem>,
}

impl Menu {
    #[must_use]
    pub fn new(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    fn first_selectable(&self) -> usize {
        self.items
            .iter()
            .position(|i| i.enabled && !i.separator)
            .unwrap_or(0)
    }
}

/// The bar across the top row plus the currently open drop-down.
#[derive(Debug, Clone, Default)]
pub struct MenuBar {
    menus: Vec<Menu>,
    active: Option<usize>,
    selected: usize,
}

impl MenuBar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_menu(&mut self, menu: Menu) {
        self.menus.push(menu);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn activate(&mut self, index: usize) {
        if index < self.menus.len() {
            self.active = Some(index);
            self.selected = self.menus[index].first_selectable();
        }
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// The x span of each menu title on the bar.
    fn title_spans(&self) -> Vec<(i32, i32)> {
        let mut spans = Vec::with_capacity(self.menus.len());
        let mut x = 1;
        for menu in &self.menus {
            let width = menu.title.chars().count() as i32 + 2;
            spans.push((x, x + width));
            x += width + 1;
        }
        spans
    }

    /// The menu title under column `x` on the bar row.
    #[must_use]
    pub fn hit_title(&self, x: i32) -> Option<usize> {
        self.title_spans()
            .iter()
            .position(|&(start, end)| x >= start && x < end)
    }

    /// Geometry of the open drop-down, borders included.
    #[must_use]
    pub fn dropdown_rect(&self) -> Option<Rect> {
        let active = self.active?;
        let menu = &self.menus[active];
        let (start, _) = self.title_spans()[active];
        let inner = menu
            .items
            .iter()
            .map(|i| {
                i.label.chars().count()
                    + i.accel.as_ref().map_or(0, |a| a.chars().count() + 2)
                    + 2
            })
            .max()
            .unwrap_or(4)
            .max(4);
        Some(Rect::new(
            start,
            1,
            inner as u16 + 2,
            menu.items.len() as u16 + 2,
        ))
    }

    /// The item index under an absolute grid position inside the drop-down.
    #[must_use]
    pub fn hit_item(&self, x: i32, y: i32) -> Option<usize> {
        let rect = self.dropdown_rect()?;
        if !rect.contains(x, y) {
            return None;
        }
        let row = y - rect.y - 1;
        let menu = &self.menus[self.active?];
        if row < 0 || row as usize >= menu.items.len() {
            return None;
        }
        let item = &menu.items[row as usize];
        (item.enabled && !item.separator).then_some(row as usize)
    }

    /// A click resolved to a command: selects and closes.
    pub fn click_item(&mut self, x: i32, y: i32) -> Option<Command> {
        let index = self.hit_item(x, y)?;
        let command = self.menus[self.active?].items[index].command;
        self.deactivate();
        Some(command)
    }

    /// Open the menu whose title starts with `ch` (the Alt+letter path).
    pub fn activate_by_initial(&mut self, ch: char) -> bool {
        let ch = ch.to_ascii_lowercase();
        let index = self
            .menus
            .iter()
            .position(|m| m.title.chars().next().map(|c| c.to_ascii_lowercase()) == Some(ch));
        if let Some(index) = index {
            self.activate(index);
            true
        } else {
            false
        }
    }

    /// Keyboard handling while a drop-down is open.
    pub fn on_key(&mut self, key: KeyEvent) -> Reaction {
        let Some(active) = self.active else {
            return Reaction::Unhandled;
        };
        let item_count = self.menus[active].items.len();
        match key.code {
            KeyCode::Escape => {
                self.deactivate();
                Reaction::Handled
            }
            KeyCode::Left => {
                let next = if active == 0 {
                    self.menus.len() - 1
                } else {
                    active - 1
                };
                self.activate(next);
                Reaction::Handled
            }
            KeyCode::Right => {
                self.activate((active + 1) % self.menus.len());
                Reaction::Handled
            }
            KeyCode::Up => {
                self.move_selection(active, item_count, -1);
                Reaction::Handled
            }
            KeyCode::Down => {
                self.move_selection(active, item_count, 1);
                Reaction::Handled
            }
            KeyCode::Enter => {
                let item = &self.menus[active].items[self.selected];
                if item.enabled && !item.separator {
                    let command = item.command;
                    self.deactivate();
                    Reaction::Emit(command)
                } else {
                    Reaction::Handled
                }
            }
            KeyCode::Char(ch) if key.modifiers.is_empty() => {
                // Jump to the item with a matching initial.
                let ch = ch.to_ascii_lowercase();
                let menu = &self.menus[active];
                let hit = menu.items.iter().position(|i| {
                    i.enabled
                        && !i.separator
                        && i.label.chars().next().map(|c| c.to_ascii_lowercase()) == Some(ch)
                });
                if let Some(index) = hit {
                    let command = menu.items[index].command;
                    self.deactivate();
                    Reaction::Emit(command)
                } else {
                    Reaction::Handled
                }
            }
            _ => Reaction::Handled,
        }
    }

    fn move_selection(&mut self, active: usize, item_count: usize, dir: i32) {
        if item_count == 0 {
            return;
        }
        let mut index = self.selected as i32;
        for _ in 0..item_count {
            index = (index + dir).rem_euclid(item_count as i32);
            let item = &self.menus[active].items[index as usize];
            if item.enabled && !item.separator {
                self.selected = index as usize;
                return;
            }
        }
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// Draw the bar across row 0.
    pub fn draw_bar(&self, screen: &mut Screen, theme: &Theme, width: usize) {
        for x in 0..width {
            screen.put_char(x as i32, 0, ' ', theme.menu);
        }
        for (index, (menu, (start, _))) in
            self.menus.iter().zip(self.title_spans()).enumerate()
        {
            let attrs = if self.active == Some(index) {
                theme.menu_selected
            } else {
                theme.menu
            };
            screen.put_str(start, 0, &format!(" {} ", menu.title), attrs);
            if self.active != Some(index) {
                // Highlight the Alt-accelerator initial.
                let hot = CellAttrs {
                    fg: theme.menu_hotkey.fg,
                    ..attrs
                };
                if let Some(first) = menu.title.chars().next() {
                    screen.put_char(start + 1, 0, first, hot);
                }
            }
        }
    }

    /// Draw the open drop-down, if any.
    pub fn draw_dropdown(&self, screen: &mut Screen, theme: &Theme) {
        let Some(active) = self.active else {
            return;
        };
        let Some(rect) = self.dropdown_rect() else {
            return;
        };
        screen.draw_box(
            rect.x,
            rect.y,
            rect.right(),
            rect.bottom(),
            theme.menu,
            Some(theme.menu),
            BorderStyle::Single,
            true,
        );
        let menu = &self.menus[active];
        for (i, item) in menu.items.iter().enumerate() {
            let y = rect.y + 1 + i as i32;
            if item.separator {
                screen.hline(rect.x + 1, y, rect.width as i32 - 2, '─', theme.menu);
                continue;
            }
            let attrs = if i == self.selected {
                theme.menu_selected
            } else if item.enabled {
                theme.menu
            } else {
                theme.menu_disabled
            };
            // Selection and disabled rows paint edge to edge.
            for x in 1..rect.width as i32 - 1 {
                screen.put_char(rect.x + x, y, ' ', attrs);
            }
            screen.put_str(rect.x + 2, y, &item.label, attrs);
            if let Some(accel) = &item.accel {
                let x = rect.right() - 2 - accel.chars().count() as i32;
                screen.put_str(x, y, accel, attrs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> MenuBar {
        let mut bar = MenuBar::new();
        bar.add_menu(Menu::new(
            "File",
            vec![
                MenuItem::new("Open", Command(10)).with_accel("F3"),
                MenuItem::separator(),
                MenuItem::new("Print", Command(11)).disabled(),
                MenuItem::new("Exit", Command(12)),
            ],
        ));
        bar.add_menu(Menu::new("Help", vec![MenuItem::new("About", Command(20))]));
        bar
    }

    #[test]
    fn titles_hit_test() {
        let bar = bar();
        // " File " starts at x=1.
        assert_eq!(bar.hit_title(2), Some(0));
        assert_eq!(bar.hit_title(8), Some(1));
        assert_eq!(bar.hit_title(50), None);
    }

    #[test]
    fn activation_selects_first_enabled() {
        let mut bar = bar();
        bar.activate(0);
        assert!(bar.is_active());
        assert_eq!(bar.selected, 0);
    }

    #[test]
    fn arrows_skip_separators_and_disabled() {
        let mut bar = bar();
        bar.activate(0);
        bar.on_key(KeyEvent::new(KeyCode::Down));
        // Skips the separator and the disabled Print.
        assert_eq!(bar.selected, 3);
        bar.on_key(KeyEvent::new(KeyCode::Up));
        assert_eq!(bar.selected, 0);
    }

    #[test]
    fn enter_emits_and_closes() {
        let mut bar = bar();
        bar.activate(0);
        bar.on_key(KeyEvent::new(KeyCode::Down));
        let reaction = bar.on_key(KeyEvent::new(KeyCode::Enter));
        assert_eq!(reaction, Reaction::Emit(Command(12)));
        assert!(!bar.is_active());
    }

    #[test]
    fn escape_closes() {
        let mut bar = bar();
        bar.activate(1);
        assert_eq!(bar.on_key(KeyEvent::new(KeyCode::Escape)), Reaction::Handled);
        assert!(!bar.is_active());
    }

    #[test]
    fn left_right_switch_menus() {
        let mut bar = bar();
        bar.activate(0);
        bar.on_key(KeyEvent::new(KeyCode::Right));
        assert_eq!(bar.active, Some(1));
        bar.on_key(KeyEvent::new(KeyCode::Right));
        assert_eq!(bar.active, Some(0));
        bar.on_key(KeyEvent::new(KeyCode::Left));
        assert_eq!(bar.active, Some(1));
    }

    #[test]
    fn initial_letter_jumps() {
        let mut bar = bar();
        assert!(bar.activate_by_initial('h'));
        assert_eq!(bar.active, Some(1));
        assert!(!bar.activate_by_initial('z'));

        bar.activate(0);
        let reaction = bar.on_key(KeyEvent::new(KeyCode::Char('e')));
        assert_eq!(reaction, Reaction::Emit(Command(12)));
    }

    #[test]
    fn click_resolves_items() {
        let mut bar = bar();
        bar.activate(0);
        let rect = bar.dropdown_rect().unwrap();
        // First item row.
        assert_eq!(bar.click_item(rect.x + 2, rect.y + 1), Some(Command(10)));
        assert!(!bar.is_active());

        bar.activate(0);
        // Separator and disabled rows do not resolve.
        assert_eq!(bar.click_item(rect.x + 2, rect.y + 2), None);
        assert_eq!(bar.click_item(rect.x + 2, rect.y + 3), None);
        assert!(bar.is_active());
    }

    #[test]
    fn disabled_enter_does_nothing() {
        let mut bar = bar();
        bar.activate(0);
        bar.selected = 2; // Print, disabled
        assert_eq!(bar.on_key(KeyEvent::new(KeyCode::Enter)), Reaction::Handled);
        assert!(bar.is_active());
    }
}
