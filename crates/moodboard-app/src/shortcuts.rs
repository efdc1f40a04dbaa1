//! Keyboard shortcut registry and documentation.

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Export in the configured raster format without asking.
    QuickExport,
    OpenProject,
    SaveProject,
    PasteImage,
    DeleteSelected,
    /// Apply the crop being edited.
    ApplyCrop,
    /// Leave crop editing without applying.
    CancelCrop,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.key.eq_ignore_ascii_case(key) && self.ctrl == ctrl && self.shift == shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("S", true, false, ShortcutAction::QuickExport, "Quick export"),
            Shortcut::new("S", true, true, ShortcutAction::SaveProject, "Save project..."),
            Shortcut::new("O", true, false, ShortcutAction::OpenProject, "Open project..."),
            Shortcut::new("V", true, false, ShortcutAction::PasteImage, "Paste image"),
            Shortcut::new("Delete", false, false, ShortcutAction::DeleteSelected, "Remove selected image"),
            Shortcut::new("Backspace", false, false, ShortcutAction::DeleteSelected, "Remove selected image"),
            Shortcut::new("Enter", false, false, ShortcutAction::ApplyCrop, "Apply crop"),
            Shortcut::new("Escape", false, false, ShortcutAction::CancelCrop, "Cancel crop"),
        ]
    }

    /// Find the action bound to a key press. Keys compare case-insensitively.
    ///
    /// On macOS pass the Command key as `ctrl`.
    pub fn resolve(key: &str, ctrl: bool, shift: bool) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, ctrl, shift))
            .map(|s| s.action)
    }

    /// Parse a combination such as "Ctrl+Shift+S" and resolve it.
    pub fn resolve_combo(combo: &str) -> Option<ShortcutAction> {
        let mut ctrl = false;
        let mut shift = false;
        let mut key = None;
        for part in combo.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" => ctrl = true,
                "shift" => shift = true,
                "" => return None,
                _ if key.is_none() => key = Some(part),
                _ => return None,
            }
        }
        Self::resolve(key?, ctrl, shift)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_s_is_quick_export() {
        assert_eq!(
            ShortcutRegistry::resolve("s", true, false),
            Some(ShortcutAction::QuickExport)
        );
        assert_eq!(
            ShortcutRegistry::resolve("S", true, true),
            Some(ShortcutAction::SaveProject)
        );
        assert_eq!(ShortcutRegistry::resolve("S", false, false), None);
    }

    #[test]
    fn test_resolve_combo() {
        assert_eq!(
            ShortcutRegistry::resolve_combo("Ctrl+S"),
            Some(ShortcutAction::QuickExport)
        );
        assert_eq!(
            ShortcutRegistry::resolve_combo("cmd+v"),
            Some(ShortcutAction::PasteImage)
        );
        assert_eq!(
            ShortcutRegistry::resolve_combo("Escape"),
            Some(ShortcutAction::CancelCrop)
        );
        assert_eq!(ShortcutRegistry::resolve_combo("Ctrl+S+X"), None);
        assert_eq!(ShortcutRegistry::resolve_combo("Ctrl+"), None);
    }

    #[test]
    fn test_format() {
        let formatted: Vec<_> = ShortcutRegistry::all().iter().map(Shortcut::format).collect();
        assert!(formatted.contains(&"Ctrl+S".to_string()));
        assert!(formatted.contains(&"Ctrl+Shift+S".to_string()));
    }
}
