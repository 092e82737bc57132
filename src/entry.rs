use serde::{Deserialize, Serialize};

/// One tile in the launcher: either a single launch target or a combo group.
///
/// On disk an entry is `{name, path?, icon?, combo?}`; a non-empty `combo`
/// array makes it a group, anything else is a leaf. A leaf without a path is
/// kept but cannot be launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEntry", into = "StoredEntry")]
pub struct AppEntry {
    pub name: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Leaf {
        path: Option<String>,
        icon: Option<String>,
    },
    Combo {
        children: Vec<AppEntry>,
        icon: Option<String>,
    },
}

impl AppEntry {
    pub fn leaf(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Leaf {
                path: Some(path.into()),
                icon: None,
            },
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        match &mut self.kind {
            EntryKind::Leaf { icon: slot, .. } | EntryKind::Combo { icon: slot, .. } => {
                *slot = Some(icon.into());
            }
        }
        self
    }

    /// Builds a combo from already-ordered children. Returns the single child
    /// unchanged when only one is given, and `None` for an empty list.
    pub fn combo(name: impl Into<String>, mut children: Vec<AppEntry>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self {
                name: name.into(),
                kind: EntryKind::Combo {
                    children,
                    icon: None,
                },
            }),
        }
    }

    pub fn is_combo(&self) -> bool {
        matches!(self.kind, EntryKind::Combo { .. })
    }

    pub fn path(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Leaf { path, .. } => path.as_deref(),
            EntryKind::Combo { .. } => None,
        }
    }

    pub fn children(&self) -> &[AppEntry] {
        match &self.kind {
            EntryKind::Combo { children, .. } => children,
            EntryKind::Leaf { .. } => &[],
        }
    }

    /// Key used for icon lookup: the explicit icon, else the path.
    /// Combos without an explicit icon use the first member's key.
    pub fn icon_key(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Leaf { path, icon } => icon.as_deref().or(path.as_deref()),
            EntryKind::Combo { children, icon } => icon
                .as_deref()
                .or_else(|| children.iter().find_map(AppEntry::icon_key)),
        }
    }

    pub fn is_launchable(&self) -> bool {
        match &self.kind {
            EntryKind::Leaf { path, .. } => path.as_deref().is_some_and(|p| !p.trim().is_empty()),
            EntryKind::Combo { children, .. } => children.iter().any(AppEntry::is_launchable),
        }
    }

    /// All leaves in launch order, descending into nested combos.
    pub fn leaves(&self) -> Vec<&AppEntry> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Character drawn on the tile until an icon arrives.
    pub fn placeholder_letter(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

fn collect_leaves<'a>(entry: &'a AppEntry, out: &mut Vec<&'a AppEntry>) {
    match &entry.kind {
        EntryKind::Leaf { .. } => out.push(entry),
        EntryKind::Combo { children, .. } => {
            for child in children {
                collect_leaves(child, out);
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    combo: Option<Vec<AppEntry>>,
}

impl From<StoredEntry> for AppEntry {
    fn from(raw: StoredEntry) -> Self {
        let path = raw.path.filter(|p| !p.trim().is_empty());
        let kind = match raw.combo {
            Some(children) if !children.is_empty() => EntryKind::Combo {
                children,
                icon: raw.icon,
            },
            _ => EntryKind::Leaf {
                path,
                icon: raw.icon,
            },
        };
        Self {
            name: raw.name,
            kind,
        }
    }
}

impl From<AppEntry> for StoredEntry {
    fn from(entry: AppEntry) -> Self {
        match entry.kind {
            EntryKind::Leaf { path, icon } => StoredEntry {
                name: entry.name,
                path,
                icon,
                combo: None,
            },
            EntryKind::Combo { children, icon } => StoredEntry {
                name: entry.name,
                path: None,
                icon,
                combo: Some(children),
            },
        }
    }
}
