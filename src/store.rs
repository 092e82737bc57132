use crate::combine::{combine, dissolve};
use crate::config::{read_json, write_json, Settings, APPS_FILE};
use crate::entry::AppEntry;
use crate::error::StoreError;
use crate::icons::is_url;
use log::{info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where the ordered entry list lives between runs.
pub trait Persistence {
    /// A missing backing file is an empty list, not an error.
    fn load(&self) -> Result<Vec<AppEntry>, StoreError>;
    fn persist(&mut self, entries: &[AppEntry]) -> Result<(), StoreError>;
}

/// `apps.json`: a pretty-printed array of entries.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_config_dir() -> Option<Self> {
        Settings::config_dir().map(|dir| Self::new(dir.join(APPS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFile {
    fn load(&self) -> Result<Vec<AppEntry>, StoreError> {
        if !self.path.exists() {
            info!(
                "no entry list at {}, starting empty",
                self.path.to_string_lossy()
            );
            return Ok(Vec::new());
        }
        read_json(&self.path)
    }

    fn persist(&mut self, entries: &[AppEntry]) -> Result<(), StoreError> {
        write_json(&self.path, entries)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    saved: Vec<AppEntry>,
    writes: usize,
    fail_writes: bool,
}

/// In-memory persistence. Clones share the same state, so a caller can keep
/// a handle to inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<AppEntry>) -> Self {
        let mem = Self::default();
        mem.state.borrow_mut().saved = entries;
        mem
    }

    pub fn saved(&self) -> Vec<AppEntry> {
        self.state.borrow().saved.clone()
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<AppEntry>, StoreError> {
        Ok(self.state.borrow().saved.clone())
    }

    fn persist(&mut self, entries: &[AppEntry]) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(StoreError::Rejected("writes disabled".to_string()));
        }
        state.saved = entries.to_vec();
        state.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddEntryResult {
    Added(usize),
    /// Already present at this top-level index.
    Duplicate(usize),
    Missing,
    Unsupported,
}

/// Ordered list of launcher entries. Every mutation writes the whole list
/// through the persistence hook right away; a failed write is logged and
/// kept for the UI to report, and the in-memory list stays authoritative.
pub struct AppStore {
    entries: Vec<AppEntry>,
    persistence: Box<dyn Persistence>,
    last_error: Option<StoreError>,
}

impl AppStore {
    /// Loads the saved list. A malformed list is logged and replaced with an
    /// empty one.
    pub fn open(persistence: Box<dyn Persistence>) -> Self {
        let entries = match persistence.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to load entry list, starting empty: {err}");
                Vec::new()
            }
        };
        Self {
            entries,
            persistence,
            last_error: None,
        }
    }

    pub fn entries(&self) -> &[AppEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&AppEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn take_persist_error(&mut self) -> Option<StoreError> {
        self.last_error.take()
    }

    /// Adds `entry` at the end unless one of its launch targets is already
    /// present. Leaves without a path are not accepted.
    pub fn append(&mut self, entry: AppEntry) -> AddEntryResult {
        let leaves = entry.leaves();
        if leaves.is_empty() || leaves.iter().any(|leaf| leaf.path().is_none()) {
            return AddEntryResult::Unsupported;
        }
        for leaf in leaves {
            if let Some(existing) = leaf.path().and_then(|p| self.find_by_path(p)) {
                return AddEntryResult::Duplicate(existing);
            }
        }
        self.entries.push(entry);
        self.persist();
        AddEntryResult::Added(self.entries.len() - 1)
    }

    /// Adds an executable or folder. The name defaults to the file stem, or
    /// the folder's own name.
    pub fn add_path(&mut self, path: &Path, name: Option<String>) -> AddEntryResult {
        if !path.exists() {
            return AddEntryResult::Missing;
        }
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let default_name = if path.is_dir() {
            path.file_name()
        } else {
            path.file_stem()
        }
        .map(|s| s.to_string_lossy().to_string());
        let name = normalize_text_opt(name)
            .or_else(|| default_name.and_then(|n| normalize_text_opt(Some(n))))
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let path = path.to_string_lossy().to_string();
        self.append(AppEntry::leaf(name, path.clone()).with_icon(path))
    }

    /// Adds a web page. A missing scheme becomes `http://`, a trailing `/` is
    /// dropped, and the name defaults to the host.
    pub fn add_url(&mut self, url: &str, name: Option<String>) -> AddEntryResult {
        let Some(url) = normalize_url(url) else {
            return AddEntryResult::Unsupported;
        };
        let name = normalize_text_opt(name).unwrap_or_else(|| url_host(&url).to_string());
        self.append(AppEntry::leaf(name, url.clone()).with_icon(url))
    }

    /// Removes the first entry matching `pred`.
    pub fn remove<F>(&mut self, pred: F) -> Option<AppEntry>
    where
        F: FnMut(&AppEntry) -> bool,
    {
        let index = self.entries.iter().position(pred)?;
        self.remove_at(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<AppEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.persist();
        Some(removed)
    }

    /// Moves the entry at `from` so that it ends up at index `to`; entries in
    /// between shift by one. `to` past the end means last.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() {
            return false;
        }
        let to = to.min(self.entries.len() - 1);
        if from == to {
            return true;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.persist();
        true
    }

    pub fn replace_all(&mut self, entries: Vec<AppEntry>) {
        self.entries = entries;
        self.persist();
    }

    /// Top-level index of the entry that launches `path`, combos included.
    pub fn find_by_path(&self, path: &str) -> Option<usize> {
        let key = entry_key(path);
        self.entries.iter().position(|entry| {
            entry
                .leaves()
                .iter()
                .filter_map(|leaf| leaf.path())
                .any(|p| entry_key(p) == key)
        })
    }

    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let Some(name) = normalize_text_opt(Some(name.to_string())) else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.name = name;
        self.persist();
        true
    }

    /// Indices of entries whose name contains `text`, ignoring case. An empty
    /// filter matches everything.
    pub fn filter(&self, text: &str) -> Vec<usize> {
        let needle = text.trim().to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| needle.is_empty() || e.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    /// Rewrites the entries sitting at `slots` so that `slots[k]` receives
    /// the entry previously at `order[k]`. `order` must be a permutation of
    /// `slots`; entries outside `slots` do not move.
    pub fn apply_order(&mut self, slots: &[usize], order: &[usize]) -> bool {
        if slots.len() != order.len() || slots.iter().any(|&i| i >= self.entries.len()) {
            return false;
        }
        let mut sorted_slots = slots.to_vec();
        let mut sorted_order = order.to_vec();
        sorted_slots.sort_unstable();
        sorted_order.sort_unstable();
        sorted_slots.dedup();
        if sorted_slots.len() != slots.len() || sorted_slots != sorted_order {
            return false;
        }
        if slots == order {
            return true;
        }

        let mut source: Vec<Option<AppEntry>> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(Some)
            .collect();
        let moved: Vec<AppEntry> = order.iter().filter_map(|&i| source[i].take()).collect();
        for (&slot, entry) in slots.iter().zip(moved) {
            source[slot] = Some(entry);
        }
        self.entries = source.into_iter().flatten().collect();
        self.persist();
        true
    }

    /// Merges `dragged` into `partner`. The combo takes `partner`'s place and
    /// lists `partner`'s members first. Returns the combo's index.
    pub fn combine_at(&mut self, dragged: usize, partner: usize) -> Option<usize> {
        let len = self.entries.len();
        if dragged == partner || dragged >= len || partner >= len {
            return None;
        }
        let dragged_entry = self.entries.remove(dragged);
        let at = if dragged < partner { partner - 1 } else { partner };
        let partner_entry = self.entries.remove(at);
        self.entries.insert(at, combine(partner_entry, dragged_entry));
        self.persist();
        Some(at)
    }

    /// Replaces the combo at `index` with its children, in order. Returns how
    /// many entries were restored; leaves are left alone.
    pub fn dissolve_at(&mut self, index: usize) -> Option<usize> {
        if !self.entries.get(index)?.is_combo() {
            return None;
        }
        let combo = self.entries.remove(index);
        let children = dissolve(combo);
        let restored = children.len();
        for (offset, child) in children.into_iter().enumerate() {
            self.entries.insert(index + offset, child);
        }
        self.persist();
        Some(restored)
    }

    fn persist(&mut self) {
        match self.persistence.persist(&self.entries) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                warn!("Failed to persist entry list: {err}");
                self.last_error = Some(err);
            }
        }
    }
}

/// Comparison key for de-duplication: normalized URL, or absolute path
/// (case-folded on Windows).
pub fn entry_key(path: &str) -> String {
    let trimmed = path.trim();
    if is_url(trimmed) {
        return trimmed.trim_end_matches('/').to_string();
    }
    let absolute = std::path::absolute(trimmed)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| trimmed.to_string());
    if cfg!(windows) {
        absolute.to_ascii_lowercase()
    } else {
        absolute
    }
}

fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = with_scheme.trim_end_matches('/').to_string();
    if !is_url(&url) || url_host(&url).is_empty() {
        return None;
    }
    Some(url)
}

fn url_host(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

fn normalize_text_opt(text: Option<String>) -> Option<String> {
    let text = text?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::temp_dir;

    fn leaf(name: &str) -> AppEntry {
        AppEntry::leaf(name, format!("/apps/{}", name.to_lowercase()))
    }

    fn store_with(names: &[&str]) -> (AppStore, MemoryPersistence) {
        let mem = MemoryPersistence::with_entries(names.iter().map(|n| leaf(n)).collect());
        (AppStore::open(Box::new(mem.clone())), mem)
    }

    fn names(store: &AppStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn move_to_later_index_shifts_others_left() {
        let (mut store, mem) = store_with(&["A", "B", "C", "D"]);
        assert!(store.move_entry(0, 2));
        assert_eq!(names(&store), vec!["B", "C", "A", "D"]);
        assert_eq!(mem.writes(), 1);

        assert!(store.move_entry(3, 0));
        assert_eq!(names(&store), vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn move_onto_itself_changes_nothing() {
        let (mut store, mem) = store_with(&["A", "B", "C"]);
        assert!(store.move_entry(1, 1));
        assert_eq!(names(&store), vec!["A", "B", "C"]);
        assert_eq!(mem.writes(), 0);
        assert!(!store.move_entry(9, 0));
    }

    #[test]
    fn duplicate_path_is_rejected_and_store_unchanged() {
        let (mut store, mem) = store_with(&["Calc"]);
        let before = store.entries().to_vec();
        let result = store.append(AppEntry::leaf("Calculator", "/apps/calc"));
        assert_eq!(result, AddEntryResult::Duplicate(0));
        assert_eq!(store.entries(), &before[..]);
        assert_eq!(mem.writes(), 0);
    }

    #[test]
    fn duplicates_inside_combos_are_found() {
        let (mut store, _mem) = store_with(&["A", "B", "C"]);
        store.combine_at(2, 1);
        assert_eq!(store.find_by_path("/apps/c"), Some(1));
        assert_eq!(
            store.append(AppEntry::leaf("C again", "/apps/c")),
            AddEntryResult::Duplicate(1)
        );
    }

    #[test]
    fn urls_dedupe_ignoring_trailing_slash() {
        let (mut store, _mem) = store_with(&[]);
        assert_eq!(
            store.add_url("example.com/", None),
            AddEntryResult::Added(0)
        );
        assert_eq!(store.entries()[0].name, "example.com");
        assert_eq!(store.entries()[0].path(), Some("http://example.com"));
        assert_eq!(
            store.add_url("http://example.com", Some("Again".into())),
            AddEntryResult::Duplicate(0)
        );
        assert_eq!(store.add_url("   ", None), AddEntryResult::Unsupported);
    }

    #[test]
    fn add_path_names_folders_and_files() {
        let dir = temp_dir("store_add_path");
        let exe = dir.join("tool.exe");
        std::fs::write(&exe, b"MZ").unwrap();
        let (mut store, _mem) = store_with(&[]);

        assert_eq!(store.add_path(&exe, None), AddEntryResult::Added(0));
        assert_eq!(store.entries()[0].name, "tool");
        assert_eq!(store.add_path(&dir, Some("  ".into())), AddEntryResult::Added(1));
        assert_eq!(
            Some(store.entries()[1].name.as_str()),
            dir.file_name().and_then(|n| n.to_str())
        );
        assert_eq!(store.add_path(&exe, None), AddEntryResult::Duplicate(0));
        assert_eq!(
            store.add_path(&dir.join("nope.exe"), None),
            AddEntryResult::Missing
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn combine_then_dissolve_restores_flat_order() {
        let (mut store, _mem) = store_with(&["A", "B", "C", "D"]);
        // drag D onto B
        assert_eq!(store.combine_at(3, 1), Some(1));
        assert_eq!(names(&store), vec!["A", "B + D", "C"]);
        assert_eq!(store.dissolve_at(1), Some(2));
        assert_eq!(names(&store), vec!["A", "B", "D", "C"]);
        assert_eq!(store.dissolve_at(0), None);
    }

    #[test]
    fn apply_order_permutes_only_visible_slots() {
        let (mut store, _mem) = store_with(&["A", "B", "C", "D", "E"]);
        // filtered view shows B, D, E; user moved E to the front
        assert!(store.apply_order(&[1, 3, 4], &[4, 1, 3]));
        assert_eq!(names(&store), vec!["A", "E", "C", "B", "D"]);
        assert!(!store.apply_order(&[0, 1], &[0, 2]));
        assert!(!store.apply_order(&[0, 0], &[0, 0]));
    }

    #[test]
    fn filter_matches_names_case_insensitively() {
        let (store, _mem) = store_with(&["Notepad", "Calc", "Paint"]);
        assert_eq!(store.filter("NOTE"), vec![0]);
        assert_eq!(store.filter("pa"), vec![0, 2]);
        assert_eq!(store.filter(""), vec![0, 1, 2]);
    }

    #[test]
    fn remove_and_rename() {
        let (mut store, _mem) = store_with(&["A", "B"]);
        assert!(store.rename(1, "  Bee "));
        assert!(!store.rename(0, "   "));
        let removed = store.remove(|e| e.name == "A").unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(names(&store), vec!["Bee"]);
        assert!(store.remove(|e| e.name == "zzz").is_none());
    }

    #[test]
    fn failed_persist_keeps_memory_state() {
        let (mut store, mem) = store_with(&["A", "B"]);
        mem.set_fail_writes(true);
        assert!(store.move_entry(0, 1));
        assert_eq!(names(&store), vec!["B", "A"]);
        assert!(matches!(
            store.take_persist_error(),
            Some(StoreError::Rejected(_))
        ));
        assert_eq!(mem.saved()[0].name, "A");
    }

    #[test]
    fn malformed_json_file_loads_as_empty() {
        let dir = temp_dir("store_bad_json");
        let path = dir.join(APPS_FILE);
        std::fs::write(&path, r#"{"name": "not a list"}"#).unwrap();
        let store = AppStore::open(Box::new(JsonFile::new(&path)));
        assert!(store.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_file_roundtrip_through_store() {
        let dir = temp_dir("store_json");
        let path = dir.join(APPS_FILE);
        let mut store = AppStore::open(Box::new(JsonFile::new(&path)));
        store.append(AppEntry::leaf("Calc", "calc.exe"));
        store.append(AppEntry::leaf("Docs", "https://docs.rs"));

        let reopened = AppStore::open(Box::new(JsonFile::new(&path)));
        assert_eq!(reopened.entries(), store.entries());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
