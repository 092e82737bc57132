//! The launcher grid as one object: entries, layout, drag session,
//! transitions and icons, driven by whatever window hosts it.

use crate::combine::compose_combo_icon;
use crate::config::Settings;
use crate::drag::{DragConfig, DragController, DragOutcome, DragPhase, Highlight};
use crate::entry::AppEntry;
use crate::error::StoreError;
use crate::events::IconRequest;
use crate::icons::{IconCache, IconImage, IconLoader, IconLookup};
use crate::launch::{launch_entry, LaunchReport, Launcher};
use crate::layout::{GridLayout, Point, Rect};
use crate::store::{AddEntryResult, AppStore, JsonFile};
use crate::transition::{ItemId, TransitionManager};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Pixel size icons are fetched at.
pub const ICON_FETCH_SIZE: u32 = 64;

/// One tile as it should be painted this frame.
#[derive(Debug, Clone, Copy)]
pub struct TileView<'a> {
    /// Store index of the entry.
    pub id: ItemId,
    pub entry: &'a AppEntry,
    pub rect: Rect,
    pub highlight: Highlight,
    pub raised: bool,
}

/// What a pointer release amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    None,
    /// A plain click on the entry at this store index.
    Activated(usize),
    Reordered,
    /// A combo now sits at this store index.
    Combined(usize),
}

pub struct LauncherEngine {
    store: AppStore,
    settings: Settings,
    container_width: f32,
    filter: String,
    /// Store indices on screen, in display order.
    visible: Vec<usize>,
    drag: DragController,
    transitions: TransitionManager,
    icons: IconCache,
    loader: Option<IconLoader>,
}

impl LauncherEngine {
    pub fn new(store: AppStore, settings: Settings, container_width: f32) -> Self {
        let visible: Vec<usize> = (0..store.len()).collect();
        let layout = GridLayout::compute(visible.len(), container_width, settings.metrics());
        let drag = DragController::new(DragConfig::from(&settings), layout, visible.clone());
        Self {
            store,
            settings,
            container_width,
            filter: String::new(),
            visible,
            drag,
            transitions: TransitionManager::new(),
            icons: IconCache::new(),
            loader: None,
        }
    }

    /// Opens `apps.json` in the per-user config directory.
    pub fn open_default(settings: Settings, container_width: f32) -> Result<Self, StoreError> {
        let file = JsonFile::in_config_dir().ok_or(StoreError::NoConfigDir)?;
        info!("entry list at {}", file.path().display());
        let store = AppStore::open(Box::new(file));
        Ok(Self::new(store, settings, container_width))
    }

    pub fn with_icon_loader(mut self, loader: IconLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &GridLayout {
        self.drag.layout()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// The filter hides every entry; the host shows a "no match" note.
    pub fn is_no_match(&self) -> bool {
        self.visible.is_empty() && !self.filter.trim().is_empty()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    pub fn take_persist_error(&mut self) -> Option<StoreError> {
        self.store.take_persist_error()
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.drag.set_config(DragConfig::from(&settings));
        self.settings = settings;
        self.relayout();
    }

    pub fn set_container_width(&mut self, width: f32) {
        if !width.is_finite() || (width - self.container_width).abs() < 0.5 {
            return;
        }
        self.container_width = width;
        self.relayout();
    }

    pub fn set_filter(&mut self, text: &str) {
        if self.filter == text {
            return;
        }
        self.filter = text.to_string();
        self.relayout();
    }

    /// Fresh layout pass over the filtered entries. Drops any drag session
    /// and in-flight transitions.
    pub fn relayout(&mut self) {
        self.transitions.clear();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.visible = self.store.filter(&self.filter);
        let layout = GridLayout::compute(
            self.visible.len(),
            self.container_width,
            self.settings.metrics(),
        );
        self.drag.set_layout(layout, self.visible.clone());
    }

    /// Tiles in paint order; the raised tile comes last.
    pub fn tiles(&self, now: Instant) -> Vec<TileView<'_>> {
        let metrics = self.layout().metrics;
        let raised = self.drag.raised();
        let mut views: Vec<TileView<'_>> = self
            .drag
            .tiles()
            .iter()
            .filter_map(|tile| {
                let entry = self.store.get(tile.id)?;
                let pos = self.transitions.sample(tile.id, now).unwrap_or(tile.pos);
                Some(TileView {
                    id: tile.id,
                    entry,
                    rect: metrics.cell_rect(pos),
                    highlight: self.drag.highlight(tile.id),
                    raised: raised == Some(tile.id),
                })
            })
            .collect();
        views.sort_by_key(|v| v.raised);
        views
    }

    pub fn add_slot_rect(&self) -> Rect {
        self.layout().add_slot_rect()
    }

    pub fn content_height(&self) -> f32 {
        self.layout().content_height()
    }

    pub fn hit_test(&self, pos: Point) -> Option<usize> {
        self.drag.hit_test(pos)
    }

    pub fn pointer_down(&mut self, pos: Point) -> bool {
        self.drag.pointer_down(pos)
    }

    pub fn pointer_move(&mut self, pos: Point, now: Instant) -> bool {
        self.drag.pointer_move(pos, now, &mut self.transitions)
    }

    pub fn pointer_up(&mut self, now: Instant) -> EngineEvent {
        let outcome = self.drag.pointer_up(now, &mut self.transitions);
        self.apply_outcome(outcome)
    }

    pub fn capture_lost(&mut self, now: Instant) -> EngineEvent {
        let outcome = self.drag.capture_lost(now, &mut self.transitions);
        self.apply_outcome(outcome)
    }

    fn apply_outcome(&mut self, outcome: DragOutcome) -> EngineEvent {
        match outcome {
            DragOutcome::None => EngineEvent::None,
            DragOutcome::Click(id) => EngineEvent::Activated(id),
            DragOutcome::Reorder { order } => {
                if self.write_back(&order) {
                    EngineEvent::Reordered
                } else {
                    EngineEvent::None
                }
            }
            DragOutcome::Combine {
                dragged,
                partner,
                order,
            } => {
                let moved = self.slot_map(&order);
                self.write_back(&order);
                let dragged = moved.get(&dragged).copied().unwrap_or(dragged);
                let partner = moved.get(&partner).copied().unwrap_or(partner);
                let combined = self.store.combine_at(dragged, partner);
                self.relayout();
                match combined {
                    Some(index) => {
                        info!("combined into {}", self.store.entries()[index].name);
                        EngineEvent::Combined(index)
                    }
                    None => EngineEvent::None,
                }
            }
        }
    }

    /// Where each id in `order` lands once the order is written back.
    fn slot_map(&self, order: &[ItemId]) -> HashMap<ItemId, usize> {
        order
            .iter()
            .copied()
            .zip(self.visible.iter().copied())
            .collect()
    }

    /// Writes a display order back into the store and follows the ids of
    /// in-flight transitions. Entries hidden by the filter keep their place.
    fn write_back(&mut self, order: &[ItemId]) -> bool {
        if order == self.visible.as_slice() {
            return false;
        }
        let moved = self.slot_map(order);
        if !self.store.apply_order(&self.visible, order) {
            warn!("display order out of step with the store, rebuilding");
            self.relayout();
            return false;
        }
        debug!("reordered {} visible entries", order.len());
        self.transitions.rekey(|id| moved.get(&id).copied());
        self.rebuild();
        true
    }

    /// Advances the drag debounce and transitions. Returns `true` when the
    /// host should repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        let locked = self.drag.poll(now);
        let finished = !self.transitions.tick(now).is_empty();
        locked || finished || self.transitions.is_animating()
    }

    /// Next time `tick` has work to do, if any. Running transitions want
    /// every frame.
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        if self.transitions.is_animating() {
            return Some(now);
        }
        self.drag.next_deadline()
    }

    pub fn launch<L: Launcher + ?Sized>(&self, index: usize, launcher: &L) -> Vec<LaunchReport> {
        match self.store.get(index) {
            Some(entry) => launch_entry(launcher, entry),
            None => Vec::new(),
        }
    }

    pub fn add_path(&mut self, path: &Path, name: Option<String>) -> AddEntryResult {
        let result = self.store.add_path(path, name);
        self.after_add(result)
    }

    pub fn add_url(&mut self, url: &str, name: Option<String>) -> AddEntryResult {
        let result = self.store.add_url(url, name);
        self.after_add(result)
    }

    fn after_add(&mut self, result: AddEntryResult) -> AddEntryResult {
        match result {
            AddEntryResult::Added(index) => {
                info!("added {}", self.store.entries()[index].name);
                self.relayout();
            }
            AddEntryResult::Duplicate(index) => debug!("duplicate of entry {index}"),
            AddEntryResult::Missing | AddEntryResult::Unsupported => {}
        }
        result
    }

    pub fn remove_at(&mut self, index: usize) -> Option<AppEntry> {
        let removed = self.store.remove_at(index)?;
        info!("removed {}", removed.name);
        self.relayout();
        Some(removed)
    }

    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let renamed = self.store.rename(index, name);
        if renamed {
            self.relayout();
        }
        renamed
    }

    pub fn dissolve_at(&mut self, index: usize) -> Option<usize> {
        let restored = self.store.dissolve_at(index)?;
        self.relayout();
        Some(restored)
    }

    /// Queues fetches for every icon a visible tile needs. Without a loader
    /// tiles keep their placeholders.
    pub fn request_visible_icons(&mut self) -> usize {
        let Some(loader) = &self.loader else {
            return 0;
        };
        let mut queued = 0;
        for &index in &self.visible {
            let Some(entry) = self.store.get(index) else {
                continue;
            };
            let members: Vec<&AppEntry> = if entry.is_combo() {
                entry.children().iter().take(4).collect()
            } else {
                vec![entry]
            };
            for member in members {
                let Some(key) = member.icon_key() else {
                    continue;
                };
                if self.icons.begin_fetch(key) {
                    let sent = loader.request(IconRequest {
                        key: key.to_string(),
                        name_hint: Some(member.name.clone()),
                        size: ICON_FETCH_SIZE,
                    });
                    if sent {
                        queued += 1;
                    } else {
                        self.icons.invalidate(key);
                    }
                }
            }
        }
        queued
    }

    /// Pulls finished icons off the worker. Returns the keys that changed.
    pub fn drain_icons(&mut self) -> Vec<String> {
        let Some(loader) = &self.loader else {
            return Vec::new();
        };
        loader
            .drain()
            .into_iter()
            .filter_map(|result| {
                let key = result.key.clone();
                self.icons.accept(result).then_some(key)
            })
            .collect()
    }

    pub fn icon_cache(&self) -> &IconCache {
        &self.icons
    }

    pub fn icon_for(&self, entry: &AppEntry) -> IconLookup<'_> {
        match entry.icon_key() {
            Some(key) => self.icons.lookup(key),
            None => IconLookup::Placeholder,
        }
    }

    /// 2x2 mosaic of a combo's first members. `None` for leaves, or while
    /// none of the member icons are available.
    pub fn combo_icon(&self, entry: &AppEntry, side: usize) -> Option<IconImage> {
        if !entry.is_combo() {
            return None;
        }
        let members: Vec<Option<&IconImage>> = entry
            .children()
            .iter()
            .take(4)
            .map(|child| child.icon_key().and_then(|key| self.icons.get(key)))
            .collect();
        if members.iter().all(Option::is_none) {
            return None;
        }
        Some(compose_combo_icon(&members, side))
    }
}
