//! Pointer-driven reordering and magnetic combining of grid tiles.
//!
//! [`DragController`] is fed raw pointer events plus the current time and
//! answers with a [`DragOutcome`] on release. It never touches the store:
//! positions live here as tile models, animation goes out through an
//! [`Animator`], and the host applies the outcome.

use crate::config::Settings;
use crate::easing::Easing;
use crate::layout::{GridLayout, Point, Rect};
use crate::transition::{Animator, ItemId, TransitionRequest};
use log::debug;
use std::time::{Duration, Instant};

const REORDER_ANIM: Duration = Duration::from_millis(180);
const SETTLE_ANIM: Duration = Duration::from_millis(220);
/// Room a dragged tile may leave the container by before it is clamped.
const DRAG_OVERFLOW: f32 = 8.0;
/// Gap left between a locked pair.
const SNAP_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub drag_threshold: f32,
    pub magnet_threshold: f32,
    pub magnet_delay: Duration,
    pub overflow: f32,
    pub snap_gap: f32,
    pub reorder_duration: Duration,
    pub settle_duration: Duration,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for DragConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            drag_threshold: settings.drag_threshold.max(0.0),
            magnet_threshold: settings.magnet_threshold.max(0.0),
            magnet_delay: settings.magnet_delay(),
            overflow: DRAG_OVERFLOW,
            snap_gap: SNAP_GAP,
            reorder_duration: REORDER_ANIM,
            settle_duration: SETTLE_ANIM,
        }
    }
}

/// A tile as the controller sees it: identity plus its resting position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub id: ItemId,
    pub pos: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Preview,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Pressed,
    Dragging,
    MagnetPending,
    MagnetLocked,
}

/// What the host should do once the pointer is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    None,
    Click(ItemId),
    /// `order` is the display order after the drag, as item ids.
    Reorder { order: Vec<ItemId> },
    Combine {
        dragged: ItemId,
        partner: ItemId,
        order: Vec<ItemId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Magnet {
    None,
    Pending {
        partner: ItemId,
        snap: Point,
        deadline: Instant,
    },
    Locked {
        partner: ItemId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    dragged: ItemId,
    pointer_offset: Point,
    last_pointer: Point,
    magnet: Magnet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Pressed { item: ItemId, press: Point },
    Dragging(DragSession),
}

pub struct DragController {
    config: DragConfig,
    layout: GridLayout,
    tiles: Vec<Tile>,
    state: State,
}

impl DragController {
    pub fn new(config: DragConfig, layout: GridLayout, ids: Vec<ItemId>) -> Self {
        let mut controller = Self {
            config,
            layout,
            tiles: Vec::new(),
            state: State::Idle,
        };
        controller.place(ids);
        controller
    }

    /// Takes a fresh layout pass. Any session in progress is dropped.
    pub fn set_layout(&mut self, layout: GridLayout, ids: Vec<ItemId>) {
        self.layout = layout;
        self.state = State::Idle;
        self.place(ids);
    }

    pub fn set_config(&mut self, config: DragConfig) {
        self.config = config;
    }

    fn place(&mut self, ids: Vec<ItemId>) {
        self.tiles = ids
            .into_iter()
            .enumerate()
            .map(|(slot, id)| Tile {
                id,
                pos: self.layout.slot_position(slot),
            })
            .collect();
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn display_order(&self) -> Vec<ItemId> {
        self.tiles.iter().map(|t| t.id).collect()
    }

    pub fn position_of(&self, id: ItemId) -> Option<Point> {
        self.tile(id).map(|t| t.pos)
    }

    pub fn phase(&self) -> DragPhase {
        match self.state {
            State::Idle => DragPhase::Idle,
            State::Pressed { .. } => DragPhase::Pressed,
            State::Dragging(session) => match session.magnet {
                Magnet::None => DragPhase::Dragging,
                Magnet::Pending { .. } => DragPhase::MagnetPending,
                Magnet::Locked { .. } => DragPhase::MagnetLocked,
            },
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging(_))
    }

    /// The tile to paint above all others.
    pub fn raised(&self) -> Option<ItemId> {
        match self.state {
            State::Dragging(session) => Some(session.dragged),
            _ => None,
        }
    }

    pub fn magnet_candidate(&self) -> Option<ItemId> {
        match self.state {
            State::Dragging(DragSession {
                magnet: Magnet::Pending { partner, .. } | Magnet::Locked { partner },
                ..
            }) => Some(partner),
            _ => None,
        }
    }

    pub fn highlight(&self, id: ItemId) -> Highlight {
        let State::Dragging(session) = self.state else {
            return Highlight::None;
        };
        let (partner, kind) = match session.magnet {
            Magnet::None => return Highlight::None,
            Magnet::Pending { partner, .. } => (partner, Highlight::Preview),
            Magnet::Locked { partner } => (partner, Highlight::Locked),
        };
        if id == session.dragged || id == partner {
            kind
        } else {
            Highlight::None
        }
    }

    /// When the pending magnet should be checked again.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Dragging(DragSession {
                magnet: Magnet::Pending { deadline, .. },
                ..
            }) => Some(deadline),
            _ => None,
        }
    }

    /// Topmost tile under `pos`. The add slot is not a tile and never hits.
    pub fn hit_test(&self, pos: Point) -> Option<ItemId> {
        if let Some(raised) = self.raised() {
            if self.rect_of(raised).is_some_and(|r| r.contains(pos)) {
                return Some(raised);
            }
        }
        self.tiles
            .iter()
            .rev()
            .find(|t| self.layout.metrics.cell_rect(t.pos).contains(pos))
            .map(|t| t.id)
    }

    pub fn pointer_down(&mut self, pos: Point) -> bool {
        if !matches!(self.state, State::Idle) {
            return false;
        }
        match self.hit_test(pos) {
            Some(item) => {
                self.state = State::Pressed { item, press: pos };
                true
            }
            None => false,
        }
    }

    /// Returns `true` when anything visible changed.
    pub fn pointer_move(&mut self, pos: Point, now: Instant, animator: &mut dyn Animator) -> bool {
        match self.state {
            State::Idle => false,
            State::Pressed { item, press } => {
                if press.distance(pos) <= self.config.drag_threshold {
                    return false;
                }
                let Some(origin) = self.position_of(item) else {
                    self.state = State::Idle;
                    return false;
                };
                debug!("drag started on item {item}");
                animator.cancel(item);
                self.state = State::Dragging(DragSession {
                    dragged: item,
                    pointer_offset: Point::new(press.x - origin.x, press.y - origin.y),
                    last_pointer: press,
                    magnet: Magnet::None,
                });
                self.drag_to(pos, now, animator);
                true
            }
            State::Dragging(_) => {
                self.drag_to(pos, now, animator);
                true
            }
        }
    }

    fn drag_to(&mut self, pos: Point, now: Instant, animator: &mut dyn Animator) {
        let State::Dragging(mut session) = self.state else {
            return;
        };
        let Some(current) = self.position_of(session.dragged) else {
            return;
        };

        if let Magnet::Locked { partner } = session.magnet {
            let desired = current.offset(pos.x - session.last_pointer.x, pos.y - session.last_pointer.y);
            let next = self.clamp(desired);
            let (dx, dy) = (next.x - current.x, next.y - current.y);
            self.set_position(session.dragged, next);
            if let Some(p) = self.position_of(partner) {
                animator.cancel(partner);
                self.set_position(partner, p.offset(dx, dy));
            }
            session.last_pointer = pos;
            self.state = State::Dragging(session);
            return;
        }

        let next = self.clamp(Point::new(
            pos.x - session.pointer_offset.x,
            pos.y - session.pointer_offset.y,
        ));
        self.set_position(session.dragged, next);
        session.last_pointer = pos;

        session.magnet = match (self.find_candidate(session.dragged), session.magnet) {
            (Some((partner, snap)), Magnet::Pending { partner: p, snap: s, deadline })
                if p == partner && s == snap =>
            {
                Magnet::Pending {
                    partner,
                    snap,
                    deadline,
                }
            }
            (Some((partner, snap)), _) => {
                debug!("magnet candidate {partner} for {}", session.dragged);
                Magnet::Pending {
                    partner,
                    snap,
                    deadline: now + self.config.magnet_delay,
                }
            }
            (None, _) => Magnet::None,
        };
        self.state = State::Dragging(session);

        if session.magnet == Magnet::None {
            self.reorder(session.dragged, now, animator);
        }
    }

    /// Locks a pending magnet once its dwell time has passed. The candidate
    /// is recomputed first so a timer that outlived its geometry never locks.
    pub fn poll(&mut self, now: Instant) -> bool {
        let State::Dragging(mut session) = self.state else {
            return false;
        };
        let Magnet::Pending {
            partner,
            snap,
            deadline,
        } = session.magnet
        else {
            return false;
        };
        if now < deadline {
            return false;
        }
        session.magnet = match self.find_candidate(session.dragged) {
            Some((p, s)) if p == partner && s == snap => {
                debug!("magnet locked {} with {partner}", session.dragged);
                self.set_position(session.dragged, snap);
                Magnet::Locked { partner }
            }
            Some((p, s)) => Magnet::Pending {
                partner: p,
                snap: s,
                deadline: now + self.config.magnet_delay,
            },
            None => Magnet::None,
        };
        self.state = State::Dragging(session);
        true
    }

    pub fn pointer_up(&mut self, now: Instant, animator: &mut dyn Animator) -> DragOutcome {
        self.poll(now);
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => DragOutcome::None,
            State::Pressed { item, .. } => DragOutcome::Click(item),
            State::Dragging(session) => match session.magnet {
                Magnet::Locked { partner } => DragOutcome::Combine {
                    dragged: session.dragged,
                    partner,
                    order: self.display_order(),
                },
                _ => {
                    self.settle(session.dragged, now, animator);
                    DragOutcome::Reorder {
                        order: self.display_order(),
                    }
                }
            },
        }
    }

    /// The window lost the pointer mid-gesture; treated as a release.
    pub fn capture_lost(&mut self, now: Instant, animator: &mut dyn Animator) -> DragOutcome {
        self.pointer_up(now, animator)
    }

    /// First eligible neighbour in display order, with the point the dragged
    /// tile snaps to beside it.
    fn find_candidate(&self, dragged: ItemId) -> Option<(ItemId, Point)> {
        let metrics = &self.layout.metrics;
        let drag_rect = self.rect_of(dragged)?;
        self.tiles
            .iter()
            .filter(|t| t.id != dragged)
            .find_map(|t| {
                let rect = metrics.cell_rect(t.pos);
                let eligible = drag_rect.overlaps_vertically(&rect)
                    && drag_rect.edge_distance(&rect) <= self.config.magnet_threshold;
                eligible.then(|| (t.id, self.snap_point(&drag_rect, &rect)))
            })
    }

    fn snap_point(&self, dragged: &Rect, partner: &Rect) -> Point {
        let to_left = (partner.min.x - dragged.right()).abs();
        let to_right = (dragged.min.x - partner.right()).abs();
        let x = if to_left <= to_right {
            partner.min.x - dragged.width - self.config.snap_gap
        } else {
            partner.right() + self.config.snap_gap
        };
        Point::new(x, partner.min.y)
    }

    fn reorder(&mut self, dragged: ItemId, now: Instant, animator: &mut dyn Animator) {
        let Some(from) = self.slot_of(dragged) else {
            return;
        };
        let Some(rect) = self.rect_of(dragged) else {
            return;
        };
        let to = self.layout.index_at(rect.center(), self.tiles.len());
        if to == from {
            return;
        }
        debug!("reorder {dragged}: slot {from} -> {to}");
        let tile = self.tiles.remove(from);
        self.tiles.insert(to, tile);
        for slot in from.min(to)..=from.max(to) {
            let tile = self.tiles[slot];
            if tile.id == dragged {
                continue;
            }
            let dest = self.layout.slot_position(slot);
            if tile.pos != dest {
                animator.animate(TransitionRequest {
                    item: tile.id,
                    from: tile.pos,
                    to: dest,
                    duration: self.config.reorder_duration,
                    easing: Easing::OutBack,
                    start: now,
                });
                self.tiles[slot].pos = dest;
            }
        }
    }

    fn settle(&mut self, dragged: ItemId, now: Instant, animator: &mut dyn Animator) {
        let Some(slot) = self.slot_of(dragged) else {
            return;
        };
        let dest = self.layout.slot_position(slot);
        let from = self.tiles[slot].pos;
        if from != dest {
            animator.animate(TransitionRequest {
                item: dragged,
                from,
                to: dest,
                duration: self.config.settle_duration,
                easing: Easing::OutBack,
                start: now,
            });
            self.tiles[slot].pos = dest;
        }
    }

    fn clamp(&self, p: Point) -> Point {
        let m = &self.layout.metrics;
        let over = self.config.overflow;
        let max_x = (self.layout.container_width - m.item_size).max(0.0) + over;
        let max_y = (self.layout.content_height() - m.cell_height()).max(0.0) + over;
        Point::new(p.x.clamp(-over, max_x), p.y.clamp(-over, max_y))
    }

    fn tile(&self, id: ItemId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    fn slot_of(&self, id: ItemId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    fn rect_of(&self, id: ItemId) -> Option<Rect> {
        self.tile(id).map(|t| self.layout.metrics.cell_rect(t.pos))
    }

    fn set_position(&mut self, id: ItemId, pos: Point) {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == id) {
            tile.pos = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GridMetrics;
    use crate::transition::RecordingAnimator;

    const MS: Duration = Duration::from_millis(1);

    fn controller(count: usize, width: f32, config: DragConfig) -> DragController {
        let layout = GridLayout::compute(count, width, GridMetrics::default());
        DragController::new(config, layout, (0..count).collect())
    }

    fn center_of(c: &DragController, id: ItemId) -> Point {
        c.layout().metrics.cell_rect(c.position_of(id).unwrap()).center()
    }

    #[test]
    fn short_press_is_a_click() {
        let mut c = controller(3, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        assert!(c.pointer_down(p));
        assert!(!c.pointer_move(p.offset(3.0, 2.0), now, &mut anim));
        assert_eq!(c.phase(), DragPhase::Pressed);
        assert_eq!(c.pointer_up(now, &mut anim), DragOutcome::Click(1));
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn press_on_add_slot_is_ignored() {
        let mut c = controller(2, 360.0, DragConfig::default());
        let add = c.layout().add_slot_rect().center();
        assert!(!c.pointer_down(add));
        let mut anim = RecordingAnimator::default();
        assert_eq!(c.pointer_up(Instant::now(), &mut anim), DragOutcome::None);
    }

    #[test]
    fn dragged_tile_follows_pointer_and_is_raised() {
        let mut c = controller(6, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let start = c.position_of(0).unwrap();
        let p = center_of(&c, 0);
        c.pointer_down(p);
        // straight down into the gap between rows, away from every neighbour edge
        c.pointer_move(p.offset(0.0, 20.0), now, &mut anim);
        assert!(c.is_dragging());
        assert_eq!(c.raised(), Some(0));
        assert_eq!(c.position_of(0), Some(start.offset(0.0, 20.0)));
        assert_eq!(anim.cancelled, vec![0]);
    }

    #[test]
    fn drag_is_clamped_with_overflow() {
        let mut c = controller(2, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 0);
        c.pointer_down(p);
        c.pointer_move(Point::new(-500.0, -500.0), now, &mut anim);
        assert_eq!(c.position_of(0), Some(Point::new(-DRAG_OVERFLOW, -DRAG_OVERFLOW)));
    }

    #[test]
    fn moving_onto_another_slot_reorders_in_place() {
        // four columns, two rows: 0 1 2 3 / 4 5
        let mut c = controller(6, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 0);
        let target = center_of(&c, 5).offset(5.0, 5.0);
        c.pointer_down(p);
        c.pointer_move(target, now, &mut anim);

        assert_eq!(c.phase(), DragPhase::Dragging);
        assert_eq!(c.display_order(), vec![1, 2, 3, 4, 5, 0]);
        let moved: Vec<ItemId> = anim.requests.iter().map(|r| r.item).collect();
        assert_eq!(moved, vec![1, 2, 3, 4, 5]);
        assert!(anim.requests.iter().all(|r| r.easing == Easing::OutBack));
        assert_eq!(c.position_of(4), Some(c.layout().slot_position(3)));

        match c.pointer_up(now, &mut anim) {
            DragOutcome::Reorder { order } => assert_eq!(order, vec![1, 2, 3, 4, 5, 0]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(c.position_of(0), Some(c.layout().slot_position(5)));
        assert_eq!(anim.requests.last().map(|r| r.item), Some(0));
    }

    #[test]
    fn release_in_own_slot_keeps_order() {
        let mut c = controller(3, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 2);
        c.pointer_down(p);
        c.pointer_move(p.offset(0.0, 10.0), now, &mut anim);
        assert_eq!(
            c.pointer_up(now, &mut anim),
            DragOutcome::Reorder {
                order: vec![0, 1, 2]
            }
        );
    }

    #[test]
    fn magnet_picks_first_eligible_in_display_order() {
        let config = DragConfig {
            magnet_threshold: 18.0,
            drag_threshold: 1.0,
            ..DragConfig::default()
        };
        let mut c = controller(3, 360.0, config);
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        c.pointer_down(p);
        // 18 px from tile 0, 14 px from tile 2: both eligible, 2 is nearer
        c.pointer_move(p.offset(2.0, 0.0), now, &mut anim);

        assert_eq!(c.phase(), DragPhase::MagnetPending);
        assert_eq!(c.magnet_candidate(), Some(0));
        assert_eq!(c.highlight(0), Highlight::Preview);
        assert_eq!(c.highlight(1), Highlight::Preview);
        assert_eq!(c.highlight(2), Highlight::None);
        assert_eq!(c.next_deadline(), Some(now + config.magnet_delay));
    }

    #[test]
    fn dwell_locks_and_release_combines() {
        let config = DragConfig::default();
        let mut c = controller(2, 360.0, config);
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        c.pointer_down(p);
        // 8 px from tile 0's right edge
        c.pointer_move(p.offset(-8.0, 0.0), now, &mut anim);
        assert_eq!(c.phase(), DragPhase::MagnetPending);

        assert!(!c.poll(now + config.magnet_delay - MS));
        assert!(c.poll(now + config.magnet_delay));
        assert_eq!(c.phase(), DragPhase::MagnetLocked);
        assert_eq!(c.highlight(0), Highlight::Locked);
        // snapped beside the partner
        let partner = c.position_of(0).unwrap();
        assert_eq!(
            c.position_of(1),
            Some(Point::new(partner.x + 72.0 + SNAP_GAP, partner.y))
        );

        let later = now + config.magnet_delay + MS * 10;
        c.pointer_move(p.offset(-8.0, 30.0), later, &mut anim);
        assert_eq!(c.position_of(0), Some(partner.offset(0.0, 30.0)));

        assert_eq!(
            c.pointer_up(later, &mut anim),
            DragOutcome::Combine {
                dragged: 1,
                partner: 0,
                order: vec![0, 1]
            }
        );
    }

    #[test]
    fn moving_away_before_deadline_cancels_magnet() {
        let config = DragConfig::default();
        let mut c = controller(2, 360.0, config);
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        c.pointer_down(p);
        c.pointer_move(p.offset(-8.0, 0.0), now, &mut anim);
        assert_eq!(c.phase(), DragPhase::MagnetPending);
        c.pointer_move(p.offset(0.0, 40.0), now + MS * 100, &mut anim);
        assert_eq!(c.phase(), DragPhase::Dragging);
        assert_eq!(c.next_deadline(), None);
        assert!(!c.poll(now + config.magnet_delay * 2));
    }

    #[test]
    fn drift_within_band_keeps_debounce() {
        let config = DragConfig {
            drag_threshold: 1.0,
            ..DragConfig::default()
        };
        let mut c = controller(2, 360.0, config);
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        c.pointer_down(p);
        c.pointer_move(p.offset(-8.0, 0.0), now, &mut anim);
        let first = c.next_deadline().unwrap();
        // same side, same partner: deadline kept
        c.pointer_move(p.offset(-10.0, 0.0), now + MS * 100, &mut anim);
        assert_eq!(c.next_deadline(), Some(first));
        // snap follows the partner's row, so vertical drift keeps it too
        c.pointer_move(p.offset(-10.0, 5.0), now + MS * 200, &mut anim);
        assert_eq!(c.next_deadline(), Some(first));
    }

    #[test]
    fn release_while_pending_past_deadline_combines() {
        let config = DragConfig::default();
        let mut c = controller(2, 360.0, config);
        let mut anim = RecordingAnimator::default();
        let now = Instant::now();
        let p = center_of(&c, 1);
        c.pointer_down(p);
        c.pointer_move(p.offset(-8.0, 0.0), now, &mut anim);
        let outcome = c.capture_lost(now + config.magnet_delay, &mut anim);
        assert!(matches!(outcome, DragOutcome::Combine { dragged: 1, partner: 0, .. }));
    }

    #[test]
    fn relayout_drops_session() {
        let mut c = controller(3, 360.0, DragConfig::default());
        let mut anim = RecordingAnimator::default();
        let p = center_of(&c, 0);
        c.pointer_down(p);
        c.pointer_move(p.offset(0.0, 30.0), Instant::now(), &mut anim);
        let layout = GridLayout::compute(2, 200.0, GridMetrics::default());
        c.set_layout(layout, vec![2, 0]);
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(c.display_order(), vec![2, 0]);
        assert_eq!(c.position_of(0), Some(Point::new(100.0, 12.0)));
    }
}
