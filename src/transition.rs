//! Position transitions for tiles that settle into a new slot.
//!
//! The drag controller only issues [`TransitionRequest`]s through the
//! [`Animator`] trait. [`TransitionManager`] is the stock implementation: it
//! owns every in-flight transition keyed by item and drops each one once it
//! has run its course.

use crate::easing::Easing;
use crate::layout::Point;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Stable identity of a tile for the lifetime of one layout pass.
pub type ItemId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRequest {
    pub item: ItemId,
    pub from: Point,
    pub to: Point,
    pub duration: Duration,
    pub easing: Easing,
    pub start: Instant,
}

pub trait Animator {
    fn animate(&mut self, request: TransitionRequest);

    /// Stops any transition for `item`, leaving it wherever it is drawn.
    fn cancel(&mut self, item: ItemId);
}

#[derive(Debug, Default)]
pub struct TransitionManager {
    active: HashMap<ItemId, TransitionRequest>,
}

impl TransitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn is_animating_item(&self, item: ItemId) -> bool {
        self.active.contains_key(&item)
    }

    /// Drawn position of `item` at `now`, if it is mid-transition.
    pub fn sample(&self, item: ItemId, now: Instant) -> Option<Point> {
        self.active.get(&item).map(|tr| sample_request(tr, now))
    }

    /// Final target of `item`, if it is mid-transition.
    #[cfg(test)]
    pub(crate) fn target(&self, item: ItemId) -> Option<Point> {
        self.active.get(&item).map(|tr| tr.to)
    }

    /// Drops finished transitions and returns the items that completed.
    pub fn tick(&mut self, now: Instant) -> Vec<ItemId> {
        let mut done: Vec<ItemId> = self
            .active
            .iter()
            .filter(|(_, tr)| now.saturating_duration_since(tr.start) >= tr.duration)
            .map(|(id, _)| *id)
            .collect();
        done.sort_unstable();
        for id in &done {
            self.active.remove(id);
        }
        done
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Follows items whose ids shifted. Items `map` drops are stopped.
    pub fn rekey<F>(&mut self, map: F)
    where
        F: Fn(ItemId) -> Option<ItemId>,
    {
        self.active = std::mem::take(&mut self.active)
            .into_values()
            .filter_map(|tr| map(tr.item).map(|item| (item, TransitionRequest { item, ..tr })))
            .collect();
    }
}

impl Animator for TransitionManager {
    fn animate(&mut self, request: TransitionRequest) {
        // Retargeting starts from where the tile is currently drawn.
        let from = self
            .active
            .get(&request.item)
            .map(|tr| sample_request(tr, request.start))
            .unwrap_or(request.from);
        self.active
            .insert(request.item, TransitionRequest { from, ..request });
    }

    fn cancel(&mut self, item: ItemId) {
        self.active.remove(&item);
    }
}

fn sample_request(tr: &TransitionRequest, now: Instant) -> Point {
    if tr.duration.is_zero() {
        return tr.to;
    }
    let elapsed = now.saturating_duration_since(tr.start);
    let t = (elapsed.as_secs_f32() / tr.duration.as_secs_f32()).clamp(0.0, 1.0);
    tr.from.lerp(tr.to, tr.easing.apply(t))
}

/// Animator that only records what it was asked to do.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingAnimator {
    pub requests: Vec<TransitionRequest>,
    pub cancelled: Vec<ItemId>,
}

#[cfg(test)]
impl Animator for RecordingAnimator {
    fn animate(&mut self, request: TransitionRequest) {
        self.requests.push(request);
    }

    fn cancel(&mut self, item: ItemId) {
        self.cancelled.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(item: ItemId, start: Instant, to: Point) -> TransitionRequest {
        TransitionRequest {
            item,
            from: Point::new(0.0, 0.0),
            to,
            duration: Duration::from_millis(100),
            easing: Easing::Linear,
            start,
        }
    }

    #[test]
    fn samples_between_endpoints_then_finishes() {
        let start = Instant::now();
        let mut mgr = TransitionManager::new();
        mgr.animate(request(3, start, Point::new(100.0, 0.0)));

        let mid = mgr.sample(3, start + Duration::from_millis(50)).unwrap();
        assert!((mid.x - 50.0).abs() < 1e-3);
        assert!(mgr.tick(start + Duration::from_millis(60)).is_empty());
        assert_eq!(mgr.tick(start + Duration::from_millis(100)), vec![3]);
        assert!(!mgr.is_animating());
    }

    #[test]
    fn retarget_starts_from_current_point() {
        let start = Instant::now();
        let mut mgr = TransitionManager::new();
        mgr.animate(request(1, start, Point::new(100.0, 0.0)));
        let later = start + Duration::from_millis(50);
        mgr.animate(request(1, later, Point::new(100.0, 100.0)));

        let at_restart = mgr.sample(1, later).unwrap();
        assert!((at_restart.x - 50.0).abs() < 1e-3);
        assert!(at_restart.y.abs() < 1e-3);
        assert_eq!(mgr.target(1), Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn rekey_moves_and_drops() {
        let start = Instant::now();
        let mut mgr = TransitionManager::new();
        mgr.animate(request(0, start, Point::new(1.0, 0.0)));
        mgr.animate(request(1, start, Point::new(2.0, 0.0)));
        mgr.rekey(|id| (id == 0).then_some(5));
        assert_eq!(mgr.target(5), Some(Point::new(1.0, 0.0)));
        assert!(!mgr.is_animating_item(0));
        assert!(!mgr.is_animating_item(1));
    }

    #[test]
    fn cancel_removes_item() {
        let start = Instant::now();
        let mut mgr = TransitionManager::new();
        mgr.animate(request(7, start, Point::new(1.0, 1.0)));
        mgr.cancel(7);
        assert!(mgr.sample(7, start).is_none());
    }
}
