//! Screen-edge docking for the floating ball.
//!
//! Releasing the ball near a screen edge snaps it flush against that edge.
//! After a quiet period it tucks in, leaving only a sliver visible; hovering
//! brings it back out.

use crate::config::Settings;
use crate::layout::Point;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockConfig {
    pub enabled: bool,
    /// How close (px) the ball must be released to an edge to stick to it.
    pub distance: f32,
    /// Visible sliver (px) once tucked.
    pub peek: f32,
    pub delay: Duration,
}

impl From<&Settings> for DockConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            enabled: settings.edge_dock,
            distance: settings.edge_dock_distance.max(0.0),
            peek: settings.edge_dock_peek.max(1.0),
            delay: settings.edge_dock_delay(),
        }
    }
}

/// Keeps at least `min_visible` pixels of a `size` box on a screen of
/// `screen` size.
pub fn clamp_origin(pos: Point, size: Point, screen: Point, min_visible: f32) -> Point {
    let min_x = min_visible - size.x;
    let max_x = (screen.x - min_visible).max(min_x);
    let min_y = min_visible - size.y;
    let max_y = (screen.y - min_visible).max(min_y);
    Point::new(pos.x.clamp(min_x, max_x), pos.y.clamp(min_y, max_y))
}

/// Nearest edge within `distance` of the box, with the origin moved flush
/// against it. Horizontal edges win ties.
pub fn snap_to_edge(pos: Point, size: Point, screen: Point, distance: f32) -> Option<(Edge, Point)> {
    let candidates = [
        (Edge::Left, pos.x.abs(), Point::new(0.0, pos.y)),
        (
            Edge::Right,
            (pos.x + size.x - screen.x).abs(),
            Point::new(screen.x - size.x, pos.y),
        ),
        (Edge::Top, pos.y.abs(), Point::new(pos.x, 0.0)),
        (
            Edge::Bottom,
            (pos.y + size.y - screen.y).abs(),
            Point::new(pos.x, screen.y - size.y),
        ),
    ];
    candidates
        .into_iter()
        .filter(|(_, gap, _)| *gap < distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(edge, _, origin)| (edge, origin))
}

#[derive(Debug, Clone)]
pub struct EdgeDock {
    config: DockConfig,
    screen: Point,
    size: Point,
    origin: Point,
    docked: Option<Edge>,
    tucked: bool,
    idle_since: Option<Instant>,
}

impl EdgeDock {
    pub fn new(config: DockConfig, origin: Point, size: Point, screen: Point) -> Self {
        Self {
            config,
            screen,
            size,
            origin: clamp_origin(origin, size, screen, size.x.min(size.y)),
            docked: None,
            tucked: false,
            idle_since: None,
        }
    }

    pub fn docked_edge(&self) -> Option<Edge> {
        self.docked
    }

    pub fn is_tucked(&self) -> bool {
        self.tucked
    }

    /// Untucked resting origin; the one worth persisting.
    pub fn resting_origin(&self) -> Point {
        self.origin
    }

    pub fn set_screen(&mut self, screen: Point) {
        self.screen = screen;
        let min_visible = self.size.x.min(self.size.y);
        self.origin = clamp_origin(self.origin, self.size, screen, min_visible);
    }

    /// Origin to place the ball window at right now.
    pub fn current_origin(&self) -> Point {
        match (self.tucked, self.docked) {
            (true, Some(edge)) => self.tucked_origin(edge),
            _ => self.origin,
        }
    }

    fn tucked_origin(&self, edge: Edge) -> Point {
        let peek = self.config.peek.min(self.size.x).min(self.size.y);
        match edge {
            Edge::Left => Point::new(peek - self.size.x, self.origin.y),
            Edge::Right => Point::new(self.screen.x - peek, self.origin.y),
            Edge::Top => Point::new(self.origin.x, peek - self.size.y),
            Edge::Bottom => Point::new(self.origin.x, self.screen.y - peek),
        }
    }

    /// The user is moving the ball by hand.
    pub fn drag_to(&mut self, origin: Point) {
        self.origin = origin;
        self.docked = None;
        self.tucked = false;
        self.idle_since = None;
    }

    /// The user let go of the ball; returns where it should settle.
    pub fn release(&mut self, now: Instant) -> Point {
        let min_visible = self.size.x.min(self.size.y);
        self.origin = clamp_origin(self.origin, self.size, self.screen, min_visible);
        self.tucked = false;
        self.docked = None;
        self.idle_since = None;
        if self.config.enabled {
            if let Some((edge, origin)) =
                snap_to_edge(self.origin, self.size, self.screen, self.config.distance)
            {
                self.origin = origin;
                self.docked = Some(edge);
                self.idle_since = Some(now);
            }
        }
        self.origin
    }

    /// Pointer over the ball: bring it out and restart the idle clock.
    pub fn hover(&mut self, now: Instant) -> bool {
        let was_tucked = self.tucked;
        self.tucked = false;
        if self.docked.is_some() {
            self.idle_since = Some(now);
        }
        was_tucked
    }

    /// Tucks the ball once the idle delay has passed. Returns `true` when it
    /// just tucked.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.config.enabled || self.tucked || self.docked.is_none() {
            return false;
        }
        match self.idle_since {
            Some(since) if now.saturating_duration_since(since) >= self.config.delay => {
                self.tucked = true;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.config.enabled || self.tucked || self.docked.is_none() {
            return None;
        }
        self.idle_since.map(|since| since + self.config.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Point = Point::new(1920.0, 1080.0);
    const BALL: Point = Point::new(56.0, 56.0);

    fn config() -> DockConfig {
        DockConfig::from(&Settings::default())
    }

    #[test]
    fn snaps_to_nearest_edge_within_distance() {
        let hit = snap_to_edge(Point::new(1850.0, 400.0), BALL, SCREEN, 24.0);
        assert_eq!(hit, Some((Edge::Right, Point::new(1864.0, 400.0))));
        assert_eq!(snap_to_edge(Point::new(500.0, 400.0), BALL, SCREEN, 24.0), None);
        // closer to top than to left
        let corner = snap_to_edge(Point::new(10.0, 4.0), BALL, SCREEN, 24.0);
        assert_eq!(corner, Some((Edge::Top, Point::new(10.0, 0.0))));
    }

    #[test]
    fn tucks_after_delay_and_hover_reveals() {
        let cfg = config();
        let now = Instant::now();
        let mut dock = EdgeDock::new(cfg, Point::new(8.0, 300.0), BALL, SCREEN);
        assert_eq!(dock.release(now), Point::new(0.0, 300.0));
        assert_eq!(dock.docked_edge(), Some(Edge::Left));
        assert_eq!(dock.next_deadline(), Some(now + cfg.delay));

        assert!(!dock.poll(now + cfg.delay / 2));
        assert!(dock.poll(now + cfg.delay));
        assert_eq!(dock.current_origin(), Point::new(cfg.peek - BALL.x, 300.0));
        assert_eq!(dock.resting_origin(), Point::new(0.0, 300.0));

        let later = now + cfg.delay * 2;
        assert!(dock.hover(later));
        assert_eq!(dock.current_origin(), Point::new(0.0, 300.0));
        assert_eq!(dock.next_deadline(), Some(later + cfg.delay));
    }

    #[test]
    fn disabled_dock_never_tucks() {
        let cfg = DockConfig {
            enabled: false,
            ..config()
        };
        let now = Instant::now();
        let mut dock = EdgeDock::new(cfg, Point::new(4.0, 300.0), BALL, SCREEN);
        assert_eq!(dock.release(now), Point::new(4.0, 300.0));
        assert!(!dock.poll(now + Duration::from_secs(60)));
        assert_eq!(dock.docked_edge(), None);
    }

    #[test]
    fn dragging_undocks() {
        let now = Instant::now();
        let mut dock = EdgeDock::new(config(), Point::new(1900.0, 10.0), BALL, SCREEN);
        dock.release(now);
        assert!(dock.poll(now + Duration::from_secs(5)));
        dock.drag_to(Point::new(900.0, 500.0));
        assert!(!dock.is_tucked());
        assert_eq!(dock.current_origin(), Point::new(900.0, 500.0));
        assert_eq!(dock.release(now), Point::new(900.0, 500.0));
        assert_eq!(dock.docked_edge(), None);
    }

    #[test]
    fn off_screen_origin_is_pulled_back() {
        let pos = clamp_origin(Point::new(-500.0, 5000.0), BALL, SCREEN, 56.0);
        assert_eq!(pos, Point::new(0.0, 1024.0));
    }
}
