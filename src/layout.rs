//! Grid placement of launcher tiles.
//!
//! Every pass starts from scratch: the same inputs always produce the same
//! cell positions, and nothing from a previous pass (resize, filter change)
//! is carried over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

/// Axis-aligned box given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(min: Point, width: f32, height: f32) -> Self {
        Self { min, width, height }
    }

    pub fn right(&self) -> f32 {
        self.min.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.min.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.min.x + self.width * 0.5, self.min.y + self.height * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.right() && p.y >= self.min.y && p.y < self.bottom()
    }

    /// Strict overlap of the vertical extents.
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.min.y < other.bottom() && other.min.y < self.bottom()
    }

    /// Distance between the closest pair of facing vertical edges: `self`'s
    /// right against `other`'s left, or `self`'s left against `other`'s right.
    /// A small overlap counts the same as a small gap.
    pub fn edge_distance(&self, other: &Rect) -> f32 {
        (other.min.x - self.right())
            .abs()
            .min((self.min.x - other.right()).abs())
    }
}

/// Tile geometry shared by the layout pass and the drag controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub item_size: f32,
    pub spacing: f32,
    pub margin: f32,
    pub label_height: f32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            item_size: 72.0,
            spacing: 16.0,
            margin: 12.0,
            label_height: 18.0,
        }
    }
}

impl GridMetrics {
    pub fn cell_height(&self) -> f32 {
        self.item_size + self.label_height
    }

    pub fn column_pitch(&self) -> f32 {
        self.item_size + self.spacing
    }

    pub fn row_pitch(&self) -> f32 {
        self.cell_height() + self.spacing
    }

    pub fn columns_for(&self, container_width: f32) -> usize {
        let pitch = self.column_pitch();
        if !container_width.is_finite() || pitch <= 0.0 {
            return 1;
        }
        ((container_width / pitch).floor() as usize).max(1)
    }

    pub fn cell_position(&self, index: usize, columns: usize) -> Point {
        let columns = columns.max(1);
        let row = index / columns;
        let col = index % columns;
        Point::new(
            self.margin + col as f32 * self.column_pitch(),
            self.margin + row as f32 * self.row_pitch(),
        )
    }

    pub fn cell_rect(&self, origin: Point) -> Rect {
        Rect::new(origin, self.item_size, self.cell_height())
    }
}

/// Positions of the first `item_count` cells for a container of the given width.
pub fn compute_layout(item_count: usize, container_width: f32, metrics: &GridMetrics) -> Vec<Point> {
    let columns = metrics.columns_for(container_width);
    (0..item_count)
        .map(|i| metrics.cell_position(i, columns))
        .collect()
}

/// One full layout pass, including the trailing "add" slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub metrics: GridMetrics,
    pub container_width: f32,
    pub columns: usize,
    pub rows: usize,
    pub positions: Vec<Point>,
    pub add_slot: Point,
}

impl GridLayout {
    pub fn compute(item_count: usize, container_width: f32, metrics: GridMetrics) -> Self {
        let columns = metrics.columns_for(container_width);
        let rows = (item_count + 1).div_ceil(columns);
        let positions = compute_layout(item_count, container_width, &metrics);
        let add_slot = metrics.cell_position(item_count, columns);
        Self {
            metrics,
            container_width,
            columns,
            rows,
            positions,
            add_slot,
        }
    }

    pub fn item_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Height needed to show every row, add slot included.
    pub fn content_height(&self) -> f32 {
        self.metrics.margin * 2.0 + self.rows as f32 * self.metrics.row_pitch()
    }

    pub fn slot_position(&self, index: usize) -> Point {
        self.positions
            .get(index)
            .copied()
            .unwrap_or_else(|| Point::new(self.metrics.margin, self.metrics.margin))
    }

    pub fn add_slot_rect(&self) -> Rect {
        self.metrics.cell_rect(self.add_slot)
    }

    /// Linear index of the cell under `center`, clamped to `[0, count-1]`.
    pub fn index_at(&self, center: Point, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let m = &self.metrics;
        let col = ((center.x - m.margin) / m.column_pitch()).floor();
        let row = ((center.y - m.margin) / m.row_pitch()).floor();
        let col = if col.is_finite() { col.max(0.0) as usize } else { 0 };
        let row = if row.is_finite() { row.max(0.0) as usize } else { 0 };
        let col = col.min(self.columns - 1);
        (row * self.columns + col).min(count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> GridMetrics {
        GridMetrics {
            item_size: 72.0,
            spacing: 16.0,
            margin: 12.0,
            label_height: 18.0,
        }
    }

    #[test]
    fn identical_inputs_give_identical_layouts() {
        let m = metrics();
        for count in [0usize, 1, 7, 40] {
            for width in [10.0f32, 200.0, 351.0, 1024.0] {
                assert_eq!(
                    compute_layout(count, width, &m),
                    compute_layout(count, width, &m)
                );
            }
        }
    }

    #[test]
    fn first_cell_is_anchored_at_margin() {
        let m = metrics();
        for width in [1.0f32, 88.0, 500.0] {
            let positions = compute_layout(5, width, &m);
            assert_eq!(positions[0], Point::new(m.margin, m.margin));
        }
    }

    #[test]
    fn add_slot_is_the_cell_after_the_last_entry() {
        let m = metrics();
        for n in 0..12 {
            let layout = GridLayout::compute(n, 360.0, m);
            assert_eq!(layout.add_slot, compute_layout(n + 1, 360.0, &m)[n]);
        }
    }

    #[test]
    fn empty_list_keeps_add_slot_at_origin() {
        let layout = GridLayout::compute(0, 360.0, metrics());
        assert!(layout.is_empty());
        assert_eq!(layout.add_slot, Point::new(12.0, 12.0));
        assert_eq!(layout.rows, 1);
    }

    #[test]
    fn narrow_container_clamps_to_one_column() {
        let layout = GridLayout::compute(3, 40.0, metrics());
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.positions[2], Point::new(12.0, 12.0 + 2.0 * 106.0));
        assert_eq!(layout.rows, 4);
    }

    #[test]
    fn wraps_rows_using_cell_height() {
        // 360 / 88 = 4 columns
        let layout = GridLayout::compute(6, 360.0, metrics());
        assert_eq!(layout.columns, 4);
        assert_eq!(layout.rows, 2);
        assert_eq!(layout.positions[3], Point::new(12.0 + 3.0 * 88.0, 12.0));
        assert_eq!(layout.positions[4], Point::new(12.0, 12.0 + 106.0));
        assert_eq!(layout.content_height(), 24.0 + 2.0 * 106.0);
    }

    #[test]
    fn index_at_maps_centers_back_and_clamps() {
        let m = metrics();
        let layout = GridLayout::compute(6, 360.0, m);
        for (i, pos) in layout.positions.iter().enumerate() {
            let center = m.cell_rect(*pos).center();
            assert_eq!(layout.index_at(center, 6), i);
        }
        assert_eq!(layout.index_at(Point::new(-50.0, -50.0), 6), 0);
        assert_eq!(layout.index_at(Point::new(5000.0, 5000.0), 6), 5);
        // past the last column stays in the same row
        assert_eq!(layout.index_at(Point::new(2000.0, 20.0), 6), 3);
    }

    #[test]
    fn rect_edges_and_overlap() {
        let a = Rect::new(Point::new(0.0, 0.0), 10.0, 10.0);
        let b = Rect::new(Point::new(15.0, 5.0), 10.0, 10.0);
        let c = Rect::new(Point::new(7.0, 20.0), 10.0, 10.0);
        assert_eq!(a.edge_distance(&b), 5.0);
        assert_eq!(b.edge_distance(&a), 5.0);
        assert!(a.overlaps_vertically(&b));
        assert!(!a.overlaps_vertically(&c));
        // overlapping by 3 px
        assert_eq!(a.edge_distance(&c), 3.0);
        assert_eq!(a.edge_distance(&a), 10.0);
    }
}
