//! Freehand stroke (a single pointer-drag drawing action).

use crate::color::Rgba;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stroke.
pub type StrokeId = Uuid;

/// A freehand stroke: sampled points plus the style captured when it began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    /// Sampled points in canvas-local coordinates.
    pub points: Vec<Point>,
    /// Stroke color.
    pub color: Rgba,
    /// Stroke width in canvas units.
    pub line_width: f64,
    /// Eraser strokes cut through existing strokes instead of painting.
    pub is_eraser: bool,
}

impl Stroke {
    /// Start a new stroke at `start`.
    pub fn new(start: Point, color: Rgba, line_width: f64, is_eraser: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![start],
            color,
            line_width,
            is_eraser,
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, color: Rgba, line_width: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            color,
            line_width,
            is_eraser: false,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Add a point to the stroke.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A stroke needs at least two points to leave a visible mark.
    pub fn is_committable(&self) -> bool {
        self.points.len() > 1
    }

    /// Build the smoothed outline path.
    ///
    /// Each raw sample becomes the control point of a quadratic curve that
    /// ends on the midpoint to the next sample, so the curve never shows the
    /// corners of the raw touch polyline. The first segment is a straight line
    /// to the first midpoint and the path always ends exactly on the last
    /// sample.
    pub fn smoothed_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if self.points.len() < 2 {
            return path;
        }

        path.move_to(self.points[0]);
        for (i, window) in self.points.windows(2).enumerate() {
            let (previous, current) = (window[0], window[1]);
            let mid = previous.midpoint(current);
            if i == 0 {
                path.line_to(mid);
            } else {
                path.quad_to(previous, mid);
            }
        }
        if let Some(last) = self.points.last() {
            path.line_to(*last);
        }

        path
    }

    /// Copy of this stroke with points scaled per axis.
    ///
    /// Width scales by the smaller factor so strokes keep their proportion
    /// under non-uniform scaling.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            id: self.id,
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x * scale_x, p.y * scale_y))
                .collect(),
            color: self.color,
            line_width: self.line_width * scale_x.min(scale_y),
            is_eraser: self.is_eraser,
        }
    }

    /// Bounding box of the sampled points (without stroke width).
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };

        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |rect, p| {
                rect.union_pt(*p)
            })
    }
}
