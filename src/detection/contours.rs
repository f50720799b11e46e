use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

use crate::models::BoundingBox;

/// Shape constraints a contour must satisfy to count as a plate outline.
#[derive(Debug, Clone)]
pub struct PlateShapeFilter {
    /// Only the largest `max_candidates` contours are considered
    pub max_candidates: usize,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Minimum polygon area in pixels (exclusive)
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approx_epsilon: f64,
}

impl Default for PlateShapeFilter {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            min_aspect: 2.0,
            max_aspect: 5.0,
            min_area: 500.0,
            approx_epsilon: 0.018,
        }
    }
}

/// Find every contour (outer borders and holes) in a binary edge image.
pub fn find_all_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .map(|c| c.points)
        .collect()
}

/// Area enclosed by a closed polygon (shoelace formula).
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Smallest upright rectangle containing every point.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    if min_x < 0 || min_y < 0 {
        return None;
    }
    Some(BoundingBox {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// Approximate a closed contour with a polygon.
fn approximate_quad(points: &[Point<i32>], epsilon_fraction: f64) -> Vec<Point<i32>> {
    let perimeter = arc_length(points, true);
    let mut approx = approximate_polygon_dp(points, epsilon_fraction * perimeter, true);
    // A closed approximation may repeat its first vertex at the end
    if approx.len() > 1 && approx.first() == approx.last() {
        approx.pop();
    }
    approx
}

impl PlateShapeFilter {
    /// Pick the plate outline among `contours`.
    ///
    /// Contours are ranked by enclosed area, largest first, and the first one
    /// whose polygon approximation is a quadrilateral with a plate-like
    /// aspect ratio and enough area wins.
    pub fn select(&self, contours: &[Vec<Point<i32>>]) -> Option<BoundingBox> {
        let mut ranked: Vec<(&Vec<Point<i32>>, f64)> = contours
            .iter()
            .filter(|c| c.len() >= 4)
            .map(|c| (c, polygon_area(c)))
            .collect();
        // Stable sort: equal areas keep discovery order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .take(self.max_candidates)
            .find_map(|(points, _)| self.accept(points))
    }

    fn accept(&self, points: &[Point<i32>]) -> Option<BoundingBox> {
        let approx = approximate_quad(points, self.approx_epsilon);
        if approx.len() != 4 {
            return None;
        }

        let bbox = bounding_rect(&approx)?;
        let aspect = bbox.aspect_ratio();
        if aspect < self.min_aspect || aspect > self.max_aspect {
            return None;
        }

        if polygon_area(&approx) > self.min_area {
            Some(bbox)
        } else {
            None
        }
    }
}
