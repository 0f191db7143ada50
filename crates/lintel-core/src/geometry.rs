use crate::types::Point;

/// Tolerance for near-zero area and length comparisons, and the floor used
/// when dividing by a dimension.
pub const EPSILON: f64 = 1e-9;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Signed shoelace sum, positive for counter-clockwise winding.
fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Enclosed area via the shoelace formula, independent of winding order.
/// Fewer than 3 points is degenerate and yields 0.0. Self-intersecting
/// outlines are accepted; the result is the net signed sum, which real
/// drawings treat as an acceptable approximation.
pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Outline length including the closing edge from the last point back to
/// the first. Degenerate inputs of fewer than 3 points yield 0.0.
pub fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        total += (b.x - a.x).hypot(b.y - a.y);
    }
    total
}

/// Axis-aligned bounds, `None` for an empty point set.
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bb = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in &points[1..] {
        bb.min_x = bb.min_x.min(p.x);
        bb.min_y = bb.min_y.min(p.y);
        bb.max_x = bb.max_x.max(p.x);
        bb.max_y = bb.max_y.max(p.y);
    }
    Some(bb)
}

/// Bounding-box side lengths as `(width, length)` where length is the
/// larger of the two.
pub fn principal_dimensions(points: &[Point]) -> (f64, f64) {
    match bounding_box(points) {
        Some(bb) => {
            let (w, h) = (bb.width(), bb.height());
            if w <= h {
                (w, h)
            } else {
                (h, w)
            }
        }
        None => (0.0, 0.0),
    }
}

/// Geometric centroid of the outline. Falls back to the vertex mean when
/// the enclosed area is near zero (collinear or degenerate outlines), so a
/// centroid is always defined for a non-empty point set.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let a = signed_area(points);
    if a.abs() <= EPSILON {
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point::new(sx / n, sy / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Point::new(cx / (6.0 * a), cy / (6.0 * a))
}

/// Angle of the longer bounding axis against the x-axis, in [0, 180).
/// A box at least as wide as it is tall reads 0.0, a taller one 90.0.
pub fn orientation_degrees(points: &[Point]) -> f64 {
    match bounding_box(points) {
        Some(bb) if bb.height() > bb.width() => 90.0,
        _ => 0.0,
    }
}

/// Length over width, with the width floored at `EPSILON` so a zero-width
/// shape produces a large finite ratio instead of infinity.
pub fn aspect_ratio(width: f64, length: f64) -> f64 {
    length / width.max(EPSILON)
}

/// Area, circumference and bounding diameter of a circle.
pub fn circle_metrics(radius: f64) -> (f64, f64, f64) {
    let area = std::f64::consts::PI * radius * radius;
    let circumference = 2.0 * std::f64::consts::PI * radius;
    (area, circumference, 2.0 * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_square_area_and_perimeter() {
        let pts = square(2.0);
        assert!(close_to(polygon_area(&pts), 4.0));
        assert!(close_to(perimeter(&pts), 8.0));
        let (w, l) = principal_dimensions(&pts);
        assert!(close_to(w, 2.0));
        assert!(close_to(l, 2.0));
    }

    #[test]
    fn test_area_ignores_winding() {
        let ccw = square(3.0);
        let cw: Vec<Point> = ccw.iter().rev().copied().collect();
        assert!(close_to(polygon_area(&ccw), polygon_area(&cw)));
    }

    #[test]
    fn test_degenerate_inputs_yield_zero() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(perimeter(&[]), 0.0);
        let two = [Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
        assert_eq!(polygon_area(&two), 0.0);
        assert_eq!(perimeter(&two), 0.0);
    }

    #[test]
    fn test_two_points_still_have_dimensions() {
        let line = [Point::new(0.0, 0.0), Point::new(6.0, 0.0)];
        let (w, l) = principal_dimensions(&line);
        assert!(close_to(w, 0.0));
        assert!(close_to(l, 6.0));
    }

    #[test]
    fn test_triangle_area() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 3.0),
        ];
        assert!(close_to(polygon_area(&pts), 6.0));
        assert!(close_to(perimeter(&pts), 12.0));
    }

    #[test]
    fn test_self_intersecting_outline_accepted() {
        // Bowtie: the two lobes cancel in the signed sum.
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ];
        let area = polygon_area(&pts);
        assert!(area.is_finite());
        assert!(close_to(area, 0.0));
        assert!(perimeter(&pts).is_finite());
    }

    #[test]
    fn test_centroid_of_square() {
        let c = centroid(&square(2.0));
        assert!(close_to(c.x, 1.0));
        assert!(close_to(c.y, 1.0));
    }

    #[test]
    fn test_centroid_falls_back_to_vertex_mean_for_collinear() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ];
        let c = centroid(&pts);
        assert!(close_to(c.x, 1.0));
        assert!(close_to(c.y, 0.0));
    }

    #[test]
    fn test_centroid_of_empty_is_origin() {
        let c = centroid(&[]);
        assert_eq!(c, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_orientation_follows_longer_axis() {
        let wide = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert_eq!(orientation_degrees(&wide), 0.0);

        let tall = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(orientation_degrees(&tall), 90.0);

        // A square has no longer axis and reads 0.0.
        assert_eq!(orientation_degrees(&square(2.0)), 0.0);
    }

    #[test]
    fn test_aspect_ratio_floors_width() {
        assert!(close_to(aspect_ratio(2.0, 6.0), 3.0));
        let degenerate = aspect_ratio(0.0, 5.0);
        assert!(degenerate.is_finite());
        assert!(degenerate > 1e6);
        assert_eq!(aspect_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_circle_metrics() {
        let (area, circumference, diameter) = circle_metrics(0.5);
        assert!(close_to(area, std::f64::consts::PI * 0.25));
        assert!(close_to(circumference, std::f64::consts::PI));
        assert!(close_to(diameter, 1.0));
    }

    #[test]
    fn test_bounding_box_center() {
        let bb = bounding_box(&square(4.0)).unwrap();
        assert_eq!(bb.center(), Point::new(2.0, 2.0));
        assert!(bounding_box(&[]).is_none());
    }
}
