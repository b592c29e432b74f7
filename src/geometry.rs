use serde::{Deserialize, Serialize};

/// A sample in canvas coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

pub fn distance_squared(a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

pub fn distance(a: Point, b: Point) -> f64 {
    distance_squared(a, b).sqrt()
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Shortest distance from `p` to the segment `v`-`w`.
///
/// The projection of `p` onto the segment's line is clamped to the endpoints,
/// and a zero-length segment degrades to the distance to `v`.
pub fn distance_to_segment(p: Point, v: Point, w: Point) -> f64 {
    let l2 = distance_squared(v, w);
    if l2 == 0.0 {
        return distance(p, v);
    }

    let t = ((p.x - v.x) * (w.x - v.x) + (p.y - v.y) * (w.y - v.y)) / l2;
    if t < 0.0 {
        return distance(p, v);
    }
    if t > 1.0 {
        return distance(p, w);
    }

    let projection = Point::new(v.x + t * (w.x - v.x), v.y + t * (w.y - v.y));
    distance(p, projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
        assert_eq!(distance_squared(Point::new(1.0, 1.0), Point::new(4.0, 5.0)), 25.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point::new(-7.5, 2.0);
        let b = Point::new(12.0, -3.25);
        assert_eq!(distance(a, b), distance(b, a));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(
            midpoint(Point::new(-5.0, 5.0), Point::new(5.0, -5.0)),
            Point::ORIGIN
        );
    }

    #[test]
    fn test_segment_projection_inside() {
        let d = distance_to_segment(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(d, 3.0);
    }

    #[test]
    fn test_segment_projection_clamped_to_endpoints() {
        let v = Point::new(0.0, 0.0);
        let w = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(-3.0, 4.0), v, w), 5.0);
        assert_eq!(distance_to_segment(Point::new(13.0, -4.0), v, w), 5.0);
    }

    #[test]
    fn test_zero_length_segment_falls_back_to_point_distance() {
        let v = Point::new(2.0, 2.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 6.0), v, v), 5.0);
    }

    #[test]
    fn test_tuple_conversion() {
        let p: Point = (1.5, -2.0).into();
        assert_eq!(p, Point::new(1.5, -2.0));
        let t: (f64, f64) = p.into();
        assert_eq!(t, (1.5, -2.0));
    }
}
