// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D outlines consumed by the extrusion builders

use nalgebra::Point2;
use std::f64::consts::PI;

/// A simple closed polygon, stored counter-clockwise
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    points: Vec<Point2<f64>>,
}

impl Profile {
    /// Build a profile from an outline in either orientation.
    /// Returns `None` for fewer than three distinct points, a zero-area
    /// outline, or one whose edges cross or touch.
    pub fn from_points(mut points: Vec<Point2<f64>>) -> Option<Self> {
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return None;
        }
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 || self_intersects(&points) {
            return None;
        }
        Self::oriented(points)
    }

    fn oriented(mut points: Vec<Point2<f64>>) -> Option<Self> {
        let area = signed_area(&points);
        if area.abs() <= f64::EPSILON {
            return None;
        }
        if area < 0.0 {
            points.reverse();
        }
        Some(Self { points })
    }

    pub fn circle(radius: f64, segments: u32) -> Option<Self> {
        let segments = segments.max(3);
        let points = (0..segments)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / segments as f64;
                Point2::new(radius * theta.cos(), radius * theta.sin())
            })
            .collect();
        // a regular polygon is always simple
        Self::oriented(points)
    }

    pub fn rectangle(width: f64, height: f64, center: bool) -> Option<Self> {
        let (x0, y0) = if center {
            (-width / 2.0, -height / 2.0)
        } else {
            (0.0, 0.0)
        };
        Self::from_points(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + width, y0),
            Point2::new(x0 + width, y0 + height),
            Point2::new(x0, y0 + height),
        ])
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    pub fn min_x(&self) -> f64 {
        self.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    /// Ear-clipping triangulation; triangles index into [`Profile::points`]
    /// and wind counter-clockwise.
    pub fn triangulate(&self) -> Vec<[usize; 3]> {
        let points = &self.points;
        let mut remaining: Vec<usize> = (0..points.len()).collect();
        let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

        while remaining.len() > 3 {
            let count = remaining.len();
            let mut clipped = false;

            for i in 0..count {
                let prev = remaining[(i + count - 1) % count];
                let cur = remaining[i];
                let next = remaining[(i + 1) % count];
                let turn = cross(&points[prev], &points[cur], &points[next]);

                if turn.abs() <= f64::EPSILON {
                    // Collinear vertex contributes no area
                    remaining.remove(i);
                    clipped = true;
                    break;
                }
                if turn < 0.0 {
                    continue;
                }
                let blocked = remaining.iter().any(|&other| {
                    other != prev
                        && other != cur
                        && other != next
                        && point_in_triangle(
                            &points[other],
                            &points[prev],
                            &points[cur],
                            &points[next],
                        )
                });
                if blocked {
                    continue;
                }

                triangles.push([prev, cur, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }

            // only reachable through rounding on near-degenerate outlines
            if !clipped {
                log::warn!(
                    "triangulation stopped with {} of {} vertices left",
                    remaining.len(),
                    points.len()
                );
                break;
            }
        }

        if remaining.len() == 3 {
            let [a, b, c] = [remaining[0], remaining[1], remaining[2]];
            if cross(&points[a], &points[b], &points[c]) > f64::EPSILON {
                triangles.push([a, b, c]);
            }
        }

        triangles
    }
}

fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

fn cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn point_in_triangle(
    p: &Point2<f64>,
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Whether any two non-adjacent edges of the closed outline meet
fn self_intersects(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let edge = |i: usize| (&points[i], &points[(i + 1) % n]);
    (0..n).any(|i| {
        let (a, b) = edge(i);
        // edge i shares a vertex with i - 1 and i + 1
        (i + 2..n)
            .filter(|&j| !(i == 0 && j == n - 1))
            .any(|j| {
                let (c, d) = edge(j);
                segments_meet(a, b, c, d)
            })
    })
}

fn segments_meet(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }
    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// `p` is collinear with `a`-`b`; check it lies within the segment
fn on_segment(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangulated_area(profile: &Profile) -> f64 {
        let p = profile.points();
        profile
            .triangulate()
            .iter()
            .map(|[a, b, c]| cross(&p[*a], &p[*b], &p[*c]) / 2.0)
            .sum()
    }

    #[test]
    fn test_clockwise_input_is_normalized() {
        let profile = Profile::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
        ])
        .unwrap();
        assert!(profile.area() > 0.0);
    }

    #[test]
    fn test_degenerate_outlines_rejected() {
        let segment = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(Profile::from_points(segment).is_none());
        assert!(Profile::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ])
        .is_none());
    }

    #[test]
    fn test_concave_triangulation_preserves_area() {
        // L-shape, area 3
        let profile = Profile::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
        .unwrap();
        assert_eq!(profile.triangulate().len(), 4);
        assert_relative_eq!(triangulated_area(&profile), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_and_rectangle() {
        let circle = Profile::circle(1.0, 64).unwrap();
        assert_relative_eq!(triangulated_area(&circle), circle.area(), epsilon = 1e-9);
        assert!((circle.area() - PI).abs() < 0.01);

        let rect = Profile::rectangle(4.0, 2.0, true).unwrap();
        assert_relative_eq!(rect.min_x(), -2.0);
        assert_relative_eq!(rect.area(), 8.0);
    }

    #[test]
    fn test_crossing_outlines_rejected() {
        // bowtie with non-zero signed area: edges 0-1 and 2-3 cross at (2.4, 1.2)
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 2.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 3.0),
        ];
        assert!(signed_area(&bowtie).abs() > 1.0);
        assert!(Profile::from_points(bowtie).is_none());

        // a vertex touching a non-adjacent edge
        let pinched = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(Profile::from_points(pinched).is_none());
    }

    #[test]
    fn test_repeated_points_are_collapsed() {
        let profile = Profile::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(profile.points().len(), 4);
        assert_relative_eq!(triangulated_area(&profile), 1.0, epsilon = 1e-9);
    }
}
