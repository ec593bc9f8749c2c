// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Linear and rotational extrusion of 2D profiles (OpenSCAD Z-up convention)

use super::{Geometry, Profile};
use nalgebra::Point3;

/// Extrude a profile along +Z. The base sits at z=0 unless `center` is set.
pub fn linear_extrude(profile: &Profile, height: f64, center: bool) -> Geometry {
    let points = profile.points();
    let z0 = if center { -height / 2.0 } else { 0.0 };
    let z1 = z0 + height;
    let mut geometry = Geometry::new();

    let at = |i: usize, z: f64| Point3::new(points[i].x, points[i].y, z);

    for [a, b, c] in profile.triangulate() {
        geometry.add_flat_triangle(at(a, z1), at(b, z1), at(c, z1));
        geometry.add_flat_triangle(at(a, z0), at(c, z0), at(b, z0));
    }

    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        geometry.add_flat_triangle(at(i, z0), at(j, z0), at(j, z1));
        geometry.add_flat_triangle(at(i, z0), at(j, z1), at(i, z1));
    }

    geometry
}

/// Revolve a profile (x = radius, y = height) around the Z axis.
///
/// `angle` is in degrees within (0, 360]; a partial sweep gets end caps.
/// The caller guarantees the profile does not cross the axis.
pub fn rotate_extrude(profile: &Profile, angle: f64, segments: u32) -> Geometry {
    let points = profile.points();
    let full_turn = angle >= 360.0;
    let sweep = angle.min(360.0).to_radians();
    let steps = rotate_steps(angle, segments);
    let mut geometry = Geometry::new();

    let at = |step: usize, i: usize| {
        let phi = sweep * step as f64 / steps as f64;
        let (sin, cos) = phi.sin_cos();
        Point3::new(points[i].x * cos, points[i].x * sin, points[i].y)
    };

    for step in 0..steps {
        // A closed revolution reuses the first ring to avoid a seam
        let next = if full_turn && step + 1 == steps { 0 } else { step + 1 };
        for i in 0..points.len() {
            let j = (i + 1) % points.len();
            let a = at(step, i);
            let b = at(step, j);
            let c = at(next, j);
            let d = at(next, i);
            geometry.add_flat_triangle(a, c, b);
            geometry.add_flat_triangle(a, d, c);
        }
    }

    if !full_turn {
        for [a, b, c] in profile.triangulate() {
            geometry.add_flat_triangle(at(0, a), at(0, b), at(0, c));
            geometry.add_flat_triangle(at(steps, a), at(steps, c), at(steps, b));
        }
    }

    geometry
}

/// Upper bound on the triangles [`linear_extrude`] emits for `profile`
pub fn linear_extrude_triangle_count(profile: &Profile) -> Option<usize> {
    let n = profile.points().len();
    n.checked_mul(4)?.checked_sub(4)
}

/// Upper bound on the triangles [`rotate_extrude`] emits for `profile`
pub fn rotate_extrude_triangle_count(
    profile: &Profile,
    angle: f64,
    segments: u32,
) -> Option<usize> {
    let n = profile.points().len();
    let sides = rotate_steps(angle, segments).checked_mul(n)?.checked_mul(2)?;
    if angle >= 360.0 {
        Some(sides)
    } else {
        sides.checked_add(n.checked_mul(2)?.checked_sub(4)?)
    }
}

/// Angular steps of a sweep, at least one
fn rotate_steps(angle: f64, segments: u32) -> usize {
    ((segments.max(3) as f64) * angle.min(360.0) / 360.0).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    /// Sum of signed tetrahedron volumes; positive when faces point outward
    fn signed_volume(geometry: &Geometry) -> f64 {
        geometry
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices.map(|i| geometry.vertices[i].position.coords);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    fn offset_square(dx: f64) -> Profile {
        Profile::from_points(vec![
            Point2::new(dx, 0.0),
            Point2::new(dx + 1.0, 0.0),
            Point2::new(dx + 1.0, 1.0),
            Point2::new(dx, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_linear_extrude_square() {
        let profile = Profile::rectangle(2.0, 3.0, false).unwrap();
        let geometry = linear_extrude(&profile, 4.0, false);
        let bbox = geometry.bounding_box();
        assert_relative_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(bbox.max, Point3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(signed_volume(&geometry), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_extrude_centered() {
        let profile = Profile::circle(1.0, 16).unwrap();
        let bbox = linear_extrude(&profile, 2.0, true).bounding_box();
        assert_relative_eq!(bbox.min.z, -1.0);
        assert_relative_eq!(bbox.max.z, 1.0);
    }

    #[test]
    fn test_rotate_extrude_full_turn_is_closed_and_outward() {
        let geometry = rotate_extrude(&offset_square(2.0), 360.0, 64);
        let volume = signed_volume(&geometry);
        // Pappus: area * 2π * centroid radius, slightly less for the polygonal sweep
        let exact = 2.0 * std::f64::consts::PI * 2.5;
        assert!(volume > 0.0);
        assert!((volume - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_rotate_extrude_partial_has_caps() {
        let geometry = rotate_extrude(&offset_square(1.0), 90.0, 32);
        let exact = std::f64::consts::FRAC_PI_2 * 1.5;
        let volume = signed_volume(&geometry);
        assert!((volume - exact).abs() / exact < 0.01);

        let bbox = geometry.bounding_box();
        assert!(bbox.min.x >= -1e-9);
        assert!(bbox.min.y >= -1e-9);
    }

    #[test]
    fn test_triangle_counts_bound_the_output() {
        let circle = Profile::circle(1.0, 20).unwrap();
        let linear = linear_extrude(&circle, 1.0, false).triangle_count();
        assert_eq!(linear_extrude_triangle_count(&circle), Some(linear));

        let square = offset_square(1.0);
        for (angle, segments) in [(360.0, 24), (90.0, 32), (1.0, 3)] {
            let emitted = rotate_extrude(&square, angle, segments).triangle_count();
            assert_eq!(
                rotate_extrude_triangle_count(&square, angle, segments),
                Some(emitted)
            );
        }
        assert!(rotate_extrude_triangle_count(&square, 360.0, u32::MAX).unwrap() > 1 << 32);
    }
}
