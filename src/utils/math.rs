// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Tolerance used when classifying points against planes and welding vertices
pub const EPSILON: f64 = 1e-5;

/// Calculate the unnormalized normal of a triangle (length is twice its area)
pub fn triangle_cross(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// True for finite values strictly greater than zero
pub fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// True when every component of the vector is finite
pub fn is_finite_vector(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}
