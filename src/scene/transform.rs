// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local placement of a mesh: position, Euler rotation and scale

use nalgebra::{Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Position / rotation / scale, composed as `T * R * S`.
///
/// `rotation` holds per-axis Euler angles in radians. The rotation matrix is
/// `Rz * Ry * Rx`, which is OpenSCAD's `rotate([x, y, z])` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
    pub scale: Vector3<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn rotation_matrix(&self) -> Matrix4<f64> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotation.x);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation.y);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation.z);
        (rz * ry * rx).to_homogeneous()
    }

    /// Local matrix
    pub fn matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation_matrix()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
