use crate::openvr_types::{HmdMatrix34, HmdQuaternion};
use nalgebra as na;

pub fn quaternion(w: f64, x: f64, y: f64, z: f64) -> HmdQuaternion {
    HmdQuaternion { w, x, y, z }
}

/// Tait-Bryan angles to quaternion, yaw applied last.
///
/// Not used by the head pose path, which converts controller matrices directly.
pub fn quaternion_from_euler(roll: f64, pitch: f64, yaw: f64) -> HmdQuaternion {
    let (sr, cr) = (roll / 2.0).sin_cos();
    let (sp, cp) = (pitch / 2.0).sin_cos();
    let (sy, cy) = (yaw / 2.0).sin_cos();
    HmdQuaternion {
        w: cr * cp * cy + sr * sp * sy,
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
    }
}

pub fn identity_matrix() -> HmdMatrix34 {
    [
        [1., 0., 0., 0.],
        [0., 1., 0., 0.],
        [0., 0., 1., 0.],
    ]
}

/// Embeds a translation and rotation into a host transform.
pub fn matrix_from_parts(
    translation: &na::Vector3<f64>,
    rotation: &na::UnitQuaternion<f64>,
) -> HmdMatrix34 {
    let r = rotation.to_rotation_matrix();
    let mut matrix = identity_matrix();
    for (row_index, row) in matrix.iter_mut().enumerate() {
        for (column, value) in row.iter_mut().take(3).enumerate() {
            *value = r.matrix()[(row_index, column)] as f32;
        }
        row[3] = translation[row_index] as f32;
    }
    matrix
}

impl From<HmdQuaternion> for na::Quaternion<f64> {
    fn from(q: HmdQuaternion) -> Self {
        na::Quaternion::new(q.w, q.x, q.y, q.z)
    }
}

pub trait PoseMatrix {
    fn to_position(&self) -> na::Vector3<f64>;
    fn to_euler(&self) -> (f64, f64, f64);
    fn to_rotation(&self) -> HmdQuaternion;
}

impl PoseMatrix for HmdMatrix34 {
    fn to_position(&self) -> na::Vector3<f64> {
        na::Vector3::new(self[0][3] as f64, self[1][3] as f64, self[2][3] as f64)
    }

    /// (roll, pitch, yaw) of the rotation block. Unused by the head pose path.
    fn to_euler(&self) -> (f64, f64, f64) {
        let m = self;
        let roll = (m[2][1] as f64).atan2(m[2][2] as f64);
        let pitch = (-m[2][0] as f64).atan2(
            ((m[2][1] * m[2][1] + m[2][2] * m[2][2]) as f64).sqrt(),
        );
        let yaw = (m[1][0] as f64).atan2(m[0][0] as f64);
        (roll, pitch, yaw)
    }

    /// Rotation block to quaternion.
    ///
    /// Picks the branch by the largest of the trace and the diagonal so the divisor
    /// stays away from zero. The input must hold a proper rotation.
    ///
    /// # Reference
    ///
    /// [euclideanspace matrix to quaternion](
    /// http://www.euclideanspace.com/maths/geometry/rotations/conversions/matrixToQuaternion/)
    #[allow(clippy::many_single_char_names)]
    fn to_rotation(&self) -> HmdQuaternion {
        let m = self;
        let (m00, m01, m02) = (m[0][0] as f64, m[0][1] as f64, m[0][2] as f64);
        let (m10, m11, m12) = (m[1][0] as f64, m[1][1] as f64, m[1][2] as f64);
        let (m20, m21, m22) = (m[2][0] as f64, m[2][1] as f64, m[2][2] as f64);
        let trace = m00 + m11 + m22;

        if trace > 0. {
            let s = (trace + 1.).sqrt() * 2.;
            quaternion(0.25 * s, (m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1. + m00 - m11 - m22).sqrt() * 2.;
            quaternion((m21 - m12) / s, 0.25 * s, (m01 + m10) / s, (m02 + m20) / s)
        } else if m11 > m22 {
            let s = (1. + m11 - m00 - m22).sqrt() * 2.;
            quaternion((m02 - m20) / s, (m01 + m10) / s, 0.25 * s, (m12 + m21) / s)
        } else {
            let s = (1. + m22 - m00 - m11).sqrt() * 2.;
            quaternion((m10 - m01) / s, (m02 + m20) / s, (m12 + m21) / s, 0.25 * s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn rotation_of(matrix: &HmdMatrix34) -> na::Matrix3<f64> {
        na::Matrix3::from_fn(|r, c| matrix[r][c] as f64)
    }

    fn check_round_trip(rotation: na::UnitQuaternion<f64>) {
        let matrix = matrix_from_parts(&na::Vector3::new(0.5, 1.0, -2.0), &rotation);
        let q: na::Quaternion<f64> = matrix.to_rotation().into();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-5);
        let back = na::UnitQuaternion::from_quaternion(q).to_rotation_matrix();
        assert_relative_eq!(*back.matrix(), rotation_of(&matrix), epsilon = 1e-5);
    }

    #[test]
    fn test_matrix_layout() {
        let matrix = [[0., 1., 2., 3.], [4., 5., 6., 7.], [8., 9., 10., 11.]];
        let position = matrix.to_position();
        assert_eq!(position.x as i32, 3);
        assert_eq!(position.y as i32, 7);
        assert_eq!(position.z as i32, 11);
    }

    #[test]
    fn identity_matrix_is_identity_quaternion() {
        let q = identity_matrix().to_rotation();
        assert_eq!(q, quaternion(1., 0., 0., 0.));
        assert_eq!(identity_matrix().to_position(), na::Vector3::zeros());
    }

    #[test]
    fn rotation_round_trips_for_every_branch() {
        // trace branch
        check_round_trip(na::UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1));
        // half turns land in the x, y and z branches
        check_round_trip(na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), PI));
        check_round_trip(na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), PI));
        check_round_trip(na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), PI));
        check_round_trip(na::UnitQuaternion::from_euler_angles(2.9, 0.4, -3.0));
        check_round_trip(na::UnitQuaternion::from_euler_angles(-FRAC_PI_2, 1.2, 2.5));
    }

    #[test]
    fn translation_survives_reembedding() {
        let translation = na::Vector3::new(1.25, -0.5, 3.0);
        let matrix = matrix_from_parts(&translation, &na::UnitQuaternion::identity());
        assert_eq!(matrix.to_position(), translation);
    }

    #[test]
    fn euler_matches_nalgebra_convention() {
        let (roll, pitch, yaw) = (0.4, -0.3, 1.2);
        let rotation = na::UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        let matrix = matrix_from_parts(&na::Vector3::zeros(), &rotation);
        let (r, p, y) = matrix.to_euler();
        assert_relative_eq!(r, roll, epsilon = 1e-5);
        assert_relative_eq!(p, pitch, epsilon = 1e-5);
        assert_relative_eq!(y, yaw, epsilon = 1e-5);
    }

    #[test]
    fn euler_quaternion_matches_nalgebra() {
        let q = quaternion_from_euler(0.4, -0.3, 1.2);
        let expected = na::UnitQuaternion::from_euler_angles(0.4, -0.3, 1.2);
        assert_relative_eq!(q.w, expected.w, epsilon = 1e-9);
        assert_relative_eq!(q.x, expected.i, epsilon = 1e-9);
        assert_relative_eq!(q.y, expected.j, epsilon = 1e-9);
        assert_relative_eq!(q.z, expected.k, epsilon = 1e-9);
    }
}
