use glam::{vec3, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::F32Ext;

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Returns luminance of this color-vector.
    fn luma(self) -> f32;

    /// Replaces non-finite and negative components with zero.
    fn sanitize(self) -> Self;

    /// Scales this color-vector down so that its luminance doesn't exceed
    /// `max`; colors below the threshold are left as they are.
    fn clamp_luma(self, max: f32) -> Self;
}

impl Vec3Ext for Vec3 {
    fn luma(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn sanitize(self) -> Self {
        vec3(self.x.sanitize(), self.y.sanitize(), self.z.sanitize())
    }

    fn clamp_luma(self, max: f32) -> Self {
        let luma = self.luma();

        if luma > max {
            self * (max / luma)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn sanitize() {
        let target = vec3(f32::NAN, -1.0, f32::INFINITY).sanitize();

        assert_eq!(Vec3::ZERO, target);
        assert_eq!(vec3(0.5, 1.0, 2.0), vec3(0.5, 1.0, 2.0).sanitize());
    }

    #[test]
    fn clamp_luma() {
        let color = vec3(10.0, 20.0, 30.0);
        let clamped = color.clamp_luma(1.0);

        assert_relative_eq!(clamped.luma(), 1.0, epsilon = 0.0001);
        assert_relative_eq!(clamped.y / clamped.x, 2.0, epsilon = 0.0001);
        assert_eq!(color, color.clamp_luma(100.0));
    }
}
