use glam::{vec2, vec3, Vec2, Vec3, Vec3Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub struct Normal;

impl Normal {
    /// Compresses normal from Vec3 into Vec2 using octahedron-normal mapping.
    pub fn encode(n: Vec3) -> Vec2 {
        let n = n / (n.x.abs() + n.y.abs() + n.z.abs());

        let n = if n.z >= 0.0 {
            n.xy()
        } else {
            let mut t = 1.0 - n.yx().abs();

            t.x = t.x.copysign(n.x);
            t.y = t.y.copysign(n.y);
            t
        };

        n * 0.5 + 0.5
    }

    /// See: [`Self::encode()`].
    pub fn decode(n: Vec2) -> Vec3 {
        let n = n * 2.0 - 1.0;
        let mut n = vec3(n.x, n.y, 1.0 - n.x.abs() - n.y.abs());
        let t = (-n.z).max(0.0);

        n.x -= t.copysign(n.x);
        n.y -= t.copysign(n.y);
        n.normalize()
    }

    /// Like [`Self::encode()`], but quantizes both coordinates to 16 bits and
    /// packs them into a single word.
    pub fn encode_u32(n: Vec3) -> u32 {
        let n = Self::encode(n).clamp(Vec2::ZERO, Vec2::ONE) * 65535.0;

        ((n.x + 0.5) as u32) | (((n.y + 0.5) as u32) << 16)
    }

    /// See: [`Self::encode_u32()`].
    pub fn decode_u32(n: u32) -> Vec3 {
        let x = (n & 0xffff) as f32;
        let y = (n >> 16) as f32;

        Self::decode(vec2(x, y) / 65535.0)
    }

    /// Returns index of the axis this normal is most aligned with, along with
    /// its sign, as a number in range `<0, 6)`.
    pub fn dominant_axis(n: Vec3) -> u32 {
        let abs = n.abs();

        let axis = if abs.x >= abs.y && abs.x >= abs.z {
            (0, n.x)
        } else if abs.y >= abs.z {
            (1, n.y)
        } else {
            (2, n.z)
        };

        2 * axis.0 + (axis.1 < 0.0) as u32
    }
}
