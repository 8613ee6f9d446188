#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub trait F32Ext
where
    Self: Sized,
{
    fn sqr(self) -> Self;
    fn saturate(self) -> Self;

    /// Replaces NaNs, infinities and negative values with zero.
    fn sanitize(self) -> Self;
}

impl F32Ext for f32 {
    fn sqr(self) -> Self {
        self * self
    }

    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn sanitize(self) -> Self {
        if self.is_finite() && self > 0.0 {
            self
        } else {
            0.0
        }
    }
}
