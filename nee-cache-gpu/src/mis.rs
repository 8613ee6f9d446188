/// Multiple importance sampling between light sampling (done by the NEE
/// cache) and BRDF sampling (done by the path tracer's own bounces).
pub struct Mis;

impl Mis {
    /// Returns balance-heuristic weight of the light-sampling strategy.
    ///
    /// A BRDF density that can't be evaluated (NaN, infinite, negative) is
    /// treated as zero, which hands the entire weight to light sampling.
    pub fn balance(light_pdf: f32, brdf_pdf: f32) -> f32 {
        if !(light_pdf > 0.0) {
            return 0.0;
        }

        if !light_pdf.is_finite() {
            return 1.0;
        }

        let brdf_pdf = if brdf_pdf.is_finite() && brdf_pdf > 0.0 {
            brdf_pdf
        } else {
            0.0
        };

        light_pdf / (light_pdf + brdf_pdf)
    }
}
