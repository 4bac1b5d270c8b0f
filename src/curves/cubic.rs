use super::Curve;

pub struct CubicCurve;

impl Curve for CubicCurve {
    fn apply(&self, volume: f64) -> f64 {
        if volume <= 0.0 || volume.is_nan() {
            return 0.0;
        }
        volume.cbrt()
    }

    fn name(&self) -> &'static str {
        "cubic"
    }
}
