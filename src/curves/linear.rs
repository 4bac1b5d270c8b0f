use super::Curve;

pub struct LinearCurve;

impl Curve for LinearCurve {
    fn apply(&self, volume: f64) -> f64 {
        if volume.is_nan() {
            return 0.0;
        }
        volume.max(0.0)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
