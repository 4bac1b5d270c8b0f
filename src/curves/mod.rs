pub mod cubic;
pub mod linear;

pub trait Curve: Send + Sync {
    fn apply(&self, volume: f64) -> f64;
    fn name(&self) -> &'static str;
}

pub use cubic::CubicCurve;
pub use linear::LinearCurve;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveConfig {
    #[default]
    Cubic,
    Linear,
}

impl CurveConfig {
    pub fn into_curve(self) -> Box<dyn Curve> {
        match self {
            CurveConfig::Cubic => Box::new(CubicCurve),
            CurveConfig::Linear => Box::new(LinearCurve),
        }
    }
}
