use crate::curves::Curve;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeReading {
    /// Linear gain, nominally `0.0..=1.0` but may exceed 1 when boosted.
    pub volume: f64,
    pub muted: bool,
}

impl VolumeReading {
    pub fn new(volume: f64) -> Self {
        Self { volume, muted: false }
    }

    pub fn muted(volume: f64) -> Self {
        Self { volume, muted: true }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn percent(&self, curve: &dyn Curve) -> u8 {
        if self.muted {
            return 0;
        }
        (curve.apply(self.volume) * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
