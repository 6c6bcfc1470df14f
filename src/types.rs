// src/types.rs
use std::fmt;
use std::ops::{Index, IndexMut};
use serde::{Deserialize, Serialize};
/// Canonical EEG frequency bands, in the fixed order used by every band-power vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
}
impl Band {
    pub const COUNT: usize = 4;
    pub const ALL: [Band; Band::COUNT] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta];
    pub fn index(self) -> usize {
        match self {
            Band::Delta => 0,
            Band::Theta => 1,
            Band::Alpha => 2,
            Band::Beta => 3,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
        }
    }
}
impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
/// Integrated spectral power per band, ordered `[Delta, Theta, Alpha, Beta]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowerVector(pub [f64; Band::COUNT]);
impl BandPowerVector {
    pub fn new(delta: f64, theta: f64, alpha: f64, beta: f64) -> Self {
        Self([delta, theta, alpha, beta])
    }
    pub fn zeros() -> Self {
        Self::default()
    }
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
    /// Sum over all four bands.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.iter().map(move |&band| (band, self[band]))
    }
}
impl Index<Band> for BandPowerVector {
    type Output = f64;
    fn index(&self, band: Band) -> &f64 {
        &self.0[band.index()]
    }
}
impl IndexMut<Band> for BandPowerVector {
    fn index_mut(&mut self, band: Band) -> &mut f64 {
        &mut self.0[band.index()]
    }
}
impl From<[f64; Band::COUNT]> for BandPowerVector {
    fn from(values: [f64; Band::COUNT]) -> Self {
        Self(values)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn band_index_matches_all_order() {
        for (i, band) in Band::ALL.iter().enumerate() {
            assert_eq!(band.index(), i);
        }
    }
    #[test]
    fn vector_is_indexed_by_band() {
        let mut v = BandPowerVector::new(1.0, 2.0, 1.5, 6.0);
        assert_eq!(v[Band::Theta], 2.0);
        assert_eq!(v[Band::Beta], 6.0);
        v[Band::Alpha] = 4.0;
        assert_eq!(v.as_slice(), &[1.0, 2.0, 4.0, 6.0]);
        assert_eq!(v.total(), 13.0);
    }
    #[test]
    fn band_serializes_as_snake_case() {
        let json = serde_json::to_string(&Band::Beta).unwrap();
        assert_eq!(json, "\"beta\"");
        let band: Band = serde_json::from_str("\"theta\"").unwrap();
        assert_eq!(band, Band::Theta);
    }
}
