//! Water-quality class labels

use serde::{Deserialize, Serialize};

/// Water-quality class predicted by the model.
///
/// Variant order mirrors the class-index assignment of the trained
/// artifact. Changing the order breaks the contract with the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterClass {
    /// No contamination detected
    Clean,
    /// Acidic water
    LowPh,
    /// Alkaline water
    HighPh,
    /// Chemical contamination
    Chemical,
    /// Excess salinity
    Salt,
    /// Organic contamination
    Organic,
}

impl WaterClass {
    /// Number of classes the model is trained on
    pub const COUNT: usize = 6;

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterClass::Clean => "Clean",
            WaterClass::LowPh => "Low pH",
            WaterClass::HighPh => "High pH",
            WaterClass::Chemical => "Chemical",
            WaterClass::Salt => "Salt",
            WaterClass::Organic => "Organic",
        }
    }

    /// Map a model class index to its label
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(WaterClass::Clean),
            1 => Some(WaterClass::LowPh),
            2 => Some(WaterClass::HighPh),
            3 => Some(WaterClass::Chemical),
            4 => Some(WaterClass::Salt),
            5 => Some(WaterClass::Organic),
            _ => None,
        }
    }

    /// Position of this class in the model's output vector
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for index in 0..WaterClass::COUNT {
            let class = WaterClass::from_index(index).unwrap();
            assert_eq!(class.index(), index);
        }
    }

    #[test]
    fn test_out_of_range_index() {
        assert_eq!(WaterClass::from_index(6), None);
        assert_eq!(WaterClass::from_index(usize::MAX), None);
    }

    #[test]
    fn test_labels_match_model_contract() {
        let labels: Vec<_> = (0..WaterClass::COUNT)
            .map(|i| WaterClass::from_index(i).unwrap().as_str())
            .collect();
        assert_eq!(
            labels,
            ["Clean", "Low pH", "High pH", "Chemical", "Salt", "Organic"]
        );
    }
}
