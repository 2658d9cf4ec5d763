//! Hazard stage classification.
//!
//! Maps a measured distance between the sensor and the water surface to a
//! discrete flood hazard stage. A smaller distance means higher water.

use serde::Serialize;

/// Distance boundaries (in centimeters) between hazard stages.
///
/// A reading strictly below a boundary falls into the more severe stage;
/// a reading exactly on a boundary belongs to the safer one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Below this distance the sensor is considered submerged.
    pub submerged_below: f64,
    /// Below this distance the stage is alert.
    pub alert_below: f64,
    /// Below this distance the stage is watch.
    pub watch_below: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            submerged_below: 50.0,
            alert_below: 100.0,
            watch_below: 200.0,
        }
    }
}

impl Thresholds {
    /// Classify a distance against these thresholds. First match wins.
    pub fn classify(&self, distance_cm: f64) -> HazardStage {
        if distance_cm < self.submerged_below {
            HazardStage::Submerged
        } else if distance_cm < self.alert_below {
            HazardStage::Alert
        } else if distance_cm < self.watch_below {
            HazardStage::Watch
        } else {
            HazardStage::Safe
        }
    }
}

/// Flood hazard stage, ordered from safest to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HazardStage {
    Safe,
    Watch,
    Alert,
    Submerged,
}

impl HazardStage {
    /// All stages, most severe first (legend order).
    pub const ALL: [HazardStage; 4] = [
        HazardStage::Submerged,
        HazardStage::Alert,
        HazardStage::Watch,
        HazardStage::Safe,
    ];

    /// Display color as a hex code.
    pub fn color(&self) -> &'static str {
        match self {
            HazardStage::Submerged => "#d32f2f",
            HazardStage::Alert => "#ed6c02",
            HazardStage::Watch => "#ffff00",
            HazardStage::Safe => "#82ca9d",
        }
    }

    /// Display color as an RGB triple.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            HazardStage::Submerged => (0xd3, 0x2f, 0x2f),
            HazardStage::Alert => (0xed, 0x6c, 0x02),
            HazardStage::Watch => (0xff, 0xff, 0x00),
            HazardStage::Safe => (0x82, 0xca, 0x9d),
        }
    }

    /// Short English label.
    pub fn label(&self) -> &'static str {
        match self {
            HazardStage::Submerged => "Submerged",
            HazardStage::Alert => "Alert",
            HazardStage::Watch => "Watch",
            HazardStage::Safe => "Safe",
        }
    }

    /// Label used on the sensor site's legend.
    pub fn local_label(&self) -> &'static str {
        match self {
            HazardStage::Submerged => "Tenggelam",
            HazardStage::Alert => "Waspada",
            HazardStage::Watch => "Siaga",
            HazardStage::Safe => "Aman",
        }
    }

    /// Returns a short symbol for compact display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HazardStage::Submerged => "SUB",
            HazardStage::Alert => "ALRT",
            HazardStage::Watch => "WTCH",
            HazardStage::Safe => "OK",
        }
    }
}

/// Classify a distance with the default thresholds.
pub fn classify(distance_cm: f64) -> HazardStage {
    Thresholds::default().classify(distance_cm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_safer_stage() {
        assert_eq!(classify(49.9), HazardStage::Submerged);
        assert_eq!(classify(50.0), HazardStage::Alert);
        assert_eq!(classify(99.9), HazardStage::Alert);
        assert_eq!(classify(100.0), HazardStage::Watch);
        assert_eq!(classify(199.9), HazardStage::Watch);
        assert_eq!(classify(200.0), HazardStage::Safe);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(0.0), HazardStage::Submerged);
        assert_eq!(classify(-5.0), HazardStage::Submerged);
        assert_eq!(classify(10_000.0), HazardStage::Safe);
        assert_eq!(classify(f64::INFINITY), HazardStage::Safe);
    }

    #[test]
    fn test_colors() {
        assert_eq!(classify(40.0).color(), "#d32f2f");
        assert_eq!(classify(75.0).color(), "#ed6c02");
        assert_eq!(classify(150.0).color(), "#ffff00");
        assert_eq!(classify(250.0).color(), "#82ca9d");
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            submerged_below: 10.0,
            alert_below: 20.0,
            watch_below: 30.0,
        };
        assert_eq!(thresholds.classify(15.0), HazardStage::Alert);
        assert_eq!(thresholds.classify(30.0), HazardStage::Safe);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(HazardStage::Submerged > HazardStage::Alert);
        assert!(HazardStage::Watch > HazardStage::Safe);
    }
}
