//! Emotion labels and result aggregation.
//!
//! The classifier emits one probability per label in the order of
//! [`Emotion::ALL`]. That order is fixed at training time; changing it here
//! silently mislabels every prediction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::AnalysisError;

/// Emotion classes the model was trained on.
///
/// Variant order is significant: it matches the model's output order and
/// breaks ties in [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Happy,
    Neutral,
    Sad,
}

impl Emotion {
    /// All labels in model output order
    pub const ALL: [Emotion; 4] = [Emotion::Angry, Emotion::Happy, Emotion::Neutral, Emotion::Sad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angry => "Angry",
            Self::Happy => "Happy",
            Self::Neutral => "Neutral",
            Self::Sad => "Sad",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label-to-probability mapping, serialized as a flat JSON object
pub type Probabilities = BTreeMap<Emotion, f32>;

/// Result of classifying one piece of audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub detected_emotion: Emotion,
    pub probabilities: Probabilities,
}

impl AnalysisOutcome {
    /// Probability assigned to the detected label
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .get(&self.detected_emotion)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Pair model output with labels and pick the most likely one.
///
/// Ties go to the label declared first.
pub fn aggregate(probabilities: &[f32]) -> Result<AnalysisOutcome, AnalysisError> {
    if probabilities.len() != Emotion::ALL.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: Emotion::ALL.len(),
            actual: probabilities.len(),
        });
    }

    let mut best = 0;
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        // Strict comparison keeps the first maximum
        if p > probabilities[best] {
            best = i;
        }
    }

    let probabilities = Emotion::ALL
        .iter()
        .copied()
        .zip(probabilities.iter().copied())
        .collect();

    Ok(AnalysisOutcome {
        detected_emotion: Emotion::ALL[best],
        probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aggregate_picks_max() {
        let outcome = aggregate(&[0.1, 0.2, 0.6, 0.1]).unwrap();
        assert_eq!(outcome.detected_emotion, Emotion::Neutral);
        assert_eq!(outcome.probabilities.len(), 4);
        assert!((outcome.confidence() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_tie_prefers_declared_order() {
        let outcome = aggregate(&[0.1, 0.4, 0.1, 0.4]).unwrap();
        assert_eq!(outcome.detected_emotion, Emotion::Happy);

        let outcome = aggregate(&[0.25, 0.25, 0.25, 0.25]).unwrap();
        assert_eq!(outcome.detected_emotion, Emotion::Angry);
    }

    #[test]
    fn test_aggregate_wrong_length() {
        let result = aggregate(&[0.5, 0.5]);
        assert!(matches!(
            result,
            Err(AnalysisError::ShapeMismatch {
                expected: 4,
                actual: 2
            })
        ));

        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn test_probabilities_serialize_as_flat_object() {
        let outcome = aggregate(&[0.7, 0.1, 0.1, 0.1]).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["detected_emotion"], "Angry");
        let probs = json["probabilities"].as_object().unwrap();
        let keys: Vec<&str> = probs.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 4);
        for label in ["Angry", "Happy", "Neutral", "Sad"] {
            assert!(keys.contains(&label), "missing {}", label);
        }
    }

    proptest! {
        #[test]
        fn prop_aggregate_returns_first_max(probs in prop::array::uniform4(0.0f32..1.0)) {
            let outcome = aggregate(&probs).unwrap();
            let idx = Emotion::ALL
                .iter()
                .position(|e| *e == outcome.detected_emotion)
                .unwrap();

            // Nothing earlier is >= the winner, nothing later is greater
            for (i, &p) in probs.iter().enumerate() {
                if i < idx {
                    prop_assert!(p < probs[idx]);
                } else {
                    prop_assert!(p <= probs[idx]);
                }
            }
        }
    }
}
