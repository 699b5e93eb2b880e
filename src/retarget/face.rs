//! Blendshape category → expression channel mapping.

use crate::avatar::{ExpressionChannels, ExpressionPreset};
use crate::landmarks::FaceRecord;

/// Face landmarker category → avatar expression. Both smile sides drive
/// `happy`; the later category in a frame wins.
pub const FACE_EXPRESSION_MAP: &[(&str, ExpressionPreset)] = &[
    ("eyeBlinkLeft", ExpressionPreset::BlinkLeft),
    ("eyeBlinkRight", ExpressionPreset::BlinkRight),
    ("jawOpen", ExpressionPreset::Aa),
    ("mouthPucker", ExpressionPreset::Ou),
    ("mouthShrugUpper", ExpressionPreset::Ee),
    ("mouthSmileLeft", ExpressionPreset::Happy),
    ("mouthSmileRight", ExpressionPreset::Happy),
];

/// Expression driven by a blendshape category, if any.
pub fn expression_for_category(category: &str) -> Option<ExpressionPreset> {
    FACE_EXPRESSION_MAP
        .iter()
        .find(|(name, _)| *name == category)
        .map(|&(_, preset)| preset)
}

/// Write raw category scores onto mapped expression channels.
///
/// Channels without a mapped category in this frame keep their weight.
pub fn apply_face(face: &FaceRecord, expressions: &mut dyn ExpressionChannels) {
    for category in &face.categories {
        let Some(preset) = expression_for_category(&category.category_name) else {
            continue;
        };

        if !expressions.set_weight(preset, category.score) {
            tracing::trace!("Avatar has no '{}' expression", preset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::ExpressionSet;
    use crate::landmarks::BlendshapeCategory;

    fn face(categories: &[(&str, f32)]) -> FaceRecord {
        FaceRecord {
            categories: categories
                .iter()
                .map(|&(name, score)| BlendshapeCategory::new(name, score))
                .collect(),
        }
    }

    #[test]
    fn test_mapping_table() {
        assert_eq!(
            expression_for_category("eyeBlinkLeft"),
            Some(ExpressionPreset::BlinkLeft)
        );
        assert_eq!(expression_for_category("jawOpen"), Some(ExpressionPreset::Aa));
        assert_eq!(expression_for_category("mouthPucker"), Some(ExpressionPreset::Ou));
        assert_eq!(
            expression_for_category("mouthSmileRight"),
            Some(ExpressionPreset::Happy)
        );
        assert_eq!(expression_for_category("browInnerUp"), None);
        assert_eq!(expression_for_category(""), None);
    }

    #[test]
    fn test_scores_copied_without_scaling() {
        let mut set = ExpressionSet::new(ExpressionPreset::ALL);
        apply_face(
            &face(&[("jawOpen", 0.42), ("eyeBlinkRight", 1.0), ("cheekPuff", 0.9)]),
            &mut set,
        );

        assert_eq!(set.weight(ExpressionPreset::Aa), Some(0.42));
        assert_eq!(set.weight(ExpressionPreset::BlinkRight), Some(1.0));
        assert_eq!(set.weight(ExpressionPreset::BlinkLeft), Some(0.0));
    }

    #[test]
    fn test_last_smile_wins() {
        let mut set = ExpressionSet::new(ExpressionPreset::ALL);
        apply_face(
            &face(&[("mouthSmileLeft", 0.8), ("mouthSmileRight", 0.3)]),
            &mut set,
        );
        assert_eq!(set.weight(ExpressionPreset::Happy), Some(0.3));

        apply_face(
            &face(&[("mouthSmileRight", 0.3), ("mouthSmileLeft", 0.8)]),
            &mut set,
        );
        assert_eq!(set.weight(ExpressionPreset::Happy), Some(0.8));
    }

    #[test]
    fn test_missing_channel_is_skipped() {
        let mut set = ExpressionSet::new([ExpressionPreset::Aa]);
        apply_face(&face(&[("eyeBlinkLeft", 0.5), ("jawOpen", 0.25)]), &mut set);

        assert_eq!(set.weight(ExpressionPreset::BlinkLeft), None);
        assert_eq!(set.weight(ExpressionPreset::Aa), Some(0.25));
    }
}
