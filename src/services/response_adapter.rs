use crate::models::{
    AnalysisEnvelope, FoodItem, LegacyAnalysisResult, LegacyFoodItem, LegacyPortion,
};

/// Items below this confidence ask the user to confirm the result.
pub const CONFIRMATION_THRESHOLD: f64 = 0.7;

/// Flattens an envelope into the format the mobile app shipped with.
///
/// Totals are summed from the items; the model's own `total` is ignored
/// because its arithmetic isn't reliable.
pub fn to_legacy(envelope: &AnalysisEnvelope) -> LegacyAnalysisResult {
    let items = &envelope.items;

    let total_calories: u64 = items.iter().map(|item| u64::from(item.calories_kcal)).sum();
    let total_protein: f64 = items.iter().map(|item| item.macros.protein_g).sum();
    let total_carbs: f64 = items.iter().map(|item| item.macros.carbs_g).sum();
    let total_fat: f64 = items.iter().map(|item| item.macros.fat_g).sum();

    let needs_user_confirmation = !envelope.questions.is_empty()
        || items
            .iter()
            .any(|item| item.confidence < CONFIRMATION_THRESHOLD);

    let mut notes = Vec::with_capacity(envelope.questions.len() + 1);
    if !envelope.notes.is_empty() {
        notes.push(envelope.notes.clone());
    }
    notes.extend(envelope.questions.iter().cloned());

    LegacyAnalysisResult {
        items: items.iter().map(to_legacy_item).collect(),
        notes,
        needs_user_confirmation,
        total_calories,
        total_protein: round1(total_protein),
        total_carbs: round1(total_carbs),
        total_fat: round1(total_fat),
    }
}

/// The v2 format is the envelope itself.
pub fn to_v2(envelope: AnalysisEnvelope) -> AnalysisEnvelope {
    envelope
}

fn to_legacy_item(item: &FoodItem) -> LegacyFoodItem {
    LegacyFoodItem {
        label: item.name.clone(),
        aliases: Vec::new(),
        portion: LegacyPortion {
            estimate_g: item.quantity_estimate.grams,
            range_g: item.quantity_estimate.range_grams,
            basis: "visual",
        },
        confidence: item.confidence,
        food_id: None,
        calories: item.calories_kcal,
        protein: item.macros.protein_g,
        carbs: item.macros.carbs_g,
        fat: item.macros.fat_g,
    }
}

// Formatter rounds the exact binary value, ties to even
fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisTotal, Macros, QuantityEstimate};

    fn item(name: &str, calories: u32, macros: (f64, f64, f64), confidence: f64) -> FoodItem {
        FoodItem {
            name: name.to_string(),
            quantity_estimate: QuantityEstimate {
                grams: 150,
                range_grams: [120, 180],
            },
            calories_kcal: calories,
            macros: Macros {
                protein_g: macros.0,
                carbs_g: macros.1,
                fat_g: macros.2,
            },
            confidence,
        }
    }

    fn envelope(items: Vec<FoodItem>, questions: &[&str], notes: &str) -> AnalysisEnvelope {
        AnalysisEnvelope {
            items,
            total: AnalysisTotal::default(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn test_single_item_scenario() {
        let result = to_legacy(&envelope(vec![item("X", 250, (15.5, 30.0, 8.5), 0.85)], &[], ""));

        assert_eq!(result.total_calories, 250);
        assert_eq!(result.total_protein, 15.5);
        assert_eq!(result.total_carbs, 30.0);
        assert_eq!(result.total_fat, 8.5);
        assert!(!result.needs_user_confirmation);
        assert!(result.notes.is_empty());

        assert_eq!(result.items.len(), 1);
        let legacy = &result.items[0];
        assert_eq!(legacy.label, "X");
        assert_eq!(legacy.portion.estimate_g, 150);
        assert_eq!(legacy.portion.range_g, [120, 180]);
        assert_eq!(legacy.portion.basis, "visual");
        assert_eq!(legacy.confidence, 0.85);
        assert_eq!(legacy.food_id, None);
        assert!(legacy.aliases.is_empty());
        assert_eq!(legacy.calories, 250);
    }

    #[test]
    fn test_empty_envelope() {
        let result = to_legacy(&envelope(vec![], &[], ""));

        assert!(result.items.is_empty());
        assert_eq!(result.total_calories, 0);
        assert_eq!(result.total_protein, 0.0);
        assert_eq!(result.total_carbs, 0.0);
        assert_eq!(result.total_fat, 0.0);
        assert!(!result.needs_user_confirmation);
    }

    #[test]
    fn test_totals_are_summed_not_copied() {
        let mut env = envelope(
            vec![
                item("Pilav", 200, (4.1, 44.2, 0.4), 0.9),
                item("Kuru fasulye", 340, (19.3, 50.1, 8.0), 0.8),
                item("Cacık", 90, (4.0, 6.0, 5.2), 0.75),
            ],
            &[],
            "",
        );
        env.total = AnalysisTotal {
            calories_kcal: 9999.0,
            protein_g: 1.0,
            carbs_g: 1.0,
            fat_g: 1.0,
        };

        let result = to_legacy(&env);
        assert_eq!(result.total_calories, 630);
        assert_eq!(result.total_protein, 27.4);
        assert_eq!(result.total_carbs, 100.3);
        assert_eq!(result.total_fat, 13.6);
    }

    #[test]
    fn test_macro_totals_rounded_to_one_decimal() {
        let result = to_legacy(&envelope(
            vec![item("A", 10, (10.04, 1.11, 0.33), 0.9), item("B", 10, (10.03, 2.22, 0.33), 0.9)],
            &[],
            "",
        ));

        assert_eq!(result.total_protein, 20.1);
        assert_eq!(result.total_carbs, 3.3);
        assert_eq!(result.total_fat, 0.7);
        // per-item values stay unrounded
        assert_eq!(result.items[0].protein, 10.04);
    }

    #[test]
    fn test_macro_rounding_uses_exact_value() {
        // 0.35 is stored just below the half, 0.25 is an exact tie
        let result = to_legacy(&envelope(vec![item("Zeytin", 12, (0.35, 0.25, 2.675), 0.9)], &[], ""));

        assert_eq!(result.total_protein, 0.3);
        assert_eq!(result.total_carbs, 0.2);
        assert_eq!(result.total_fat, 2.7);
    }

    #[test]
    fn test_confidence_threshold() {
        let low = to_legacy(&envelope(
            vec![item("A", 100, (1.0, 1.0, 1.0), 0.95), item("B", 100, (1.0, 1.0, 1.0), 0.69)],
            &[],
            "",
        ));
        assert!(low.needs_user_confirmation);

        let at_threshold = to_legacy(&envelope(
            vec![item("A", 100, (1.0, 1.0, 1.0), 0.70), item("B", 100, (1.0, 1.0, 1.0), 0.70)],
            &[],
            "",
        ));
        assert!(!at_threshold.needs_user_confirmation);
    }

    #[test]
    fn test_questions_force_confirmation() {
        let result = to_legacy(&envelope(
            vec![item("Çay", 2, (0.0, 0.5, 0.0), 0.99)],
            &["Şeker eklendi mi?"],
            "",
        ));
        assert!(result.needs_user_confirmation);

        let no_items = to_legacy(&envelope(vec![], &["Tabakta ne var?"], ""));
        assert!(no_items.needs_user_confirmation);
    }

    #[test]
    fn test_notes_then_questions() {
        let result = to_legacy(&envelope(
            vec![],
            &["Porsiyon tam mı?", "Sos var mı?"],
            "Tabak kısmen görünüyor",
        ));

        assert_eq!(
            result.notes,
            vec!["Tabak kısmen görünüyor", "Porsiyon tam mı?", "Sos var mı?"]
        );
    }

    #[test]
    fn test_v2_is_identity() {
        let env = envelope(vec![item("X", 250, (15.5, 30.0, 8.5), 0.85)], &["?"], "not");
        assert_eq!(to_v2(env.clone()), env);
    }
}
