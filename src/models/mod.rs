use serde::{Deserialize, Deserializer, Serialize};

/// Varsayılan locale (frontend Türkçe başlıyor)
pub const DEFAULT_LOCALE: &str = "tr-TR";

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeFoodRequest {
    pub image_base64: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityEstimate {
    #[serde(deserialize_with = "whole_number")]
    pub grams: u32,
    #[serde(deserialize_with = "whole_number_pair")]
    pub range_grams: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// One detected food, as estimated by the vision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub quantity_estimate: QuantityEstimate,
    #[serde(deserialize_with = "whole_number")]
    pub calories_kcal: u32,
    pub macros: Macros,
    pub confidence: f64,
}

/// Totals as reported by the model. Not trusted for the legacy format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisTotal {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Parsed model reply. Also the v2 response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    pub items: Vec<FoodItem>,
    #[serde(default)]
    pub total: AnalysisTotal,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl AnalysisEnvelope {
    /// Range checks serde can't express. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        for (index, item) in self.items.iter().enumerate() {
            if !item.confidence.is_finite() || !(0.0..=1.0).contains(&item.confidence) {
                return Err(format!(
                    "items[{}].confidence out of range: {}",
                    index, item.confidence
                ));
            }

            let macros = [
                ("protein_g", item.macros.protein_g),
                ("carbs_g", item.macros.carbs_g),
                ("fat_g", item.macros.fat_g),
            ];
            for (field, value) in macros {
                if !value.is_finite() || value < 0.0 {
                    return Err(format!("items[{}].macros.{} invalid: {}", index, field, value));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyPortion {
    pub estimate_g: u32,
    pub range_g: [u32; 2],
    pub basis: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyFoodItem {
    pub label: String,
    pub aliases: Vec<String>,
    pub portion: LegacyPortion,
    pub confidence: f64,
    pub food_id: Option<String>,  // Veritabanından gelmiyor, hep null
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Flat, frontend-compatible response of `POST /api/food/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyAnalysisResult {
    pub items: Vec<LegacyFoodItem>,
    pub notes: Vec<String>,
    pub needs_user_confirmation: bool,
    pub total_calories: u64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

// Models sometimes answer `250.0` for integer fields; accept any non-negative number.
fn to_whole(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
        Some(value.trunc() as u32)
    } else {
        None
    }
}

fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    to_whole(value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a non-negative whole number, got {}", value))
    })
}

fn whole_number_pair<'de, D>(deserializer: D) -> Result<[u32; 2], D::Error>
where
    D: Deserializer<'de>,
{
    let [low, high] = <[f64; 2]>::deserialize(deserializer)?;
    match (to_whole(low), to_whole(high)) {
        (Some(low), Some(high)) => Ok([low, high]),
        _ => Err(serde::de::Error::custom(format!(
            "expected a pair of non-negative whole numbers, got [{}, {}]",
            low, high
        ))),
    }
}
