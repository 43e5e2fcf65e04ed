// Prompts for the food photo analysis request

/// Fixed instruction: JSON only, documented schema, empty items when no food.
pub const FOOD_ANALYSIS_SYSTEM_PROMPT: &str = r#"Sen bir yemek ve besin değeri analiz uzmanısın. Fotoğraftaki yiyecekleri incele ve SADECE JSON ile yanıt ver.

KURALLAR:
1. Yanıt yalnızca geçerli JSON olmalı, JSON dışında hiçbir metin yazma
2. Fotoğrafta yiyecek yoksa "items": [] döndür
3. Porsiyonu görsel ipuçlarından tahmin et (tabak boyutu, çatal/kaşık, el vb.)
4. "confidence" değeri 0.0 ile 1.0 arasında olmalı
5. Yemek isimlerini kullanıcının diline göre yaz
6. Emin olmadığın bir şey varsa "questions" listesine kısa bir soru ekle

JSON ŞEMASI:
{
  "items": [
    {
      "name": "Yemek adı",
      "quantity_estimate": {
        "grams": 150,
        "range_grams": [120, 180]
      },
      "calories_kcal": 250,
      "macros": {
        "protein_g": 15.5,
        "carbs_g": 30.0,
        "fat_g": 8.5
      },
      "confidence": 0.85
    }
  ],
  "total": {
    "calories_kcal": 250,
    "protein_g": 15.5,
    "carbs_g": 30.0,
    "fat_g": 8.5
  },
  "questions": [],
  "notes": "Varsa kısa not"
}"#;

/// User turn text. The locale decides the language of names and notes.
pub fn food_analysis_user_prompt(locale: &str) -> String {
    format!(
        "Bu fotoğraftaki yiyecekleri analiz et. Locale: {}\n\n\
         Her yiyeceği ayrı ayrı tespit et, porsiyonunu görsel ipuçlarından belirle \
         ve besin değerlerini tahmin et.\n\
         Kesinlikle şemaya uygun JSON formatında yanıt ver.",
        locale
    )
}
