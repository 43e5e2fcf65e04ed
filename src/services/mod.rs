pub mod ai_service; // vision backend trait
pub mod food_analyzer;
pub mod image_prep;
pub mod openai_vision; // OpenAI-compatible chat completions
pub mod prompts;
pub mod response_adapter;

pub use ai_service::VisionBackend;
pub use food_analyzer::{FoodAnalyzer, ModelPair};
pub use openai_vision::OpenAiVisionService;
