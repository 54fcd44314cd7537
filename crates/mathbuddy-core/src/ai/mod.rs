pub mod ollama;

pub use ollama::{ChatOptions, MathTutor, OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
