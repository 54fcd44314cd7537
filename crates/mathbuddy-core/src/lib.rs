pub mod ai;
pub mod config;
pub mod equations;
pub mod latex;
pub mod plot;
pub mod sanitize;
pub mod state;
pub mod typeset;

// Re-export main types for convenience
pub use ai::{ChatOptions, MathTutor, OllamaClient};
pub use config::Config;
pub use plot::{render_svg, Plot, SvgOptions};
pub use sanitize::clean_model_response;
pub use state::{ChatMessage, ChatRole, ChatSession, DisplayMessage};
pub use typeset::{TypesetEngine, Typesetter};
