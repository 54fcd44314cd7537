use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{error, info};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use mathbuddy_core::state::connection_fallback;
use mathbuddy_core::{
    render_svg, ChatSession, Config, MathTutor, OllamaClient, Plot, SvgOptions, TypesetEngine,
    Typesetter,
};

use crate::markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    // In-flight tutor reply
    pub query_task: Option<JoinHandle<String>>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Plot pane
    pub show_plot: bool,
    pub plot: Option<Plot>,
    pub exported_plots: usize,

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    /// One-line notice shown in the footer until the next key press.
    pub status: Option<String>,

    pub tutor: MathTutor,
    pub typesetter: TypesetEngine,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let url = config.ollama_url();
        let client = OllamaClient::with_timeout(&url, config.request_timeout())?;
        let tutor = MathTutor::new(client, config.model(), config.chat_options());
        info!("Using Ollama at {} with model {}", url, tutor.model());

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session: ChatSession::new(),

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            query_task: None,
            animation_frame: 0,

            show_plot: true,
            plot: None,
            exported_plots: 0,

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),

            status: None,

            tutor,
            typesetter: TypesetEngine::default(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    /// Send the input box contents to the tutor. Ignored while a reply is
    /// pending or when the input is blank.
    pub fn submit(&mut self) {
        let Some(history) = self.session.begin_turn(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.input_mode = InputMode::Normal;
        self.animation_frame = 0;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_to_bottom();

        let tutor = self.tutor.clone();
        self.query_task = Some(tokio::spawn(async move { tutor.respond(&history).await }));
    }

    /// Collect the reply if the background task has finished.
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            match task.await {
                Ok(reply) => self.finish_turn(&reply),
                Err(e) => {
                    error!("Tutor task failed: {}", e);
                    self.session.fail_turn(connection_fallback(self.tutor.model()));
                }
            }
            self.input_mode = InputMode::Editing;
            self.scroll_to_bottom();
        }
    }

    fn finish_turn(&mut self, reply: &str) {
        self.session.complete_turn(reply);

        let latest = self
            .session
            .messages()
            .last()
            .and_then(|msg| Plot::for_message(&msg.text));
        if let Some(plot) = latest {
            info!("Attached {} plot to reply", plot.title().to_lowercase());
            self.plot = Some(plot);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Lines the chat pane needs at the current width, including the
    /// "Thinking..." indicator while a reply is pending.
    pub fn chat_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;
        for msg in self.session.messages() {
            total_lines += 1; // "You:" or "Tutor:"
            total_lines += markup::wrapped_height(&self.typesetter.typeset(&msg.text), wrap_width);
            total_lines += 1; // blank line after message
        }

        if self.is_busy() {
            total_lines += 2; // "Tutor:" + "Thinking..."
        }

        total_lines.min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_line_count().saturating_sub(visible_height)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn toggle_plot(&mut self) {
        self.show_plot = !self.show_plot;
    }

    /// Write the current plot as `mathbuddy-plot-<n>.svg` inside `dir`.
    pub fn export_plot(&mut self, dir: &Path) -> Result<PathBuf> {
        let plot = self
            .plot
            .as_ref()
            .ok_or_else(|| anyhow!("No plot to export yet"))?;

        let path = dir.join(format!("mathbuddy-plot-{}.svg", self.exported_plots + 1));
        fs::write(&path, render_svg(plot, &SvgOptions::default()))?;
        self.exported_plots += 1;

        info!("Exported plot to {}", path.display());
        Ok(path)
    }

    // Model picker methods
    pub fn open_model_picker(&mut self, models: Vec<String>) {
        if models.is_empty() {
            self.status = Some("No models found. Pull one with: ollama pull qwen3".to_string());
            return;
        }

        // Select current model if in list, otherwise first
        let current_idx = models
            .iter()
            .position(|m| m == self.tutor.model())
            .unwrap_or(0);
        self.available_models = models;
        self.model_picker_state.select(Some(current_idx));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Switch to the highlighted model. Returns the model name so the
    /// caller can persist it.
    pub fn select_model(&mut self) -> Option<String> {
        let model = self
            .model_picker_state
            .selected()
            .and_then(|i| self.available_models.get(i))
            .cloned()?;

        self.tutor.set_model(model.clone());
        self.show_model_picker = false;
        info!("Switched model to {}", model);
        Some(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn app() -> App {
        let config = Config {
            ollama_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::default()
        };
        App::new(&config).unwrap()
    }

    #[test]
    fn test_new_app_shows_greeting() {
        let app = app();
        assert_eq!(app.session.messages().len(), 1);
        assert!(!app.is_busy());
        assert_eq!(app.tutor.model(), "qwen3");
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut app = app();
        app.input = "   ".to_string();
        app.submit();
        assert!(app.query_task.is_none());
        assert_eq!(app.session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_starts_turn_and_clears_input() {
        let mut app = app();
        app.input = "solve 2x+3y=6".to_string();
        app.cursor = app.input.chars().count();
        app.submit();

        assert!(app.is_busy());
        assert!(app.query_task.is_some());
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.session.messages()[1].text, "solve \\(2x+3y=6\\)");

        // A second submission while busy changes nothing
        app.input = "another".to_string();
        app.submit();
        assert_eq!(app.input, "another");
        assert_eq!(app.session.history().len(), 1);

        if let Some(task) = app.query_task.take() {
            task.abort();
        }
    }

    #[test]
    fn test_finish_turn_attaches_plot() {
        let mut app = app();
        app.input = "help me graph a line".to_string();
        app.submit_without_spawn();
        app.finish_turn("Try graphing 2x+3y=6. What is the slope?");

        assert!(!app.is_busy());
        assert!(matches!(app.plot, Some(Plot::Lines(_))));

        // A later reply without math keeps the previous plot
        app.input = "ok".to_string();
        app.submit_without_spawn();
        app.finish_turn("What do you notice?");
        assert!(app.plot.is_some());
    }

    #[test]
    fn test_export_plot_numbers_files() {
        let dir = tempdir().unwrap();
        let mut app = app();
        assert!(app.export_plot(dir.path()).is_err());

        app.plot = Some(Plot::from_equations(&["vector A = (3, 4)".to_string()]));
        let first = app.export_plot(dir.path()).unwrap();
        let second = app.export_plot(dir.path()).unwrap();
        assert_eq!(first.file_name().unwrap(), "mathbuddy-plot-1.svg");
        assert_eq!(second.file_name().unwrap(), "mathbuddy-plot-2.svg");

        let svg = fs::read_to_string(first).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn test_model_picker_selects_current_model() {
        let mut app = app();
        app.open_model_picker(vec!["llama3.2".to_string(), "qwen3".to_string()]);
        assert!(app.show_model_picker);
        assert_eq!(app.model_picker_state.selected(), Some(1));

        app.model_picker_nav_up();
        assert_eq!(app.select_model(), Some("llama3.2".to_string()));
        assert_eq!(app.tutor.model(), "llama3.2");
        assert!(!app.show_model_picker);
    }

    #[test]
    fn test_empty_model_list_sets_status() {
        let mut app = app();
        app.open_model_picker(Vec::new());
        assert!(!app.show_model_picker);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app();
        app.chat_height = 5;
        app.chat_width = 80;
        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 0);
        app.scroll_up(3);
        assert_eq!(app.chat_scroll, 0);
    }

    impl App {
        /// Start a turn the way `submit` does, without a runtime.
        fn submit_without_spawn(&mut self) {
            let input = std::mem::take(&mut self.input);
            self.session.begin_turn(&input);
        }
    }
}
