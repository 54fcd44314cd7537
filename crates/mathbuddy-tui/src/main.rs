mod app;
mod handler;
mod markup;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};

use anyhow::Result;
use log::{info, warn};

use mathbuddy_core::Config;

use crate::app::App;
use crate::tui::EventHandler;

/// Log to `<cache_dir>/mathbuddy/mathbuddy.log`; the terminal belongs to the UI.
/// Logging stays off if the file can't be opened.
fn init_logger() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("mathbuddy")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }

    if let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mathbuddy.log"))
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {}", e);
        Config::new()
    });
    let mut app = App::new(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    app.typesetter.init();

    let result = run(&mut app, &mut terminal).await;

    app.typesetter.shutdown();
    tui::restore()?;
    info!("Exiting");

    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        app.poll_query().await;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    if let Some(task) = app.query_task.take() {
        task.abort();
    }

    Ok(())
}
