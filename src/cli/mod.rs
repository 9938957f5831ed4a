//! Terminal dashboard (Ratatui + Crossterm)
//! - Talks to the server over HTTP
//! - Follows the realtime stream so every open terminal shows the same view

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::info;

pub mod api;
pub mod events;
pub mod input;
pub mod state;
pub mod ui;
pub mod util;

const TICK: Duration = Duration::from_millis(200);

pub async fn run(server_url: &str) -> Result<()> {
    let client = api::Client::new(server_url)?;
    let mut app = state::App::new(client.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = events::spawn_listener(client, tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The stream also delivers a snapshot, but don't leave the screen empty
    // if it is slow to connect.
    app.refresh().await;
    info!(server = %server_url, "terminal dashboard started");

    let result = event_loop(&mut terminal, &mut app, &mut rx).await;

    listener.abort();
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut state::App,
    rx: &mut mpsc::UnboundedReceiver<events::Update>,
) -> Result<()> {
    loop {
        while let Ok(update) = rx.try_recv() {
            app.apply_update(update);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        // crossterm polling blocks; keep it off the runtime threads
        let key = tokio::task::block_in_place(|| -> Result<Option<Event>> {
            if event::poll(TICK)? {
                Ok(Some(event::read()?))
            } else {
                Ok(None)
            }
        })?;

        if let Some(Event::Key(key)) = key {
            app.handle_key(key).await?;
        }

        if app.quit {
            return Ok(());
        }
    }
}
