pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::{App, Snapshot};
pub use theme::{resolve_theme, ThemeColors};

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::supply::CacheConfig;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

type PendingLoad = JoinHandle<Result<anyhow::Result<Snapshot>, tokio::time::error::Elapsed>>;

/// Load market data and compute everything the pages show, on a background task
fn spawn_load(config: &Config, cache_config: CacheConfig) -> PendingLoad {
    let config = config.clone();
    tokio::spawn(async move {
        tokio::time::timeout(LOAD_TIMEOUT, async move {
            let data = crate::load::load_market_data(&config, &cache_config).await?;
            Ok::<_, anyhow::Error>(Snapshot::build(data, &config.engine()))
        })
        .await
    })
}

pub async fn run_tui(mut app: App) -> anyhow::Result<()> {
    // Buffer log output while the TUI is active to keep it off the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let reload_every = Duration::from_secs(app.config.auto_refresh_interval.max(1));
    let mut events = EventHandler::new(Duration::from_millis(250), reload_every);

    let mut pending_load: Option<PendingLoad> = Some(spawn_load(&app.config, app.cache_config.clone()));
    app.is_loading = true;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = std::time::Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Resize => {}
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Reload => {
                app.needs_refresh = true;
            }
        }

        // Check if background load has completed
        if pending_load.as_ref().is_some_and(|h| h.is_finished()) {
            let Some(handle) = pending_load.take() else {
                continue;
            };
            match handle.await {
                Ok(Ok(Ok(snapshot))) => app.update_snapshot(snapshot),
                Ok(Ok(Err(e))) => app.show_flash(format!("Failed to reload: {:#}", e)),
                Ok(Err(_elapsed)) => app.show_flash(format!(
                    "Reload timed out ({}s). Will retry on next reload.",
                    LOAD_TIMEOUT.as_secs()
                )),
                Err(e) => app.show_flash(format!("Failed to reload: task panicked: {}", e)),
            }
            app.is_loading = false;
        }

        // Spawn a reload if one is due and none is running
        if app.needs_refresh && pending_load.is_none() {
            let is_manual = app.force_refresh;
            let modal_open = app.input_mode != app::InputMode::Normal;
            let recent_interaction = app.last_interaction.elapsed() < Duration::from_secs(10);

            // Auto reloads wait until the user is idle and no popup is open.
            // Manual reloads go right away and skip the cache.
            if is_manual || (!modal_open && !recent_interaction) {
                app.needs_refresh = false;
                let mut cache_config = app.cache_config.clone();
                if is_manual {
                    cache_config.enabled = false;
                    app.force_refresh = false;
                }
                pending_load = Some(spawn_load(&app.config, cache_config));
                app.is_loading = true;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    ratatui::restore();

    // Flush buffered log lines now that the terminal is restored
    for line in crate::stderr_buffer::drain() {
        eprint!("{}", line);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.should_quit = true
            }

            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),

            KeyCode::Tab => app.next_page(),
            KeyCode::BackTab => app.previous_page(),

            KeyCode::Char('p') => app.toggle_data_view(),

            KeyCode::Char('r') => {
                app.needs_refresh = true;
                app.force_refresh = true;
                app.show_flash("Reloading (fresh data)...".to_string());
            }

            KeyCode::Char('?') => app.show_help(),
            KeyCode::Char('b') => app.show_score_breakdown(),

            _ => {}
        },
        app::InputMode::ScoreBreakdown => match key.code {
            KeyCode::Esc | KeyCode::Char('b') => app.dismiss_score_breakdown(),
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            _ => {}
        },
        // Any key exits help
        app::InputMode::Help => app.dismiss_help(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new_loading(Config::default(), CacheConfig::default(), ThemeColors::dark())
    }

    #[test]
    fn test_tab_keys_switch_pages() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Tab));
        assert_eq!(app.page, app::Page::Metrics);
        handle_key_event(&mut app, press(KeyCode::BackTab));
        handle_key_event(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.page, app::Page::Data);
    }

    #[test]
    fn test_reload_key_forces_fresh_data() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert!(app.needs_refresh);
        assert!(app.force_refresh);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Char('?')));
        assert_eq!(app.input_mode, app::InputMode::Help);
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert_eq!(app.input_mode, app::InputMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        let mut key = press(KeyCode::Char('c'));
        key.modifiers = KeyModifiers::CONTROL;
        handle_key_event(&mut app, key);
        assert!(app.should_quit);
    }
}
