use crossterm::event::{Event as TermEvent, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal resized; the next draw picks up the new size
    Resize,
    Tick,
    /// Auto-reload timer fired
    Reload,
}

/// Merges terminal input, a UI tick and the auto-reload timer into one
/// channel read by the main loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, reload_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            let mut reload = tokio::time::interval(reload_interval);

            // The first reload tick fires immediately; data is already loading
            reload.tick().await;

            loop {
                let event = tokio::select! {
                    maybe_event = reader.next() => match maybe_event {
                        // Press only, so Windows does not report every key twice
                        Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Some(Ok(TermEvent::Resize(_, _))) => Event::Resize,
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break,
                    },
                    _ = tick.tick() => Event::Tick,
                    _ = reload.tick() => Event::Reload,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        EventHandler { rx }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::Tick)
    }
}
