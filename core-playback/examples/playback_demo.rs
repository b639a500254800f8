//! # Playback Controller Example
//!
//! Drives the controller with a simulated media backend that "plays" silent
//! clips on a tokio timer, while two widgets share the same controller.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::logging::LogLevel;
use bridge_traits::media::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};
use core_playback::{PlaybackController, TrackView};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{CoreEvent, EventBus};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

// ============================================================================
// Simulated Media Backend (for demonstration)
// ============================================================================

const TICK: Duration = Duration::from_millis(200);

struct TimerResource {
    clip_secs: f64,
    sink: Arc<dyn MediaEventSink>,
    position: Arc<Mutex<f64>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerResource {
    fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait::async_trait]
impl MediaResource for TimerResource {
    async fn play(&self) -> BridgeResult<()> {
        // Pretend to buffer.
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.sink.emit(MediaEvent::Loaded {
            duration: Some(self.clip_secs),
        });

        let sink = Arc::clone(&self.sink);
        let position = Arc::clone(&self.position);
        let clip_secs = self.clip_secs;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let now = {
                    let mut position = position.lock();
                    *position += TICK.as_secs_f64();
                    *position
                };
                if now >= clip_secs {
                    sink.emit(MediaEvent::Ended);
                    break;
                }
                sink.emit(MediaEvent::TimeUpdate { position: now });
            }
        });

        if let Some(previous) = self.ticker.lock().replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.stop_ticker();
        Ok(())
    }

    fn seek(&self, position: f64) -> BridgeResult<()> {
        *self.position.lock() = position;
        Ok(())
    }

    fn release(&self) {
        self.stop_ticker();
    }
}

struct TimerBackend;

impl MediaBackend for TimerBackend {
    fn create(
        &self,
        uri: &str,
        sink: Arc<dyn MediaEventSink>,
    ) -> BridgeResult<Arc<dyn MediaResource>> {
        if !uri.starts_with("https://") {
            return Err(BridgeError::LoadFailed(format!("cannot fetch {}", uri)));
        }

        Ok(Arc::new(TimerResource {
            clip_secs: 2.0,
            sink,
            position: Arc::new(Mutex::new(0.0)),
            ticker: Mutex::new(None),
        }))
    }
}

// ============================================================================
// Main Demo
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let config = PlayerConfig::from_env()?;
    let events = EventBus::new(config.event_buffer_size);
    let mut feed = events.subscribe();
    tokio::spawn(async move {
        while let Ok(CoreEvent::Playback(event)) = feed.recv().await {
            println!("   event: {:?}", event);
        }
    });

    let controller = PlaybackController::with_event_bus(Arc::new(TimerBackend), config, events)?;

    let wren = controller.consumer(
        "rec-wren",
        "https://cdn.example/wren.mp3?sig=abc",
        Some("Eurasian Wren".to_string()),
    );
    let robin = controller.consumer("rec-robin", "https://cdn.example/robin.mp3", None);
    let broken = controller.consumer("rec-broken", "bad-uri", None);

    println!("Play wren: {}", wren.toggle().await);
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("Pause wren: {}", wren.toggle().await);
    println!("   wren={:?} robin={:?}", wren.view(), robin.view());

    println!("Switch to robin: {}", robin.toggle().await);
    println!("   wren={:?} robin={:?}", wren.view(), robin.view());

    controller.seek_forward(Some(1.0));
    println!("   position after seek: {:.1}s", controller.state().position);

    // Let the clip run out.
    let mut watcher = robin.clone();
    while robin.view() != TrackView::Inactive {
        watcher.changed().await;
    }
    println!("Robin finished; idle = {}", controller.state().is_idle());

    println!("Play broken track: {}", broken.toggle().await);
    println!("   error: {:?}", controller.state().error);

    controller.stop();
    println!("Stopped: {:?}", controller.state());

    // Give the event printer a moment to drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
