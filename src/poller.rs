//! Periodic capture service feeding decoded frames to a display sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::raster::{RawFrame, Raster, Rgb, Theme, decode};
use crate::scope::{Acquirer, ScopeChannel};

/// One successfully captured and decoded screen.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub raw: RawFrame,
    pub raster: Raster,
    pub theme: Theme,
    pub captured_at: DateTime<Local>,
}

/// What the poller reports after each tick.
#[derive(Debug)]
pub enum PollEvent {
    Frame(Box<CapturedFrame>),
    /// The capture failed; the display keeps its previous image.
    Missed { error: String, resynced: bool },
}

/// Counters accumulated over a polling session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    pub frames: usize,
    pub missed: usize,
    pub resyncs: usize,
}

impl PollStats {
    /// Get summary message.
    pub fn summary(&self) -> String {
        format!(
            "Frames: {}, Missed: {}, Resyncs: {}",
            self.frames, self.missed, self.resyncs
        )
    }
}

/// Handle for switching the palette while the poller runs.
#[derive(Debug, Clone)]
pub struct ThemeControl {
    tx: Arc<watch::Sender<Theme>>,
}

impl ThemeControl {
    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    pub fn set(&self, theme: Theme) {
        self.tx.send_replace(theme);
    }

    /// Advance to the next theme and return it.
    pub fn cycle(&self) -> Theme {
        self.tx.send_modify(|theme| *theme = theme.next());
        self.current()
    }
}

/// Capture failure as seen from the blocking task.
struct Missed {
    error: AppError,
    resynced: bool,
}

/// Polls the scope on a fixed period with at most one capture in flight.
///
/// The channel sits behind a mutex and is only touched from
/// `spawn_blocking`, so the async runtime never stalls on the serial line.
pub struct ScopePoller<C> {
    channel: Arc<Mutex<C>>,
    acquirer: Acquirer,
    interval: Duration,
    theme: watch::Receiver<Theme>,
    theme_tx: Arc<watch::Sender<Theme>>,
    raster: Raster,
}

impl<C: ScopeChannel + Send + 'static> ScopePoller<C> {
    /// Create a poller owning `channel`.
    ///
    /// `background` pre-fills the output raster before the first decode.
    pub fn new(channel: C, acquirer: Acquirer, interval: Duration, theme: Theme, background: Rgb) -> Self {
        let (theme_tx, theme_rx) = watch::channel(theme);
        Self {
            channel: Arc::new(Mutex::new(channel)),
            acquirer,
            interval,
            theme: theme_rx,
            theme_tx: Arc::new(theme_tx),
            raster: Raster::filled(background),
        }
    }

    pub fn theme_control(&self) -> ThemeControl {
        ThemeControl {
            tx: Arc::clone(&self.theme_tx),
        }
    }

    /// Capture and decode a single frame.
    pub async fn capture_once(&mut self) -> Result<CapturedFrame> {
        self.capture().await.map_err(|missed| missed.error)
    }

    /// Poll until the event receiver is dropped.
    ///
    /// Recoverable capture failures are reported as [`PollEvent::Missed`]
    /// and polling continues on the next tick.
    pub async fn run(mut self, events: mpsc::Sender<PollEvent>) -> Result<PollStats> {
        info!("Polling scope every {:?}", self.interval);
        let mut stats = PollStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let event = match self.capture().await {
                Ok(frame) => {
                    stats.frames += 1;
                    PollEvent::Frame(Box::new(frame))
                }
                Err(Missed { error, resynced }) if error.is_recoverable() => {
                    warn!("Capture missed: {error}");
                    stats.missed += 1;
                    if resynced {
                        stats.resyncs += 1;
                    }
                    PollEvent::Missed {
                        error: error.to_string(),
                        resynced,
                    }
                }
                Err(Missed { error, .. }) => return Err(error),
            };

            if events.send(event).await.is_err() {
                info!("Display sink closed, stopping poller ({})", stats.summary());
                return Ok(stats);
            }
        }
    }

    async fn capture(&mut self) -> std::result::Result<CapturedFrame, Missed> {
        let channel = Arc::clone(&self.channel);
        let acquirer = self.acquirer;

        let raw = tokio::task::spawn_blocking(move || {
            let mut guard = channel.lock().map_err(|_| Missed {
                error: AppError::TaskFailed("serial channel lock poisoned".to_string()),
                resynced: false,
            })?;

            acquirer.acquire(&mut *guard).map_err(|e| {
                let resynced = e.needs_resync()
                    && match acquirer.resync(&mut *guard) {
                        Ok(_) => true,
                        Err(resync_err) => {
                            warn!("Resync failed: {resync_err}");
                            false
                        }
                    };
                Missed {
                    error: e.into(),
                    resynced,
                }
            })
        })
        .await
        .map_err(|e| Missed {
            error: AppError::TaskFailed(e.to_string()),
            resynced: false,
        })??;

        let theme = *self.theme.borrow_and_update();
        decode(&raw, theme.palette(), &mut self.raster);
        debug!("Decoded frame with {theme} palette");

        Ok(CapturedFrame {
            raw,
            raster: self.raster.clone(),
            theme,
            captured_at: Local::now(),
        })
    }
}
