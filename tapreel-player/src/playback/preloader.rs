//! Preloader
//!
//! Opens one media element per playlist entry, attaches it hidden to the
//! surface, and waits until every clip can play through. All readiness
//! waits run concurrently and are aggregated by a counter; the whole
//! operation shares a single deadline.
//!
//! Priming (explicit load, play/pause warm-up) happens here and nowhere
//! else, driven by the [`Capabilities`] resolved at startup.

use crate::error::{Error, Result};
use crate::media::{MediaBackend, MediaEventSender, MediaOptions, MediaSlot, ReadyState};
use crate::playback::capabilities::Capabilities;
use crate::surface::{PresentationSurface, VisibilityFade};
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tapreel_common::events::{EventBus, PresentationEvent};
use tapreel_common::time;
use tracing::{debug, error, info, warn};

/// Drives every slot through Unloaded -> Loading -> Ready
pub struct Preloader {
    timeout: Duration,
    capabilities: Capabilities,
    events: EventBus,
}

impl Preloader {
    pub fn new(timeout: Duration, capabilities: Capabilities, events: EventBus) -> Self {
        Self {
            timeout,
            capabilities,
            events,
        }
    }

    /// Preload every locator
    ///
    /// Returns the slots in playlist order once all are Ready. Any single
    /// failure, or the deadline elapsing first, fails the whole operation;
    /// slots still loading at that point are marked Failed.
    pub async fn run(
        &self,
        locators: &[String],
        backend: &dyn MediaBackend,
        surface: &dyn PresentationSurface,
        media_events: MediaEventSender,
    ) -> Result<Vec<MediaSlot>> {
        if locators.is_empty() {
            return Err(Error::Config("playlist is empty".to_string()));
        }

        let total = locators.len();
        let priming = self.capabilities.priming;
        info!(
            "Preloading {} clips (timeout {}ms, priming {:?})",
            total,
            self.timeout.as_millis(),
            priming
        );

        let mut slots = Vec::with_capacity(total);
        for (index, locator) in locators.iter().enumerate() {
            let element = backend.open(
                index,
                locator,
                MediaOptions::for_slot(index),
                media_events.clone(),
            );
            let mut slot = MediaSlot::new(index, element);
            surface.attach(index, locator);
            surface.set_visibility(index, VisibilityFade::immediate(0.0));
            slot.mark_loading()?;
            if priming.forces_load() {
                slot.request_load();
            }
            slots.push(slot);
        }

        let mut pending: FuturesUnordered<_> = slots
            .iter()
            .map(|slot| {
                let index = slot.index();
                let element = slot.element();
                async move { (index, element.can_play_through().await) }
            })
            .collect();

        let mut ready = 0usize;
        let outcome = tokio::time::timeout(self.timeout, async {
            while let Some((index, result)) = pending.next().await {
                let slot = &mut slots[index];
                let result = match result {
                    Ok(()) => slot.prime(priming).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        slot.mark_ready()?;
                        ready += 1;
                        debug!(
                            "Clip {} ready ({}/{}): {}",
                            index,
                            ready,
                            total,
                            slot.source_locator()
                        );
                        self.events.emit_lossy(PresentationEvent::PreloadProgress {
                            ready,
                            total,
                            timestamp: time::now(),
                        });
                    }
                    Err(reason) => {
                        slot.mark_failed()?;
                        return Err(Error::LoadFailure {
                            index,
                            locator: slot.source_locator().to_string(),
                            reason,
                        });
                    }
                }
            }
            Ok::<(), Error>(())
        })
        .await;

        let failure = match outcome {
            Ok(Ok(())) => {
                info!("All {} clips ready", total);
                self.events.emit_lossy(PresentationEvent::PreloadComplete {
                    total,
                    timestamp: time::now(),
                });
                return Ok(slots);
            }
            Ok(Err(e)) => e,
            Err(_elapsed) => Error::LoadTimeout {
                ready,
                total,
                timeout_ms: self.timeout.as_millis() as u64,
            },
        };

        for slot in slots
            .iter_mut()
            .filter(|s| s.ready_state() == ReadyState::Loading)
        {
            if let Err(e) = slot.mark_failed() {
                warn!("Could not mark slot {} failed: {}", slot.index(), e);
            }
        }

        error!("Preload failed: {}", failure);
        self.events.emit_lossy(PresentationEvent::PreloadFailed {
            message: failure.to_string(),
            timestamp: time::now(),
        });
        Err(failure)
    }
}
