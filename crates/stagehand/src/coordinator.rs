//! Per-purpose capture sessions with generation-fenced polling.
//!
//! Each purpose (melody, chords) owns one slot holding a monotonically
//! increasing generation counter and at most one live poll task. Starting a
//! new capture bumps the generation and aborts the old task; every emission
//! inside a poll task re-checks its captured generation first, so a task
//! that lost the race can never mutate state or speak on the event channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use croonproto::{Note, SessionDefaults};

use crate::bridge::BridgeClient;

/// What the captured notes are for. Sessions of different purposes are
/// independent; they share the bridge's single capture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapturePurpose {
    Melody,
    Chords,
}

impl CapturePurpose {
    /// Free-form hint relayed to the host with the start signal.
    pub fn hint(&self) -> &'static str {
        match self {
            CapturePurpose::Melody => "melody-capture",
            CapturePurpose::Chords => "chord-capture",
        }
    }
}

/// Polling behavior for a capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Delay between consecutive result reads
    pub poll_interval: Duration,
    /// Total reads before the session times out
    pub attempt_budget: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            attempt_budget: 8,
        }
    }
}

impl CaptureConfig {
    /// Create config with custom poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create config with custom attempt budget
    pub fn with_attempt_budget(mut self, budget: u32) -> Self {
        self.attempt_budget = budget;
        self
    }

    /// Build from the `[capture]` config section.
    pub fn from_config(config: &croonconf::CaptureConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            attempt_budget: config.attempt_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    /// The arm request itself failed; the session never entered polling.
    #[error("failed to arm capture: {0}")]
    ArmFailure(String),

    /// The attempt budget ran out with nothing in the capture slot.
    #[error("no capture data after {attempts} polls")]
    Timeout { attempts: u32 },
}

/// Session lifecycle events, delivered on the channel handed out by
/// [`Coordinator::new`].
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A poll came back empty; `remaining` reads are left in the budget.
    Waiting {
        purpose: CapturePurpose,
        remaining: u32,
    },
    /// The capture slot filled. The session is destroyed.
    Completed {
        purpose: CapturePurpose,
        full_track: Vec<Note>,
        added_notes: Vec<Note>,
    },
    /// The session ended without data.
    Failed {
        purpose: CapturePurpose,
        error: CaptureError,
    },
}

struct SessionSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            generation: 0,
            task: None,
        }
    }

    /// Invalidate whatever is running against this slot.
    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation
    }
}

struct Slots {
    melody: SessionSlot,
    chords: SessionSlot,
}

impl Slots {
    fn slot_mut(&mut self, purpose: CapturePurpose) -> &mut SessionSlot {
        match purpose {
            CapturePurpose::Melody => &mut self.melody,
            CapturePurpose::Chords => &mut self.chords,
        }
    }
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Arbitrates the bridge's capture slot between melody and chord requests.
pub struct Coordinator {
    bridge: Arc<dyn BridgeClient>,
    config: CaptureConfig,
    slots: Arc<Mutex<Slots>>,
    events: UnboundedSender<CaptureEvent>,
}

impl Coordinator {
    /// Create a coordinator and the receiving end of its event channel.
    pub fn new(
        bridge: Arc<dyn BridgeClient>,
        config: CaptureConfig,
    ) -> (Self, UnboundedReceiver<CaptureEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let coordinator = Self {
            bridge,
            config,
            slots: Arc::new(Mutex::new(Slots {
                melody: SessionSlot::new(),
                chords: SessionSlot::new(),
            })),
            events,
        };
        (coordinator, receiver)
    }

    /// Start a capture session, superseding any pending one of the same
    /// purpose. Arms the bridge inline; an arm failure is returned directly
    /// and no poll task is spawned. The host nudge is fire-and-forget.
    pub async fn begin_capture(
        &self,
        purpose: CapturePurpose,
        defaults: &SessionDefaults,
    ) -> Result<(), CaptureError> {
        let generation = lock(&self.slots).slot_mut(purpose).supersede();

        self.bridge.arm_capture().await.map_err(|e| {
            warn!(purpose = purpose.hint(), error = %e, "arm capture failed");
            CaptureError::ArmFailure(e.to_string())
        })?;

        let notify_bridge = Arc::clone(&self.bridge);
        let data = json!({
            "hint": purpose.hint(),
            "bpm": defaults.bpm,
            "mood": defaults.mood,
            "length_value": defaults.length_value,
            "length_unit": defaults.length_unit,
        });
        tokio::spawn(async move {
            if let Err(e) = notify_bridge.notify_host("start_capture", data).await {
                warn!(error = %e, "host notify failed, session continues");
            }
        });

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.bridge),
            Arc::clone(&self.slots),
            self.events.clone(),
            self.config.clone(),
            purpose,
            generation,
        ));

        let mut slots = lock(&self.slots);
        let slot = slots.slot_mut(purpose);
        if slot.generation == generation {
            slot.task = Some(task);
        } else {
            // Superseded while arming. The replacement owns the slot now.
            task.abort();
        }
        Ok(())
    }

    /// Drop any pending session for the purpose. Idempotent; cancelling a
    /// non-pending purpose is a no-op.
    pub fn cancel(&self, purpose: CapturePurpose) {
        lock(&self.slots).slot_mut(purpose).supersede();
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        slots.melody.supersede();
        slots.chords.supersede();
    }
}

/// Read the capture slot until it fills or the budget runs out. Each read
/// and each event emission is fenced on `generation`.
async fn poll_loop(
    bridge: Arc<dyn BridgeClient>,
    slots: Arc<Mutex<Slots>>,
    events: UnboundedSender<CaptureEvent>,
    config: CaptureConfig,
    purpose: CapturePurpose,
    generation: u64,
) {
    let mut attempts = 0u32;
    let mut transient_errors = 0u32;

    loop {
        if !still_current(&slots, purpose, generation) {
            return;
        }

        match bridge.read_latest().await {
            Ok(latest) if latest.has_data => {
                let mut slots = lock(&slots);
                let slot = slots.slot_mut(purpose);
                if slot.generation == generation {
                    slot.task = None;
                    let _ = events.send(CaptureEvent::Completed {
                        purpose,
                        full_track: latest.full_track,
                        added_notes: latest.added_notes,
                    });
                }
                return;
            }
            Ok(_) => {}
            Err(e) => {
                transient_errors += 1;
                debug!(
                    purpose = purpose.hint(),
                    error = %e,
                    transient_errors,
                    "poll read failed, will retry"
                );
            }
        }

        attempts += 1;
        if attempts >= config.attempt_budget {
            let mut slots = lock(&slots);
            let slot = slots.slot_mut(purpose);
            if slot.generation == generation {
                slot.task = None;
                let _ = events.send(CaptureEvent::Failed {
                    purpose,
                    error: CaptureError::Timeout { attempts },
                });
            }
            return;
        }

        if still_current(&slots, purpose, generation) {
            let _ = events.send(CaptureEvent::Waiting {
                purpose,
                remaining: config.attempt_budget - attempts,
            });
        }

        tokio::time::sleep(config.poll_interval).await;
    }
}

fn still_current(slots: &Mutex<Slots>, purpose: CapturePurpose, generation: u64) -> bool {
    lock(slots).slot_mut(purpose).generation == generation
}
