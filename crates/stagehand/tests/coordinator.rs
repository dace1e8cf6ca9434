//! Coordinator behavior against an in-memory bridge double, under paused
//! tokio time so the one-second poll cadence costs nothing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use croonproto::{BridgeLatest, Note, SessionDefaults};
use stagehand::{
    BridgeClient, BridgeError, CaptureConfig, CaptureError, CaptureEvent, CapturePurpose,
    Coordinator,
};

struct MockBridge {
    reads: AtomicU32,
    fail_arm: bool,
    ready_after: Option<u32>,
}

impl MockBridge {
    fn empty() -> Self {
        Self {
            reads: AtomicU32::new(0),
            fail_arm: false,
            ready_after: None,
        }
    }

    fn ready_after(n: u32) -> Self {
        Self {
            ready_after: Some(n),
            ..Self::empty()
        }
    }

    fn failing_arm() -> Self {
        Self {
            fail_arm: true,
            ..Self::empty()
        }
    }

    fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BridgeClient for MockBridge {
    async fn arm_capture(&self) -> Result<(), BridgeError> {
        if self.fail_arm {
            return Err(BridgeError::Status {
                status: 500,
                body: "bridge down".to_string(),
            });
        }
        Ok(())
    }

    async fn notify_host(&self, _event: &str, _data: Value) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn read_latest(&self) -> Result<BridgeLatest, BridgeError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ready) = self.ready_after {
            if n >= ready {
                return Ok(BridgeLatest {
                    has_data: true,
                    full_track: vec![Note::new("C4", 0.0, 1.0)],
                    added_notes: vec![],
                    timestamp: None,
                });
            }
        }
        Ok(BridgeLatest::empty())
    }
}

async fn drain_until_terminal(rx: &mut UnboundedReceiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let terminal = matches!(
            event,
            CaptureEvent::Completed { .. } | CaptureEvent::Failed { .. }
        );
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn timeout_after_exactly_eight_reads() {
    let bridge = Arc::new(MockBridge::empty());
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), CaptureConfig::default());

    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();

    let events = drain_until_terminal(&mut rx).await;

    let mut expected: Vec<CaptureEvent> = (1..=7)
        .rev()
        .map(|remaining| CaptureEvent::Waiting {
            purpose: CapturePurpose::Melody,
            remaining,
        })
        .collect();
    expected.push(CaptureEvent::Failed {
        purpose: CapturePurpose::Melody,
        error: CaptureError::Timeout { attempts: 8 },
    });
    assert_eq!(events, expected);
    assert_eq!(bridge.reads(), 8);

    // no ninth poll after the budget is spent
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(bridge.reads(), 8);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn completion_stops_polling_and_carries_notes() {
    let bridge = Arc::new(MockBridge::ready_after(3));
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), CaptureConfig::default());

    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();

    let events = drain_until_terminal(&mut rx).await;
    assert_eq!(
        events,
        vec![
            CaptureEvent::Waiting {
                purpose: CapturePurpose::Melody,
                remaining: 7
            },
            CaptureEvent::Waiting {
                purpose: CapturePurpose::Melody,
                remaining: 6
            },
            CaptureEvent::Completed {
                purpose: CapturePurpose::Melody,
                full_track: vec![Note::new("C4", 0.0, 1.0)],
                added_notes: vec![],
            },
        ]
    );
    assert_eq!(bridge.reads(), 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(bridge.reads(), 3);
}

#[tokio::test]
async fn arm_failure_surfaces_without_polling() {
    let bridge = Arc::new(MockBridge::failing_arm());
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), CaptureConfig::default());

    let result = coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await;

    assert!(matches!(result, Err(CaptureError::ArmFailure(_))));
    assert_eq!(bridge.reads(), 0);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn cancel_before_resolution_emits_nothing() {
    let bridge = Arc::new(MockBridge::empty());
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), CaptureConfig::default());

    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();
    coordinator.cancel(CapturePurpose::Melody);

    // let every would-be poll tick go by
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent() {
    let bridge = Arc::new(MockBridge::empty());
    let (coordinator, mut rx) = Coordinator::new(bridge, CaptureConfig::default());

    coordinator.cancel(CapturePurpose::Chords);
    coordinator.cancel(CapturePurpose::Chords);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn superseding_same_purpose_silences_the_old_session() {
    let bridge = Arc::new(MockBridge::empty());
    let config = CaptureConfig::default().with_attempt_budget(2);
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), config);

    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();
    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();

    let events = drain_until_terminal(&mut rx).await;
    assert_eq!(
        events,
        vec![
            CaptureEvent::Waiting {
                purpose: CapturePurpose::Melody,
                remaining: 1
            },
            CaptureEvent::Failed {
                purpose: CapturePurpose::Melody,
                error: CaptureError::Timeout { attempts: 2 },
            },
        ]
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn purposes_are_independent() {
    let bridge = Arc::new(MockBridge::empty());
    let (coordinator, mut rx) = Coordinator::new(bridge.clone(), CaptureConfig::default());

    coordinator
        .begin_capture(CapturePurpose::Melody, &SessionDefaults::default())
        .await
        .unwrap();
    coordinator
        .begin_capture(CapturePurpose::Chords, &SessionDefaults::default())
        .await
        .unwrap();
    coordinator.cancel(CapturePurpose::Melody);

    let events = drain_until_terminal(&mut rx).await;
    assert!(events
        .iter()
        .all(|e| matches!(
            e,
            CaptureEvent::Waiting {
                purpose: CapturePurpose::Chords,
                ..
            } | CaptureEvent::Failed {
                purpose: CapturePurpose::Chords,
                ..
            }
        )));
    assert_eq!(
        events.last(),
        Some(&CaptureEvent::Failed {
            purpose: CapturePurpose::Chords,
            error: CaptureError::Timeout { attempts: 8 },
        })
    );
}
