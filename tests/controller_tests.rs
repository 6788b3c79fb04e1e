use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use ferrite::model::{
    AbortReason, Api, ControlState, Model, PerThread, RecordingStatus, StatusEvent,
};
use ferrite::runtime::{
    error::RuntimeResult,
    rng::{RngSeed, RngType},
};
use parking_lot::Mutex;

const WORKERS: usize = 8;

/// Eight workers, each stepping through checkpoints with a 10 ms delay and
/// remembering the last checkpoint it reached.
struct Ticker {
    steps: u64,
    reached: Mutex<Vec<u64>>,
}

impl Ticker {
    fn new(steps: u64) -> Arc<Self> {
        Arc::new(Self {
            steps,
            reached: Mutex::new(vec![0; WORKERS]),
        })
    }
}

impl Model for Ticker {
    fn number_threads(&self) -> usize {
        WORKERS
    }

    fn run_thread(&self, thread_id: u32, per_thread: &mut PerThread) -> RuntimeResult<()> {
        for step in 1..=self.steps {
            self.reached.lock()[thread_id as usize] = step;
            per_thread.c(step)?;
            thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }
}

fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn paused_run(model: Arc<Ticker>) -> (Api, Arc<RecordingStatus>) {
    let api = Api::new(model).unwrap();
    let status = Arc::new(RecordingStatus::new());
    api.start(RngType::Mt19937, RngSeed::from_u64(3), status.clone())
        .unwrap();

    thread::sleep(Duration::from_millis(10));
    assert!(api.pause());
    assert_eq!(api.state(), ControlState::PausedOnUserRequest);
    wait_for("every worker to pause", || {
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == WORKERS
    });
    (api, status)
}

#[test]
fn pause_and_resume_eight_workers() {
    let (api, status) = paused_run(Ticker::new(20));
    assert_eq!(
        status.count(|e| matches!(e, StatusEvent::PausedOnUserRequest { .. })),
        1
    );
    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadFinished { .. })), 0);

    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);

    let events = status.events();
    let resumed = events
        .iter()
        .position(|e| *e == StatusEvent::Resumed)
        .unwrap();
    let paused: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, StatusEvent::ThreadPaused { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(paused.len(), WORKERS);
    assert!(paused.iter().all(|&i| i < resumed));

    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadFinished { .. })), WORKERS);
    assert_eq!(status.count(|e| *e == StatusEvent::Finished), 1);
    assert_eq!(events.last(), Some(&StatusEvent::Finished));
}

#[test]
fn abort_while_paused() {
    let model = Ticker::new(1000);
    let (api, status) = paused_run(model.clone());
    let reached = model.reached.lock().clone();

    let requested = Instant::now();
    assert!(api.abort());
    assert_eq!(api.wait_complete(), ControlState::Aborted);
    assert!(requested.elapsed() < Duration::from_millis(200));

    match status.events().last() {
        Some(StatusEvent::Aborted { reason, operation }) => {
            assert_eq!(*reason, AbortReason::UserRequest);
            assert!(reached.contains(operation), "{operation} not in {reached:?}");
        }
        other => panic!("expected an abort, got {other:?}"),
    }
    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadAborted { .. })), WORKERS);
    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadFinished { .. })), 0);
}

#[test]
fn every_worker_starts_and_ends_exactly_once() {
    let api = Api::new(Ticker::new(3)).unwrap();
    let status = Arc::new(RecordingStatus::new());
    api.run(RngType::Xoshiro256StarStar, RngSeed::default(), status.clone())
        .unwrap();
    for thread_id in 0..WORKERS as u32 {
        assert_eq!(
            status.count(|e| *e == StatusEvent::ThreadStarted { thread_id }),
            1
        );
        assert_eq!(
            status.count(|e| {
                *e == StatusEvent::ThreadFinished { thread_id }
                    || *e == StatusEvent::ThreadAborted { thread_id }
            }),
            1
        );
    }
}

#[test]
fn abort_while_active_stops_every_worker() {
    let api = Api::new(Ticker::new(1000)).unwrap();
    let status = Arc::new(RecordingStatus::new());
    api.start(RngType::Mt19937, RngSeed::default(), status.clone())
        .unwrap();
    thread::sleep(Duration::from_millis(15));
    assert!(api.abort());
    assert_eq!(api.wait_complete(), ControlState::Aborted);
    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadAborted { .. })), WORKERS);
    assert!(!api.abort());
}

#[test]
fn events_serialize_for_the_host() {
    let api = Api::new(Ticker::new(1)).unwrap();
    let status = Arc::new(RecordingStatus::new());
    api.run(RngType::Mt19937, RngSeed::default(), status.clone())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&status.to_json().unwrap()).unwrap();
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 2 + 2 * WORKERS);
    assert_eq!(events[0]["event"], "started");
    assert_eq!(events[events.len() - 1]["event"], "finished");
}
