use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    model::{
        AbortReason, Api, ControlState, Model, PerThread, RecordingStatus, Status, StatusEvent,
        StatusFanout,
    },
    runtime::{
        error::{RuntimeError, RuntimeResult},
        rng::{RngSeed, RngType, Sampling},
    },
};

struct Steps {
    threads: usize,
    steps: u64,
    delay: Duration,
    fail_at: Option<(u32, u64)>,
    panic_at: Option<(u32, u64)>,
    watched_write: Option<(u64, u64)>,
}

impl Steps {
    fn new(threads: usize, steps: u64) -> Self {
        Self {
            threads,
            steps,
            delay: Duration::ZERO,
            fail_at: None,
            panic_at: None,
            watched_write: None,
        }
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Model for Steps {
    fn number_threads(&self) -> usize {
        self.threads
    }

    fn run_thread(&self, thread_id: u32, per_thread: &mut PerThread) -> RuntimeResult<()> {
        for step in 1..=self.steps {
            per_thread.c(step)?;
            if self.fail_at == Some((thread_id, step)) {
                return Err(RuntimeError::invalid_parameter("model failure"));
            }
            if self.panic_at == Some((thread_id, step)) {
                panic!("model panic at {}", step);
            }
            if let Some((at, identifier)) = self.watched_write {
                if at == step {
                    per_thread.variable_updated(step, identifier)?;
                }
            }
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        Ok(())
    }
}

fn api(model: Steps) -> Api {
    Api::new(Arc::new(model)).unwrap()
}

fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}

fn start(api: &Api) -> Arc<RecordingStatus> {
    let status = Arc::new(RecordingStatus::new());
    api.start(RngType::Mt19937, RngSeed::from_u64(1), status.clone())
        .unwrap();
    status
}

#[test]
fn thread_counts_are_bounded() {
    assert!(Api::new(Arc::new(Steps::new(0, 1))).is_err());
    assert!(Api::new(Arc::new(Steps::new(33, 1))).is_err());
    assert_eq!(api(Steps::new(32, 1)).thread_count(), 32);
}

#[test]
fn idle_controller_refuses_requests() {
    let api = api(Steps::new(1, 1));
    assert_eq!(api.state(), ControlState::Idle);
    assert!(!api.pause());
    assert!(!api.resume());
    assert!(!api.single_step());
    assert!(!api.abort());
    assert_eq!(api.wait_complete(), ControlState::Idle);
}

#[test]
fn run_reports_every_worker() {
    let api = api(Steps::new(4, 20));
    let status = Arc::new(RecordingStatus::new());
    let state = api
        .run(RngType::Xoshiro256PlusPlus, RngSeed::from_u64(9), status.clone())
        .unwrap();
    assert_eq!(state, ControlState::Stopped);

    let events = status.events();
    assert_eq!(events.first(), Some(&StatusEvent::Started));
    assert_eq!(events.last(), Some(&StatusEvent::Finished));
    for thread_id in 0..4 {
        let started = events
            .iter()
            .position(|e| *e == StatusEvent::ThreadStarted { thread_id })
            .unwrap();
        let finished = events
            .iter()
            .position(|e| *e == StatusEvent::ThreadFinished { thread_id })
            .unwrap();
        assert!(started < finished);
    }
    assert_eq!(events.len(), 10);
}

#[test]
fn a_finished_controller_can_run_again() {
    let api = api(Steps::new(2, 3));
    for _ in 0..3 {
        let status = Arc::new(RecordingStatus::new());
        let state = api
            .run(RngType::Mt19937, RngSeed::default(), status.clone())
            .unwrap();
        assert_eq!(state, ControlState::Stopped);
        assert_eq!(status.count(|e| *e == StatusEvent::Finished), 1);
    }
}

#[test]
fn starting_twice_fails() {
    let api = api(Steps::new(1, 1000).delay(Duration::from_millis(1)));
    let _status = start(&api);
    assert!(api.start(RngType::Mt19937, RngSeed::default(), Arc::new(RecordingStatus::new())).is_err());
    assert!(api.abort());
    assert_eq!(api.wait_complete(), ControlState::Aborted);
}

#[test]
fn worker_error_aborts_with_exception() {
    let mut model = Steps::new(3, 1000).delay(Duration::from_micros(200));
    model.fail_at = Some((1, 5));
    let api = api(model);
    let status = start(&api);
    assert_eq!(api.wait_complete(), ControlState::Aborted);

    let events = status.events();
    assert_eq!(
        events.last(),
        Some(&StatusEvent::Aborted {
            reason: AbortReason::Exception,
            operation: 5
        })
    );
    assert_eq!(status.count(|e| matches!(e, StatusEvent::ThreadAborted { .. })), 3);
    assert_eq!(status.count(|e| matches!(e, StatusEvent::Aborted { .. })), 1);
}

#[test]
fn worker_panic_aborts_with_exception() {
    let mut model = Steps::new(2, 1000).delay(Duration::from_micros(200));
    model.panic_at = Some((0, 3));
    let api = api(model);
    let status = start(&api);
    assert_eq!(api.wait_complete(), ControlState::Aborted);
    assert_eq!(
        status.events().last(),
        Some(&StatusEvent::Aborted {
            reason: AbortReason::Exception,
            operation: 3
        })
    );
}

#[test]
fn operation_breakpoint_pauses_the_run() {
    let api = api(Steps::new(2, 50).delay(Duration::from_millis(1)));
    api.set_operation_breakpoint(10, true);
    let status = start(&api);

    wait_for("both workers to pause", || {
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == 2
    });
    assert_eq!(api.state(), ControlState::PausedAtOperation);
    assert_eq!(
        status.count(|e| *e == StatusEvent::PausedAtOperation { operation: 10 }),
        1
    );

    api.set_operation_breakpoint(10, false);
    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);
}

#[test]
fn run_to_location_starts_paused_and_fires_once() {
    let api = api(Steps::new(1, 10));
    api.set_run_to_location(7);
    let status = start(&api);
    assert_eq!(api.state(), ControlState::PausedOnUserRequest);
    wait_for("the worker to park at entry", || {
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == 1
    });

    assert!(api.resume());
    wait_for("the run-to location", || api.state() == ControlState::PausedAtOperation);
    assert_eq!(api.run_to_location(), None);

    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);
    let events = status.events();
    assert_eq!(events[1], StatusEvent::PausedOnUserRequest { operation: 0 });
    assert_eq!(status.count(|e| *e == StatusEvent::PausedAtOperation { operation: 7 }), 1);
}

#[test]
fn single_step_advances_one_checkpoint() {
    let api = api(Steps::new(1, 6));
    api.set_run_to_location(2);
    let status = start(&api);
    assert!(api.resume());
    wait_for("operation 2", || api.state() == ControlState::PausedAtOperation);

    for expected in [3, 4] {
        assert!(api.single_step());
        wait_for("the step", || {
            status.count(|e| *e == StatusEvent::PausedOnUserRequest { operation: expected }) == 1
        });
        assert_eq!(api.state(), ControlState::PausedOnUserRequest);
    }

    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);
}

#[test]
fn pause_after_single_step_cancels_the_step() {
    let api = api(Steps::new(1, 1000).delay(Duration::from_millis(20)));
    let status = start(&api);
    assert!(api.pause());
    wait_for("the first pause", || {
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == 1
    });

    assert!(api.single_step());
    assert!(api.pause());
    wait_for("the second pause", || {
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == 2
    });

    assert!(api.resume());
    thread::sleep(Duration::from_millis(300));
    assert_eq!(api.state(), ControlState::Active);
    assert_eq!(
        status.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })),
        2
    );

    assert!(api.abort());
    assert_eq!(api.wait_complete(), ControlState::Aborted);
}

#[derive(Default)]
struct ResumeThreads {
    threads: Mutex<Vec<thread::ThreadId>>,
}

impl Status for ResumeThreads {
    fn resumed(&self, _api: &Api) {
        self.threads.lock().push(thread::current().id());
    }
}

#[test]
fn resumed_is_reported_from_a_worker() {
    let api = api(Steps::new(2, 300).delay(Duration::from_millis(1)));
    let recording = Arc::new(RecordingStatus::new());
    let resumes = Arc::new(ResumeThreads::default());
    let sinks: Vec<Arc<dyn Status>> = vec![recording.clone(), resumes.clone()];
    let status = Arc::new(StatusFanout(sinks));
    api.start(RngType::Mt19937, RngSeed::from_u64(4), status).unwrap();

    let paused = |n: usize| {
        wait_for("the workers to pause", || {
            recording.count(|e| matches!(e, StatusEvent::ThreadPaused { .. })) == n
        })
    };
    assert!(api.pause());
    paused(2);
    assert!(api.single_step());
    paused(4);
    assert!(api.resume());
    assert!(api.pause());
    paused(6);
    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);

    let host = thread::current().id();
    let threads = resumes.threads.lock().clone();
    assert_eq!(threads.len(), 3);
    assert!(threads.iter().all(|&id| id != host));
    assert_eq!(recording.count(|e| *e == StatusEvent::Resumed), 3);
}

#[test]
fn watched_variable_pauses_the_run() {
    let mut model = Steps::new(1, 5);
    model.watched_write = Some((3, 42));
    let api = api(model);
    api.set_variable_update_breakpoint(42, true);
    let status = start(&api);

    wait_for("the variable update", || {
        api.state() == ControlState::PausedOnVariableUpdate
    });
    wait_for("the announcement", || {
        status.count(|e| {
            *e == StatusEvent::PausedOnVariableUpdate {
                operation: 3,
                identifier: 42,
            }
        }) == 1
    });
    assert!(api.resume());
    assert_eq!(api.wait_complete(), ControlState::Stopped);
}

struct Draws {
    out: Mutex<Vec<(u32, i64)>>,
}

impl Model for Draws {
    fn number_threads(&self) -> usize {
        3
    }

    fn run_thread(&self, thread_id: u32, per_thread: &mut PerThread) -> RuntimeResult<()> {
        per_thread.c(1)?;
        let draw = per_thread.random_integer();
        self.out.lock().push((thread_id, draw));
        Ok(())
    }
}

#[test]
fn runs_reproduce_from_the_seed() {
    let draws = |seed: u64| {
        let model = Arc::new(Draws {
            out: Mutex::new(Vec::new()),
        });
        let api = Api::new(model.clone()).unwrap();
        api.run(RngType::Mt216091, RngSeed::from_u64(seed), Arc::new(RecordingStatus::new()))
            .unwrap();
        let mut out = model.out.lock().clone();
        out.sort();
        out
    };
    assert_eq!(draws(5), draws(5));
    assert_ne!(draws(5), draws(6));
}
