//! Drives the [`Sequencer`] in real time
//!
//! A [`Trainer`] owns the sequencer behind a mutex and sleeps between phases with the
//! lock released, so a renderer can read intermediate states at any moment. Auto-run
//! repeats whole steps from a background thread until it is switched off.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::{
    input::{Field, InputError},
    network::TrainingExample,
    sequencer::Sequencer,
};

/// Pauses of one training step, matching the lengths of the animations shown in each phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    /// hidden then output activations easing in
    pub forward: Duration,
    /// proposed deltas flashing on the edges, plus fade out
    pub pulse: Duration,
    /// pause after the update before going idle
    pub settle: Duration,
    /// wait between two auto-run steps
    pub auto_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            forward: Duration::from_millis(350 + 400),
            pulse: Duration::from_millis(700 + 300),
            settle: Duration::from_millis(600),
            auto_interval: Duration::from_millis(600),
        }
    }
}

impl Timings {
    /// No pauses at all
    pub fn instant() -> Self {
        Self {
            forward: Duration::ZERO,
            pulse: Duration::ZERO,
            settle: Duration::ZERO,
            auto_interval: Duration::ZERO,
        }
    }

    /// Default timings stretched by `factor`, negative or non-finite factors count as 0
    pub fn scaled(factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let base = Self::default();
        Self {
            forward: base.forward.mul_f64(factor),
            pulse: base.pulse.mul_f64(factor),
            settle: base.settle.mul_f64(factor),
            auto_interval: base.auto_interval.mul_f64(factor),
        }
    }

    /// Total time one step spends between leaving and re-entering idle
    pub fn step_duration(&self) -> Duration {
        self.forward + self.pulse + self.settle
    }
}

/// Called with a copy of the state after every phase transition. A panic inside it is
/// logged and swallowed so the step still completes.
pub type Observer = Arc<dyn Fn(&Sequencer) + Send + Sync>;

struct Shared {
    sequencer: Mutex<Sequencer>,
    rng: Mutex<Pcg64Mcg>,
    timings: Timings,
    observer: Option<Observer>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Sequencer> {
        self.sequencer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, state: Sequencer) {
        if let Some(observer) = &self.observer {
            if panic::catch_unwind(AssertUnwindSafe(|| observer(&state))).is_err() {
                log::error!("observer panicked in {} phase", state.phase());
            }
        }
    }

    /// Runs one step with pauses, `false` if another step was in flight or `gate`
    /// was cleared before the step could begin
    fn run_cycle(&self, gate: Option<&AtomicBool>) -> bool {
        let state = {
            let mut seq = self.lock();
            if gate.is_some_and(|g| !g.load(Ordering::Acquire)) {
                return false;
            }
            if !seq.begin_step() {
                return false;
            }
            seq.clone()
        };
        self.notify(state);

        for pause in [
            self.timings.forward,
            self.timings.pulse,
            self.timings.settle,
        ] {
            thread::sleep(pause);
            let state = {
                let mut seq = self.lock();
                seq.advance();
                seq.clone()
            };
            self.notify(state);
        }
        true
    }
}

struct AutoRun {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Sleeps for `duration` unless `running` goes false first. Returns whether still running.
fn wait_while_running(running: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !running.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

fn auto_run_loop(shared: Arc<Shared>, running: Arc<AtomicBool>) {
    log::debug!("auto-run started");
    while running.load(Ordering::Acquire) {
        if !shared.run_cycle(Some(&running)) {
            log::debug!("auto-run started no step");
        }
        if !wait_while_running(&running, shared.timings.auto_interval) {
            break;
        }
    }
    log::debug!("auto-run stopped");
}

/// Single owner of the network state; serializes all training steps
pub struct Trainer {
    shared: Arc<Shared>,
    auto_run: Option<AutoRun>,
}

impl Trainer {
    pub fn new(sequencer: Sequencer, timings: Timings) -> Self {
        Self::build(sequencer, timings, Pcg64Mcg::from_rng(&mut rand::rng()))
    }

    /// Same as [`Trainer::new`] but every randomize draw is reproducible
    pub fn seeded(sequencer: Sequencer, timings: Timings, seed: u64) -> Self {
        Self::build(sequencer, timings, Pcg64Mcg::seed_from_u64(seed))
    }

    /// Attaches a callback run after every phase transition. Only possible before auto-run
    /// was ever started.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.observer = Some(observer),
            None => log::warn!("observer ignored, trainer state is already shared"),
        }
        self
    }

    fn build(sequencer: Sequencer, timings: Timings, rng: Pcg64Mcg) -> Self {
        Self {
            shared: Arc::new(Shared {
                sequencer: Mutex::new(sequencer),
                rng: Mutex::new(rng),
                timings,
                observer: None,
            }),
            auto_run: None,
        }
    }

    pub fn timings(&self) -> Timings {
        self.shared.timings
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> Sequencer {
        self.shared.lock().clone()
    }

    /// Takes effect from the next step
    pub fn set_learning_rate(&self, learning_rate: f64) {
        self.shared.lock().set_learning_rate(learning_rate);
    }

    /// Takes effect from the next step
    pub fn set_example(&self, example: TrainingExample) {
        self.shared.lock().set_example(example);
    }

    /// Text edit of a numeric field, see [`Sequencer::set_field`]
    pub fn set_field(&self, field: Field, text: &str) -> Result<(), InputError> {
        self.shared.lock().set_field(field, text)
    }

    /// Runs one full step, blocking through its pauses.
    /// Returns `false` without doing anything if a step is already in flight.
    pub fn step(&self) -> bool {
        self.shared.run_cycle(None)
    }

    /// Redraws all parameters. Refused while a step is in flight.
    pub fn randomize(&self) -> bool {
        let state = {
            let mut seq = self.shared.lock();
            let mut rng = self.shared.rng.lock().unwrap_or_else(PoisonError::into_inner);
            if !seq.randomize(&mut *rng) {
                return false;
            }
            seq.clone()
        };
        self.shared.notify(state);
        true
    }

    pub fn is_auto_running(&self) -> bool {
        self.auto_run
            .as_ref()
            .is_some_and(|a| a.running.load(Ordering::Acquire))
    }

    /// Turns auto-run on or off. Switching off lets the step in flight finish but keeps
    /// any further step from starting.
    pub fn set_auto_run(&mut self, enabled: bool) {
        if enabled {
            self.start_auto_run();
        } else {
            self.stop_auto_run();
        }
    }

    fn start_auto_run(&mut self) {
        if self.is_auto_running() {
            return;
        }
        // a previous loop may still be finishing its last step
        self.join_auto_run();
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let shared = Arc::clone(&self.shared);
            let running = Arc::clone(&running);
            thread::spawn(move || auto_run_loop(shared, running))
        };
        self.auto_run = Some(AutoRun { running, handle });
    }

    fn stop_auto_run(&mut self) {
        if let Some(auto_run) = &self.auto_run {
            auto_run.running.store(false, Ordering::Release);
            auto_run.handle.thread().unpark();
        }
    }

    /// Stops auto-run and waits for its thread to exit
    pub fn join_auto_run(&mut self) {
        self.stop_auto_run();
        if let Some(auto_run) = self.auto_run.take() {
            if auto_run.handle.join().is_err() {
                log::error!("auto-run thread panicked");
            }
        }
    }
}

impl Drop for Trainer {
    fn drop(&mut self) {
        self.join_auto_run();
    }
}
