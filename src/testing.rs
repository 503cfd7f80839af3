//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::error::BoxError;
use crate::install::{InstallEngine, InstallOptions, ProjectHandle};
use crate::store::StoreHost;

/// One-shot latch a restore can block on until the test opens it.
#[derive(Default)]
pub(crate) struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub(crate) fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

/// Observations recorded by [`RecordingEngine`].
#[derive(Default)]
pub(crate) struct EngineState {
    pub resolves: Vec<(String, InstallOptions)>,
    /// `(root, counter)` recorded when each restore starts.
    pub sequence: Vec<(String, u64)>,
    pub in_flight: FxHashMap<String, usize>,
    pub max_in_flight_per_root: usize,
    pub max_in_flight_total: usize,
}

#[derive(Default)]
struct Shared {
    failures_left: AtomicUsize,
    counter: AtomicU64,
    in_flight_total: AtomicUsize,
    state: Mutex<EngineState>,
}

/// Install engine that writes a fixed package set and records every call.
#[derive(Clone)]
pub(crate) struct RecordingEngine {
    host: StoreHost,
    packages: Vec<(String, String)>,
    delay: Duration,
    wait_for_overlap: bool,
    gate: Option<Arc<Gate>>,
    shared: Arc<Shared>,
}

impl RecordingEngine {
    pub(crate) fn new(host: StoreHost) -> Self {
        Self {
            host,
            packages: Vec::new(),
            delay: Duration::ZERO,
            wait_for_overlap: false,
            gate: None,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Write `content` at `<root>/node_modules/<path>` on every restore.
    pub(crate) fn with_package(mut self, path: &str, content: &str) -> Self {
        self.packages.push((path.to_string(), content.to_string()));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make each restore wait (bounded) until another restore is running.
    pub(crate) fn waiting_for_overlap(mut self) -> Self {
        self.wait_for_overlap = true;
        self
    }

    /// Hold the first restore until `gate` is opened.
    pub(crate) fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail the next `n` restores.
    pub(crate) fn failing(self, n: usize) -> Self {
        self.shared.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        self.shared.state.lock()
    }

    pub(crate) fn resolve_count(&self) -> usize {
        self.state().resolves.len()
    }

    fn restore(&self, root: &str) -> Result<(), BoxError> {
        let shared = &self.shared;
        let order = shared.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let total = shared.in_flight_total.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = shared.state.lock();
            state.sequence.push((root.to_string(), order));
            let per_root = {
                let count = state.in_flight.entry(root.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            state.max_in_flight_per_root = state.max_in_flight_per_root.max(per_root);
            state.max_in_flight_total = state.max_in_flight_total.max(total);
        }

        if order == 1
            && let Some(gate) = &self.gate
        {
            gate.wait();
        }
        if self.wait_for_overlap {
            let deadline = Instant::now() + Duration::from_secs(2);
            while shared.in_flight_total.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }
            let total = shared.in_flight_total.load(Ordering::SeqCst);
            let mut state = shared.state.lock();
            state.max_in_flight_total = state.max_in_flight_total.max(total);
        }
        std::thread::sleep(self.delay);

        let result = self.write_packages(root);

        {
            let mut state = shared.state.lock();
            if let Some(count) = state.in_flight.get_mut(root) {
                *count -= 1;
            }
        }
        shared.in_flight_total.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn write_packages(&self, root: &str) -> Result<(), BoxError> {
        let fail = self
            .shared
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err("registry unreachable".into());
        }
        for (path, content) in &self.packages {
            self.host
                .write_file(&format!("{root}/node_modules/{path}"), content)?;
        }
        Ok(())
    }
}

impl InstallEngine for RecordingEngine {
    fn resolve_project(
        &self,
        root: &str,
        options: &InstallOptions,
    ) -> Result<Box<dyn ProjectHandle>, BoxError> {
        self.state().resolves.push((root.to_string(), options.clone()));
        Ok(Box::new(RecordedProject {
            engine: self.clone(),
            root: root.to_string(),
        }))
    }
}

struct RecordedProject {
    engine: RecordingEngine,
    root: String,
}

impl ProjectHandle for RecordedProject {
    fn restore(&mut self) -> Result<(), BoxError> {
        self.engine.restore(&self.root)
    }
}
