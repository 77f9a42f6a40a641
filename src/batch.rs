//! Batch Orchestrator (C12): walks an input directory tree and dispatches
//! each ROM it finds to the Processor (C11) through a bounded worker pool,
//! observing outcomes through a [`ConversionObserver`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::warn;
use walkdir::WalkDir;

use crate::format::Format;
use crate::observer::ConversionObserver;
use crate::processor::process_rom_with_cancellation;

/// Counts of ROM outcomes across one batch run, handed back to the CLI
/// collaborator for its `Batch complete: ...` summary line.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub successes: usize,
    pub failures: usize,
}

/// How long a batch waits for in-flight tasks to drain after cancellation
/// is signalled before giving up and returning anyway.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5 * 60);

/// Converts every supported ROM under `input_dir`, mirroring its directory
/// structure under `output_dir`, using up to `jobs` workers.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    format: Format,
    jobs: usize,
    observer: Arc<dyn ConversionObserver>,
) -> BatchSummary {
    run_batch_with_cancellation(
        input_dir,
        output_dir,
        format,
        jobs,
        observer,
        Arc::new(AtomicBool::new(false)),
    )
}

/// As [`run_batch`], sharing `cancel_flag` with a SIGINT handler (external
/// collaborator) so in-flight workers see the cancellation signal.
pub fn run_batch_with_cancellation(
    input_dir: &Path,
    output_dir: &Path,
    format: Format,
    jobs: usize,
    observer: Arc<dyn ConversionObserver>,
    cancel_flag: Arc<AtomicBool>,
) -> BatchSummary {
    let jobs = jobs.max(1);
    let pool = WorkerPool::new(jobs);
    let limiter = Arc::new(InFlightLimiter::new(2 * jobs));
    let active = Arc::new(ActiveCount::new());
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));

    for entry in WalkDir::new(input_dir).into_iter() {
        if cancel_flag.load(Ordering::Relaxed) {
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("[!] batch traversal error: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_supported_rom(entry.path()) {
            continue;
        }

        let rom_path = entry.into_path();
        let relative = rom_path
            .parent()
            .and_then(|parent| parent.strip_prefix(input_dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let task_output_dir = output_dir.join(&relative);
        if let Err(err) = std::fs::create_dir_all(&task_output_dir) {
            warn!(
                "[!] could not create {}: {}",
                task_output_dir.display(),
                err
            );
            continue;
        }

        let task = ConversionTask {
            rom_path,
            task_output_dir,
            suffix: next_workspace_suffix(),
            format,
            cancel_flag: Arc::clone(&cancel_flag),
            observer: Arc::clone(&observer),
            successes: Arc::clone(&successes),
            failures: Arc::clone(&failures),
        };

        active.increment();
        if limiter.try_acquire() {
            let limiter = Arc::clone(&limiter);
            let active = Arc::clone(&active);
            pool.spawn(move || {
                task.run();
                limiter.release();
                active.decrement();
            });
        } else {
            // Queue is full: the enqueuing thread runs the task itself.
            task.run();
            active.decrement();
        }
    }

    active.wait_for_drain(SHUTDOWN_GRACE);
    observer.finish();

    BatchSummary {
        successes: successes.load(Ordering::Relaxed),
        failures: failures.load(Ordering::Relaxed),
    }
}

struct ConversionTask {
    rom_path: PathBuf,
    task_output_dir: PathBuf,
    suffix: String,
    format: Format,
    cancel_flag: Arc<AtomicBool>,
    observer: Arc<dyn ConversionObserver>,
    successes: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl ConversionTask {
    fn run(self) {
        self.observer.on_start(&self.rom_path);
        let result = process_rom_with_cancellation(
            &self.rom_path,
            &self.task_output_dir,
            &self.suffix,
            self.format,
            self.cancel_flag,
        );
        match result {
            Ok(disk_count) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                self.observer.on_success(&self.rom_path, disk_count);
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.observer.on_failure(&self.rom_path, &err);
            }
        }
    }
}

/// Wraps a `rayon::ThreadPool`, falling back to running tasks inline if the
/// pool fails to build (e.g. under a restrictive sandbox), since a batch
/// should still make progress single-threaded rather than give up.
enum WorkerPool {
    Pooled(rayon::ThreadPool),
    Inline,
}

impl WorkerPool {
    fn new(jobs: usize) -> WorkerPool {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => WorkerPool::Pooled(pool),
            Err(err) => {
                warn!("[!] could not build a {}-worker pool ({}); converting inline", jobs, err);
                WorkerPool::Inline
            }
        }
    }

    fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        match self {
            WorkerPool::Pooled(pool) => pool.spawn(task),
            WorkerPool::Inline => task(),
        }
    }
}

/// A counting semaphore of fixed capacity implementing the caller-runs
/// overflow policy: `try_acquire` never blocks, it just reports whether a
/// pool slot was free.
struct InFlightLimiter {
    state: Mutex<usize>,
    capacity: usize,
}

impl InFlightLimiter {
    fn new(capacity: usize) -> InFlightLimiter {
        InFlightLimiter {
            state: Mutex::new(0),
            capacity,
        }
    }

    fn try_acquire(&self) -> bool {
        let mut in_flight = self.state.lock().expect("in-flight mutex poisoned");
        if *in_flight < self.capacity {
            *in_flight += 1;
            true
        } else {
            false
        }
    }

    fn release(&self) {
        let mut in_flight = self.state.lock().expect("in-flight mutex poisoned");
        *in_flight = in_flight.saturating_sub(1);
    }
}

/// Tracks how many tasks (pooled or caller-run) are currently in flight, so
/// graceful shutdown can wait for the count to reach zero.
struct ActiveCount {
    count: Mutex<usize>,
    drained: Condvar,
}

impl ActiveCount {
    fn new() -> ActiveCount {
        ActiveCount {
            count: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn increment(&self) {
        *self.count.lock().expect("active-count mutex poisoned") += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock().expect("active-count mutex poisoned");
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_for_drain(&self, grace: Duration) {
        let deadline = Instant::now() + grace;
        let mut count = self.count.lock().expect("active-count mutex poisoned");
        while *count > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("[!] shutdown grace period elapsed with tasks still in flight");
                return;
            }
            let (guard, timeout) = self
                .drained
                .wait_timeout(count, remaining)
                .expect("active-count condvar poisoned");
            count = guard;
            if timeout.timed_out() && *count > 0 {
                warn!("[!] shutdown grace period elapsed with tasks still in flight");
                return;
            }
        }
    }
}

/// Generates a per-task scratch-directory suffix unique within this
/// process: process id, wall-clock nanoseconds, and a monotonic counter.
/// A real UUID crate would also work, but the teacher's dependency list
/// has no reason to grow just for this.
fn next_workspace_suffix() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}-{}-{}", std::process::id(), nanos, n)
}

/// True if `path`'s file name is a ROM the pipeline understands: `.sfc`,
/// `.fig`, `.swc`, `.ufo` (case-insensitive), or a Game Doctor split-part
/// name (`sf[0-9]{1,2}[A-Za-z]{1,5}` with an optional `.NNN` extension).
fn is_supported_rom(path: &Path) -> bool {
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(name) => name,
        None => return false,
    };
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();
    matches!(ext.as_str(), "sfc" | "fig" | "swc" | "ufo") || matches_gd3_pattern(file_name)
}

fn matches_gd3_pattern(name: &str) -> bool {
    if name.len() < 3 || !name[..2].eq_ignore_ascii_case("sf") {
        return false;
    }
    let mut chars = name[2..].chars().peekable();

    let mut digits = 0;
    while digits < 2 && matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        digits += 1;
    }
    if digits == 0 {
        return false;
    }

    let mut letters = 0;
    while letters < 5 && matches!(chars.peek(), Some(c) if c.is_ascii_alphabetic()) {
        chars.next();
        letters += 1;
    }
    if letters == 0 {
        return false;
    }

    let remainder: String = chars.collect();
    match remainder.strip_prefix('.') {
        None if remainder.is_empty() => true,
        Some(ext) => ext.len() == 3 && ext.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}
