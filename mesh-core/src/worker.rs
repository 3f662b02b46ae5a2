//! Worker tasks: the periodic retry sweep and gateway announce tick, plus an
//! optional host-side thread runner for each.
//!
//! [`Engine::run_retry_sweep`](crate::engine::Engine::run_retry_sweep) and
//! [`Engine::run_announce_tick`](crate::engine::Engine::run_announce_tick)
//! are themselves platform-agnostic: calling them is all a worker "task" is,
//! regardless of whether the caller is a bare-metal super-loop, an RTOS
//! task, or (behind the `std` feature, for host tooling and tests) a real
//! OS thread. [`WorkerHandle`] provides the latter: a start/stop/join
//! wrapper around a thread that ticks on a fixed interval.

#[cfg(feature = "std")]
pub use std_worker::WorkerHandle;

#[cfg(feature = "std")]
mod std_worker {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::JoinHandle;
    use std::time::Duration as StdDuration;

    /// Runs a closure on a fixed interval from a dedicated OS thread until
    /// [`WorkerHandle::stop`] is called.
    ///
    /// The closure is expected to be one of `Engine::run_retry_sweep` or
    /// `Engine::run_announce_tick`, wrapped by the caller to capture
    /// whatever `Arc`/reference it needs to reach the engine.
    pub struct WorkerHandle {
        running: Arc<AtomicBool>,
        join: Option<JoinHandle<()>>,
    }

    /// Upper bound on one sleep step between running-flag checks, so `stop`
    /// is never kept waiting for the full configured interval.
    const POLL_STEP: StdDuration = StdDuration::from_secs(1);

    impl WorkerHandle {
        /// Spawns a thread that calls `tick` every `interval`, checking the
        /// running flag at least once per second so shutdown is prompt even
        /// when `interval` is much longer than that.
        pub fn spawn<F>(interval: StdDuration, mut tick: F) -> Self
        where
            F: FnMut() + Send + 'static,
        {
            let running = Arc::new(AtomicBool::new(true));
            let running_thread = running.clone();
            let join = std::thread::spawn(move || {
                while running_thread.load(Ordering::Acquire) {
                    tick();

                    let mut remaining = interval;
                    while remaining > StdDuration::ZERO {
                        if !running_thread.load(Ordering::Acquire) {
                            break;
                        }
                        let step = remaining.min(POLL_STEP);
                        std::thread::sleep(step);
                        remaining -= step;
                    }
                }
            });

            WorkerHandle {
                running,
                join: Some(join),
            }
        }

        /// Signals the worker thread to stop after its current sleep.
        pub fn stop(&self) {
            self.running.store(false, Ordering::Release);
        }

        /// Signals shutdown and blocks until the worker thread has exited.
        pub fn join(mut self) {
            self.stop();
            if let Some(join) = self.join.take() {
                let _ = join.join();
            }
        }
    }

    impl Drop for WorkerHandle {
        fn drop(&mut self) {
            self.stop();
            if let Some(join) = self.join.take() {
                let _ = join.join();
            }
        }
    }
}
