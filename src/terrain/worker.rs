//! # Generation Worker
//!
//! A dedicated, named OS thread that runs the terrain generation loop under a
//! supervisor.
//!
//! ## Supervision
//!
//! The loop body runs inside `catch_unwind`. A panic is logged at `error` level and
//! counted, then the body is started again as long as no stop was requested. A body
//! that returns normally ends the worker; the generation loop only returns once it
//! observes the stop flag.
//!
//! ## Shutdown
//!
//! [`GenerationWorker::stop`] raises the shared stop flag. [`GenerationWorker::join`]
//! (and `Drop`) raise it and wait for the thread to exit.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::error::{Result, TerrainError};

/// Pause before a panicked loop body is started again.
const RESTART_DELAY: Duration = Duration::from_millis(10);

/// Handle to a supervised background thread.
#[derive(Debug)]
pub struct GenerationWorker {
    handle: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    restarts: Arc<AtomicUsize>,
}

impl GenerationWorker {
    /// Spawns a thread named `name` that runs `body` until it returns or a stop is
    /// requested through `stop_flag`.
    ///
    /// # Arguments
    /// * `name` - Thread name, shown in panic messages and debuggers
    /// * `stop_flag` - Cooperative stop flag shared with `body`
    /// * `body` - The loop to supervise. Restarted after every panic.
    ///
    /// # Errors
    /// `TerrainError::WorkerSpawn` when the OS refuses to create the thread.
    pub fn spawn<F>(name: &str, stop_flag: Arc<AtomicBool>, body: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let restarts = Arc::new(AtomicUsize::new(0));
        let supervisor = {
            let stop_flag = stop_flag.clone();
            let restarts = restarts.clone();
            let mut body = body;
            move || supervise(&stop_flag, &restarts, &mut body)
        };

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(supervisor)
            .map_err(TerrainError::WorkerSpawn)?;
        log::info!("Started worker thread {:?}", name);

        Ok(GenerationWorker {
            handle: Some(handle),
            stop_flag,
            restarts,
        })
    }

    /// Requests a cooperative stop without waiting.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Number of times the loop body panicked and was restarted.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::Acquire)
    }

    /// Requests a stop and waits for the thread to exit.
    pub fn join(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            match handle.join() {
                Ok(()) => log::info!("Worker thread {:?} stopped", name),
                Err(payload) => log::error!(
                    "Worker thread {:?} supervisor panicked: {}",
                    name,
                    panic_message(payload.as_ref())
                ),
            }
        }
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        self.join();
    }
}

fn supervise(stop_flag: &AtomicBool, restarts: &AtomicUsize, body: &mut dyn FnMut()) {
    while !stop_flag.load(Ordering::Acquire) {
        match panic::catch_unwind(AssertUnwindSafe(&mut *body)) {
            Ok(()) => return,
            Err(payload) => {
                let count = restarts.fetch_add(1, Ordering::AcqRel) + 1;
                log::error!(
                    "Terrain generation loop panicked ({}), restart #{}",
                    panic_message(payload.as_ref()),
                    count
                );
                thread::sleep(RESTART_DELAY);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
