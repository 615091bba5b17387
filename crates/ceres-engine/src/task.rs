//! Named background threads with a cooperative stop flag.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Stop request observed by a running task.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A thread that runs until its [`StopSignal`] is raised.
///
/// `stop` raises the signal and joins. Dropping a task that is still running does the same.
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    stop: StopSignal,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    pub fn spawn<F>(name: &'static str, body: F) -> io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let stop = StopSignal::default();
        let signal = stop.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(signal))?;

        log::debug!("started task `{name}`");
        Ok(Self {
            name,
            stop,
            handle: Some(handle),
        })
    }

    /// `true` until `stop` has joined the thread.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Requests a stop and waits for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.stop.raise();
        let Some(handle) = self.handle.take() else {
            return;
        };
        match handle.join() {
            Ok(()) => log::debug!("stopped task `{}`", self.name),
            Err(_) => log::error!("task `{}` panicked", self.name),
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.stop();
    }
}
