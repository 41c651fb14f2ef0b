//! Background thread that performs backend requests so the UI thread never
//! blocks on the network.
//!
//! Jobs run one at a time in submission order. Results come back over a
//! channel and are drained by the UI once per frame with [`BackendWorker::poll`].
//! Nothing is cancelled: a result for a session that has since been replaced
//! is still delivered and the editor decides it is stale.
//!
//! Requests have no timeout, so dropping the worker never waits on one that
//! is still in flight. The thread is told to stop and left to finish on its
//! own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::DynamicImage;

use crate::backend::Backend;
use crate::editor::SessionId;
use crate::error::BackendError;
use crate::model::{AnnotationSubmission, ImageDescriptor};

pub enum Job {
    ListImages,
    LoadImage {
        session: SessionId,
        url: String,
    },
    SaveAnnotation {
        session: SessionId,
        submission: AnnotationSubmission,
    },
}

pub enum JobResult {
    Images(Result<Vec<ImageDescriptor>, BackendError>),
    ImageLoaded {
        session: SessionId,
        result: Result<DynamicImage, BackendError>,
    },
    Saved {
        session: SessionId,
        submission: AnnotationSubmission,
        result: Result<serde_json::Value, BackendError>,
    },
}

enum ThreadMessage {
    Run(Job),
    Shutdown,
}

pub struct BackendWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<JobResult>,
    thread_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    pending: usize,
}

impl BackendWorker {
    pub fn spawn(backend: Arc<dyn Backend>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<JobResult>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let thread_handle = thread::Builder::new()
            .name("backend-requests".to_string())
            .spawn(move || {
                log::info!("Backend request thread started");
                Self::thread_loop(backend.as_ref(), request_rx, result_tx, &thread_shutdown);
                log::info!("Backend request thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            shutdown,
            pending: 0,
        })
    }

    fn thread_loop(
        backend: &dyn Backend,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<JobResult>,
        shutdown: &AtomicBool,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Run(_)) if shutdown.load(Ordering::Acquire) => {
                    log::debug!("Shutting down, skipping queued requests");
                    break;
                }
                Ok(ThreadMessage::Run(job)) => {
                    let result = Self::run(backend, job);
                    if result_tx.send(result).is_err() {
                        log::warn!("Result channel closed, request thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, request thread exiting");
                    break;
                }
            }
        }
    }

    fn run(backend: &dyn Backend, job: Job) -> JobResult {
        match job {
            Job::ListImages => JobResult::Images(backend.list_images()),
            Job::LoadImage { session, url } => {
                let result = backend
                    .fetch_image(&url)
                    .and_then(|bytes| image::load_from_memory(&bytes).map_err(BackendError::from));
                if let Err(e) = &result {
                    log::error!("Failed to load {}: {}", url, e);
                }
                JobResult::ImageLoaded { session, result }
            }
            Job::SaveAnnotation {
                session,
                submission,
            } => {
                let result = backend.save_annotation(&submission);
                JobResult::Saved {
                    session,
                    submission,
                    result,
                }
            }
        }
    }

    pub fn submit(&mut self, job: Job) {
        if self.request_tx.send(ThreadMessage::Run(job)).is_ok() {
            self.pending += 1;
        } else {
            log::error!("Backend request thread is gone; request dropped");
        }
    }

    /// Next finished job, if any. Never blocks.
    pub fn poll(&mut self) -> Option<JobResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    #[cfg(test)]
    fn wait(&mut self, timeout: std::time::Duration) -> Option<JobResult> {
        let result = self.result_rx.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(result)
    }
}

impl Drop for BackendWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        if self.pending > 0 {
            // A request may be blocked on the network with no timeout.
            log::debug!(
                "Detaching backend request thread with {} request(s) in flight",
                self.pending
            );
            return;
        }
        if handle.join().is_err() {
            log::warn!("Backend request thread panicked");
        }
    }
}
