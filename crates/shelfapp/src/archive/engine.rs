use super::ArchiveSettings;
use super::board::{JobBoard, MemoryJobBoard};
use super::job;
use super::status::{JobId, JobStatus};
use crate::error::{Result, ShelfError};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct Task {
    id: JobId,
    paths: Vec<PathBuf>,
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
}

struct EngineInner {
    queue: Mutex<QueueState>,
    ready: Condvar,
    board: Arc<dyn JobBoard>,
    settings: ArchiveSettings,
    fallback_dir: PathBuf,
}

/// Background archive builder: a FIFO queue drained by worker threads.
///
/// Dropping the engine shuts it down, which waits for queued jobs to finish.
pub struct ArchiveEngine {
    inner: Arc<EngineInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ArchiveEngine {
    /// Start the engine with an in-memory job board.
    ///
    /// `fallback_dir` receives archives for requests without a usable first
    /// path, typically the storage root.
    pub fn start(settings: ArchiveSettings, fallback_dir: PathBuf) -> Result<Self> {
        let board = Arc::new(MemoryJobBoard::new(settings.retain_finished));
        Self::with_board(settings, fallback_dir, board)
    }

    pub fn with_board(
        settings: ArchiveSettings,
        fallback_dir: PathBuf,
        board: Arc<dyn JobBoard>,
    ) -> Result<Self> {
        let worker_count = settings.workers.max(1);
        let inner = Arc::new(EngineInner {
            queue: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
            board,
            settings,
            fallback_dir,
        });

        let engine = Self {
            inner,
            workers: Mutex::new(Vec::with_capacity(worker_count)),
        };
        for index in 0..worker_count {
            let inner = Arc::clone(&engine.inner);
            let handle = thread::Builder::new()
                .name(format!("shelf-archive-{}", index))
                .spawn(move || worker_loop(inner))
                .map_err(ShelfError::Io)?;
            engine.workers.lock().push(handle);
        }

        tracing::info!(workers = worker_count, "Archive engine started");
        Ok(engine)
    }

    /// Queue a job and return its id without waiting for any work.
    pub fn submit(&self, paths: Vec<PathBuf>) -> Result<JobId> {
        let id = JobId::generate();
        {
            let mut queue = self.inner.queue.lock();
            if queue.closed {
                return Err(ShelfError::EngineStopped);
            }
            self.inner.board.register(&id);
            queue.tasks.push_back(Task {
                id: id.clone(),
                paths,
            });
        }
        self.inner.ready.notify_one();
        tracing::debug!(job_id = %id, "Archive job queued");
        Ok(id)
    }

    pub fn status(&self, id: &JobId) -> Result<JobStatus> {
        self.inner
            .board
            .get(id)
            .ok_or_else(|| ShelfError::JobNotFound(id.to_string()))
    }

    /// Poll until the job is terminal or `timeout` elapses, returning the
    /// last snapshot seen.
    pub fn wait(&self, id: &JobId, timeout: Duration) -> Result<JobStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(id)?;
            if status.is_terminal() || Instant::now() >= deadline {
                return Ok(status);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().tasks.len()
    }

    /// Stop accepting jobs, let the workers drain the queue and join them.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        {
            let mut queue = self.inner.queue.lock();
            if queue.closed && self.workers.lock().is_empty() {
                return;
            }
            queue.closed = true;
        }
        self.inner.ready.notify_all();

        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Archive worker exited with a panic");
            }
        }
        tracing::info!("Archive engine stopped");
    }
}

impl Drop for ArchiveEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(inner: Arc<EngineInner>) {
    while let Some(task) = next_task(&inner) {
        inner.execute(task);
    }
}

/// Block until a task is available; `None` once closed and drained.
fn next_task(inner: &EngineInner) -> Option<Task> {
    let mut queue = inner.queue.lock();
    loop {
        if let Some(task) = queue.tasks.pop_front() {
            return Some(task);
        }
        if queue.closed {
            return None;
        }
        inner.ready.wait(&mut queue);
    }
}

impl EngineInner {
    fn execute(&self, task: Task) {
        let Task { id, paths } = task;
        tracing::info!(job_id = %id, paths = paths.len(), "Archive job started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            job::run(&id, &paths, &self.settings, &self.fallback_dir, &mut |status| {
                self.board.publish(&id, status);
            })
        }));

        let terminal = outcome.unwrap_or_else(|payload| {
            let error = panic_message(payload.as_ref());
            tracing::error!(job_id = %id, error = %error, "Archive job panicked");
            JobStatus::Failure { error }
        });
        self.board.publish(&id, terminal);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("archive worker panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("archive worker panicked: {}", msg)
    } else {
        "archive worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn submit_returns_pending_id() {
        let tmp = TempDir::new().unwrap();
        let engine = ArchiveEngine::start(ArchiveSettings::default(), tmp.path().to_path_buf()).unwrap();
        let id = engine.submit(vec![]).unwrap();
        assert!(engine.status(&id).is_ok());

        let done = engine.wait(&id, WAIT).unwrap();
        assert_eq!(done.state_name(), "SUCCESS");
    }

    #[test]
    fn unknown_job_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let engine = ArchiveEngine::start(ArchiveSettings::default(), tmp.path().to_path_buf()).unwrap();
        let err = engine.status(&JobId::from("missing")).unwrap_err();
        assert!(matches!(err, ShelfError::JobNotFound(_)));
    }

    #[test]
    fn shutdown_drains_queue_and_rejects_new_jobs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        let settings = ArchiveSettings {
            workers: 1,
            ..ArchiveSettings::default()
        };
        let engine = ArchiveEngine::start(settings, tmp.path().to_path_buf()).unwrap();

        let ids: Vec<JobId> = (0..4)
            .map(|_| engine.submit(vec![tmp.path().join("a.txt")]).unwrap())
            .collect();
        engine.shutdown();

        for id in &ids {
            assert!(engine.status(id).unwrap().is_terminal());
        }
        assert_eq!(engine.queued(), 0);
        assert!(matches!(
            engine.submit(vec![]),
            Err(ShelfError::EngineStopped)
        ));
        engine.shutdown();
    }

    #[test]
    fn panic_payload_becomes_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "archive worker panicked: boom");
    }
}
