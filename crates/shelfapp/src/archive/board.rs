//! Job status backend.
//!
//! Workers publish into a board and callers poll it. The trait is the seam
//! for out-of-process backends; [`MemoryJobBoard`] serves the in-process engine.

use super::status::{JobId, JobStatus};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

pub trait JobBoard: Send + Sync {
    /// Register a freshly submitted job as `PENDING`.
    fn register(&self, id: &JobId);

    /// Replace a job's status. Returns `false` (and keeps the old status)
    /// when the job is unknown or the transition is not allowed.
    fn publish(&self, id: &JobId, status: JobStatus) -> bool;

    /// Current snapshot, `None` for ids the board does not know.
    fn get(&self, id: &JobId) -> Option<JobStatus>;
}

#[derive(Default)]
struct BoardState {
    jobs: HashMap<JobId, JobStatus>,
    /// Terminal jobs in the order they finished, oldest first.
    finished: VecDeque<JobId>,
}

/// In-memory board that keeps at most `retain_finished` terminal jobs.
pub struct MemoryJobBoard {
    state: RwLock<BoardState>,
    retain_finished: usize,
}

impl MemoryJobBoard {
    pub fn new(retain_finished: usize) -> Self {
        Self {
            state: RwLock::new(BoardState::default()),
            retain_finished,
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobBoard for MemoryJobBoard {
    fn register(&self, id: &JobId) {
        self.state.write().jobs.insert(id.clone(), JobStatus::Pending);
    }

    fn publish(&self, id: &JobId, status: JobStatus) -> bool {
        let mut state = self.state.write();
        let Some(current) = state.jobs.get_mut(id) else {
            tracing::warn!(job_id = %id, "Status published for unknown job");
            return false;
        };
        if !current.can_advance_to(&status) {
            tracing::warn!(
                job_id = %id,
                from = current.state_name(),
                to = status.state_name(),
                "Rejected job status regression"
            );
            return false;
        }

        let finished = status.is_terminal();
        *current = status;

        if finished {
            state.finished.push_back(id.clone());
            while state.finished.len() > self.retain_finished {
                if let Some(evicted) = state.finished.pop_front() {
                    state.jobs.remove(&evicted);
                    tracing::debug!(job_id = %evicted, "Evicted finished job");
                }
            }
        }
        true
    }

    fn get(&self, id: &JobId) -> Option<JobStatus> {
        self.state.read().jobs.get(id).cloned()
    }
}
