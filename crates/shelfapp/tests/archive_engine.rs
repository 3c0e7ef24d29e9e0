use shelfapp::ShelfError;
use shelfapp::archive::{
    ArchiveEngine, ArchiveFormat, ArchiveSettings, JobBoard, JobId, JobStatus, MemoryJobBoard,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(30);

/// Board that remembers every accepted update.
struct RecordingBoard {
    inner: MemoryJobBoard,
    history: Mutex<Vec<JobStatus>>,
}

impl RecordingBoard {
    fn new() -> Self {
        Self {
            inner: MemoryJobBoard::new(64),
            history: Mutex::new(Vec::new()),
        }
    }
}

impl JobBoard for RecordingBoard {
    fn register(&self, id: &JobId) {
        self.inner.register(id);
    }

    fn publish(&self, id: &JobId, status: JobStatus) -> bool {
        let accepted = self.inner.publish(id, status.clone());
        if accepted {
            self.history.lock().unwrap().push(status);
        }
        accepted
    }

    fn get(&self, id: &JobId) -> Option<JobStatus> {
        self.inner.get(id)
    }
}

fn engine(root: &Path) -> ArchiveEngine {
    ArchiveEngine::start(ArchiveSettings::default(), root.to_path_buf()).unwrap()
}

fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

#[test]
fn empty_request_succeeds_with_no_files() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(tmp.path());

    let id = engine.submit(Vec::new()).unwrap();
    match engine.wait(&id, WAIT).unwrap() {
        JobStatus::Success {
            total_files,
            percent,
            result,
            ..
        } => {
            assert_eq!(total_files, 0);
            assert_eq!(percent, 0);
            assert_eq!(result.parent(), Some(tmp.path()));
            assert!(zip_names(&result).is_empty());
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn files_and_directories_keep_their_layout() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("a.txt"), b"0123456789").unwrap();
    fs::create_dir(root.join("d")).unwrap();
    fs::write(root.join("d/x.txt"), b"x").unwrap();
    fs::write(root.join("d/y.txt"), b"y").unwrap();

    let engine = engine(root);
    let id = engine
        .submit(vec![root.join("a.txt"), root.join("d")])
        .unwrap();

    match engine.wait(&id, WAIT).unwrap() {
        JobStatus::Success {
            total_files,
            percent,
            result,
            filename,
            ..
        } => {
            assert_eq!(total_files, 3);
            assert_eq!(percent, 100);
            assert!(filename.starts_with("archive_"));
            assert!(filename.ends_with(&format!("_{}.zip", id.short())));
            assert_eq!(result, root.join(&filename));
            assert_eq!(zip_names(&result), vec!["a.txt", "d/x.txt", "d/y.txt"]);
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn missing_sources_are_skipped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("real.txt"), b"r").unwrap();
    let engine = engine(tmp.path());

    let id = engine
        .submit(vec![tmp.path().join("ghost.txt"), tmp.path().join("real.txt")])
        .unwrap();
    match engine.wait(&id, WAIT).unwrap() {
        JobStatus::Success {
            total_files, result, ..
        } => {
            assert_eq!(total_files, 1);
            assert_eq!(zip_names(&result), vec!["real.txt"]);
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn progress_never_goes_backwards() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("many");
    fs::create_dir(&src).unwrap();
    for i in 0..23 {
        fs::write(src.join(format!("f{:02}.txt", i)), vec![b'x'; 512]).unwrap();
    }

    let board = Arc::new(RecordingBoard::new());
    let settings = ArchiveSettings {
        progress_every: 5,
        ..ArchiveSettings::default()
    };
    let engine = ArchiveEngine::with_board(
        settings,
        tmp.path().to_path_buf(),
        Arc::clone(&board) as Arc<dyn JobBoard>,
    )
    .unwrap();

    let id = engine.submit(vec![src]).unwrap();

    let mut polled = Vec::new();
    loop {
        let status = engine.status(&id).unwrap();
        let done = status.is_terminal();
        polled.push(status);
        if done {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    for seen in [&polled, &*board.history.lock().unwrap()] {
        let counts: Vec<u64> = seen.iter().filter_map(JobStatus::current).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{:?}", counts);
        let percents: Vec<u8> = seen.iter().filter_map(JobStatus::percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    }

    let published: Vec<u64> = board
        .history
        .lock()
        .unwrap()
        .iter()
        .filter(|s| matches!(s, JobStatus::Progress { .. }))
        .filter_map(JobStatus::current)
        .collect();
    assert_eq!(published, vec![0, 5, 10, 15, 20, 23]);
}

#[test]
fn unknown_job_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(tmp.path());
    let err = engine.status(&JobId::from("no-such-job")).unwrap_err();
    assert!(matches!(err, ShelfError::JobNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn tar_gz_output_and_output_dir() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("exports");
    fs::create_dir(&out).unwrap();
    fs::write(tmp.path().join("a.txt"), b"a").unwrap();

    let settings = ArchiveSettings {
        format: ArchiveFormat::TarGz,
        output_dir: Some(out.clone()),
        ..ArchiveSettings::default()
    };
    let engine = ArchiveEngine::start(settings, tmp.path().to_path_buf()).unwrap();
    let id = engine.submit(vec![tmp.path().join("a.txt")]).unwrap();

    match engine.wait(&id, WAIT).unwrap() {
        JobStatus::Success { result, .. } => {
            assert_eq!(result.parent(), Some(out.as_path()));
            assert!(result.to_string_lossy().ends_with(".tar.gz"));
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn failed_job_leaves_no_partial_archive() {
    let tmp = TempDir::new().unwrap();
    let missing_out = tmp.path().join("gone");
    let settings = ArchiveSettings {
        output_dir: Some(missing_out.clone()),
        ..ArchiveSettings::default()
    };
    fs::write(tmp.path().join("a.txt"), b"a").unwrap();
    let engine = ArchiveEngine::start(settings, tmp.path().to_path_buf()).unwrap();

    let id = engine.submit(vec![tmp.path().join("a.txt")]).unwrap();
    match engine.wait(&id, WAIT).unwrap() {
        JobStatus::Failure { error } => assert!(!error.is_empty()),
        other => panic!("unexpected status {:?}", other),
    }
    assert!(!missing_out.exists());
}

#[test]
fn concurrent_jobs_get_distinct_archives() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), b"a").unwrap();
    let settings = ArchiveSettings {
        workers: 4,
        ..ArchiveSettings::default()
    };
    let engine = ArchiveEngine::start(settings, tmp.path().to_path_buf()).unwrap();

    let ids: Vec<JobId> = (0..8)
        .map(|_| engine.submit(vec![tmp.path().join("a.txt")]).unwrap())
        .collect();

    let mut results: Vec<PathBuf> = ids
        .iter()
        .map(|id| match engine.wait(id, WAIT).unwrap() {
            JobStatus::Success { result, .. } => result,
            other => panic!("unexpected status {:?}", other),
        })
        .collect();
    results.sort();
    results.dedup();
    assert_eq!(results.len(), 8);
}
