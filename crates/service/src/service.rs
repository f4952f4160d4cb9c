use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::thread;

use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use file_sorter_core::{
    collect_doctor_info, delete_paths, load_config, run_pipeline, DeletionMode, DeletionOutcome,
    DeletionRequest, DoctorInfo, PipelineOutput, PipelineStage, ScanOptions, SorterConfig,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub scan_id: Option<String>,
    pub root: PathBuf,
    #[serde(default)]
    pub config_path: Option<PathBuf>,
    #[serde(default)]
    pub chunk_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanSessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanProgressEvent {
    pub seq: u64,
    pub scan_id: String,
    pub stage: PipelineStage,
    pub percent: u8,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSessionSnapshot {
    pub scan_id: String,
    pub root: PathBuf,
    pub status: ScanSessionStatus,
    pub stage: Option<PipelineStage>,
    pub percent: u8,
    pub error: Option<String>,
    pub file_count: Option<usize>,
    pub total_size_bytes: Option<u64>,
}

/// `status` stays `running` until the worker notices the request and exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelScanResponse {
    pub scan_id: String,
    pub status: ScanSessionStatus,
    pub cancel_requested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub paths: Vec<PathBuf>,
    pub mode: DeletionMode,
    /// Directory to scan again once the batch has touched at least one path.
    #[serde(default)]
    pub rescan_root: Option<PathBuf>,
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub outcome: DeletionOutcome,
    pub rescan_id: Option<String>,
}

#[derive(Debug)]
struct ScanSession {
    /// Distinguishes runs that reuse the same scan id.
    generation: u64,
    root: PathBuf,
    status: ScanSessionStatus,
    output: Option<PipelineOutput>,
    file_count: Option<usize>,
    total_size_bytes: Option<u64>,
    error: Option<String>,
    events: Vec<ScanProgressEvent>,
    cancel_flag: Arc<AtomicBool>,
}

impl ScanSession {
    fn new(generation: u64, root: PathBuf, cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            generation,
            root,
            status: ScanSessionStatus::Running,
            output: None,
            file_count: None,
            total_size_bytes: None,
            error: None,
            events: Vec::new(),
            cancel_flag,
        }
    }
}

/// Finished sessions `start_scan` retains. Older ones are dropped along with
/// any inventory nobody took.
const MAX_FINISHED_SESSIONS: usize = 16;

static SESSIONS: Lazy<Mutex<HashMap<String, ScanSession>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Starts scan + distribution on a background thread and returns its id.
pub fn start_scan(request: ScanRequest) -> Result<String> {
    let config = resolve_config(request.config_path.as_deref(), request.chunk_capacity)?;
    let scan_id = request
        .scan_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

    {
        let mut sessions = lock_sessions()?;
        if sessions
            .get(&scan_id)
            .is_some_and(|session| session.status == ScanSessionStatus::Running)
        {
            return Err(anyhow!("scan session already running: {scan_id}"));
        }
        sessions.insert(
            scan_id.clone(),
            ScanSession::new(generation, request.root.clone(), Arc::clone(&cancel_flag)),
        );
        evict_finished(&mut sessions, MAX_FINISHED_SESSIONS);
    }

    let thread_scan_id = scan_id.clone();
    thread::spawn(move || {
        let options = ScanOptions {
            cancel_flag: Some(Arc::clone(&cancel_flag)),
            ..ScanOptions::from_config(request.root, &config)
        };

        let mut last_seen: Option<(PipelineStage, u8)> = None;
        let run_result = run_pipeline(&options, |event| {
            if last_seen == Some((event.stage, event.percent)) {
                return;
            }
            last_seen = Some((event.stage, event.percent));
            if let Ok(mut sessions) = lock_sessions() {
                if let Some(session) = own_session(&mut sessions, &thread_scan_id, generation) {
                    let seq = session.events.len() as u64 + 1;
                    session.events.push(ScanProgressEvent {
                        seq,
                        scan_id: thread_scan_id.clone(),
                        stage: event.stage,
                        percent: event.percent,
                        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    });
                }
            }
        });

        let Ok(mut sessions) = lock_sessions() else {
            return;
        };
        let Some(session) = own_session(&mut sessions, &thread_scan_id, generation) else {
            return;
        };
        match run_result {
            Ok(_) if cancel_flag.load(Ordering::Relaxed) => {
                session.status = ScanSessionStatus::Cancelled;
            }
            Ok(output) => {
                session.file_count = Some(output.result.file_count());
                session.total_size_bytes = Some(output.result.total_size_bytes);
                session.output = Some(output);
                session.status = ScanSessionStatus::Completed;
                session.error = None;
            }
            Err(err) if err.is_cancelled() => {
                session.status = ScanSessionStatus::Cancelled;
            }
            Err(err) => {
                warn!("scan session {} failed: {}", thread_scan_id, err);
                session.status = ScanSessionStatus::Failed;
                session.error = Some(err.to_string());
            }
        }
    });

    Ok(scan_id)
}

pub fn poll_scan_events(scan_id: &str, from_seq: u64) -> Result<Vec<ScanProgressEvent>> {
    let sessions = lock_sessions()?;
    let session = sessions
        .get(scan_id)
        .ok_or_else(|| anyhow!("scan session not found: {scan_id}"))?;

    Ok(session
        .events
        .iter()
        .filter(|event| event.seq > from_seq)
        .cloned()
        .collect())
}

pub fn get_scan_session(scan_id: &str) -> Result<ScanSessionSnapshot> {
    let sessions = lock_sessions()?;
    let session = sessions
        .get(scan_id)
        .ok_or_else(|| anyhow!("scan session not found: {scan_id}"))?;
    let last = session.events.last();

    Ok(ScanSessionSnapshot {
        scan_id: scan_id.to_string(),
        root: session.root.clone(),
        status: session.status.clone(),
        stage: last.map(|event| event.stage),
        percent: last.map(|event| event.percent).unwrap_or(0),
        error: session.error.clone(),
        file_count: session.file_count,
        total_size_bytes: session.total_size_bytes,
    })
}

/// Hands the finished inventory to the caller. The session keeps its summary
/// but no longer owns the records.
pub fn take_scan_output(scan_id: &str) -> Result<PipelineOutput> {
    let mut sessions = lock_sessions()?;
    let session = sessions
        .get_mut(scan_id)
        .ok_or_else(|| anyhow!("scan session not found: {scan_id}"))?;

    match session.status {
        ScanSessionStatus::Completed => session
            .output
            .take()
            .ok_or_else(|| anyhow!("scan output already taken: {scan_id}")),
        ScanSessionStatus::Running => Err(anyhow!("scan session still running: {scan_id}")),
        ScanSessionStatus::Cancelled => Err(anyhow!("scan session was cancelled: {scan_id}")),
        ScanSessionStatus::Failed => Err(anyhow!(
            "scan session failed: {}",
            session.error.clone().unwrap_or_default()
        )),
    }
}

pub fn cancel_scan(scan_id: &str) -> Result<CancelScanResponse> {
    let mut sessions = lock_sessions()?;
    let session = sessions
        .get_mut(scan_id)
        .ok_or_else(|| anyhow!("scan session not found: {scan_id}"))?;

    let cancel_requested = session.status == ScanSessionStatus::Running;
    if cancel_requested {
        session.cancel_flag.store(true, Ordering::Relaxed);
    }

    Ok(CancelScanResponse {
        scan_id: scan_id.to_string(),
        status: session.status.clone(),
        cancel_requested,
    })
}

/// Drops a finished session and whatever inventory it still holds.
pub fn remove_scan_session(scan_id: &str) -> Result<()> {
    let mut sessions = lock_sessions()?;
    let status = sessions
        .get(scan_id)
        .map(|session| session.status.clone())
        .ok_or_else(|| anyhow!("scan session not found: {scan_id}"))?;
    if status == ScanSessionStatus::Running {
        return Err(anyhow!("scan session still running: {scan_id}"));
    }
    sessions.remove(scan_id);
    Ok(())
}

/// Runs one deletion batch and, when asked, starts the follow-up scan.
pub fn delete_files(request: DeleteRequest) -> Result<DeleteResponse> {
    let deletion = DeletionRequest::from_selection(request.paths, request.mode);
    let outcome = delete_paths(&deletion);

    let rescan_id = match request.rescan_root {
        Some(root) if outcome.attempted > 0 && root.is_dir() => Some(start_scan(ScanRequest {
            root,
            config_path: request.config_path,
            ..ScanRequest::default()
        })?),
        _ => None,
    };
    if let Some(id) = &rescan_id {
        info!("rescan {} started after deletion batch", id);
    }

    Ok(DeleteResponse { outcome, rescan_id })
}

pub fn doctor(config_path: Option<&Path>) -> Result<DoctorInfo> {
    let config = resolve_config(config_path, None)?;
    Ok(collect_doctor_info(&config))
}

fn resolve_config(path: Option<&Path>, chunk_capacity: Option<usize>) -> Result<SorterConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SorterConfig::default(),
    };
    if let Some(capacity) = chunk_capacity {
        config.chunk_capacity = capacity;
    }
    config.validate()
}

/// The session under `scan_id`, unless a newer run has taken the id over.
fn own_session<'a>(
    sessions: &'a mut HashMap<String, ScanSession>,
    scan_id: &str,
    generation: u64,
) -> Option<&'a mut ScanSession> {
    sessions
        .get_mut(scan_id)
        .filter(|session| session.generation == generation)
}

fn evict_finished(sessions: &mut HashMap<String, ScanSession>, keep: usize) {
    let mut finished: Vec<(u64, String)> = sessions
        .iter()
        .filter(|(_, session)| session.status != ScanSessionStatus::Running)
        .map(|(id, session)| (session.generation, id.clone()))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    for (_, scan_id) in finished.into_iter().skip(keep) {
        debug!("evicting finished scan session {}", scan_id);
        sessions.remove(&scan_id);
    }
}

fn lock_sessions() -> Result<std::sync::MutexGuard<'static, HashMap<String, ScanSession>>> {
    SESSIONS
        .lock()
        .map_err(|_| anyhow!("scan session registry lock poisoned"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{atomic::AtomicBool, Arc};
    use std::time::{Duration, Instant};

    use file_sorter_core::{DeletionMode, PipelineStage};
    use tempfile::TempDir;

    use super::{
        cancel_scan, delete_files, doctor, evict_finished, get_scan_session, poll_scan_events,
        remove_scan_session, start_scan, take_scan_output, DeleteRequest, ScanRequest,
        ScanSession, ScanSessionSnapshot, ScanSessionStatus,
    };

    fn wait_for(scan_id: &str) -> ScanSessionSnapshot {
        let started = Instant::now();
        loop {
            let snapshot = get_scan_session(scan_id).expect("session exists");
            if snapshot.status != ScanSessionStatus::Running {
                return snapshot;
            }
            assert!(started.elapsed() < Duration::from_secs(30));
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    #[test]
    fn start_scan_creates_session_and_events() {
        let temp = TempDir::new().expect("tempdir");
        for name in ["a.jpg", "b.txt", "c.mp4", "d.bin"] {
            fs::write(temp.path().join(name), name.as_bytes()).expect("write");
        }

        let scan_id = start_scan(ScanRequest {
            root: temp.path().to_path_buf(),
            chunk_capacity: Some(2),
            ..ScanRequest::default()
        })
        .expect("scan starts");

        let snapshot = wait_for(&scan_id);
        assert_eq!(snapshot.status, ScanSessionStatus::Completed);
        assert_eq!(snapshot.file_count, Some(4));
        assert_eq!(snapshot.stage, Some(PipelineStage::Distributing));
        assert_eq!(snapshot.percent, 100);

        let events = poll_scan_events(&scan_id, 0).expect("events");
        assert!(events
            .iter()
            .any(|e| e.stage == PipelineStage::Scanning && e.percent == 100));
        let later = poll_scan_events(&scan_id, events[0].seq).expect("events");
        assert_eq!(later.len(), events.len() - 1);

        let output = take_scan_output(&scan_id).expect("output");
        assert_eq!(output.buckets.all.len(), 4);
        assert!(take_scan_output(&scan_id).is_err());
    }

    #[test]
    fn missing_root_marks_session_failed() {
        let temp = TempDir::new().expect("tempdir");
        let scan_id = start_scan(ScanRequest {
            root: temp.path().join("missing"),
            ..ScanRequest::default()
        })
        .expect("scan starts");

        let snapshot = wait_for(&scan_id);
        assert_eq!(snapshot.status, ScanSessionStatus::Failed);
        assert!(snapshot.error.is_some());
    }

    #[test]
    fn delete_files_reports_and_rescans() {
        let temp = TempDir::new().expect("tempdir");
        let doomed = temp.path().join("old.log");
        fs::write(&doomed, b"stale").expect("write");
        fs::write(temp.path().join("keep.txt"), b"keep").expect("write");

        let response = delete_files(DeleteRequest {
            paths: vec![doomed.clone(), temp.path().join("already-gone.txt")],
            mode: DeletionMode::Permanent,
            rescan_root: Some(temp.path().to_path_buf()),
            config_path: None,
        })
        .expect("delete runs");

        assert_eq!(response.outcome.attempted, 1);
        assert!(response.outcome.is_complete_success());
        assert!(!doomed.exists());

        let rescan_id = response.rescan_id.expect("rescan started");
        let snapshot = wait_for(&rescan_id);
        assert_eq!(snapshot.file_count, Some(1));
    }

    #[test]
    fn doctor_reports_default_chunk_capacity() {
        let info = doctor(None).expect("doctor");
        assert_eq!(info.chunk_capacity, 100);
    }

    #[test]
    fn reused_id_after_cancel_belongs_to_the_new_run() {
        let busy = TempDir::new().expect("tempdir");
        for index in 0..2_000 {
            fs::write(busy.path().join(format!("f{index:04}.txt")), b"x").expect("write");
        }
        let small = TempDir::new().expect("tempdir");
        fs::write(small.path().join("only.jpg"), b"jpg").expect("write");
        let scan_id = "reused-after-cancel".to_string();

        start_scan(ScanRequest {
            scan_id: Some(scan_id.clone()),
            root: busy.path().to_path_buf(),
            chunk_capacity: Some(10),
            ..ScanRequest::default()
        })
        .expect("first scan starts");
        let cancelled = cancel_scan(&scan_id).expect("cancel");
        assert!(cancelled.cancel_requested || cancelled.status != ScanSessionStatus::Running);

        // The cancelled run keeps the id until its worker exits.
        let started = Instant::now();
        loop {
            let restarted = start_scan(ScanRequest {
                scan_id: Some(scan_id.clone()),
                root: small.path().to_path_buf(),
                ..ScanRequest::default()
            });
            if restarted.is_ok() {
                break;
            }
            assert!(started.elapsed() < Duration::from_secs(30));
            std::thread::sleep(Duration::from_millis(10));
        }

        let snapshot = wait_for(&scan_id);
        assert_eq!(snapshot.status, ScanSessionStatus::Completed);
        assert_eq!(snapshot.root, small.path());
        assert_eq!(snapshot.file_count, Some(1));

        let events = poll_scan_events(&scan_id, 0).expect("events");
        assert!(events
            .iter()
            .enumerate()
            .all(|(index, event)| event.seq == index as u64 + 1));
        assert_eq!(
            events.last().map(|event| (event.stage, event.percent)),
            Some((PipelineStage::Distributing, 100))
        );

        let output = take_scan_output(&scan_id).expect("output");
        assert_eq!(output.result.files.len(), 1);
    }

    #[test]
    fn finished_session_can_be_removed() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write");
        let scan_id = start_scan(ScanRequest {
            root: temp.path().to_path_buf(),
            ..ScanRequest::default()
        })
        .expect("scan starts");
        wait_for(&scan_id);

        remove_scan_session(&scan_id).expect("removed");
        assert!(get_scan_session(&scan_id).is_err());
        assert!(remove_scan_session(&scan_id).is_err());
    }

    #[test]
    fn eviction_keeps_newest_finished_and_all_running() {
        let mut sessions = HashMap::new();
        for generation in 1..=5_u64 {
            let mut session = ScanSession::new(
                generation,
                PathBuf::from(format!("/scan/{generation}")),
                Arc::new(AtomicBool::new(false)),
            );
            if generation != 1 {
                session.status = ScanSessionStatus::Completed;
            }
            sessions.insert(format!("s{generation}"), session);
        }

        evict_finished(&mut sessions, 2);

        let mut kept: Vec<_> = sessions.keys().cloned().collect();
        kept.sort();
        assert_eq!(kept, vec!["s1", "s4", "s5"]);
    }
}
