use async_trait::async_trait;
use fd_lock::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{check_version, sort_jobs, JobRepository, StorageError};
use crate::jobs::types::Job;

/// JSON snapshot repository.
///
/// All jobs live in one JSON array. Every operation takes an advisory lock on
/// a sidecar `.lock` file (shared for reads, exclusive for writes), so several
/// processes can share one snapshot without losing updates. Writes go to a
/// temporary file that is renamed over the snapshot.
#[derive(Debug, Clone)]
pub struct FileJobRepository {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileJobRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opened job snapshot repository");
        Ok(Self {
            lock_path: sibling(&path, ".lock"),
            path,
        })
    }

    async fn read_with<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(BTreeMap<String, Job>) -> Result<T, StorageError> + Send + 'static,
    {
        let (path, lock_path) = (self.path.clone(), self.lock_path.clone());
        run_blocking(move || {
            let lock = RwLock::new(open_lock_file(&lock_path)?);
            let _guard = lock.read()?;
            f(read_snapshot(&path)?)
        })
        .await
    }

    async fn write_with<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, Job>) -> Result<(), StorageError> + Send + 'static,
    {
        let (path, lock_path) = (self.path.clone(), self.lock_path.clone());
        run_blocking(move || {
            let mut lock = RwLock::new(open_lock_file(&lock_path)?);
            let _guard = lock.write()?;
            let mut jobs = read_snapshot(&path)?;
            f(&mut jobs)?;
            write_snapshot(&path, &jobs)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
}

fn open_lock_file(lock_path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
}

fn read_snapshot(path: &Path) -> Result<BTreeMap<String, Job>, StorageError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let entries: Vec<Job> = serde_json::from_str(&data)?;
    let mut jobs = BTreeMap::new();
    for job in entries {
        let id = job.id.clone();
        if jobs.insert(id.clone(), job).is_some() {
            return Err(StorageError::Corrupted {
                reason: format!("job {id} appears more than once"),
            });
        }
    }
    Ok(jobs)
}

/// `path` with `suffix` appended to its full file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_snapshot(path: &Path, jobs: &BTreeMap<String, Job>) -> Result<(), StorageError> {
    let mut entries: Vec<Job> = jobs.values().cloned().collect();
    sort_jobs(&mut entries);
    let data = serde_json::to_string_pretty(&entries)?;

    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), count = entries.len(), "Job snapshot written");
    Ok(())
}

#[async_trait]
impl JobRepository for FileJobRepository {
    async fn get(&self, id: &str) -> Result<Job, StorageError> {
        let id = id.to_string();
        self.read_with(move |mut jobs| {
            jobs.remove(&id).ok_or(StorageError::NotFound { id })
        })
        .await
    }

    async fn create(&self, job: &Job) -> Result<(), StorageError> {
        let job = job.clone();
        self.write_with(move |jobs| {
            if jobs.contains_key(&job.id) {
                return Err(StorageError::AlreadyExists { id: job.id });
            }
            jobs.insert(job.id.clone(), job);
            Ok(())
        })
        .await
    }

    async fn put(&self, job: &Job) -> Result<(), StorageError> {
        let job = job.clone();
        self.write_with(move |jobs| {
            let stored = jobs
                .get(&job.id)
                .ok_or_else(|| StorageError::NotFound { id: job.id.clone() })?;
            check_version(stored, &job)?;
            jobs.insert(job.id.clone(), job);
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Job>, StorageError> {
        self.read_with(|jobs| {
            let mut entries: Vec<Job> = jobs.into_values().collect();
            sort_jobs(&mut entries);
            Ok(entries)
        })
        .await
    }
}
