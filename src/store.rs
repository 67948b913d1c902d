//! In-memory lead collection with optional JSON snapshot on disk.
//!
//! Every mutation is all-or-nothing: the change is applied to a copy, the
//! snapshot (if any) is written, and only then is the copy committed. A failed
//! snapshot write leaves the collection exactly as it was.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{LeadError, LeadResult};
use crate::lead::{Lead, LeadStatus};

pub const ENV_SNAPSHOT_PATH: &str = "LEADS_SNAPSHOT_PATH";

#[derive(Debug, Default)]
pub struct LeadStore {
    inner: RwLock<Vec<Lead>>,
    snapshot: Option<PathBuf>,
}

impl LeadStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON snapshot. A missing file starts empty.
    pub fn with_snapshot<P: AsRef<Path>>(path: P) -> LeadResult<Self> {
        let path = path.as_ref().to_path_buf();
        let leads = if path.exists() {
            let s = fs::read_to_string(&path)
                .map_err(|e| LeadError::Storage(format!("reading {}: {e}", path.display())))?;
            serde_json::from_str::<Vec<Lead>>(&s)
                .map_err(|e| LeadError::Storage(format!("parsing {}: {e}", path.display())))?
        } else {
            Vec::new()
        };
        tracing::info!(target: "desk", path = %path.display(), leads = leads.len(), "lead snapshot opened");
        Ok(Self {
            inner: RwLock::new(leads),
            snapshot: Some(path),
        })
    }

    /// `$LEADS_SNAPSHOT_PATH` if set, otherwise memory only.
    pub fn from_env() -> LeadResult<Self> {
        match std::env::var(ENV_SNAPSHOT_PATH) {
            Ok(p) if !p.trim().is_empty() => Self::with_snapshot(p),
            _ => Ok(Self::in_memory()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_many(&self, leads: Vec<Lead>) -> LeadResult<()> {
        let mut v = self.inner.write().map_err(|_| poisoned())?;
        let before = v.len();
        v.extend(leads);
        if let Err(e) = self.persist(&v) {
            v.truncate(before);
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> LeadResult<Lead> {
        let v = self.inner.read().map_err(|_| poisoned())?;
        v.iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(LeadError::NotFound(id))
    }

    /// Leads ordered by score (highest first), newest first within a score.
    pub fn list(&self, status: Option<LeadStatus>) -> LeadResult<Vec<Lead>> {
        let v = self.inner.read().map_err(|_| poisoned())?;
        let mut out: Vec<Lead> = v
            .iter()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(out)
    }

    /// Apply `f` to one lead atomically. If `f` errors or the snapshot cannot
    /// be written, nothing changes.
    pub fn update<F>(&self, id: Uuid, f: F) -> LeadResult<Lead>
    where
        F: FnOnce(&mut Lead) -> LeadResult<()>,
    {
        let mut v = self.inner.write().map_err(|_| poisoned())?;
        let idx = v
            .iter()
            .position(|l| l.id == id)
            .ok_or(LeadError::NotFound(id))?;

        let mut candidate = v[idx].clone();
        f(&mut candidate)?;

        let old = std::mem::replace(&mut v[idx], candidate);
        if let Err(e) = self.persist(&v) {
            v[idx] = old;
            return Err(e);
        }
        Ok(v[idx].clone())
    }

    fn persist(&self, leads: &[Lead]) -> LeadResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        write_snapshot(path, leads)
            .map_err(|e| LeadError::Storage(format!("writing {}: {e}", path.display())))
    }
}

fn poisoned() -> LeadError {
    LeadError::Storage("lead store lock poisoned".to_string())
}

fn write_snapshot(path: &Path, leads: &[Lead]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let s = serde_json::to_string_pretty(leads)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    f.sync_all()?;
    fs::rename(tmp, path)?;
    Ok(())
}
