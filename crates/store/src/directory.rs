use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StoreError;
use crate::record::PlanRecord;
use crate::traits::PlanStore;

/// Plan store keeping one pretty-printed JSON file per record:
/// `<root>/<record id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryPlanStore {
    root: PathBuf,
}

/// Just enough of a record to decide namespace membership.
#[derive(Deserialize)]
struct GroupProbe {
    group: String,
}

impl DirectoryPlanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryPlanStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    /// JSON files directly under the root. A missing root holds no records.
    fn record_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn read(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl PlanStore for DirectoryPlanStore {
    fn discard_namespace(&mut self, namespace: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for path in self.record_files()? {
            // Files that are not plan records belong to someone else.
            let Ok(probe) = serde_json::from_str::<GroupProbe>(&read(&path)?) else {
                tracing::debug!(path = %path.display(), "skipping non-plan file");
                continue;
            };
            if probe.group == namespace {
                fs::remove_file(&path).map_err(|source| StoreError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn save(&mut self, record: &PlanRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(record).map_err(|source| StoreError::Serialize {
            id: record.id.clone(),
            source,
        })?;
        let path = self.record_path(&record.id);
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }

    fn load_namespace(&self, namespace: &str) -> Result<Vec<PlanRecord>, StoreError> {
        let mut records = Vec::new();
        for path in self.record_files()? {
            let content = read(&path)?;
            if serde_json::from_str::<GroupProbe>(&content)
                .map_or(true, |probe| probe.group != namespace)
            {
                continue;
            }
            let record: PlanRecord = serde_json::from_str(&content)
                .map_err(|source| StoreError::Corrupt { path, source })?;
            records.push(record);
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
