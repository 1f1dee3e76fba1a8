//! Local JSON snapshot of the hosted database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use patentrack_core::{Employee, Patent};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{FieldMap, PatentRepository, StoreError};

const PATENTS_FILE: &str = "patents.json";
const EMPLOYEES_FILE: &str = "employees.json";

/// Snapshot directory holding `patents.json` and `employees.json`.
///
/// Each file is a JSON array of rows exactly as the REST endpoint returns
/// them. A missing `employees.json` reads as an empty roster.
///
/// Use [`open`](Self::open) for an existing directory and
/// [`create`](Self::create) when pulling a fresh snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open an existing snapshot directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::SnapshotNotFound(dir.to_path_buf()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Open a snapshot directory, creating it if needed.
    pub async fn create(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn patents_path(&self) -> PathBuf {
        self.dir.join(PATENTS_FILE)
    }

    fn employees_path(&self) -> PathBuf {
        self.dir.join(EMPLOYEES_FILE)
    }

    /// Whether `patents.json` is present.
    pub fn has_snapshot(&self) -> bool {
        self.patents_path().is_file()
    }

    /// Replace both files with the given rows.
    pub async fn write_snapshot(
        &self,
        patents: &[Patent],
        employees: &[Employee],
    ) -> Result<(), StoreError> {
        write_json(&self.patents_path(), patents).await?;
        write_json(&self.employees_path(), employees).await?;
        info!(
            dir = %self.dir.display(),
            patents = patents.len(),
            employees = employees.len(),
            "wrote snapshot"
        );
        Ok(())
    }

    pub async fn patent_count(&self) -> Result<usize, StoreError> {
        let rows: Vec<Value> = read_json(&self.patents_path()).await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl PatentRepository for SnapshotStore {
    type Error = StoreError;

    async fn fetch_patents(&self) -> Result<Vec<Patent>, StoreError> {
        let patents: Vec<Patent> = read_json(&self.patents_path()).await?;
        info!(count = patents.len(), "loaded patents from snapshot");
        Ok(patents)
    }

    async fn fetch_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let path = self.employees_path();
        if !path.is_file() {
            debug!(path = %path.display(), "no roster in snapshot");
            return Ok(Vec::new());
        }
        let employees: Vec<Employee> = read_json(&path).await?;
        info!(count = employees.len(), "loaded employees from snapshot");
        Ok(employees)
    }

    /// Merge `fields` into the stored row, check the row still parses as a
    /// [`Patent`], and rewrite `patents.json`.
    async fn update_patent(&self, id: &str, fields: FieldMap) -> Result<(), StoreError> {
        let path = self.patents_path();
        let mut rows: Vec<Value> = read_json(&path).await?;

        let row = rows
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::PatentNotFound(id.to_string()))?;
        let object = row
            .as_object_mut()
            .ok_or_else(|| StoreError::Other(format!("patent row {id} is not an object")))?;

        let changed = fields.len();
        object.extend(fields);
        serde_json::from_value::<Patent>(Value::Object(object.clone()))?;

        write_json(&path, &rows).await?;
        info!(id, fields = changed, "updated patent in snapshot");
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.is_file() {
        return Err(StoreError::SnapshotNotFound(path.to_path_buf()));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write through a temporary sibling so readers never see a half-written file.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentrack_core::Role;
    use serde_json::json;

    fn sample_patents() -> Vec<Patent> {
        vec![
            Patent {
                id: "p1".into(),
                tracking_id: "PAT-001".into(),
                idf_sent: true,
                ..Default::default()
            },
            Patent {
                id: "p2".into(),
                tracking_id: "PAT-002".into(),
                ..Default::default()
            },
        ]
    }

    fn sample_employees() -> Vec<Employee> {
        vec![Employee {
            id: "e1".into(),
            full_name: "Meera".into(),
            role: Role::Drafter,
        }]
    }

    #[test]
    fn open_missing_dir_errors() {
        let result = SnapshotStore::open(Path::new("/nonexistent/snapshot"));
        assert!(matches!(result, Err(StoreError::SnapshotNotFound(_))));
    }

    #[tokio::test]
    async fn empty_dir_has_no_snapshot() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::open(tmp.path()).unwrap();
        assert!(!store.has_snapshot());
        assert!(matches!(
            store.fetch_patents().await,
            Err(StoreError::SnapshotNotFound(_))
        ));
        assert!(store.fetch_employees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_and_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("snap");

        let store = SnapshotStore::create(&dir).await.unwrap();
        store
            .write_snapshot(&sample_patents(), &sample_employees())
            .await
            .unwrap();
        assert!(store.has_snapshot());
        drop(store);

        let store = SnapshotStore::open(&dir).unwrap();
        let patents = store.fetch_patents().await.unwrap();
        assert_eq!(patents.len(), 2);
        assert_eq!(patents[0].tracking_id, "PAT-001");
        assert!(patents[0].idf_sent);
        assert_eq!(store.patent_count().await.unwrap(), 2);
        assert_eq!(store.fetch_employees().await.unwrap()[0].full_name, "Meera");
    }

    #[tokio::test]
    async fn reads_rows_with_nulls() {
        let tmp = tempfile::TempDir::new().unwrap();
        let rows = r#"[{"id": "p9", "tracking_id": "PAT-009", "idf_received": null, "inventors": null}]"#;
        std::fs::write(tmp.path().join(PATENTS_FILE), rows).unwrap();

        let store = SnapshotStore::open(tmp.path()).unwrap();
        let patents = store.fetch_patents().await.unwrap();
        assert!(!patents[0].idf_received);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::create(tmp.path()).await.unwrap();
        store
            .write_snapshot(&sample_patents(), &sample_employees())
            .await
            .unwrap();

        let mut fields = FieldMap::new();
        fields.insert("ps_drafting_status".into(), json!(1));
        fields.insert("ps_drafter_assgn".into(), json!("Meera"));
        store.update_patent("p2", fields).await.unwrap();

        let patents = store.fetch_patents().await.unwrap();
        assert_eq!(patents[1].ps_drafting_status, 1);
        assert_eq!(patents[1].ps_drafter_assgn.as_deref(), Some("Meera"));
        assert_eq!(patents[0].ps_drafting_status, 0);
    }

    #[tokio::test]
    async fn update_unknown_id_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::create(tmp.path()).await.unwrap();
        store.write_snapshot(&sample_patents(), &[]).await.unwrap();

        let result = store.update_patent("missing", FieldMap::new()).await;
        assert!(matches!(result, Err(StoreError::PatentNotFound(_))));
    }

    #[tokio::test]
    async fn update_rejects_invalid_values() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::create(tmp.path()).await.unwrap();
        store.write_snapshot(&sample_patents(), &[]).await.unwrap();

        let mut fields = FieldMap::new();
        fields.insert("ps_drafting_status".into(), json!("done"));
        let result = store.update_patent("p1", fields).await;
        assert!(matches!(result, Err(StoreError::Json(_))));

        // File untouched.
        let patents = store.fetch_patents().await.unwrap();
        assert_eq!(patents[0].ps_drafting_status, 0);
    }
}
