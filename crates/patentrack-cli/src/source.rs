//! Where the CLI reads patents from: the local snapshot or the hosted database.

use std::path::Path;

use anyhow::Context;
use patentrack_core::{Employee, Patent};
use patentrack_store::{FieldMap, PatentRepository, SnapshotStore};
use patentrack_sync::RestClient;
use tracing::info;

pub enum Source {
    Snapshot(SnapshotStore),
    Remote(RestClient),
}

impl Source {
    /// Remote when an API URL is configured, otherwise the snapshot directory.
    pub fn select(
        data_dir: &Path,
        api_url: Option<&str>,
        api_key: Option<&str>,
    ) -> anyhow::Result<Self> {
        match api_url {
            Some(url) => {
                info!(url, "reading from hosted database");
                Ok(Source::Remote(remote(url, api_key)))
            }
            None => {
                let store = SnapshotStore::open(data_dir).with_context(|| {
                    format!(
                        "opening snapshot {} (run `patentrack pull` or set PATENTRACK_API_URL)",
                        data_dir.display()
                    )
                })?;
                Ok(Source::Snapshot(store))
            }
        }
    }

    pub async fn load(&self) -> anyhow::Result<(Vec<Patent>, Vec<Employee>)> {
        match self {
            Source::Snapshot(store) => fetch_all(store).await,
            Source::Remote(client) => fetch_all(client).await,
        }
    }

    pub async fn update(&self, id: &str, fields: FieldMap) -> anyhow::Result<()> {
        match self {
            Source::Snapshot(store) => store.update_patent(id, fields).await?,
            Source::Remote(client) => client.update_patent(id, fields).await?,
        }
        Ok(())
    }
}

pub fn remote(url: &str, api_key: Option<&str>) -> RestClient {
    RestClient::new(url.to_string(), api_key.map(str::to_string))
}

/// Fetch patents and the roster concurrently.
pub async fn fetch_all<R: PatentRepository>(
    repo: &R,
) -> anyhow::Result<(Vec<Patent>, Vec<Employee>)> {
    let (patents, employees) = futures::try_join!(repo.fetch_patents(), repo.fetch_employees())
        .context("fetching patents and employees")?;
    Ok((patents, employees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentrack_core::Role;

    #[tokio::test]
    async fn snapshot_source_loads_both_tables() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::create(tmp.path()).await.unwrap();
        let patents = vec![Patent {
            id: "p1".into(),
            tracking_id: "PAT-1".into(),
            ..Default::default()
        }];
        let employees = vec![Employee {
            id: "e1".into(),
            full_name: "Meera".into(),
            role: Role::Drafter,
        }];
        store.write_snapshot(&patents, &employees).await.unwrap();

        let source = Source::select(tmp.path(), None, None).unwrap();
        let (loaded, roster) = source.load().await.unwrap();
        assert_eq!(loaded, patents);
        assert_eq!(roster, employees);
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let result = Source::select(Path::new("/nonexistent/patentrack"), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn api_url_selects_remote() {
        let source = Source::select(
            Path::new("/nonexistent"),
            Some("https://db.example.com"),
            None,
        );
        assert!(matches!(source, Ok(Source::Remote(_))));
    }
}
