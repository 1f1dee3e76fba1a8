//! REST client for the hosted database's `patents` and `employees` tables.

use async_trait::async_trait;
use patentrack_core::{Employee, Patent};
use patentrack_store::{FieldMap, PatentRepository};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

const PATENTS_SELECT: &str = "*,inventors(*),fer_entries(*)";
const EMPLOYEES_SELECT: &str = "id,full_name,role";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error payload the REST layer sends alongside non-2xx responses.
#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP client for the hosted database's REST endpoint.
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestClient {
    /// Create a client for the given base URL.
    ///
    /// `base_url` should be like `https://db.example.com` (no trailing slash,
    /// no `/rest/v1`). With an `api_key`, every request carries it as both
    /// `apikey` and bearer token.
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
    ) -> Result<Vec<T>, SyncError> {
        let url = self.table_url(table);
        info!(url = %url, "fetching rows");
        let request = self.client.get(&url).query(&[("select", select)]);
        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(server_error(status.as_u16(), body));
        }

        // Parse from text so a schema mismatch surfaces as a JSON error.
        let body = resp.text().await?;
        let rows: Vec<T> = serde_json::from_str(&body)?;
        info!(table, count = rows.len(), "fetched rows");
        Ok(rows)
    }
}

fn server_error(status: u16, body: String) -> SyncError {
    let body = match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => err.message,
        Err(_) => body,
    };
    SyncError::Server { status, body }
}

#[async_trait]
impl PatentRepository for RestClient {
    type Error = SyncError;

    async fn fetch_patents(&self) -> Result<Vec<Patent>, SyncError> {
        self.get_rows("patents", PATENTS_SELECT).await
    }

    async fn fetch_employees(&self) -> Result<Vec<Employee>, SyncError> {
        self.get_rows("employees", EMPLOYEES_SELECT).await
    }

    async fn update_patent(&self, id: &str, fields: FieldMap) -> Result<(), SyncError> {
        let url = self.table_url("patents");
        let filter = format!("eq.{id}");
        info!(url = %url, id, fields = fields.len(), "updating patent");
        let request = self
            .client
            .patch(&url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&fields);
        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(server_error(status.as_u16(), body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentrack_core::{PaymentStatus, Role, Stage, derive_stage};

    #[test]
    fn rest_client_trims_trailing_slash() {
        let client = RestClient::new("https://db.example.com/".into(), None);
        assert_eq!(client.base_url, "https://db.example.com");
        assert_eq!(
            client.table_url("patents"),
            "https://db.example.com/rest/v1/patents"
        );
    }

    #[test]
    fn server_error_prefers_api_message() {
        let err = server_error(
            401,
            r#"{"message": "Invalid API key", "hint": null}"#.to_string(),
        );
        match err {
            SyncError::Server { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_error_keeps_plain_body() {
        let err = server_error(502, "Bad Gateway".to_string());
        assert_eq!(err.to_string(), "server returned 502: Bad Gateway");
    }

    #[test]
    fn patent_row_with_embeds_parses() {
        let json = r#"[{
            "id": "9b2e",
            "tracking_id": "PAT-014",
            "client_id": "ACME",
            "patent_title": "Heat exchanger",
            "idf_sent": true,
            "idf_received": true,
            "ps_drafting_status": 1,
            "ps_review_draft_status": 1,
            "ps_filing_status": null,
            "cs_data": false,
            "fer_status": 0,
            "withdrawn": null,
            "payment_status": "sent",
            "payment_amount": 25000,
            "form_01": true,
            "inventors": [{"name": "A. Rao", "address": "Pune"}],
            "fer_entries": []
        }]"#;
        let patents: Vec<Patent> = serde_json::from_str(json).unwrap();
        let patent = &patents[0];
        assert_eq!(patent.payment_status, Some(PaymentStatus::Sent));
        assert_eq!(patent.payment_amount, 25_000.0);
        assert_eq!(patent.inventors.len(), 1);
        assert_eq!(derive_stage(patent), Stage::PsDraftingApproval);
    }

    #[test]
    fn employee_rows_parse() {
        let json = r#"[
            {"id": "e1", "full_name": "Meera", "role": "drafter"},
            {"id": "e2", "full_name": "Kavya", "role": "filer"}
        ]"#;
        let employees: Vec<Employee> = serde_json::from_str(json).unwrap();
        assert_eq!(employees[1].role, Role::Filer);
    }
}
