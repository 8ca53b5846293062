//! Data Lineage v1 REST client
//!
//! Reference: https://cloud.google.com/dataplex/docs/reference/data-lineage/rest

use crate::api::{LineageApi, LineageError};
use crate::model::{resource_id, LineageEvent, Link, LinkDirection, Process, Run};
use lookplex_catalog::http::{classify, error_body, remediation_hint, StatusClass};
use lookplex_catalog::AuthorizedClient;
use lookplex_core::Config;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const LINEAGE_API: &str = "datalineage.googleapis.com";
pub const DEFAULT_BASE_URL: &str = "https://datalineage.googleapis.com/v1";

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessPage {
    #[serde(default)]
    processes: Vec<Process>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunPage {
    #[serde(default)]
    runs: Vec<Run>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkPage {
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Client for one project and location
pub struct DataLineageClient {
    client: AuthorizedClient,
    base_url: String,
    parent: String,
}

impl DataLineageClient {
    pub fn new(config: &Config, client: AuthorizedClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            parent: config.location_path(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `projects/{p}/locations/{l}`
    pub fn parent(&self) -> &str {
        &self.parent
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    async fn api_error(response: Response) -> LineageError {
        let (status, message) = error_body(response).await;
        LineageError::Api {
            status,
            message,
            hint: remediation_hint(status, LINEAGE_API),
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, LineageError> {
        response
            .json()
            .await
            .map_err(|e| LineageError::InvalidResponse(e.to_string()))
    }

    /// GET a single resource; 404 is `None`
    async fn get_optional<T: DeserializeOwned>(&self, resource: &str) -> Result<Option<T>, LineageError> {
        let url = self.url(resource);
        let response = self.client.send(|http| http.get(&url)).await?;

        match classify(response.status()) {
            StatusClass::Success => Ok(Some(Self::parse(response).await?)),
            StatusClass::NotFound => Ok(None),
            _ => Err(Self::api_error(response).await),
        }
    }

    /// POST `body` and parse the created resource
    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, LineageError> {
        let response = self
            .client
            .send(|http| http.post(url).query(query).json(body))
            .await?;

        match classify(response.status()) {
            StatusClass::Success => Self::parse(response).await,
            _ => Err(Self::api_error(response).await),
        }
    }

    /// GET one page of a collection
    async fn get_page<T: DeserializeOwned>(&self, url: &str, page_token: Option<&str>) -> Result<T, LineageError> {
        let response = self
            .client
            .send(|http| {
                let mut request = http.get(url).query(&[("pageSize", PAGE_SIZE.to_string())]);
                if let Some(token) = page_token {
                    request = request.query(&[("pageToken", token)]);
                }
                request
            })
            .await?;

        match classify(response.status()) {
            StatusClass::Success => Self::parse(response).await,
            _ => Err(Self::api_error(response).await),
        }
    }
}

fn next_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, LineageError> {
    serde_json::to_value(value).map_err(|e| LineageError::InvalidResponse(e.to_string()))
}

#[async_trait::async_trait]
impl LineageApi for DataLineageClient {
    fn name(&self) -> &'static str {
        "Data Lineage"
    }

    async fn get_process(&self, name: &str) -> Result<Option<Process>, LineageError> {
        self.get_optional(name).await
    }

    async fn create_process(&self, process: &Process) -> Result<Process, LineageError> {
        let url = self.url(&format!("{}/processes", self.parent));
        let body = to_body(process)?;
        tracing::debug!("POST {} {}", url, body);

        // The deterministic id doubles as the request id, so a retried create is a no-op
        let request_id = resource_id(&process.name).to_string();
        self.post(&url, &[("requestId", request_id.as_str())], &body).await
    }

    async fn list_processes(&self) -> Result<Vec<Process>, LineageError> {
        let url = self.url(&format!("{}/processes", self.parent));
        let mut processes = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page: ProcessPage = self.get_page(&url, token.as_deref()).await?;
            processes.extend(page.processes);
            match next_token(page.next_page_token) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(processes)
    }

    async fn delete_process(&self, name: &str) -> Result<(), LineageError> {
        let url = self.url(name);
        let response = self.client.send(|http| http.delete(&url)).await?;

        match classify(response.status()) {
            StatusClass::Success => Ok(()),
            StatusClass::NotFound => {
                tracing::debug!("Process {} already gone", name);
                Ok(())
            }
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn get_run(&self, name: &str) -> Result<Option<Run>, LineageError> {
        self.get_optional(name).await
    }

    async fn create_run(&self, process_name: &str, run: &Run) -> Result<Run, LineageError> {
        let url = self.url(&format!("{}/runs", process_name));
        let body = to_body(run)?;
        tracing::debug!("POST {} {}", url, body);
        self.post(&url, &[], &body).await
    }

    async fn list_runs(&self, process_name: &str) -> Result<Vec<Run>, LineageError> {
        let url = self.url(&format!("{}/runs", process_name));
        let mut runs = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page: RunPage = self.get_page(&url, token.as_deref()).await?;
            runs.extend(page.runs);
            match next_token(page.next_page_token) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(runs)
    }

    async fn create_event(&self, run_name: &str, event: &LineageEvent) -> Result<(), LineageError> {
        let url = self.url(&format!("{}/lineageEvents", run_name));
        let body = to_body(event)?;
        tracing::debug!("POST {} {}", url, body);
        let _created: Value = self.post(&url, &[], &body).await?;
        Ok(())
    }

    async fn search_links(&self, fqn: &str, direction: LinkDirection) -> Result<Vec<Link>, LineageError> {
        let url = self.url(&format!("{}:searchLinks", self.parent));
        let mut links = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut body = direction.search_body(fqn);
            body["pageSize"] = Value::from(PAGE_SIZE);
            if let Some(token) = &token {
                body["pageToken"] = Value::from(token.as_str());
            }

            let page: LinkPage = self.post(&url, &[], &body).await?;
            links.extend(page.links);
            match next_token(page.next_page_token) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookplex_catalog::{Credentials, StaticTokenProvider};
    use std::sync::Arc;

    #[test]
    fn urls() {
        let config =
            Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string())).unwrap();
        let credentials = Credentials::new(Arc::new(StaticTokenProvider::new("t")));
        let client = DataLineageClient::new(&config, AuthorizedClient::new(credentials).unwrap());

        assert_eq!(client.parent(), "projects/proj/locations/eu");
        assert_eq!(
            client.url("projects/proj/locations/eu/processes/bq-view-1"),
            "https://datalineage.googleapis.com/v1/projects/proj/locations/eu/processes/bq-view-1"
        );
    }

    #[test]
    fn empty_page_token_ends_paging() {
        assert_eq!(next_token(Some(String::new())), None);
        assert_eq!(next_token(Some("p2".to_string())), Some("p2".to_string()));
        assert_eq!(next_token(None), None);
    }
}
