//! Dataplex backend: REST for reads and entry links, gcloud for creates
//!
//! Reference: https://cloud.google.com/dataplex/docs/reference/rest

use crate::backend::{
    generate_link_id, AspectTypeSpec, CatalogBackend, CatalogEntry, CatalogError,
    CreateEntryRequest, CreateStatus, EntryLinkRequest, EntryTypeSpec,
};
use crate::gcloud::{self, Gcloud};
use crate::http::{classify, error_body, remediation_hint, AuthorizedClient, StatusClass};
use lookplex_core::{Config, EntryRef};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

pub const DATAPLEX_API: &str = "dataplex.googleapis.com";
pub const DEFAULT_BASE_URL: &str = "https://dataplex.googleapis.com/v1";

const LIST_PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<CatalogEntry>,

    #[serde(default)]
    next_page_token: Option<String>,
}

/// Dataplex catalog for one project and location
pub struct DataplexCatalog {
    config: Config,
    client: AuthorizedClient,
    gcloud: Gcloud,
    base_url: String,
}

impl DataplexCatalog {
    pub fn new(config: Config, client: AuthorizedClient) -> Self {
        Self {
            config,
            client,
            gcloud: Gcloud::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point REST calls somewhere else (tests, regional endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_gcloud(mut self, gcloud: Gcloud) -> Self {
        self.gcloud = gcloud;
        self
    }

    /// URL of an entry; the id is one path segment even when it holds slashes
    fn entry_url(&self, entry: &EntryRef) -> Result<Url, CatalogError> {
        let base = format!(
            "{}/{}/entryGroups/{}/entries",
            self.base_url,
            self.config.location_path(),
            entry.entry_group
        );
        let mut url = Url::parse(&base).map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidResponse(format!("Cannot build entry URL from {}", base)))?
            .push(&entry.entry_id);
        Ok(url)
    }

    fn api_error(status: u16, body: String) -> CatalogError {
        CatalogError::Api {
            status,
            message: body,
            hint: remediation_hint(status, DATAPLEX_API),
        }
    }

    async fn run_create(&self, args: Vec<String>) -> Result<CreateStatus, CatalogError> {
        self.gcloud.run(&args).await?.create_status()
    }
}

#[async_trait::async_trait]
impl CatalogBackend for DataplexCatalog {
    fn name(&self) -> &'static str {
        "Dataplex"
    }

    async fn entry_exists(&self, entry: &EntryRef) -> Result<bool, CatalogError> {
        let url = self.entry_url(entry)?;
        let response = self.client.send(|http| http.get(url.clone())).await?;

        match classify(response.status()) {
            StatusClass::Success => Ok(true),
            StatusClass::NotFound => Ok(false),
            _ => {
                let (status, body) = error_body(response).await;
                Err(Self::api_error(status, body))
            }
        }
    }

    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<CreateStatus, CatalogError> {
        let aspects = request.aspects.to_entry_aspects(&self.config);
        tracing::debug!("Aspects for {}: {}", request.entry, aspects);

        // Removed when dropped at the end of this call
        let aspects_file = gcloud::write_json_tempfile(&aspects)?;
        let args = gcloud::create_entry_args(&self.config, request, aspects_file.path());
        self.run_create(args).await
    }

    async fn list_entries(&self, entry_group: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!(
            "{}/{}/entryGroups/{}/entries",
            self.base_url,
            self.config.location_path(),
            entry_group
        );

        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .client
                .send(|http| {
                    let mut request = http.get(&url).query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
                    if let Some(token) = &page_token {
                        request = request.query(&[("pageToken", token)]);
                    }
                    request
                })
                .await?;

            if classify(response.status()) != StatusClass::Success {
                let (status, body) = error_body(response).await;
                return Err(Self::api_error(status, body));
            }

            let page: ListEntriesResponse = response
                .json()
                .await
                .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
            entries.extend(page.entries);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} entries in {}", entries.len(), entry_group);
        Ok(entries)
    }

    async fn create_entry_link(&self, link: &EntryLinkRequest) -> Result<CreateStatus, CatalogError> {
        let parent = format!("{}/entryGroups/{}", self.config.location_path(), link.source.entry_group);
        let url = format!("{}/{}/entryLinks", self.base_url, parent);
        let link_id = generate_link_id();
        let body = json!({
            "entryLinkType": link.kind.link_type(),
            "entryReferences": [
                { "name": link.source.resource_name(&self.config), "type": "UNSPECIFIED" },
                { "name": link.target.resource_name(&self.config), "type": "UNSPECIFIED" },
            ]
        });

        let response = self
            .client
            .send(|http| http.post(&url).query(&[("entryLinkId", &link_id)]).json(&body))
            .await?;

        match classify(response.status()) {
            StatusClass::Success => Ok(CreateStatus::Created),
            StatusClass::Conflict => Ok(CreateStatus::AlreadyExists),
            _ => {
                let (status, body) = error_body(response).await;
                Err(Self::api_error(status, body))
            }
        }
    }

    async fn create_entry_group(&self, description: &str) -> Result<CreateStatus, CatalogError> {
        self.run_create(gcloud::create_entry_group_args(&self.config, description)).await
    }

    async fn create_aspect_type(&self, spec: &AspectTypeSpec) -> Result<CreateStatus, CatalogError> {
        let template_file = gcloud::write_json_tempfile(&spec.template)?;
        let args = gcloud::create_aspect_type_args(&self.config, spec, template_file.path());
        self.run_create(args).await
    }

    async fn create_entry_type(&self, spec: &EntryTypeSpec) -> Result<CreateStatus, CatalogError> {
        self.run_create(gcloud::create_entry_type_args(&self.config, spec)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, StaticTokenProvider};
    use lookplex_core::BigQueryTable;
    use std::sync::Arc;

    fn catalog() -> DataplexCatalog {
        let config =
            Config::from_lookup(|name| (name == "GCP_PROJECT_ID").then(|| "proj".to_string())).unwrap();
        let credentials = Credentials::new(Arc::new(StaticTokenProvider::new("t")));
        DataplexCatalog::new(config, AuthorizedClient::new(credentials).unwrap())
    }

    #[test]
    fn looker_entry_url() {
        let catalog = catalog();
        let url = catalog
            .entry_url(&EntryRef::new("looker", "mylooker-retail_banking-card"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dataplex.googleapis.com/v1/projects/proj/locations/eu/entryGroups/looker/entries/mylooker-retail_banking-card"
        );
    }

    #[test]
    fn bigquery_entry_id_is_one_segment() {
        let catalog = catalog();
        let table = BigQueryTable::new("proj", "retail_banking", "card");
        let url = catalog.entry_url(&table.entry_ref()).unwrap();
        assert!(url.as_str().ends_with(
            "/entryGroups/@bigquery/entries/bigquery.googleapis.com%2Fprojects%2Fproj%2Fdatasets%2Fretail_banking%2Ftables%2Fcard"
        ));
    }
}
