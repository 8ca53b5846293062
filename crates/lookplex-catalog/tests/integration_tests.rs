//! Integration tests for catalog sync
//!
//! These tests exercise the full path from LookML text to catalog calls
//! against the in-memory backend, and the Dataplex REST client against a
//! local HTTP stub.
//!
//! ## Test Categories
//!
//! - **Entry creation**: idempotent ingest of views, explores, dashboards
//! - **Linking**: structural links, missing endpoints, link failures
//! - **Setup**: entry group, aspect types, entry types
//! - **REST**: token refresh, not-found, conflict, paging, rejections
//! - **gcloud**: create commands run through a stand-in executable

mod fixtures;

use fixtures::{config, FakeGcloud, StubServer, ACCOUNT_VIEW, CARD_VIEW, DASHBOARD, MODEL};
use lookplex_catalog::entries::{dashboard_entry, explore_entry, view_entry};
use lookplex_catalog::gcloud::Gcloud;
use lookplex_catalog::setup::{aspect_type_specs, entry_type_specs};
use lookplex_catalog::{
    AuthorizedClient, CatalogBackend, CatalogError, CatalogSetup, Credentials, DataplexCatalog,
    EntryLinkRequest, EntrySpec, EntryWriter, KnownEntries, LinkKind, MockCatalog,
    RelationshipLinker, StaticTokenProvider,
};
use lookplex_core::{BigQueryTable, Config, EntryKind, EntryRef, StructuralLinks};
use lookplex_lookml::explore::parse_explores;
use lookplex_lookml::{Dashboard, ViewMetadata};
use std::collections::BTreeMap;
use std::sync::Arc;

fn specs(config: &Config) -> Vec<EntrySpec> {
    let mut views = BTreeMap::new();
    for (content, stem) in [(CARD_VIEW, "card"), (ACCOUNT_VIEW, "account")] {
        let view = ViewMetadata::parse(content, stem);
        views.insert(view.name.clone(), view);
    }

    let mut specs: Vec<EntrySpec> = views.values().map(|v| view_entry(config, v)).collect();
    specs.extend(parse_explores(MODEL).iter().map(|e| explore_entry(config, e, &views)));
    specs.push(dashboard_entry(config, &Dashboard::parse(DASHBOARD, "customer_account")));
    specs
}

fn structural_links() -> StructuralLinks {
    let mut links = StructuralLinks::default();
    links.dashboard_explores.insert(
        "customer_account".to_string(),
        vec!["account_overview".to_string(), "card_transactions".to_string()],
    );
    links.explore_views.insert("card_transactions".to_string(), vec!["card".to_string()]);
    links.explore_views.insert("account_overview".to_string(), vec!["account".to_string()]);
    links.view_tables.insert("card".to_string(), "card".to_string());
    links.view_tables.insert("account".to_string(), "retail_banking.account".to_string());
    links
}

fn dataplex(server: &StubServer, provider: &StaticTokenProvider) -> DataplexCatalog {
    let credentials = Credentials::new(Arc::new(provider.clone()));
    DataplexCatalog::new(config(), AuthorizedClient::new(credentials).unwrap())
        .with_base_url(server.base_url.clone())
}

// =============================================================================
// Entry Creation Tests
// =============================================================================

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let config = config();
    let catalog = MockCatalog::new();
    let writer = EntryWriter::new(&catalog, &config);
    let specs = specs(&config);
    assert_eq!(specs.len(), 5);

    let first = writer.ensure_all("all", &specs).await;
    let second = writer.ensure_all("all", &specs).await;

    assert_eq!(first.succeeded, 5);
    assert_eq!(second.succeeded, 5);
    assert_eq!(catalog.calls().create_entry, 5);
    assert_eq!(catalog.entry_count().await, 5);
}

#[tokio::test]
async fn test_created_entries_are_listed_by_kind() {
    let config = config();
    let catalog = MockCatalog::new();
    EntryWriter::new(&catalog, &config).ensure_all("all", &specs(&config)).await;

    let listed = catalog.list_entries("looker").await.unwrap();
    let known = KnownEntries::from_entries(&listed);

    assert!(known.views.contains("mylooker-retail_banking-card"));
    assert!(known.explores.contains("mylooker-retail_banking-card_transactions"));
    assert!(known.dashboards.contains("mylooker-retail_banking-customer_account"));

    let card = catalog
        .get_entry(&EntryRef::looker(&config, "mylooker-retail_banking-card"))
        .await
        .unwrap();
    assert_eq!(
        card.fully_qualified_name.as_deref(),
        Some("custom:looker.view:mylooker.retail_banking.card")
    );
}

#[tokio::test]
async fn test_one_failing_entry_does_not_stop_batch() {
    let config = config();
    let catalog = MockCatalog::new();
    catalog
        .add_error_for_entry(
            "mylooker-retail_banking-account",
            CatalogError::Network("connection reset".to_string()),
        )
        .await;

    let batch = EntryWriter::new(&catalog, &config)
        .ensure_all("all", &specs(&config))
        .await;

    assert_eq!(batch.failed, 1);
    assert_eq!(batch.succeeded, 4);
}

// =============================================================================
// Linking Tests
// =============================================================================

#[tokio::test]
async fn test_unknown_explore_creates_no_links() {
    let config = config();
    let catalog = MockCatalog::new();
    let linker = RelationshipLinker::new(&catalog, &config);

    let mut known = KnownEntries::default();
    known.dashboards.insert("mylooker-retail_banking-d1".to_string());

    let mut pairs = BTreeMap::new();
    pairs.insert("d1".to_string(), vec!["e1".to_string()]);

    let summary = linker.link_dashboards_to_explores(&pairs, &known).await;

    assert_eq!(summary.links_created, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(catalog.calls().create_entry_link, 0);
    assert_eq!(catalog.calls().entry_exists, 0);
}

#[tokio::test]
async fn test_link_all_after_ingest() {
    let config = config();
    let card_table = BigQueryTable::new("proj", "retail_banking", "card");
    let catalog = MockCatalog::new().with_entry(card_table.entry_ref(), EntryKind::View);
    EntryWriter::new(&catalog, &config).ensure_all("all", &specs(&config)).await;

    let batches = RelationshipLinker::new(&catalog, &config)
        .link_all(&structural_links())
        .await
        .unwrap();

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].succeeded, 2);
    assert_eq!(batches[1].succeeded, 2);
    // account's table was never registered in BigQuery
    assert_eq!(batches[2].succeeded, 1);
    assert_eq!(batches[2].skipped, 1);

    let links = catalog.links().await;
    assert_eq!(links.len(), 5);
    assert!(links.contains(&EntryLinkRequest {
        source: EntryRef::looker(&config, "mylooker-retail_banking-card"),
        target: card_table.entry_ref(),
        kind: LinkKind::MapsTo,
    }));
}

#[tokio::test]
async fn test_relinking_reports_existing_links() {
    let config = config();
    let catalog = MockCatalog::new();
    EntryWriter::new(&catalog, &config).ensure_all("all", &specs(&config)).await;
    let linker = RelationshipLinker::new(&catalog, &config);

    let first = linker.link_all(&structural_links()).await.unwrap();
    let second = linker.link_all(&structural_links()).await.unwrap();

    assert_eq!(first[0].succeeded, second[0].succeeded);
    assert_eq!(catalog.links().await.len(), 4);
}

#[tokio::test]
async fn test_link_failures_are_counted() {
    let config = config();
    let catalog = MockCatalog::new().with_link_failure();
    EntryWriter::new(&catalog, &config).ensure_all("all", &specs(&config)).await;

    let batches = RelationshipLinker::new(&catalog, &config)
        .link_all(&structural_links())
        .await
        .unwrap();

    assert_eq!(batches[0].failed, 2);
    assert_eq!(batches[0].succeeded, 0);
    assert!(batches.iter().all(|b| b.succeeded == 0));
}

#[tokio::test]
async fn test_endpoint_check_error_fails_link() {
    let config = config();
    let catalog = MockCatalog::new();
    EntryWriter::new(&catalog, &config).ensure_all("all", &specs(&config)).await;
    let linker = RelationshipLinker::new(&catalog, &config);
    let known = linker.known_entries().await.unwrap();

    catalog
        .add_error_for_entry(
            "mylooker-retail_banking-card",
            CatalogError::Network("connection reset".to_string()),
        )
        .await;

    let mut pairs = BTreeMap::new();
    pairs.insert("card_transactions".to_string(), vec!["card".to_string()]);
    let summary = linker.link_explores_to_views(&pairs, &known).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.links_created, 0);
    assert_eq!(summary.skipped, 0);
    assert_eq!(catalog.calls().create_entry_link, 0);
}

// =============================================================================
// Setup Tests
// =============================================================================

#[tokio::test]
async fn test_setup_twice_succeeds() {
    let catalog = MockCatalog::new();
    let setup = CatalogSetup::new(&catalog);

    let first = setup.run_all().await;
    let second = setup.run_all().await;

    assert!(first.iter().all(|b| !b.has_failures()));
    assert!(second.iter().all(|b| !b.has_failures()));
    assert_eq!(
        catalog.resources().await.len(),
        1 + aspect_type_specs().len() + entry_type_specs().len()
    );
}

// =============================================================================
// REST Tests
// =============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = StubServer::start(vec![(401, "{}"), (200, r#"{"name":"x"}"#)]).await;
    let provider = StaticTokenProvider::new("token-1");
    let catalog = dataplex(&server, &provider);

    let exists = catalog
        .entry_exists(&EntryRef::new("looker", "mylooker-retail_banking-card"))
        .await
        .unwrap();

    assert!(exists);
    assert_eq!(provider.fetch_count(), 2);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer token-1"));
    assert!(requests[0]
        .target
        .ends_with("/projects/proj/locations/eu/entryGroups/looker/entries/mylooker-retail_banking-card"));
}

#[tokio::test]
async fn test_missing_entry() {
    let server = StubServer::start(vec![(404, r#"{"error":{"code":404}}"#)]).await;
    let provider = StaticTokenProvider::new("t");
    let catalog = dataplex(&server, &provider);

    let exists = catalog.entry_exists(&EntryRef::new("looker", "nope")).await.unwrap();

    assert!(!exists);
    assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn test_forbidden_carries_hint() {
    let server = StubServer::start(vec![(403, "denied")]).await;
    let provider = StaticTokenProvider::new("t");
    let catalog = dataplex(&server, &provider);

    let error = catalog
        .entry_exists(&EntryRef::new("looker", "x"))
        .await
        .unwrap_err();

    assert!(matches!(error, CatalogError::Api { status: 403, .. }));
    assert!(error
        .hint()
        .unwrap()
        .contains("apis/library/dataplex.googleapis.com"));
}

#[tokio::test]
async fn test_existing_link_is_success() {
    let server = StubServer::start(vec![(409, r#"{"error":{"status":"ALREADY_EXISTS"}}"#)]).await;
    let provider = StaticTokenProvider::new("t");
    let config = config();
    let catalog = dataplex(&server, &provider);

    let status = catalog
        .create_entry_link(&EntryLinkRequest {
            source: EntryRef::looker(&config, "a"),
            target: EntryRef::looker(&config, "b"),
            kind: LinkKind::Uses,
        })
        .await
        .unwrap();

    assert_eq!(status, lookplex_catalog::CreateStatus::AlreadyExists);

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert!(request.target.contains("/entryGroups/looker/entryLinks?entryLinkId=link-"));
    assert!(request.body.contains("entryLinkType"));
    assert!(request
        .body
        .contains("projects/proj/locations/eu/entryGroups/looker/entries/b"));
}

#[tokio::test]
async fn test_list_entries_follows_pages() {
    let server = StubServer::start(vec![
        (
            200,
            r#"{"entries":[{"name":"projects/proj/locations/eu/entryGroups/looker/entries/a","entryType":"projects/proj/locations/eu/entryTypes/looker-view"}],"nextPageToken":"p2"}"#,
        ),
        (
            200,
            r#"{"entries":[{"name":"projects/proj/locations/eu/entryGroups/looker/entries/b","entryType":"projects/proj/locations/eu/entryTypes/looker-dashboard"}]}"#,
        ),
    ])
    .await;
    let provider = StaticTokenProvider::new("t");
    let catalog = dataplex(&server, &provider);

    let entries = catalog.list_entries("looker").await.unwrap();
    let known = KnownEntries::from_entries(&entries);

    assert_eq!(entries.len(), 2);
    assert!(known.views.contains("a"));
    assert!(known.dashboards.contains("b"));

    let requests = server.requests();
    assert!(requests[0].target.contains("pageSize=500"));
    assert!(requests[1].target.contains("pageToken=p2"));
}

// =============================================================================
// gcloud Tests
// =============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_denied_create_carries_hint() {
    let server = StubServer::start(vec![(200, "{}")]).await;
    let provider = StaticTokenProvider::new("t");
    let fake = FakeGcloud::failing(
        "ERROR: (gcloud.dataplex.entry-groups.create) PERMISSION_DENIED: Permission denied on resource",
    );
    let catalog = dataplex(&server, &provider)
        .with_gcloud(Gcloud::new().with_program(fake.program().to_string_lossy()));

    let error = catalog.create_entry_group("Looker assets").await.unwrap_err();

    assert!(matches!(error, CatalogError::Api { status: 403, .. }));
    assert!(error
        .hint()
        .unwrap()
        .contains("apis/library/dataplex.googleapis.com"));

    let args = fake.last_args();
    assert_eq!(&args[..4], &["dataplex", "entry-groups", "create", "looker"]);
    assert!(args.contains(&"--project=proj".to_string()));
    assert!(server.requests().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_setup_step_is_counted() {
    let server = StubServer::start(vec![(200, "{}")]).await;
    let provider = StaticTokenProvider::new("t");
    let fake = FakeGcloud::failing("ERROR: (gcloud.dataplex.aspect-types.create) INVALID_ARGUMENT: bad template");
    let catalog = dataplex(&server, &provider)
        .with_gcloud(Gcloud::new().with_program(fake.program().to_string_lossy()));

    let batch = CatalogSetup::new(&catalog).create_aspect_types().await;

    assert_eq!(batch.failed, aspect_type_specs().len());
    assert_eq!(batch.succeeded, 0);
}
