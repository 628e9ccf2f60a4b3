//! Access gate behaviour through the HTTP router.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::common::{assert_status, json_body, TestHarness};
use hearings_core::common::{Provenance, UserRole};
use hearings_core::domains::publications::{Publication, Sensitivity};
use hearings_core::kernel::test_dependencies::test_publication;

fn publish(harness: &TestHarness, sensitivity: Sensitivity, provenance: Provenance) -> Publication {
    let publication = test_publication(sensitivity, provenance);
    harness.deps.publications.insert(publication.clone());
    harness
        .deps
        .publications
        .insert_payload(publication.artefact_id, json!({ "courtLists": [] }));
    publication
}

fn metadata_uri(publication: &Publication) -> String {
    format!("/api/publications/{}", publication.artefact_id)
}

fn data_uri(publication: &Publication) -> String {
    format!("/api/publications/{}/data", publication.artefact_id)
}

// ============================================================================
// PUBLIC
// ============================================================================

#[tokio::test]
async fn public_publication_visible_to_everyone() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Public, Provenance::ManualUpload);

    let response = harness.get(&metadata_uri(&publication), None).await;
    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["artefactId"], publication.artefact_id.to_string());
    assert_eq!(body["listTypeName"], "Civil and Family Daily Cause List");

    let response = harness.get(&data_uri(&publication), None).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "courtLists": [] }));
}

#[tokio::test]
async fn welsh_list_type_name() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Public, Provenance::ManualUpload);

    let uri = format!("{}?lng=cy", metadata_uri(&publication));
    let body = json_body(harness.get(&uri, None).await).await;

    assert_eq!(body["listTypeName"], "Rhestr Achosion Dyddiol Sifil a Theulu");
}

// ============================================================================
// PRIVATE
// ============================================================================

#[tokio::test]
async fn private_publication_denied_to_anonymous() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Private, Provenance::ManualUpload);

    let response = harness.get(&metadata_uri(&publication), None).await;
    assert_status(&response, StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["title"], "Access denied");
    assert_eq!(
        body["error"]["message"],
        "You do not have permission to view this list."
    );
}

#[tokio::test]
async fn private_denial_in_welsh() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Private, Provenance::ManualUpload);

    let uri = format!("{}?lng=cy", metadata_uri(&publication));
    let body = json_body(harness.get(&uri, None).await).await;

    assert_eq!(body["error"]["title"], "Mynediad wedi'i wrthod");
    assert_eq!(body["error"]["locale"], "cy");
}

#[tokio::test]
async fn private_publication_visible_to_verified_user() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Private, Provenance::ManualUpload);
    let user = TestHarness::principal(Some(UserRole::Verified), Provenance::CftIdam);

    let response = harness.get(&data_uri(&publication), Some(&user)).await;

    assert_status(&response, StatusCode::OK);
}

#[tokio::test]
async fn private_content_denied_to_internal_admins() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Private, Provenance::ManualUpload);

    for role in [UserRole::InternalAdminLocal, UserRole::InternalAdminCtsc] {
        let admin = TestHarness::principal(Some(role), Provenance::Sso);

        let response = harness.get(&metadata_uri(&publication), Some(&admin)).await;
        assert_status(&response, StatusCode::OK);

        let response = harness.get(&data_uri(&publication), Some(&admin)).await;
        assert_status(&response, StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Court and tribunal staff cannot view"));
    }
}

// ============================================================================
// CLASSIFIED
// ============================================================================

#[tokio::test]
async fn classified_requires_matching_provenance() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Classified, Provenance::B2cIdam);

    let matching = TestHarness::principal(Some(UserRole::Verified), Provenance::B2cIdam);
    let response = harness.get(&data_uri(&publication), Some(&matching)).await;
    assert_status(&response, StatusCode::OK);

    let other = TestHarness::principal(Some(UserRole::Verified), Provenance::CftIdam);
    let response = harness.get(&metadata_uri(&publication), Some(&other)).await;
    assert_status(&response, StatusCode::FORBIDDEN);

    let no_role = TestHarness::principal(None, Provenance::B2cIdam);
    let response = harness.get(&metadata_uri(&publication), Some(&no_role)).await;
    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn classified_visible_to_system_admin() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Classified, Provenance::CrimeIdam);
    let admin = TestHarness::principal(Some(UserRole::SystemAdmin), Provenance::Sso);

    let response = harness.get(&data_uri(&publication), Some(&admin)).await;

    assert_status(&response, StatusCode::OK);
}

// ============================================================================
// Lookup failures
// ============================================================================

#[tokio::test]
async fn invalid_id_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness.get("/api/publications/not-a-uuid", None).await;

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(harness.deps.publications.lookup_count(), 0);
}

#[tokio::test]
async fn unknown_publication_is_not_found() {
    let harness = TestHarness::new();

    let uri = format!("/api/publications/{}", Uuid::new_v4());
    let response = harness.get(&uri, None).await;

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failure_is_internal_error() {
    let harness = TestHarness::new();
    harness.deps.publications.fail_lookups();

    let uri = format!("/api/publications/{}", Uuid::new_v4());
    let response = harness.get(&uri, None).await;

    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn one_lookup_per_request() {
    let harness = TestHarness::new();
    let publication = publish(&harness, Sensitivity::Public, Provenance::ManualUpload);

    harness.get(&metadata_uri(&publication), None).await;

    assert_eq!(harness.deps.publications.lookup_count(), 1);
}
