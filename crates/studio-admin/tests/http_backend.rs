//! Page stores driving the real HTTP client against a mock backend

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use pretty_assertions::assert_eq;
use serde_json::json;
use studio_admin::{AdminError, AutoConfirm, CollectionStore, FeatureOutcome, ProfilePage};
use studio_client::{ApiClient, MemoryStorage, Session};
use studio_core::{AdminProfile, Booking, Category, GalleryItem, Service, types::LoginResponse};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(format!("{}/api", server.uri())).unwrap().with_token("tok")
}

#[tokio::test]
async fn test_featured_toggle_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/gallery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "a", "title": "Sunset", "featured": true},
            {"_id": "b", "title": "Harbour", "featured": false}
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/content/gallery/a"))
        .and(body_partial_json(json!({"featured": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "a", "title": "Sunset", "featured": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/content/gallery/b"))
        .and(body_partial_json(json!({"featured": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "b", "title": "Harbour", "featured": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/content/gallery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"_id": "a", "title": "Sunset", "featured": false},
            {"_id": "b", "title": "Harbour", "featured": true}
        ]})))
        .mount(&server)
        .await;

    let api = client_for(&server).gallery();
    let mut store = CollectionStore::<GalleryItem>::default();
    assert!(store.load(&api).await);

    let outcome = store.set_featured(&api, "b", &AutoConfirm(true)).await.unwrap();

    assert_eq!(outcome, FeatureOutcome::Featured { id: "b".to_string() });
    let featured: Vec<_> = store.featured().filter_map(|g| g.id.as_deref()).collect();
    assert_eq!(featured, ["b"]);
}

#[tokio::test]
async fn test_load_error_is_surfaced_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/services"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let api = client_for(&server).services();
    let mut store = CollectionStore::<Service>::default().surfacing_load_errors();

    assert!(!store.load(&api).await);
    assert!(store.items().is_empty());
    assert!(store.status().error.as_deref().unwrap().contains("maintenance"));
}

#[tokio::test]
async fn test_rejected_session_stops_a_status_change_before_writing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/bookings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/content/bookings/b1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = client_for(&server).bookings();
    let mut store = CollectionStore::<Booking>::default().surfacing_load_errors();

    let error = store.try_load(&api).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert!(error.to_string().contains("jwt expired"));
    assert!(store.items().is_empty());
    assert!(!store.status().loading);
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "c1", "name": "Weddings"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/content/categories/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let api = client_for(&server).categories();
    let mut store = CollectionStore::<Category>::default();
    store.try_load(&api).await.unwrap();

    let error = store
        .delete_confirmed(&api, "c1", &AutoConfirm(false))
        .await
        .unwrap_err();

    assert!(matches!(error, AdminError::Declined { .. }));
    assert_eq!(store.items().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_profile_load_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let session = Session::new(MemoryStorage::default());
    session
        .store_login(&LoginResponse {
            token: "tok".to_string(),
            admin: AdminProfile::default(),
        })
        .unwrap();
    let mut page = ProfilePage::new(client_for(&server), session, 1024);

    let error = page.load().await.unwrap_err();

    assert!(error.is_unauthorized());
    assert!(page.session().token().unwrap().is_none());
}

#[tokio::test]
async fn test_email_change_refreshes_cached_admin() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/profile/email"))
        .and(body_partial_json(json!({"email": "new@studio.test", "currentPassword": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "admin": {"_id": "a1", "username": "owner", "email": "new@studio.test"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = ProfilePage::new(client_for(&server), Session::new(MemoryStorage::default()), 1024);
    page.change_email("new@studio.test", "secret1").await.unwrap();

    let cached = page.session().current_admin().unwrap().unwrap();
    assert_eq!(cached.email, "new@studio.test");
    assert_eq!(page.status().success.as_deref(), Some("Email updated"));
}

#[tokio::test]
async fn test_avatar_upload_updates_cached_admin() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/profile/avatar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "a1", "username": "owner", "email": "owner@studio.test", "avatar": "/uploads/me.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = ProfilePage::new(client_for(&server), Session::new(MemoryStorage::default()), 1024);
    let profile = page.change_avatar(b"png".to_vec(), "me.png").await.unwrap();

    assert_eq!(profile.avatar.as_deref(), Some("/uploads/me.png"));
    assert_eq!(page.avatar().value(), Some("/uploads/me.png"));
    assert_eq!(
        page.session().current_admin().unwrap().unwrap().avatar.as_deref(),
        Some("/uploads/me.png")
    );
}

#[tokio::test]
async fn test_submit_without_open_form_fails() {
    let server = MockServer::start().await;
    let api = client_for(&server).categories();
    let mut store = CollectionStore::<Category>::default();

    assert!(matches!(store.submit(&api).await, Err(AdminError::NoEditor { .. })));
}
