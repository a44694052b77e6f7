//! End-to-end tests for the marketplace routes
//!
//! Each test drives the full router in process: in-memory SQLite, a
//! temporary uploads directory, and hand-built HTTP requests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use classifieds::database::{init_schema, list_orders};
use classifieds::uploads::UploadStore;
use classifieds::web::create_router;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "marketplace-test-boundary-7MA4YWxkTrZu0gW";

const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake jpeg payload";

struct TestApp {
    router: Router,
    db: Arc<Mutex<Connection>>,
    uploads_dir: PathBuf,
    temp_dir: TempDir,
}

fn test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let uploads_dir = temp_dir.path().join("uploads");

    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let db = Arc::new(Mutex::new(conn));

    let router = create_router(Arc::clone(&db), Arc::new(UploadStore::new(&uploads_dir)));

    TestApp {
        router,
        db,
        uploads_dir,
        temp_dir,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

async fn get(app: &TestApp, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assemble a multipart/form-data body with text fields and an optional
/// file part named `image`.
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/add")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// POST a complete listing and return the response.
async fn post_listing(app: &TestApp, content: &str, category: &str, filename: &str) -> Response {
    let body = multipart_body(
        &[
            ("content", content),
            ("store", "ACME"),
            ("price", "200"),
            ("category", category),
        ],
        Some((filename, JPEG_BYTES)),
    );
    send(app, multipart_request(body)).await
}

async fn post_buy(app: &TestApp, item_id: i64, form: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/buy/{}", item_id))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_add_listing_then_browse() {
    let app = test_app();

    let response = post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Desk lamp"));
    assert!(html.contains("href=\"/item/1\""));
    assert!(html.contains("/uploads/lamp.jpg"));
}

#[tokio::test]
async fn test_browse_filters_by_keyword_and_category() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;
    post_listing(&app, "Bicycle", "車輛", "bike.jpg").await;

    let html = body_string(get(&app, "/?q=Desk").await).await;
    assert!(html.contains("Desk lamp"));
    assert!(!html.contains("Bicycle"));

    let uri = format!("/?q=Desk&category={}", urlencoding::encode("居家用品"));
    let html = body_string(get(&app, &uri).await).await;
    assert!(html.contains("Desk lamp"));

    let uri = format!("/?q=Desk&category={}", urlencoding::encode("車輛"));
    let html = body_string(get(&app, &uri).await).await;
    assert!(!html.contains("Desk lamp"));
    assert!(html.contains("目前沒有符合的商品"));
}

#[tokio::test]
async fn test_keyword_match_is_case_insensitive() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;

    let html = body_string(get(&app, "/?q=desk").await).await;
    assert!(html.contains("Desk lamp"));
}

#[tokio::test]
async fn test_item_detail_shows_buy_form() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;

    let response = get(&app, "/item/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Desk lamp"));
    assert!(html.contains("ACME"));
    assert!(html.contains("action=\"/buy/1\""));
}

#[tokio::test]
async fn test_item_detail_missing_is_not_found() {
    let app = test_app();
    let response = get(&app, "/item/4242").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_buy_records_inquiry() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;

    let response = post_buy(&app, 1, "location=Taipei&phone=0912345678&email=a%40b.tw").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("下單成功"));

    let conn = app.db.lock().unwrap();
    let orders = list_orders(&conn).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].item_id, 1);
    assert_eq!(orders[0].buyer_location, "Taipei");
    assert_eq!(orders[0].buyer_phone, "0912345678");
    assert_eq!(orders[0].buyer_email, "a@b.tw");
}

#[tokio::test]
async fn test_buy_unknown_listing_is_accepted() {
    // No existence check on the listing id: the inquiry is recorded even
    // when nothing was ever listed under that id.
    let app = test_app();

    let response = post_buy(&app, 999, "location=Kaohsiung&phone=0987654321&email=x%40y.z").await;
    assert_eq!(response.status(), StatusCode::OK);

    let conn = app.db.lock().unwrap();
    let orders = list_orders(&conn).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].item_id, 999);
}

#[tokio::test]
async fn test_buy_missing_field_is_bad_request() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;

    let response = post_buy(&app, 1, "location=Taipei&phone=0912345678").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let conn = app.db.lock().unwrap();
    assert!(list_orders(&conn).unwrap().is_empty());
}

#[tokio::test]
async fn test_buy_empty_values_are_stored() {
    let app = test_app();

    let response = post_buy(&app, 1, "location=&phone=&email=").await;
    assert_eq!(response.status(), StatusCode::OK);

    let conn = app.db.lock().unwrap();
    let orders = list_orders(&conn).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].buyer_location, "");
}

#[tokio::test]
async fn test_delete_keeps_photo_and_inquiries() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;
    post_buy(&app, 1, "location=Taipei&phone=0912345678&email=a%40b.tw").await;

    let response = get(&app, "/delete/1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let response = get(&app, "/item/1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The photo file and the inquiry row both survive the delete
    assert!(app.uploads_dir.join("lamp.jpg").exists());
    let conn = app.db.lock().unwrap();
    assert_eq!(list_orders(&conn).unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let app = test_app();
    let response = get(&app, "/delete/4242").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uploaded_photo_round_trips() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "lamp.jpg").await;

    let response = get(&app, "/uploads/lamp.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], JPEG_BYTES);
}

#[tokio::test]
async fn test_missing_photo_is_not_found() {
    let app = test_app();
    let response = get(&app, "/uploads/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photo_requests_cannot_escape_uploads_dir() {
    let app = test_app();
    std::fs::write(app.temp_dir.path().join("secret.txt"), b"hidden").unwrap();

    // Encoded slash keeps this a single path segment; the handler must
    // still refuse to read outside the uploads directory.
    let response = get(&app, "/uploads/..%2Fsecret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_filename_is_sanitized() {
    let app = test_app();
    post_listing(&app, "Desk lamp", "居家用品", "my desk lamp.jpg").await;

    let html = body_string(get(&app, "/").await).await;
    assert!(html.contains("/uploads/my_desk_lamp.jpg"));

    let response = get(&app, "/uploads/my_desk_lamp.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.uploads_dir.join("my_desk_lamp.jpg").exists());
}

#[tokio::test]
async fn test_unusable_filename_still_creates_listing() {
    // A filename that sanitizes to nothing: the listing is created with no
    // photo and nothing is written to disk.
    let app = test_app();
    let response = post_listing(&app, "Desk lamp", "居家用品", "...").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_string(get(&app, "/").await).await;
    assert!(html.contains("Desk lamp"));
    assert!(html.contains("無照片"));

    let entries: Vec<_> = std::fs::read_dir(&app.uploads_dir).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_add_missing_text_field_is_bad_request() {
    let app = test_app();
    let body = multipart_body(
        &[
            ("content", "Desk lamp"),
            ("store", "ACME"),
            ("category", "居家用品"),
        ],
        Some(("lamp.jpg", JPEG_BYTES)),
    );

    let response = send(&app, multipart_request(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_missing_file_is_bad_request() {
    let app = test_app();
    let body = multipart_body(
        &[
            ("content", "Desk lamp"),
            ("store", "ACME"),
            ("price", "200"),
            ("category", "居家用品"),
        ],
        None,
    );

    let response = send(&app, multipart_request(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_accepts_any_category_text() {
    // Category values outside the catalogue are stored and browsable
    let app = test_app();
    post_listing(&app, "Mystery box", "made-up-category", "box.jpg").await;

    let uri = format!("/?category={}", urlencoding::encode("made-up-category"));
    let html = body_string(get(&app, &uri).await).await;
    assert!(html.contains("Mystery box"));
}

#[tokio::test]
async fn test_add_form_page_renders() {
    let app = test_app();
    let response = get(&app, "/add").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"image\""));
    assert!(html.contains("車輛"));
}
