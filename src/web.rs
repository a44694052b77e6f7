//! Web server for the classifieds marketplace
//!
//! Serves the browse/search page, the listing creation form, listing detail
//! with purchase inquiries, and stored listing photos. Submissions are plain
//! HTML forms; responses are server-rendered pages or redirects.

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Form, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, Redirect, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::database::{delete_item, get_item, insert_item, insert_order, list_items, NewItem};
use crate::error::MarketError;
use crate::pages;
use crate::uploads::{content_type_for, UploadStore};

/// Shared application state (thread-safe database connection + photo store)
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    uploads: Arc<UploadStore>,
}

/// Browse filters, both optional
#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: String,
}

/// Look up a required form field, failing the request when the key is
/// absent. Present-but-empty values pass through unchanged.
fn require<'a>(form: &'a HashMap<String, String>, key: &str) -> Result<&'a str, StatusCode> {
    match form.get(key) {
        Some(value) => Ok(value.as_str()),
        None => {
            log::warn!("Form submission missing field {:?}", key);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// GET / - Browse listings, filtered by ?q= (content substring) and
/// ?category= (exact match)
async fn index_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, StatusCode> {
    let conn = state.db.lock().unwrap();

    match list_items(&conn, &params.q, &params.category) {
        Ok(items) => Ok(Html(pages::index_page(&items, &params.q, &params.category))),
        Err(e) => {
            log::error!("Database error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /add - Listing creation form
async fn add_form_handler() -> Html<String> {
    Html(pages::add_item_page())
}

/// POST /add - Create a listing from a multipart form
///
/// Expects text fields `content`, `store`, `price`, `category` and a file
/// field `image`. A missing field fails the request; empty values are
/// stored as-is. The photo is stored under its sanitized client filename
/// and the listing records that name (or the empty string when the name
/// sanitized to nothing).
async fn create_item_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, StatusCode> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut photo: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Malformed multipart submission: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        };

        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "image" {
            let client_name = field.file_name().unwrap_or("").to_string();
            match field.bytes().await {
                Ok(bytes) => photo = Some((client_name, bytes)),
                Err(e) => {
                    log::warn!("Failed to read uploaded photo: {}", e);
                    return Err(StatusCode::BAD_REQUEST);
                }
            }
        } else {
            match field.text().await {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(e) => {
                    log::warn!("Failed to read form field {:?}: {}", name, e);
                    return Err(StatusCode::BAD_REQUEST);
                }
            }
        }
    }

    let content = require(&fields, "content")?;
    let store = require(&fields, "store")?;
    let price = require(&fields, "price")?;
    let category = require(&fields, "category")?;

    let (client_name, bytes) = match photo {
        Some(photo) => photo,
        None => {
            log::warn!("Form submission missing field \"image\"");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let stored_name = match state.uploads.save(&client_name, &bytes) {
        Ok(name) => name,
        Err(e) => {
            log::error!("Failed to store uploaded photo: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let item = NewItem {
        content: content.to_string(),
        store: store.to_string(),
        price: price.to_string(),
        category: category.to_string(),
        image: stored_name,
    };

    let conn = state.db.lock().unwrap();
    match insert_item(&conn, &item) {
        Ok(id) => {
            log::info!("Created listing {}", id);
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /item/{id} - Listing detail with the purchase inquiry form
async fn item_detail_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Html<String>, StatusCode> {
    let conn = state.db.lock().unwrap();

    match get_item(&conn, item_id) {
        Ok(Some(item)) => Ok(Html(pages::item_detail_page(&item))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            log::error!("Database error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /buy/{id} - Record a purchase inquiry
///
/// Stores the buyer's contact details against the listing id from the URL.
/// The listing is not checked to exist; an inquiry against a deleted or
/// never-created id is recorded all the same.
async fn buy_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, StatusCode> {
    let location = require(&form, "location")?;
    let phone = require(&form, "phone")?;
    let email = require(&form, "email")?;

    let conn = state.db.lock().unwrap();
    match insert_order(&conn, item_id, location, phone, email) {
        Ok(order_id) => {
            log::info!("Recorded inquiry {} for listing {}", order_id, item_id);
            Ok(Html(pages::order_success_page()))
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /delete/{id} - Remove a listing
///
/// Leaves the stored photo and any inquiries in place.
async fn delete_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Redirect, StatusCode> {
    let conn = state.db.lock().unwrap();

    match delete_item(&conn, item_id) {
        Ok(true) => {
            log::info!("Deleted listing {}", item_id);
            Ok(Redirect::to("/"))
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            log::error!("Database error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /uploads/{filename} - Stored listing photo
async fn uploaded_file_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.uploads.read(&filename) {
        Some(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&filename))
            .header(header::CACHE_CONTROL, "public, max-age=86400")
            .body(Body::from(bytes))
            .unwrap(),
        None => {
            log::debug!("Photo not found: {:?}", filename);
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::from("Photo not found"))
                .unwrap()
        }
    }
}

/// Build the web server router
///
/// Body size limits are disabled; uploads of any size are accepted.
pub fn create_router(db: Arc<Mutex<Connection>>, uploads: Arc<UploadStore>) -> Router {
    let state = AppState { db, uploads };

    Router::new()
        .route("/", get(index_handler))
        .route("/add", get(add_form_handler).post(create_item_handler))
        .route("/item/{id}", get(item_detail_handler))
        .route("/buy/{id}", post(buy_handler))
        .route("/delete/{id}", get(delete_item_handler))
        .route("/uploads/{filename}", get(uploaded_file_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
/// When running locally, use firewall rules to restrict access.
/// Runs until ctrl-c.
pub async fn serve(
    db: Arc<Mutex<Connection>>,
    uploads_dir: &std::path::Path,
    port: u16,
) -> Result<(), MarketError> {
    let uploads = Arc::new(UploadStore::new(uploads_dir));

    let app = create_router(db, uploads);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Marketplace listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::warn!("Failed to listen for shutdown signal: {}", e),
    }
}
