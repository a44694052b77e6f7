//! Database operations for the classifieds marketplace
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! The schema is deliberately lax: no foreign keys, no NOT NULL, no length
//! enforcement. Listings and orders store whatever the web layer hands them,
//! and an order may reference a listing id that no longer (or never) existed.

use rusqlite::{params, Connection};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// A listing as stored in the `items` table.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: i64,
    pub content: String,
    pub store: String,
    pub price: String,
    pub category: String,
    pub image: String,
}

/// Fields for a new listing; the id is assigned by the database.
///
/// `price` is opaque text, `category` is whatever the form sent, and `image`
/// is the stored upload filename (empty when the upload produced no usable
/// name). None of it is validated here or anywhere else.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub content: String,
    pub store: String,
    pub price: String,
    pub category: String,
    pub image: String,
}

/// A buyer inquiry as stored in the `orders` table.
///
/// `item_id` is a soft reference: deleting a listing leaves its orders
/// behind, and nothing stops an order against an id that never existed.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub item_id: i64,
    pub buyer_location: String,
    pub buyer_phone: String,
    pub buyer_email: String,
}

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `items`: listings for sale (text fields plus an image filename)
/// - `orders`: buyer contact submissions referencing a listing id
///
/// The VARCHAR widths document the intended field sizes; SQLite does not
/// enforce them, and neither does anything else.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS items (
            id       INTEGER PRIMARY KEY,
            content  VARCHAR(200),
            store    VARCHAR(100),
            price    VARCHAR(50),
            category VARCHAR(100),
            image    VARCHAR(300)
        );

        CREATE TABLE IF NOT EXISTS orders (
            id             INTEGER PRIMARY KEY,
            item_id        INTEGER,
            buyer_location VARCHAR(200),
            buyer_phone    VARCHAR(50),
            buyer_email    VARCHAR(100)
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

// ── Listing store ──────────────────────────────────────────────────────────

/// Insert a new listing and return its generated id.
pub fn insert_item(conn: &Connection, item: &NewItem) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO items (content, store, price, category, image)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &item.content,
            &item.store,
            &item.price,
            &item.category,
            &item.image,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List listings, optionally filtered.
///
/// `q` is a substring match against `content` with SQLite LIKE semantics:
/// ASCII case-insensitive, and `%`/`_` wildcards pass through unescaped.
/// `category` is verbatim equality. An empty string disables either filter;
/// combining both intersects them. Results come back in insertion order.
pub fn list_items(conn: &Connection, q: &str, category: &str) -> DbResult<Vec<Item>> {
    let pattern = format!("%{}%", q);
    let mut stmt = conn.prepare(
        "SELECT id, content, store, price, category, image
         FROM items
         WHERE (?1 = '' OR content LIKE ?2)
           AND (?3 = '' OR category = ?3)
         ORDER BY id",
    )?;

    let items: DbResult<Vec<Item>> = stmt
        .query_map(params![q, pattern, category], |row| {
            Ok(Item {
                id: row.get(0)?,
                content: row.get(1)?,
                store: row.get(2)?,
                price: row.get(3)?,
                category: row.get(4)?,
                image: row.get(5)?,
            })
        })?
        .collect();
    items
}

/// Get a single listing by id.
pub fn get_item(conn: &Connection, id: i64) -> DbResult<Option<Item>> {
    let mut stmt = conn.prepare(
        "SELECT id, content, store, price, category, image
         FROM items
         WHERE id = ?1",
    )?;

    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(Item {
            id: row.get(0)?,
            content: row.get(1)?,
            store: row.get(2)?,
            price: row.get(3)?,
            category: row.get(4)?,
            image: row.get(5)?,
        })),
        None => Ok(None),
    }
}

/// Delete a listing by id. Returns false when no such listing existed.
///
/// Leaves the listing's image file and any orders referencing it untouched.
pub fn delete_item(conn: &Connection, id: i64) -> DbResult<bool> {
    let affected = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Get total count of listings
pub fn item_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
}

// ── Inquiry store ──────────────────────────────────────────────────────────

/// Insert a buyer inquiry against a listing id and return the generated id.
///
/// `item_id` is stored as given; there is intentionally no check that the
/// listing exists. Contact fields are free text.
pub fn insert_order(
    conn: &Connection,
    item_id: i64,
    location: &str,
    phone: &str,
    email: &str,
) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO orders (item_id, buyer_location, buyer_phone, buyer_email)
         VALUES (?1, ?2, ?3, ?4)",
        params![item_id, location, phone, email],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List all inquiries, oldest first.
///
/// No route exposes this: inquiries are followed up out-of-band, so the
/// accessor lives on the library surface only.
pub fn list_orders(conn: &Connection) -> DbResult<Vec<Order>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, buyer_location, buyer_phone, buyer_email
         FROM orders
         ORDER BY id",
    )?;

    let orders: DbResult<Vec<Order>> = stmt
        .query_map([], |row| {
            Ok(Order {
                id: row.get(0)?,
                item_id: row.get(1)?,
                buyer_location: row.get(2)?,
                buyer_phone: row.get(3)?,
                buyer_email: row.get(4)?,
            })
        })?
        .collect();
    orders
}

/// Get total count of inquiries
pub fn order_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
}
