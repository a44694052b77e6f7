//! Classifieds marketplace - listings, photos, and purchase inquiries
//!
//! Backs a small second-hand marketplace site: sellers post an item with a
//! photo, buyers browse by keyword or category and leave contact details on
//! a listing. Storage is a single SQLite database plus a directory of
//! uploaded photos.

pub mod categories;
pub mod database;
pub mod error;
pub mod pages;
pub mod uploads;
pub mod web;

pub use categories::CATEGORIES;
pub use database::{init_schema, item_count, order_count};
pub use error::{MarketError, Result};
