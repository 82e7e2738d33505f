//! Marketing campaign

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub banner_image_url: String,
    pub month: i32,
    pub year: i32,
    pub featured: bool,
    pub link: String,
    pub created_at: DateTime<Utc>,
}
