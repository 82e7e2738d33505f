//! Ledger project record

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub project_id: i32,
    pub name: String,
    pub link: String,
    pub visibility: String,
    #[sqlx(rename = "EPR_id")]
    pub epr_id: String,
    pub description: String,
    pub banner: String,
    pub is_featured: bool,
}
