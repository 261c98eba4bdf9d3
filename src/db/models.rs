//! Row types for the `live_data` table (migrations/0001_create_live_data.sql).
use chrono::NaiveDateTime;
use sqlx::types::Json;

/// Persistence form of one live item. Built by `convert::convert_listing`,
/// written by `db::writer`, dropped once the write returns.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRecord {
    pub live_id: i64,
    pub live_title: String,
    /// Carried for completeness; the 12-column `live_data` schema does not store it.
    pub live_thumbnail_image_url: String,
    pub concurrent_user_count: i64,
    pub open_date: NaiveDateTime,
    pub adult: bool,
    /// Stored as a JSONB array.
    pub tags: Json<Vec<String>>,
    pub category_type: String,
    pub live_category: String,
    pub live_category_value: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_image_url: String,
}
