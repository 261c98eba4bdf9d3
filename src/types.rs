use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Listing API envelope
// ---------------------------------------------------------------------------

/// Top-level response of the live listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub content: LiveListContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveListContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<LiveItem>,
    #[serde(default)]
    pub page: PageInfo,
}

/// Pagination block. An empty `next` means the listing is exhausted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub next: String,
}

impl ApiEnvelope {
    pub fn next_cursor(&self) -> &str {
        &self.content.page.next
    }

    pub fn into_items(self) -> Vec<LiveItem> {
        self.content.data
    }
}

// ---------------------------------------------------------------------------
// Live item (raw)
// ---------------------------------------------------------------------------

/// One live stream as returned by the API. `open_date` is still text here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveItem {
    pub live_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub live_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub live_thumbnail_image_url: String,
    pub concurrent_user_count: i64,
    /// `YYYY-MM-DD HH:MM:SS`, no zone.
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_date: String,
    pub adult: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub live_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub live_category_value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_image_url: String,
}

impl LiveItem {
    pub fn is_adult_content(&self) -> bool {
        self.adult
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

// The API sends `null` for empty tag lists, the last page's cursor and
// optional text fields such as image URLs and categories.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Accumulated listing
// ---------------------------------------------------------------------------

/// Every item of one traversal, in API order, pages concatenated.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub items: Vec<LiveItem>,
    pub pages: usize,
}
