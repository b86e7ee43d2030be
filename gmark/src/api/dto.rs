// gmark/src/api/dto.rs
//! JSON bodies of the endpoint contract. Field names are camelCase on the wire.

use crate::application::services::bookmark_service::BookmarkPage;
use crate::domain::bookmark::{Bookmark, BookmarkPatch};
use crate::domain::category::{Category, CategoryPatch, CategorySummary, NewCategory};
use crate::domain::content::{ContentRef, ContentSource};
use crate::domain::status::StatusMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDto {
    pub id: i32,
    pub user_id: String,
    pub content_id: i64,
    pub content_source_type: ContentSource,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookmarkDto {
    pub fn content(&self) -> ContentRef {
        ContentRef::new(self.content_id, self.content_source_type)
    }

    pub fn status_key(&self) -> String {
        self.content().status_key()
    }
}

impl From<Bookmark> for BookmarkDto {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            id: bookmark.id.unwrap_or_default(),
            user_id: bookmark.owner_id,
            content_id: bookmark.content.content_id,
            content_source_type: bookmark.content.source,
            note: bookmark.note,
            pinned: bookmark.pinned,
            is_public: bookmark.is_public,
            created_at: bookmark.created_at,
            updated_at: bookmark.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub cover_bookmark_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub sort_index: i32,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.unwrap_or_default(),
            user_id: category.owner_id,
            name: category.name,
            description: category.description,
            color: category.color,
            icon: category.icon,
            cover_bookmark_id: category.cover_bookmark_id,
            parent_id: category.parent_id,
            sort_index: category.sort_index,
            is_public: category.is_public,
            share_token: category.share_token,
            is_system: category.is_system,
            bookmark_count: None,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<CategorySummary> for CategoryDto {
    fn from(summary: CategorySummary) -> Self {
        Self {
            bookmark_count: Some(summary.bookmark_count),
            ..CategoryDto::from(summary.category)
        }
    }
}

/// One `(contentId, contentSourceType)` pair of a batch request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemDto {
    pub content_id: i64,
    pub content_source_type: ContentSource,
}

impl From<ContentItemDto> for ContentRef {
    fn from(item: ContentItemDto) -> Self {
        ContentRef::new(item.content_id, item.content_source_type)
    }
}

impl From<ContentRef> for ContentItemDto {
    fn from(content: ContentRef) -> Self {
        Self {
            content_id: content.content_id,
            content_source_type: content.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBatchRequest {
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<ContentItemDto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckBatchResponse {
    pub bookmarks: StatusMap<BookmarkDto>,
}

impl From<StatusMap<Bookmark>> for CheckBatchResponse {
    fn from(map: StatusMap<Bookmark>) -> Self {
        Self {
            bookmarks: map
                .into_iter()
                .map(|(key, bookmark)| (key, bookmark.map(BookmarkDto::from)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub bookmarked: bool,
    pub bookmark: Option<BookmarkDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub user_id: String,
    pub content_id: i64,
    pub content_source_type: ContentSource,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub is_public: bool,
}

impl CreateBookmarkRequest {
    pub fn new<S: Into<String>>(user_id: S, content: ContentRef) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content.content_id,
            content_source_type: content.source,
            note: None,
            pinned: false,
            is_public: false,
        }
    }

    pub fn content(&self) -> ContentRef {
        ContentRef::new(self.content_id, self.content_source_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateBookmarkRequest {
    pub fn patch(&self) -> BookmarkPatch {
        BookmarkPatch {
            note: self.note.clone(),
            pinned: self.pinned,
            is_public: self.is_public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPageDto {
    pub items: Vec<BookmarkDto>,
    pub next_cursor: Option<String>,
}

impl From<BookmarkPage> for BookmarkPageDto {
    fn from(page: BookmarkPage) -> Self {
        Self {
            items: page.items.into_iter().map(BookmarkDto::from).collect(),
            next_cursor: page.next_cursor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCategoriesRequest {
    pub user_id: String,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCategoriesResponse {
    pub category_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover_bookmark_id: Option<i32>,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub is_public: bool,
}

impl CreateCategoryRequest {
    pub fn named<S: Into<String>>(user_id: S, name: S) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            color: None,
            icon: None,
            cover_bookmark_id: None,
            parent_id: None,
            is_public: false,
        }
    }

    pub fn to_new_category(&self) -> NewCategory {
        NewCategory {
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            cover_bookmark_id: self.cover_bookmark_id,
            parent_id: self.parent_id,
            is_public: self.is_public,
        }
    }
}

/// Absent fields stay unchanged; an explicit `null` clears nullable ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub color: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub icon: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub cover_bookmark_id: Option<Option<i32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateCategoryRequest {
    pub fn to_patch(&self) -> CategoryPatch {
        CategoryPatch {
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            cover_bookmark_id: self.cover_bookmark_id,
            parent_id: self.parent_id,
            is_public: self.is_public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_batch_request_json_then_parses_camel_case() {
        let request: CheckBatchRequest = serde_json::from_value(json!({
            "userId": "alice",
            "items": [
                {"contentId": 1001, "contentSourceType": "items"},
                {"contentId": 7, "contentSourceType": "auto_items"}
            ]
        }))
        .unwrap();

        assert_eq!(request.user_id, "alice");
        let refs: Vec<ContentRef> = request.items.into_iter().map(ContentRef::from).collect();
        assert_eq!(refs[1], ContentRef::new(7, ContentSource::AutoItems));
    }

    #[test]
    fn given_update_category_json_then_null_and_absent_differ() {
        let request: UpdateCategoryRequest = serde_json::from_value(json!({
            "userId": "alice",
            "parentId": null,
            "color": "#aabbcc"
        }))
        .unwrap();

        let patch = request.to_patch();
        assert_eq!(patch.parent_id, Some(None));
        assert_eq!(patch.color, Some(Some("#aabbcc".to_string())));
        assert_eq!(patch.description, None);
        assert_eq!(patch.name, None);
    }

    #[test]
    fn given_absent_bookmark_then_serialized_as_null() {
        let mut response = CheckBatchResponse::default();
        response.bookmarks.insert("1002-items".to_string(), None);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"bookmarks": {"1002-items": null}}));
    }
}
