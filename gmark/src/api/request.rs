// gmark/src/api/request.rs
use crate::api::dto::{
    CheckBatchRequest, CreateBookmarkRequest, CreateCategoryRequest, SyncCategoriesRequest,
    UpdateBookmarkRequest, UpdateCategoryRequest,
};
use crate::domain::content::{ContentRef, ContentSource};
use crate::domain::repositories::query::SortDirection;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Query parameters of `GET /bookmarks`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListBookmarksParams {
    pub user_id: String,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
    pub content_source: Option<ContentSource>,
    pub pinned: Option<bool>,
    pub category_id: Option<i32>,
    pub sort: Option<SortDirection>,
}

impl ListBookmarksParams {
    pub fn for_user<S: Into<String>>(user_id: S) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Filter and sort parameters, without user and cursor, in a stable order.
    pub fn filter_params(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        if let Some(limit) = self.limit {
            params.insert("limit", limit.to_string());
        }
        if let Some(source) = self.content_source {
            params.insert("contentSourceType", source.to_string());
        }
        if let Some(pinned) = self.pinned {
            params.insert("pinned", pinned.to_string());
        }
        if let Some(category_id) = self.category_id {
            params.insert("categoryId", category_id.to_string());
        }
        if let Some(sort) = self.sort {
            params.insert("sort", sort.to_string());
        }
        params
    }
}

/// One call of the endpoint contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    CheckBatch(CheckBatchRequest),
    Check {
        user_id: String,
        content: ContentRef,
    },
    CreateBookmark(CreateBookmarkRequest),
    UpdateBookmark {
        id: i32,
        body: UpdateBookmarkRequest,
    },
    DeleteBookmark {
        id: i32,
        user_id: String,
    },
    ListBookmarks(ListBookmarksParams),
    SyncCategories {
        bookmark_id: i32,
        body: SyncCategoriesRequest,
    },
    ListCategories {
        user_id: String,
    },
    CreateCategory(CreateCategoryRequest),
    UpdateCategory {
        id: i32,
        body: UpdateCategoryRequest,
    },
    DeleteCategory {
        id: i32,
        user_id: String,
        move_to: Option<i32>,
    },
    ShareCategory {
        id: i32,
        user_id: String,
    },
    GetSharedCategory {
        token: String,
    },
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        match self {
            ApiRequest::Check { .. }
            | ApiRequest::ListBookmarks(_)
            | ApiRequest::ListCategories { .. }
            | ApiRequest::GetSharedCategory { .. } => Method::Get,
            ApiRequest::CheckBatch(_)
            | ApiRequest::CreateBookmark(_)
            | ApiRequest::SyncCategories { .. }
            | ApiRequest::CreateCategory(_)
            | ApiRequest::ShareCategory { .. } => Method::Post,
            ApiRequest::UpdateBookmark { .. } | ApiRequest::UpdateCategory { .. } => Method::Patch,
            ApiRequest::DeleteBookmark { .. } | ApiRequest::DeleteCategory { .. } => {
                Method::Delete
            }
        }
    }

    /// Path without query string
    pub fn path(&self) -> String {
        match self {
            ApiRequest::CheckBatch(_) => "/bookmarks/check-batch".to_string(),
            ApiRequest::Check { .. } => "/bookmarks/check".to_string(),
            ApiRequest::CreateBookmark(_) | ApiRequest::ListBookmarks(_) => {
                "/bookmarks".to_string()
            }
            ApiRequest::UpdateBookmark { id, .. } | ApiRequest::DeleteBookmark { id, .. } => {
                format!("/bookmarks/{}", id)
            }
            ApiRequest::SyncCategories { bookmark_id, .. } => {
                format!("/bookmarks/{}/categories", bookmark_id)
            }
            ApiRequest::ListCategories { .. } | ApiRequest::CreateCategory(_) => {
                "/categories".to_string()
            }
            ApiRequest::UpdateCategory { id, .. } | ApiRequest::DeleteCategory { id, .. } => {
                format!("/categories/{}", id)
            }
            ApiRequest::ShareCategory { id, .. } => format!("/categories/{}/share", id),
            ApiRequest::GetSharedCategory { token } => format!("/categories/shared/{}", token),
        }
    }

    /// Query string pairs, unencoded
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiRequest::Check { user_id, content } => vec![
                ("userId", user_id.clone()),
                ("contentId", content.content_id.to_string()),
                ("contentSourceType", content.source.to_string()),
            ],
            ApiRequest::DeleteBookmark { user_id, .. }
            | ApiRequest::ListCategories { user_id }
            | ApiRequest::ShareCategory { user_id, .. } => vec![("userId", user_id.clone())],
            ApiRequest::DeleteCategory {
                user_id, move_to, ..
            } => {
                let mut pairs = vec![("userId", user_id.clone())];
                if let Some(target) = move_to {
                    pairs.push(("moveTo", target.to_string()));
                }
                pairs
            }
            ApiRequest::ListBookmarks(params) => {
                let mut pairs = vec![("userId", params.user_id.clone())];
                if let Some(cursor) = &params.cursor {
                    pairs.push(("cursor", cursor.clone()));
                }
                pairs.extend(params.filter_params());
                pairs
            }
            _ => Vec::new(),
        }
    }

    /// JSON body of POST and PATCH requests
    pub fn body(&self) -> Option<Value> {
        let body = match self {
            ApiRequest::CheckBatch(body) => serde_json::to_value(body),
            ApiRequest::CreateBookmark(body) => serde_json::to_value(body),
            ApiRequest::UpdateBookmark { body, .. } => serde_json::to_value(body),
            ApiRequest::SyncCategories { body, .. } => serde_json::to_value(body),
            ApiRequest::CreateCategory(body) => serde_json::to_value(body),
            ApiRequest::UpdateCategory { body, .. } => serde_json::to_value(body),
            ApiRequest::ShareCategory { user_id, .. } => {
                Ok(serde_json::json!({ "userId": user_id }))
            }
            _ => return None,
        };
        body.ok()
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Status code and JSON body of a handled request. `204` carries `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field of an error body
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_methods() {
        let delete = ApiRequest::DeleteCategory {
            id: 4,
            user_id: "alice".to_string(),
            move_to: Some(2),
        };
        assert_eq!(delete.method(), Method::Delete);
        assert_eq!(delete.path(), "/categories/4");
        assert_eq!(
            delete.query(),
            vec![("userId", "alice".to_string()), ("moveTo", "2".to_string())]
        );
        assert_eq!(delete.to_string(), "DELETE /categories/4");
        assert!(delete.body().is_none());
    }

    #[test]
    fn test_list_params_are_ordered() {
        let params = ListBookmarksParams {
            sort: Some(SortDirection::Ascending),
            pinned: Some(true),
            ..ListBookmarksParams::for_user("alice")
        };
        let keys: Vec<&str> = params.filter_params().keys().copied().collect();
        assert_eq!(keys, vec!["pinned", "sort"]);
    }
}
