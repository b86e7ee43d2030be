// gmark/src/infrastructure/repositories/sqlite/model.rs
use chrono::NaiveDateTime;
use diesel::sql_types::{BigInt, Integer};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, QueryableByName, Selectable};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::bookmarks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbBookmark {
    pub id: i32,
    pub owner_id: String,
    pub content_id: i64,
    pub content_source: String,
    pub note: String,
    pub pinned: bool,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New bookmark for insertion
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::bookmarks)]
pub struct NewDbBookmark {
    pub owner_id: String,
    pub content_id: i64,
    pub content_source: String,
    pub note: String,
    pub pinned: bool,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable bookmark columns; identity and ownership never change
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::bookmarks)]
pub struct DbBookmarkChanges {
    pub note: String,
    pub pinned: bool,
    pub is_public: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbCategory {
    pub id: i32,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub cover_bookmark_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub sort_index: i32,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub is_system: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::categories)]
pub struct NewDbCategory {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub cover_bookmark_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub sort_index: i32,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub is_system: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changes for updating a category; `None` clears nullable columns
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::categories)]
#[diesel(treat_none_as_null = true)]
pub struct DbCategoryChanges {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub cover_bookmark_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::infrastructure::repositories::sqlite::schema::bookmark_categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbMembership {
    pub bookmark_id: i32,
    pub category_id: i32,
    pub owner_id: String,
    pub position: i32,
    pub added_at: NaiveDateTime,
}

/// Member count per category for aggregation queries
#[derive(QueryableByName, Debug)]
pub struct CategoryCount {
    #[diesel(sql_type = Integer)]
    pub category_id: i32,

    #[diesel(sql_type = BigInt)]
    pub n: i64,
}
