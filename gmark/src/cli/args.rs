// gmark/src/cli/args.rs
use crate::domain::content::{ContentRef, ContentSource};
use crate::domain::repositories::query::SortDirection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Owner-scoped bookmarks for gallery content
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Send requests to a gmark server instead of the local database
    #[arg(long = "remote", value_name = "URL")]
    pub remote: Option<String>,

    #[arg(long = "generate-config", help = "print default configuration")]
    pub generate_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new database
    CreateDb {
        /// Path of the database file
        path: PathBuf,
    },
    /// Bookmark a content item, given as <contentId>:<source>
    Add {
        #[arg(short = 'u', long = "user")]
        user: String,
        content: ContentRef,
        #[arg(long = "note")]
        note: Option<String>,
        #[arg(long = "pinned")]
        pinned: bool,
        #[arg(long = "public")]
        public: bool,
    },
    /// Update note, pin or visibility of a bookmark
    Update {
        id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
        #[arg(long = "note")]
        note: Option<String>,
        #[arg(long = "pinned")]
        pinned: Option<bool>,
        #[arg(long = "public")]
        public: Option<bool>,
    },
    /// Delete a bookmark
    Delete {
        id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
    },
    /// Is one content item bookmarked
    Check {
        #[arg(short = 'u', long = "user")]
        user: String,
        content: ContentRef,
    },
    /// Bookmark status of many content items in one request
    CheckBatch {
        #[arg(short = 'u', long = "user")]
        user: String,
        items: Vec<ContentRef>,
    },
    /// One page of bookmarks
    List {
        #[arg(short = 'u', long = "user")]
        user: String,
        #[arg(long = "cursor", help = "cursor returned as nextCursor by the previous page")]
        cursor: Option<String>,
        #[arg(short = 'l', long = "limit")]
        limit: Option<usize>,
        #[arg(long = "source")]
        source: Option<ContentSource>,
        #[arg(long = "pinned")]
        pinned: Option<bool>,
        #[arg(long = "category")]
        category: Option<i32>,
        #[arg(long = "sort", help = "newest or oldest")]
        sort: Option<SortDirection>,
    },
    /// Replace the categories of a bookmark
    Assign {
        bookmark_id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
        /// list of category ids, separated by comma, no blanks
        #[arg(value_delimiter = ',')]
        category_ids: Vec<i32>,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Categories with bookmark counts
    List {
        #[arg(short = 'u', long = "user")]
        user: String,
    },
    Add {
        #[arg(short = 'u', long = "user")]
        user: String,
        name: String,
        #[arg(long = "description")]
        description: Option<String>,
        #[arg(long = "color")]
        color: Option<String>,
        #[arg(long = "icon")]
        icon: Option<String>,
        #[arg(long = "parent")]
        parent: Option<i32>,
        #[arg(long = "cover")]
        cover: Option<i32>,
        #[arg(long = "public")]
        public: bool,
    },
    Update {
        id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
        #[arg(long = "name")]
        name: Option<String>,
        #[arg(long = "description")]
        description: Option<String>,
        #[arg(long = "color")]
        color: Option<String>,
        #[arg(long = "icon")]
        icon: Option<String>,
        #[arg(long = "parent", conflicts_with = "no_parent")]
        parent: Option<i32>,
        #[arg(long = "no-parent", help = "move to the top level")]
        no_parent: bool,
        #[arg(long = "cover")]
        cover: Option<i32>,
        #[arg(long = "public")]
        public: Option<bool>,
    },
    /// Delete a category; its bookmarks can be moved to another one first
    Delete {
        id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
        #[arg(long = "move-to")]
        move_to: Option<i32>,
    },
    /// Make a category public and print its share token
    Share {
        id: i32,
        #[arg(short = 'u', long = "user")]
        user: String,
    },
    /// Show a shared category by token
    Shared { token: String },
}
