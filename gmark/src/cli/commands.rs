// gmark/src/cli/commands.rs
use crate::api::dto::{
    CheckBatchResponse, CheckResponse, CreateBookmarkRequest, CreateCategoryRequest,
    ShareResponse, SyncCategoriesResponse, UpdateBookmarkRequest, UpdateCategoryRequest,
};
use crate::api::request::ListBookmarksParams;
use crate::cli::args::{CategoryCommands, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::client::transport::{HttpTransport, LocalTransport, Transport};
use crate::client::GalleryClient;
use crate::config::Settings;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::repositories::sqlite::connection::init_pool;
use crossterm::style::Stylize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Remote when a URL is given on the command line or configured, else the
/// local database.
pub fn create_transport(
    remote: Option<&str>,
    settings: &Settings,
) -> CliResult<Arc<dyn Transport>> {
    match remote.or(settings.api_url.as_deref()) {
        Some(url) => {
            debug!("Using remote server {}", url);
            Ok(Arc::new(HttpTransport::new(url)?))
        }
        None => {
            let container = ServiceContainer::new(settings)?;
            Ok(Arc::new(LocalTransport::new(Arc::new(
                container.api_handler(),
            ))))
        }
    }
}

#[instrument(level = "debug")]
pub fn create_db(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::InvalidInput(format!(
            "Database already exists at: {}",
            path.display()
        )));
    }

    let db_url = path.to_string_lossy();
    init_pool(&db_url)?;
    eprintln!("Database created at: {}", db_url.to_string().green());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one command and prints the response body on stdout.
#[instrument(skip(gallery), level = "debug")]
pub async fn run(command: Commands, gallery: GalleryClient) -> CliResult<()> {
    match command {
        Commands::CreateDb { .. } => Err(CliError::CommandFailed(
            "create-db does not talk to a server".to_string(),
        )),
        Commands::Add {
            user,
            content,
            note,
            pinned,
            public,
        } => {
            let request = CreateBookmarkRequest {
                note,
                pinned,
                is_public: public,
                ..CreateBookmarkRequest::new(user, content)
            };
            print_json(&gallery.add_bookmark(request).await?)
        }
        Commands::Update {
            id,
            user,
            note,
            pinned,
            public,
        } => {
            let body = UpdateBookmarkRequest {
                user_id: user,
                note,
                pinned,
                is_public: public,
            };
            print_json(&gallery.update_bookmark(id, body).await?)
        }
        Commands::Delete { id, user } => {
            gallery.api().delete_bookmark(&user, id).await?;
            eprintln!("Deleted bookmark {}", id.to_string().green());
            Ok(())
        }
        Commands::Check { user, content } => {
            let status = gallery.status(&user, content).await?;
            print_json(&CheckResponse {
                bookmarked: status.is_bookmarked,
                bookmark: status.bookmark,
            })
        }
        Commands::CheckBatch { user, items } => {
            let bookmarks = gallery.resolver().resolve(&user, &items).await?;
            print_json(&CheckBatchResponse { bookmarks })
        }
        Commands::List {
            user,
            cursor,
            limit,
            source,
            pinned,
            category,
            sort,
        } => {
            let params = ListBookmarksParams {
                user_id: user,
                cursor,
                limit,
                content_source: source,
                pinned,
                category_id: category,
                sort,
            };
            print_json(&gallery.bookmarks(params).await?)
        }
        Commands::Assign {
            bookmark_id,
            user,
            category_ids,
        } => {
            let category_ids = gallery
                .sync_categories(&user, bookmark_id, category_ids)
                .await?;
            print_json(&SyncCategoriesResponse { category_ids })
        }
        Commands::Categories { command } => run_category_command(command, gallery).await,
    }
}

async fn run_category_command(command: CategoryCommands, gallery: GalleryClient) -> CliResult<()> {
    match command {
        CategoryCommands::List { user } => print_json(&gallery.categories(&user).await?),
        CategoryCommands::Add {
            user,
            name,
            description,
            color,
            icon,
            parent,
            cover,
            public,
        } => {
            let request = CreateCategoryRequest {
                user_id: user,
                name,
                description,
                color,
                icon,
                cover_bookmark_id: cover,
                parent_id: parent,
                is_public: public,
            };
            print_json(&gallery.create_category(request).await?)
        }
        CategoryCommands::Update {
            id,
            user,
            name,
            description,
            color,
            icon,
            parent,
            no_parent,
            cover,
            public,
        } => {
            let parent_id = if no_parent {
                Some(None)
            } else {
                parent.map(Some)
            };
            let body = UpdateCategoryRequest {
                user_id: user,
                name,
                description: description.map(Some),
                color: color.map(Some),
                icon: icon.map(Some),
                cover_bookmark_id: cover.map(Some),
                parent_id,
                is_public: public,
            };
            print_json(&gallery.update_category(id, body).await?)
        }
        CategoryCommands::Delete { id, user, move_to } => {
            gallery.delete_category(&user, id, move_to).await?;
            eprintln!("Deleted category {}", id.to_string().green());
            Ok(())
        }
        CategoryCommands::Share { id, user } => {
            let share_token = gallery.share_category(&user, id).await?;
            print_json(&ShareResponse { share_token })
        }
        CategoryCommands::Shared { token } => {
            print_json(&gallery.api().shared_category(&token).await?)
        }
    }
}
