//! Command-line interface for contentstore.
//!
//! Provides commands for inspecting the resolved configuration, listing
//! views, fetching resources, resolving relationships and searching.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::HttpTransport;
use crate::config;
use crate::core::{ContentStore, FetchOutcome, SearchResults};
use crate::domain::{PerIdError, Resource, ResourceType};

/// contentstore - Client-side content graph store
#[derive(Parser, Debug)]
#[command(name = "contentstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resolved configuration (debug)
    Config,

    /// List the views named in the server config
    Views,

    /// Fetch a view by name
    View {
        /// View name (e.g., "homepage")
        name: String,

        /// Relationships to side-load (comma-separated)
        #[arg(short, long)]
        include: Option<String>,
    },

    /// Fetch resources by id
    Fetch {
        /// Resource type (video, collection, view, ...)
        resource_type: ResourceType,

        /// One or more ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Relationships to side-load (comma-separated)
        #[arg(short, long)]
        include: Option<String>,
    },

    /// Resolve a relationship of a resource
    Related {
        /// Resource type of the parent
        resource_type: ResourceType,

        /// Parent id
        id: String,

        /// Relationship name (e.g., "entities")
        relationship: String,
    },

    /// Search videos and collections
    Search {
        /// Search term
        term: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Config => show_config(),
            Commands::Views => list_views().await,
            Commands::View { name, include } => fetch_view(&name, include.as_deref()).await,
            Commands::Fetch {
                resource_type,
                ids,
                include,
            } => fetch_resources(resource_type, &ids, include.as_deref()).await,
            Commands::Related {
                resource_type,
                id,
                relationship,
            } => show_related(resource_type, &id, &relationship).await,
            Commands::Search { term } => search(&term).await,
        }
    }
}

/// Build a store over HTTP and initialize it
async fn open_store() -> Result<ContentStore> {
    let cfg = config::config()?;
    let transport = HttpTransport::from_config(cfg).context("Failed to build HTTP transport")?;

    let store = ContentStore::new(Arc::new(transport));
    store
        .initialize()
        .await
        .with_context(|| format!("Failed to initialize against {}", cfg.base_url))?;

    Ok(store)
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("contentstore configuration");
    println!("{}", "-".repeat(40));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Server:");
    println!("  Mode:      {}", cfg.server_mode);
    println!("  URL:       {}", cfg.base_url);
    println!("  Timeout:   {}s", cfg.timeout.as_secs());
    println!(
        "  Auth:      {}",
        if cfg.auth_token.is_some() { "token set" } else { "(none)" }
    );
    println!();
    println!(
        "Log level: {}",
        cfg.log_level.as_deref().unwrap_or("(default)")
    );

    Ok(())
}

/// List configured view names
async fn list_views() -> Result<()> {
    let store = open_store().await?;
    let Some(app_config) = store.config() else {
        return Ok(());
    };

    println!("{:<20} {:<40}", "VIEW", "ID");
    println!("{}", "-".repeat(60));
    for name in app_config.view_names() {
        let id = app_config.id_for_view_name(name).unwrap_or_default();
        println!("{:<20} {:<40}", name, id);
    }

    Ok(())
}

async fn fetch_view(name: &str, include: Option<&str>) -> Result<()> {
    let store = open_store().await?;
    let outcome = store.fetch_view(name, include).await?;

    for view in &outcome.objects {
        print_resource(view);
    }
    print_errors(&outcome.errors);

    Ok(())
}

async fn fetch_resources(resource_type: ResourceType, ids: &[String], include: Option<&str>) -> Result<()> {
    let store = open_store().await?;
    let outcome = store.objects_of_type(resource_type, ids, include).await?;

    for resource in &outcome.objects {
        print_resource(resource);
    }
    print_errors(&outcome.errors);

    Ok(())
}

/// Fetch a parent and lazily resolve one of its relationships
async fn show_related(resource_type: ResourceType, id: &str, relationship: &str) -> Result<()> {
    let store = open_store().await?;

    let parent = store.objects_of_type(resource_type, &[id], None).await?;
    print_errors(&parent.errors);
    let parent = parent
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} not found: {}", resource_type, id))?;

    let node = parent.relationship(relationship).ok_or_else(|| {
        anyhow::anyhow!(
            "{} {} has no relationship `{}` (available: {})",
            resource_type,
            id,
            relationship,
            parent.relationship_names().join(", ")
        )
    })?;

    let outcome: FetchOutcome = node.get_all_objects(&store).await?;

    println!(
        "{} of {} {} ({} target(s))\n",
        relationship,
        resource_type,
        id,
        node.number_of_relationships()
    );
    print_table(&outcome.objects);
    print_errors(&outcome.errors);

    Ok(())
}

async fn search(term: &str) -> Result<()> {
    let store = open_store().await?;
    let SearchResults {
        videos,
        collections,
        errors,
    } = store.search(term).await?;

    if videos.is_empty() && collections.is_empty() {
        println!("No results found for: {}", term);
        print_errors(&errors);
        return Ok(());
    }

    println!(
        "Found {} result(s) for \"{}\":\n",
        videos.len() + collections.len(),
        term
    );
    print_table(videos.iter().chain(&collections));
    print_errors(&errors);

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn print_table<'a>(resources: impl IntoIterator<Item = &'a Arc<Resource>>) {
    println!("{:<34} {:<11} {:<50}", "ID", "TYPE", "TITLE");
    println!("{}", "-".repeat(95));
    for resource in resources {
        println!(
            "{:<34} {:<11} {:<50}",
            resource.id(),
            resource.resource_type().to_string(),
            truncate(resource.title().unwrap_or("(untitled)"), 50)
        );
    }
}

fn print_resource(resource: &Resource) {
    println!("{} {}", resource.resource_type(), resource.id());
    if let Some(title) = resource.title() {
        println!("  Title: {}", title);
    }
    if let Some(description) = resource.description() {
        println!("  Description: {}", truncate(description, 70));
    }
    if let Some(url) = resource.url() {
        println!("  URL: {}", url);
    }
    if let Some(duration) = resource.duration() {
        println!("  Duration: {}s", duration / 1000);
    }
    if let Some(thumbnail) = resource.thumbnail_link() {
        println!("  Thumbnail: {}", thumbnail);
    }

    for node in resource
        .relationship_names()
        .into_iter()
        .filter_map(|name| resource.relationship(name))
    {
        let state = if node.is_resolved() { "resolved" } else { "ids only" };
        println!(
            "  -> {} [{} target(s), {}]",
            node.name(),
            node.number_of_relationships(),
            state
        );
    }
    println!();
}

fn print_errors(errors: &[PerIdError]) {
    for error in errors {
        eprintln!("warning: {}", error);
    }
}
