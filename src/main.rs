use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use handbook::app::state::{Document, nav_entries};
use handbook::assistant::{self, ApiKeyManager, AssistantClient};
use handbook::docs::{ContentStore, manifest};
use handbook::ui::content::render_blocks;
use handbook::{App, Config, Theme};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Line width used when printing a section
const RENDER_WIDTH: usize = 100;

#[derive(Parser)]
#[command(name = "handbook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing handbook.json (overrides the config file)
    #[arg(short, long, global = true)]
    docs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every section and sub-item
    Sections,
    /// Search the documentation
    Search {
        /// Text to look for in titles, tags and content
        query: String,
    },
    /// Print the headings of a section
    Toc {
        /// Section or sub-item key
        key: String,
    },
    /// Print a section as formatted text
    Render {
        /// Section or sub-item key
        key: String,
        /// Mark every occurrence of this term
        #[arg(long)]
        highlight: Option<String>,
    },
    /// Ask the documentation assistant a question
    Ask {
        /// The question
        question: String,
    },
    /// Store the assistant API key in the system keyring
    Key {
        /// Anthropic API key
        #[arg(required_unless_present = "delete")]
        api_key: Option<String>,
        /// Remove the stored key instead
        #[arg(long, conflicts_with = "api_key")]
        delete: bool,
    },
}

fn init_logging(tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "handbook=info".into());

    if tui {
        // Anything written to the terminal would corrupt the alternate screen
        let path = Config::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {:?}", parent))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {:?}", path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none())?;

    let mut config = Config::load()?;
    if let Some(dir) = cli.docs_dir {
        config.docs_dir = dir;
    }

    // Managing the key needs no docs
    if let Some(Commands::Key { api_key, delete }) = &cli.command {
        match api_key {
            Some(key) if !delete => {
                ApiKeyManager::set_api_key(key)?;
                println!("API key saved ({})", ApiKeyManager::mask_key(key));
            }
            _ => {
                ApiKeyManager::delete_api_key()?;
                println!("API key removed");
            }
        }
        return Ok(());
    }

    let (manifest, registry) = manifest::load_registry(&config.docs_dir)
        .with_context(|| format!("Failed to load docs from {:?}", config.docs_dir))?;
    let store = Arc::new(ContentStore::new(registry));

    match cli.command {
        Some(Commands::Sections) => {
            for entry in nav_entries(store.registry()) {
                let indent = "  ".repeat(entry.depth as usize);
                println!("{indent}{:<24} {}", entry.key, entry.title);
            }
        }
        Some(Commands::Search { query }) => {
            store.preload_all().await;
            let results = store.search(&query);
            if results.is_empty() {
                println!("No matches for {query:?}");
            }
            for section in results.iter() {
                print_match(&store, &section.key, &section.title, &query, 0);
                for item in &section.sub_items {
                    print_match(&store, &item.key, &item.title, &query, 1);
                }
            }
        }
        Some(Commands::Toc { key }) => {
            let document = load_document(&store, &key).await?;
            for heading in &document.headings {
                let indent = if heading.level == 3 { "  " } else { "" };
                println!("{indent}{}  #{}", heading.text, heading.id);
            }
        }
        Some(Commands::Render { key, highlight }) => {
            let document = load_document(&store, &key).await?;
            let theme = config.active_theme();
            print_document(&document, &theme, highlight.as_deref());
        }
        Some(Commands::Ask { question }) => {
            store.preload_all().await;
            let (api_key, _) = ApiKeyManager::resolve()?;
            let client = AssistantClient::new(api_key)?;
            let answer = assistant::ask(
                &client,
                config.model,
                &manifest.product,
                &store.assistant_context(),
                &question,
            )
            .await;
            println!("{answer}");
        }
        Some(Commands::Key { .. }) => {}
        None => {
            // Launch TUI
            let mut app = App::new(config, store, manifest.product)?;
            app.run().await?;
        }
    }

    Ok(())
}

fn print_match(store: &ContentStore, key: &str, title: &str, query: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    match store.find_heading_anchor(key, query) {
        Some(anchor) => println!("{indent}{title}  {key}#{anchor}"),
        None => println!("{indent}{title}  {key}"),
    }
}

/// Load the content behind `key` and parse it
async fn load_document(store: &ContentStore, key: &str) -> Result<Document> {
    let Some(entry) = store.registry().entry(key) else {
        let known: Vec<&str> = store.registry().keys().collect();
        bail!("No section named {key} (known: {})", known.join(", "));
    };
    let title = entry.title().to_string();

    let load_key = store.resolve_sub_item_parent(key).unwrap_or_else(|| key.to_string());
    let outcome = store.wait_loaded(&load_key).await;
    if !outcome.is_available() {
        bail!("Couldn't load {key}: {outcome:?}");
    }
    Ok(Document::parse(key, title, &store.active_content(key)))
}

fn print_document(document: &Document, theme: &Theme, highlight: Option<&str>) {
    let rendered = render_blocks(&document.blocks, theme, RENDER_WIDTH, highlight);
    for line in rendered.lines {
        let mut out = String::new();
        for span in &line.spans {
            let text = span.content.as_ref();
            if highlight.is_some() && span.style.bg == Some(theme.mark_bg) {
                out.push_str(&text.reverse().to_string());
            } else {
                out.push_str(text);
            }
        }
        println!("{}", out.trim_end());
    }
}
