//! SnipForge command line
//!
//! Thin shell over `SnippetStore`: every subcommand maps to one store call.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use snipforge::config::Settings;
use snipforge::database::Database;
use snipforge::transfer::export_filename;
use snipforge::{Snippet, SnippetFields, SnippetStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal snippet manager", long_about = None)]
struct Cli {
    /// SQLite database file (overrides the settings file)
    #[arg(long, env = "SNIPFORGE_DB")]
    db: Option<PathBuf>,

    /// Settings file
    #[arg(long, env = "SNIPFORGE_CONFIG", default_value = "snipforge.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and settings file, seeding a welcome snippet
    Init,
    /// List all snippets, most recently updated first
    List,
    /// Add a snippet
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "plaintext")]
        language: String,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change fields of a snippet; omitted fields are kept
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Replace all tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },
    /// Delete a snippet
    Remove { id: i64 },
    /// Search with free text or `tag:`/`title:`/`body:` clauses joined by `|`
    Search { query: String },
    /// Show the tag vocabulary, or suggestions for a partial tag
    Tags { partial: Option<String> },
    /// Autocomplete a tag list (or a search query with --query)
    Complete {
        input: String,
        /// Cursor position in characters; defaults to the end of input
        #[arg(long)]
        cursor: Option<usize>,
        /// Treat input as a search query and complete its `tag:` clause
        #[arg(long)]
        query: bool,
    },
    /// List the placeholders in a snippet body
    Vars { id: i64 },
    /// Print a snippet body with placeholders filled in
    Fill {
        id: i64,
        /// name=value pairs
        values: Vec<String>,
    },
    /// Export snippets to JSON
    Export {
        /// Only snippets carrying this tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output file; defaults to a dated name in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import snippets from an export file
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let db_path = cli
        .db
        .clone()
        .or_else(|| settings.database_path.clone())
        .unwrap_or_else(|| PathBuf::from("snipforge.db"));

    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    if let Command::Init = cli.command {
        if db.seed_welcome()? {
            println!("Seeded {}", db_path.display());
        }
        if !cli.config.exists() {
            settings.save(&cli.config)?;
            println!("Wrote {}", cli.config.display());
        }
        return Ok(());
    }

    let store = SnippetStore::with_settings(db, &settings);
    run(&store, cli.command)
}

fn run(store: &SnippetStore<Database>, command: Command) -> Result<()> {
    match command {
        Command::Init => {}
        Command::List => print_snippets(&store.list()?),
        Command::Add { title, body, description, language, tags } => {
            let fields = SnippetFields::new(title, body)
                .with_description(description)
                .with_language(language)
                .with_tags(tags);
            let id = store.create(&fields)?;
            println!("{}", id);
        }
        Command::Edit { id, title, body, description, language, tags } => {
            let mut fields = store.get(id)?.fields();
            if let Some(title) = title {
                fields.title = title;
            }
            if let Some(body) = body {
                fields.body = body;
            }
            if let Some(description) = description {
                fields.description = description;
            }
            if let Some(language) = language {
                fields = fields.with_language(language);
            }
            if let Some(tags) = tags {
                fields = fields.with_tags(tags);
            }
            store.update(id, &fields)?;
        }
        Command::Remove { id } => store.delete(id)?,
        Command::Search { query } => print_snippets(&store.search(&query)?),
        Command::Tags { partial: None } => {
            for tag in store.tag_vocabulary()? {
                println!("{}", tag);
            }
        }
        Command::Tags { partial: Some(partial) } => {
            for tag in store.suggest_tags(&partial)? {
                println!("{}", tag);
            }
        }
        Command::Complete { input, cursor, query: true } => {
            let cursor = cursor.unwrap_or_else(|| input.chars().count());
            let completion = store.complete_query(&input, cursor)?;
            println!("{}", completion.completed.unwrap_or(input));
        }
        Command::Complete { input, cursor: Some(cursor), query: false } => {
            let inline = store.complete_at_cursor(&input, cursor)?;
            println!("{}", inline.completion_text.unwrap_or_default());
        }
        Command::Complete { input, cursor: None, query: false } => {
            println!("{}", store.complete_tags(&input)?.completed);
        }
        Command::Vars { id } => {
            for name in store.variables(id)? {
                println!("{}", name);
            }
        }
        Command::Fill { id, values } => {
            let values = parse_assignments(&values)?;
            println!("{}", store.fill(id, &values)?);
        }
        Command::Export { tags, out } => {
            let document = store.export(&tags)?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(export_filename(&tags, Utc::now().date_naive()))
            });
            std::fs::write(&path, document.to_json_pretty()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} snippets to {}", document.total_commands, path.display());
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let count = store.import_json(&json)?;
            println!("Imported {} snippets", count);
        }
    }
    Ok(())
}

fn print_snippets(snippets: &[Snippet]) {
    for snippet in snippets {
        if snippet.tags.is_empty() {
            println!("{:>5}  {}", snippet.id, snippet.title);
        } else {
            println!("{:>5}  {}  [{}]", snippet.id, snippet.title, snippet.tags);
        }
    }
}

fn parse_assignments(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("expected name=value, got {:?}", pair);
        };
        values.insert(name.trim().to_string(), value.to_string());
    }
    Ok(values)
}
