//! Generate a demo database full of realistic shell snippets.
//!
//! The database is written through the library's own `Database`, so the
//! schema always matches the app.
//!
//! Usage:
//!     cargo run --release --bin generate-demo-db -- [--count N] [output_path]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use snipforge::database::Database;
use snipforge::SnippetFields;

#[derive(Parser, Debug)]
#[command(about = "Generate a SnipForge demo database")]
struct Args {
    /// Number of snippets to generate
    #[arg(long, default_value_t = 2_000)]
    count: usize,
    /// Output SQLite file (replaced if it exists)
    #[arg(default_value = "snipforge-demo.sqlite")]
    output: PathBuf,
}

/// (title, body, tags) templates; bodies may carry placeholders
const TEMPLATES: &[(&str, &str, &[&str])] = &[
    ("SSH into host", "ssh {{user}}@{{host}} -p {{port}}", &["ssh", "remote"]),
    ("Copy file to host", "scp {{file}} {{user}}@{{host}}:{{path}}", &["ssh", "files"]),
    ("Git status", "git status -sb", &["git"]),
    ("Git amend", "git commit --amend --no-edit", &["git"]),
    ("Push branch", "git push -u origin {{branch}}", &["git", "github"]),
    ("Docker compose up", "docker compose up -d {{service}}", &["docker", "compose"]),
    ("Prune docker images", "docker image prune -a -f", &["docker", "cleanup"]),
    ("Tail pod logs", "kubectl logs -f {{pod}} -n {{namespace}}", &["kubernetes", "logs"]),
    ("List pods", "kubectl get pods -A", &["kubernetes"]),
    ("Find large files", "find {{dir}} -type f -size +{{size}}M", &["shell", "files"]),
    ("Disk usage", "du -sh * | sort -h", &["shell", "disk"]),
    ("Port in use", "lsof -i :{{port}}", &["network", "debug"]),
    ("Curl JSON", "curl -s {{url}} | jq '.'", &["http", "json"]),
    ("Postgres dump", "pg_dump -U {{user}} {{database}} > dump.sql", &["postgres", "backup"]),
    ("Systemd restart", "sudo systemctl restart {{unit}}", &["linux", "system"]),
];

const LANGUAGES: &[&str] = &["bash", "plaintext", "markdown", "sql", "yaml"];

const QUALIFIERS: &[&str] = &["quick", "prod", "staging", "local", "verbose", "safe", "nightly"];

const DESCRIPTION_WORDS: &[&str] = &[
    "useful", "when", "debugging", "the", "cluster", "after", "deploys", "run", "before",
    "release", "check", "output", "carefully", "handy", "for", "on-call", "cleanup",
];

fn generate_fields(rng: &mut impl Rng) -> SnippetFields {
    let (title, body, tags) = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
    let qualifier = QUALIFIERS[rng.gen_range(0..QUALIFIERS.len())];

    let description_len = rng.gen_range(0..=12);
    let description: Vec<&str> = (0..description_len)
        .filter_map(|_| DESCRIPTION_WORDS.choose(&mut *rng).copied())
        .collect();

    let mut all_tags: Vec<&str> = tags.to_vec();
    if rng.gen_bool(0.4) {
        all_tags.push(qualifier);
    }

    SnippetFields::new(format!("{} ({})", title, qualifier), body)
        .with_description(description.join(" "))
        .with_language(LANGUAGES[rng.gen_range(0..LANGUAGES.len())])
        .with_tags(all_tags)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if args.output.exists() {
        std::fs::remove_file(&args.output)
            .with_context(|| format!("failed to remove {}", args.output.display()))?;
    }

    println!("Generating demo database...");
    println!("Output: {}", args.output.display());

    let db = Database::open(&args.output).context("failed to create database")?;

    let mut rng = rand::thread_rng();
    let batch: Vec<SnippetFields> = (0..args.count).map(|_| generate_fields(&mut rng)).collect();
    let with_variables = batch
        .iter()
        .filter(|f| snipforge::variables::has_variables(&f.body))
        .count();
    db.insert_many(&batch).context("failed to insert snippets")?;

    println!();
    println!("Database created: {}", args.output.display());
    println!("  Snippets: {}", args.count);
    println!("  With variables: {}", with_variables);
    Ok(())
}
