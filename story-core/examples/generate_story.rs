//! Generate one branching story with Claude and write it to disk.
//!
//! Run with: `cargo run -p story-core --example generate_story`
//!
//! Settings come from the environment (or a `.env` file):
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ANTHROPIC_API_KEY` | required |
//! | `STORY_MAX_DEPTH` | 3 |
//! | `STORY_MAX_RETRIES` | 3 |
//! | `STORY_MAX_REQUESTS` | 40 |
//! | `STORY_INSPIRATION_WORDS` | 3 |
//! | `STORY_MIN_DELAY_MS` | 1000 |
//! | `STORY_OUTPUT_DIR` | `stories` |
//! | `STORY_FORMAT` | `markdown` (or `json`) |

use std::str::FromStr;
use std::time::Duration;
use story_core::{ClaudeBackend, GenerationConfig, OutputFormat, StoryGenerator, TreeWriter};
use tracing_subscriber::EnvFilter;

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| format!("{name} has an invalid value: {value:?}")),
        Err(_) => Ok(default),
    }
}

fn config_from_env() -> Result<GenerationConfig, Box<dyn std::error::Error>> {
    let delay_ms: u64 = env_or("STORY_MIN_DELAY_MS", 1000)?;

    let config = GenerationConfig::builder()
        .with_max_depth(env_or("STORY_MAX_DEPTH", GenerationConfig::DEFAULT_MAX_DEPTH)?)
        .with_max_retries(env_or("STORY_MAX_RETRIES", GenerationConfig::DEFAULT_MAX_RETRIES)?)
        .with_max_requests(env_or("STORY_MAX_REQUESTS", GenerationConfig::DEFAULT_MAX_REQUESTS)?)
        .with_inspiration_words(env_or(
            "STORY_INSPIRATION_WORDS",
            GenerationConfig::DEFAULT_INSPIRATION_WORDS,
        )?)
        .with_min_delay(Duration::from_millis(delay_ms))
        .build()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set");
        eprintln!("Set it in your environment or create a .env file");
        std::process::exit(1);
    }

    let config = config_from_env()?;
    let format = match std::env::var("STORY_FORMAT").as_deref() {
        Ok("json") => OutputFormat::Json,
        _ => OutputFormat::Markdown,
    };
    let output_dir = std::env::var("STORY_OUTPUT_DIR").unwrap_or_else(|_| "stories".to_string());

    let generator = StoryGenerator::new(ClaudeBackend::from_env()?);
    let story = generator.generate_story(&config).await?;

    println!("Title:       {}", story.title());
    println!("Genre:       {}", story.genre);
    println!("Inspiration: {}", story.inspiration_words.join(", "));
    println!(
        "Nodes:       {} ({} endings, depth {})",
        story.node_count(),
        story.ending_count(),
        story.height()
    );

    let path = TreeWriter::new(output_dir)
        .with_format(format)
        .write(&story)
        .await?;
    println!("\nWrote story to: {}", path.display());

    Ok(())
}
