//! Branching story generation engine with an AI storyteller.
//!
//! This crate provides:
//! - A depth-first story generator that drives a language-model backend
//! - Structural validation and bounded retries for every segment
//! - A call budget with a minimum delay between backend requests
//! - Markdown and JSON output of the finished story tree
//!
//! # Quick Start
//!
//! ```ignore
//! use story_core::{ClaudeBackend, GenerationConfig, StoryGenerator, TreeWriter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::builder()
//!         .with_max_depth(3)
//!         .with_inspiration_words(4)
//!         .build()?;
//!
//!     let generator = StoryGenerator::new(ClaudeBackend::from_env()?);
//!     let story = generator.generate_story(&config).await?;
//!
//!     let path = TreeWriter::new("stories").write(&story).await?;
//!     println!("Wrote {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod generator;
pub mod limiter;
pub mod prompt;
pub mod segment;
pub mod story;
pub mod testing;
pub mod vocabulary;
pub mod writer;

// Primary public API
pub use backend::{parse_segment, BackendConfig, BackendError, ClaudeBackend, StoryBackend};
pub use config::{ConfigError, GenerationConfig, GenerationConfigBuilder};
pub use generator::{AttemptError, GenerationError, StoryGenerator};
pub use limiter::{RateLimitExceeded, RateLimiter};
pub use prompt::{BranchStep, StoryModelPrompt};
pub use segment::{SegmentChoice, StoryModelSegment, ValidationError};
pub use story::{GeneratedStory, StoryChoice, StoryNode};
pub use testing::ScriptedBackend;
pub use vocabulary::Vocabulary;
pub use writer::{render_markdown, OutputFormat, SavedStory, TreeWriter, WriteError};
