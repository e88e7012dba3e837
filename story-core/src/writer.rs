//! Writing finished stories to disk.
//!
//! Stories can be written as a Markdown document for reading or as a
//! versioned JSON envelope ([`SavedStory`]) that can be loaded back.

use crate::story::{GeneratedStory, StoryNode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

/// Errors from writing or loading stories.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Marker placed under every ending node.
pub const ENDING_MARKER: &str = "*The story ends here.*";

/// Current story file version.
const STORY_FILE_VERSION: u32 = 1;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// A story wrapped with the metadata needed to load it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStory {
    /// File format version for compatibility checking.
    pub version: u32,

    /// When the file was written (RFC 3339).
    pub saved_at: String,

    pub story: GeneratedStory,
}

impl SavedStory {
    pub fn new(story: GeneratedStory) -> Self {
        Self {
            version: STORY_FILE_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            story,
        }
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != STORY_FILE_VERSION {
            return Err(WriteError::VersionMismatch {
                expected: STORY_FILE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// Writes stories into an output directory.
///
/// Without a fixed file name every call produces a new timestamped file.
#[derive(Debug, Clone)]
pub struct TreeWriter {
    output_dir: PathBuf,
    format: OutputFormat,
    file_name: Option<String>,
}

impl TreeWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: OutputFormat::default(),
            file_name: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Always write to this file inside the output directory, overwriting it.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `story` and return the path of the file written.
    pub async fn write(&self, story: &GeneratedStory) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.output_dir).await?;

        let path = self.target_path(story);
        let content = match self.format {
            OutputFormat::Markdown => render_markdown(story),
            OutputFormat::Json => serde_json::to_string_pretty(&SavedStory::new(story.clone()))?,
        };
        fs::write(&path, content).await?;

        info!(path = %path.display(), story_id = %story.id, "story written");
        Ok(path)
    }

    fn target_path(&self, story: &GeneratedStory) -> PathBuf {
        match &self.file_name {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.join(timestamped_file_name(story, self.format)),
        }
    }
}

/// `<genre>_<timestamp>_<short id>.<ext>`
fn timestamped_file_name(story: &GeneratedStory, format: OutputFormat) -> String {
    let genre = story
        .genre
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
    let id = story.id.simple().to_string();

    format!("{genre}_{timestamp}_{}.{}", &id[..8], format.extension())
}

/// Render the story as a Markdown document.
///
/// Each node gets a heading labelled with its position (`1`, `1.2`, `1.2.1`,
/// ...), its narrative, and either a numbered list of choices followed by the
/// nodes they lead to, or [`ENDING_MARKER`].
pub fn render_markdown(story: &GeneratedStory) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {}\n\n", story.title()));
    doc.push_str(&format!("**Genre:** {}  \n", story.genre));
    doc.push_str(&format!(
        "**Inspiration:** {}  \n",
        story.inspiration_words.join(", ")
    ));
    doc.push_str(&format!("**Generated:** {}\n\n", story.created_at.to_rfc3339()));
    doc.push_str("---\n\n");

    render_node(&mut doc, &story.root, "1", 0);
    doc
}

fn render_node(doc: &mut String, node: &StoryNode, label: &str, depth: usize) {
    let level = (depth + 2).min(6);
    doc.push_str(&format!("{} {label}. {}\n\n", "#".repeat(level), node.title));
    doc.push_str(node.narrative.trim());
    doc.push_str("\n\n");

    if node.is_ending() {
        doc.push_str(ENDING_MARKER);
        doc.push_str("\n\n");
        return;
    }

    doc.push_str("**Choices:**\n\n");
    for (i, choice) in node.choices.iter().enumerate() {
        doc.push_str(&format!(
            "{}. {} _({})_ -> {label}.{}\n",
            i + 1,
            choice.prompt_text,
            choice.summary_text,
            i + 1
        ));
    }
    doc.push('\n');

    for (i, choice) in node.choices.iter().enumerate() {
        let child_label = format!("{label}.{}", i + 1);
        match &choice.next {
            Some(child) => render_node(doc, child, &child_label, depth + 1),
            None => doc.push_str(&format!("*Branch {child_label} ends here.*\n\n")),
        }
    }
}
