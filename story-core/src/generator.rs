//! Story generation: expands the tree one backend segment at a time.
//!
//! Nodes are expanded depth-first. Each branch, including all of its
//! descendants, is finished before the next sibling starts, so backend calls
//! are strictly sequential. Any fatal error unwinds the whole expansion and
//! the partial tree is dropped.

use crate::backend::{BackendError, StoryBackend};
use crate::config::{ConfigError, GenerationConfig};
use crate::limiter::{RateLimitExceeded, RateLimiter};
use crate::prompt::{BranchStep, StoryModelPrompt};
use crate::segment::{StoryModelSegment, ValidationError};
use crate::story::{GeneratedStory, StoryChoice, StoryNode};
use crate::vocabulary::Vocabulary;
use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a single segment attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The error returned to callers of [`StoryGenerator::generate_story`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Story generation failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Story generation failed: {0}")]
    RateLimited(#[from] RateLimitExceeded),

    #[error(
        "Story generation failed: segment at depth {depth} failed after {attempts} attempts: {last_error}"
    )]
    SegmentFailed {
        depth: u32,
        attempts: u32,
        #[source]
        last_error: AttemptError,
    },
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, GenerationError::Config(_))
    }
}

/// State shared by every node of one run.
struct Run<'a> {
    config: &'a GenerationConfig,
    limiter: &'a RateLimiter,
    genre: &'a str,
    inspiration_words: &'a [String],
}

/// Drives a [`StoryBackend`] to build a complete story tree.
pub struct StoryGenerator<B> {
    backend: B,
    vocabulary: Vocabulary,
    seed: Option<u64>,
}

impl<B: StoryBackend> StoryGenerator<B> {
    /// Create a generator using the built-in vocabulary.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            vocabulary: Vocabulary::default(),
            seed: None,
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Make genre and inspiration picks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Generate a full story with a fresh rate limiter built from `config`.
    pub async fn generate_story(
        &self,
        config: &GenerationConfig,
    ) -> Result<GeneratedStory, GenerationError> {
        let limiter = RateLimiter::from_config(config);
        self.generate_story_with_limiter(config, &limiter).await
    }

    /// Generate a full story, drawing backend calls from `limiter`.
    pub async fn generate_story_with_limiter(
        &self,
        config: &GenerationConfig,
        limiter: &RateLimiter,
    ) -> Result<GeneratedStory, GenerationError> {
        let (genre, inspiration_words) = self.pick_seed_words(config)?;

        info!(
            genre = %genre,
            inspiration = ?inspiration_words,
            max_depth = config.max_depth(),
            max_requests = limiter.max_requests(),
            "starting story generation"
        );

        let run = Run {
            config,
            limiter,
            genre: &genre,
            inspiration_words: &inspiration_words,
        };

        let root = match self.expand_node(&run, Vec::new(), 0).await {
            Ok(root) => root,
            Err(e) => {
                warn!(backend_calls = limiter.attempts(), error = %e, "story generation aborted");
                return Err(e);
            }
        };

        let story = GeneratedStory::new(genre, inspiration_words, root);
        info!(
            story_id = %story.id,
            nodes = story.node_count(),
            endings = story.ending_count(),
            backend_calls = limiter.attempts(),
            "story generation complete"
        );
        Ok(story)
    }

    fn pick_seed_words(
        &self,
        config: &GenerationConfig,
    ) -> Result<(String, Vec<String>), ConfigError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let genre = self.vocabulary.pick_genre(&mut rng)?.to_string();
        let words = self
            .vocabulary
            .pick_inspiration_words(config.inspiration_word_count(), &mut rng)?;
        Ok((genre, words))
    }

    /// Build the node at `depth` reached through `path`, then its subtree.
    fn expand_node<'a>(
        &'a self,
        run: &'a Run<'a>,
        path: Vec<BranchStep>,
        depth: u32,
    ) -> BoxFuture<'a, Result<StoryNode, GenerationError>> {
        async move {
            let segment = self.request_segment_with_validation(run, &path, depth).await?;
            let mut node = StoryNode::new(segment.title, segment.narrative);

            if segment.is_ending {
                debug!(depth, title = %node.title, "reached an ending");
                return Ok(node);
            }

            for choice in segment.choices {
                let mut child_path = path.clone();
                child_path.push(BranchStep::new(&choice.prompt_text, &choice.summary_text));

                let child = self.expand_node(run, child_path, depth + 1).await?;
                node.choices
                    .push(StoryChoice::new(choice.prompt_text, choice.summary_text).leading_to(child));
            }

            Ok(node)
        }
        .boxed()
    }

    /// Ask for one segment until it validates or the attempts run out.
    ///
    /// Backend and validation failures are retried; an exhausted call budget
    /// is returned immediately.
    async fn request_segment_with_validation(
        &self,
        run: &Run<'_>,
        path: &[BranchStep],
        depth: u32,
    ) -> Result<StoryModelSegment, GenerationError> {
        let max_depth = run.config.max_depth();
        let max_attempts = run.config.max_retries_per_segment();
        let prompt = StoryModelPrompt::new(
            run.genre,
            run.inspiration_words,
            path,
            depth,
            max_depth,
        )
        .render();

        let mut attempt = 0;
        loop {
            attempt += 1;
            run.limiter.acquire().await?;
            debug!(depth, attempt, "requesting segment");

            let failure = match self.backend.request_segment(&prompt).await {
                Ok(segment) => match segment.validate(depth, max_depth) {
                    Ok(()) => return Ok(segment),
                    Err(e) => AttemptError::Validation(e),
                },
                Err(e) => AttemptError::Backend(e),
            };

            if attempt >= max_attempts {
                return Err(GenerationError::SegmentFailed {
                    depth,
                    attempts: attempt,
                    last_error: failure,
                });
            }

            warn!(depth, attempt, max_attempts, error = %failure, "segment attempt failed, retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use std::time::Duration;

    fn config(max_depth: u32, retries: u32, requests: u32) -> GenerationConfig {
        GenerationConfig::new(max_depth, retries, requests, 2, Duration::ZERO).unwrap()
    }

    #[tokio::test]
    async fn test_single_ending_root() {
        let backend = ScriptedBackend::new(vec![Ok(StoryModelSegment::ending(
            "Short",
            "It ends at once.",
        ))]);
        let generator = StoryGenerator::new(backend);

        let story = generator.generate_story(&config(2, 1, 1)).await.unwrap();
        assert!(story.root.is_ending());
        assert_eq!(story.inspiration_words.len(), 2);
        assert_eq!(generator.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_seeded_generators_pick_the_same_words() {
        let make = || {
            StoryGenerator::new(ScriptedBackend::from_fn(|_, _| {
                Ok(StoryModelSegment::ending("End", "Done."))
            }))
            .with_seed(99)
        };

        let a = make().generate_story(&config(1, 1, 1)).await.unwrap();
        let b = make().generate_story(&config(1, 1, 1)).await.unwrap();
        assert_eq!(a.genre, b.genre);
        assert_eq!(a.inspiration_words, b.inspiration_words);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_prompt_carries_genre_and_words() {
        let generator = StoryGenerator::new(ScriptedBackend::from_fn(|_, _| {
            Ok(StoryModelSegment::ending("End", "Done."))
        }))
        .with_vocabulary(Vocabulary::new(["noir"], ["rain", "neon"]));

        let story = generator.generate_story(&config(1, 1, 1)).await.unwrap();
        assert_eq!(story.genre, "noir");

        let prompt = &generator.backend().prompts()[0];
        assert!(prompt.contains("Genre: noir"));
        assert!(prompt.contains("rain") && prompt.contains("neon"));
        assert!(prompt.contains("opening of the adventure"));
    }

    #[tokio::test]
    async fn test_validation_failure_message_names_attempts() {
        let generator = StoryGenerator::new(ScriptedBackend::from_fn(|_, _| {
            Ok(StoryModelSegment::ending("", "No title."))
        }));

        let err = generator.generate_story(&config(2, 4, 10)).await.unwrap_err();
        match &err {
            GenerationError::SegmentFailed {
                depth,
                attempts,
                last_error: AttemptError::Validation(ValidationError::MissingTitle),
            } => {
                assert_eq!(*depth, 0);
                assert_eq!(*attempts, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("after 4 attempts"));
        assert!(err.to_string().contains("missing a title"));
    }
}
