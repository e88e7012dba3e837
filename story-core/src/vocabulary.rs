//! Genres and inspiration words that seed a story.
//!
//! The vocabulary is plain data handed to the generator, so tests and
//! callers can swap in their own lists.

use crate::config::ConfigError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Genres used by [`Vocabulary::default`].
pub const DEFAULT_GENRES: &[&str] = &[
    "fantasy",
    "science fiction",
    "mystery",
    "horror",
    "western",
    "pirate adventure",
    "fairy tale",
    "cyberpunk",
    "mythology",
    "post-apocalyptic",
    "steampunk",
    "space opera",
];

/// Inspiration words used by [`Vocabulary::default`].
pub const DEFAULT_INSPIRATION_WORDS: &[&str] = &[
    "lantern", "compass", "storm", "mirror", "key", "raven", "labyrinth", "ember", "tide",
    "clockwork", "whisper", "crown", "shadow", "map", "bridge", "orchard", "comet", "mask",
    "forge", "glacier", "riddle", "feather", "tower", "serpent", "echo", "harvest", "lighthouse",
    "vault", "thorn", "moonlight", "caravan", "relic", "bell", "garden", "ashes", "crystal",
    "wolf", "library", "ferry", "oath",
];

/// Read-only source of genres and inspiration words.
///
/// Entries are trimmed, blanks dropped and duplicates collapsed on
/// construction, so any pick of distinct positions yields distinct words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    genres: Vec<String>,
    inspiration_words: Vec<String>,
}

impl Vocabulary {
    pub fn new<G, W>(
        genres: impl IntoIterator<Item = G>,
        inspiration_words: impl IntoIterator<Item = W>,
    ) -> Self
    where
        G: Into<String>,
        W: Into<String>,
    {
        Self {
            genres: distinct(genres),
            inspiration_words: distinct(inspiration_words),
        }
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn inspiration_words(&self) -> &[String] {
        &self.inspiration_words
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.inspiration_words.iter().any(|w| w == word)
    }

    /// Pick one genre at random.
    pub fn pick_genre<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, ConfigError> {
        self.genres
            .choose(rng)
            .map(String::as_str)
            .ok_or(ConfigError::NoGenres)
    }

    /// Pick `count` distinct inspiration words at random.
    pub fn pick_inspiration_words<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<String>, ConfigError> {
        if count > self.inspiration_words.len() {
            return Err(ConfigError::NotEnoughInspirationWords {
                requested: count,
                available: self.inspiration_words.len(),
            });
        }

        Ok(self
            .inspiration_words
            .choose_multiple(rng, count)
            .cloned()
            .collect())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(
            DEFAULT_GENRES.iter().copied(),
            DEFAULT_INSPIRATION_WORDS.iter().copied(),
        )
    }
}

fn distinct<T: Into<String>>(items: impl IntoIterator<Item = T>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.into().trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_vocabulary_has_no_duplicates() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.genres().len(), DEFAULT_GENRES.len());
        assert_eq!(vocab.inspiration_words().len(), DEFAULT_INSPIRATION_WORDS.len());
    }

    #[test]
    fn test_duplicates_and_blanks_collapse() {
        let vocab = Vocabulary::new(["noir", " noir ", ""], ["rain", "rain", "neon", "  "]);
        assert_eq!(vocab.genres(), ["noir"]);
        assert_eq!(vocab.inspiration_words(), ["rain", "neon"]);
    }

    #[test]
    fn test_pick_words_are_distinct_and_known() {
        let vocab = Vocabulary::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let words = vocab.pick_inspiration_words(5, &mut rng).unwrap();
            assert_eq!(words.len(), 5);
            let unique: HashSet<_> = words.iter().collect();
            assert_eq!(unique.len(), 5);
            assert!(words.iter().all(|w| vocab.contains_word(w)));
        }
    }

    #[test]
    fn test_pick_entire_vocabulary() {
        let vocab = Vocabulary::new(["noir"], ["rain", "neon", "smoke"]);
        let mut words = vocab
            .pick_inspiration_words(3, &mut StdRng::seed_from_u64(1))
            .unwrap();
        words.sort();
        assert_eq!(words, ["neon", "rain", "smoke"]);
    }

    #[test]
    fn test_too_many_words_requested() {
        let vocab = Vocabulary::new(["noir"], ["rain", "rain", "neon"]);
        let err = vocab
            .pick_inspiration_words(3, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotEnoughInspirationWords {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_no_genres() {
        let vocab = Vocabulary::new(Vec::<String>::new(), ["rain"]);
        assert_eq!(
            vocab.pick_genre(&mut StdRng::seed_from_u64(1)),
            Err(ConfigError::NoGenres)
        );
    }

    #[test]
    fn test_same_seed_same_pick() {
        let vocab = Vocabulary::default();
        let a = vocab.pick_genre(&mut StdRng::seed_from_u64(42)).unwrap().to_string();
        let b = vocab.pick_genre(&mut StdRng::seed_from_u64(42)).unwrap().to_string();
        assert_eq!(a, b);
    }
}
