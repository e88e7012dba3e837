//! Prompt rendering for a single story segment.
//!
//! A [`StoryModelPrompt`] is a borrowed view over the generation context. It
//! renders to the instruction text sent to the backend and has no other
//! behavior.

use serde::{Deserialize, Serialize};

/// Fewest choices a non-ending segment is asked to offer.
pub const MIN_CHOICES: usize = 2;

/// Most choices a non-ending segment is asked to offer.
pub const MAX_CHOICES: usize = 3;

/// One choice already taken on the way from the root to the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStep {
    pub choice_text: String,
    pub outcome_summary: String,
}

impl BranchStep {
    pub fn new(choice_text: impl Into<String>, outcome_summary: impl Into<String>) -> Self {
        Self {
            choice_text: choice_text.into(),
            outcome_summary: outcome_summary.into(),
        }
    }
}

/// Everything the backend needs to write the next segment.
#[derive(Debug, Clone, Copy)]
pub struct StoryModelPrompt<'a> {
    pub genre: &'a str,
    pub inspiration_words: &'a [String],
    pub path: &'a [BranchStep],
    pub depth: u32,
    pub max_depth: u32,
}

impl<'a> StoryModelPrompt<'a> {
    pub fn new(
        genre: &'a str,
        inspiration_words: &'a [String],
        path: &'a [BranchStep],
        depth: u32,
        max_depth: u32,
    ) -> Self {
        Self {
            genre,
            inspiration_words,
            path,
            depth,
            max_depth,
        }
    }

    /// Segments still allowed after this one on the current path.
    pub fn remaining(&self) -> u32 {
        self.max_depth.saturating_sub(self.depth)
    }

    /// Whether this segment sits at the depth limit and must end the story.
    pub fn is_final(&self) -> bool {
        self.depth >= self.max_depth
    }

    /// Render the backend instruction text.
    pub fn render(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You are writing one segment of a branching, choose-your-own-adventure story.\n\n",
        );

        prompt.push_str("## Setting\n");
        prompt.push_str(&format!("Genre: {}\n", self.genre));
        prompt.push_str(&format!(
            "Inspiration words (weave them into the story): {}\n",
            self.inspiration_words.join(", ")
        ));

        prompt.push_str("\n## Story so far\n");
        if self.path.is_empty() {
            prompt.push_str(
                "This is the opening of the adventure. No choices have been made yet.\n",
            );
        } else {
            prompt.push_str("The reader has made these choices, in the order they were taken:\n");
            for (i, step) in self.path.iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. Chose \"{}\" -> {}\n",
                    i + 1,
                    step.choice_text,
                    step.outcome_summary
                ));
            }
        }

        prompt.push_str("\n## Progress\n");
        prompt.push_str(&format!(
            "Segments already written on this path: {}. Segments remaining after this one: {} (maximum depth {}).\n",
            self.depth,
            self.remaining(),
            self.max_depth
        ));

        prompt.push_str("\n## Response format\n");
        prompt.push_str(
            "Respond with a single JSON object and nothing else, in exactly this shape:\n",
        );
        prompt.push_str(
            "{\"title\": \"...\", \"narrative\": \"...\", \"isEnding\": false, \"choices\": [{\"prompt\": \"...\", \"summary\": \"...\"}]}\n",
        );
        prompt.push_str(
            "- \"title\": a short title for this segment.\n\
             - \"narrative\": the story text of this segment.\n\
             - \"isEnding\": true if this segment ends the story.\n\
             - \"choices\": what the reader can do next; \"prompt\" is the choice as shown to the reader, \"summary\" is what happens as a result.\n",
        );

        prompt.push_str("\n## Rules\n");
        prompt.push_str("- An ending segment sets \"isEnding\" to true and has zero choices.\n");
        prompt.push_str(&format!(
            "- A segment that is not an ending sets \"isEnding\" to false and offers {MIN_CHOICES} to {MAX_CHOICES} choices.\n"
        ));
        prompt.push_str(
            "- If the current depth equals the maximum depth, the segment must end with no choices.\n",
        );

        if self.is_final() {
            prompt.push_str(&format!(
                "\nThis segment is at depth {} of {}: it must be an ending with no choices.\n",
                self.depth, self.max_depth
            ));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<String> {
        vec!["lantern".to_string(), "tide".to_string()]
    }

    #[test]
    fn test_opening_prompt() {
        let words = words();
        let prompt = StoryModelPrompt::new("mystery", &words, &[], 0, 3).render();

        assert!(prompt.contains("Genre: mystery"));
        assert!(prompt.contains("lantern, tide"));
        assert!(prompt.contains("This is the opening of the adventure"));
        assert!(prompt.contains("Segments already written on this path: 0"));
        assert!(prompt.contains("Segments remaining after this one: 3"));
        assert!(!prompt.contains("it must be an ending"));
    }

    #[test]
    fn test_path_is_listed_in_order() {
        let words = words();
        let path = vec![
            BranchStep::new("Open the door", "A draft blows out the candle"),
            BranchStep::new("Light a match", "Eyes glint in the dark"),
        ];
        let prompt = StoryModelPrompt::new("horror", &words, &path, 2, 3).render();

        assert!(!prompt.contains("opening of the adventure"));
        let first = prompt
            .find("1. Chose \"Open the door\" -> A draft blows out the candle")
            .unwrap();
        let second = prompt
            .find("2. Chose \"Light a match\" -> Eyes glint in the dark")
            .unwrap();
        assert!(first < second);
        assert!(prompt.contains("Segments remaining after this one: 1"));
    }

    #[test]
    fn test_response_shape_and_rules_are_stated() {
        let words = words();
        let prompt = StoryModelPrompt::new("fantasy", &words, &[], 1, 2).render();

        assert!(prompt.contains("\"isEnding\""));
        assert!(prompt.contains("\"choices\": [{\"prompt\""));
        assert!(prompt.contains("zero choices"));
        assert!(prompt.contains("offers 2 to 3 choices"));
        assert!(prompt.contains("must end with no choices"));
    }

    #[test]
    fn test_final_depth_demands_an_ending() {
        let words = words();
        let prompt = StoryModelPrompt::new("western", &words, &[], 2, 2);
        assert!(prompt.is_final());
        assert_eq!(prompt.remaining(), 0);
        assert!(prompt.render().contains("it must be an ending with no choices"));
    }
}
