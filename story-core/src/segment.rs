//! Backend segments and their structural validation.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A segment violates a structural rule.
///
/// Distinct from a backend failure: the backend answered and the answer
/// parsed, but the content cannot be placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Segment is missing a title")]
    MissingTitle,

    #[error("Segment is missing narrative text")]
    MissingNarrative,

    #[error("Maximum depth reached but segment still offered choices")]
    ChoicesAtMaxDepth,

    #[error("Ending segments must not include choices")]
    EndingWithChoices,

    #[error("Non-ending segments must include at least one choice")]
    MissingChoices,

    #[error("A choice prompt was empty (choice {index})")]
    EmptyChoicePrompt { index: usize },

    #[error("A choice summary was empty (choice {index})")]
    EmptyChoiceSummary { index: usize },
}

/// One outgoing choice as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentChoice {
    #[serde(rename = "prompt")]
    pub prompt_text: String,
    #[serde(rename = "summary")]
    pub summary_text: String,
}

impl SegmentChoice {
    pub fn new(prompt_text: impl Into<String>, summary_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            summary_text: summary_text.into(),
        }
    }
}

/// A parsed backend response for one node.
///
/// The serde shape matches the JSON the backend is asked for:
/// `{"title", "narrative", "isEnding", "choices": [{"prompt", "summary"}]}`.
/// `choices` may be absent or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryModelSegment {
    pub title: String,
    pub narrative: String,
    #[serde(rename = "isEnding")]
    pub is_ending: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub choices: Vec<SegmentChoice>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl StoryModelSegment {
    /// An ending segment with no choices.
    pub fn ending(title: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            narrative: narrative.into(),
            is_ending: true,
            choices: Vec::new(),
        }
    }

    /// A non-ending segment offering the given `(prompt, summary)` choices.
    pub fn branching<P, S>(
        title: impl Into<String>,
        narrative: impl Into<String>,
        choices: impl IntoIterator<Item = (P, S)>,
    ) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            narrative: narrative.into(),
            is_ending: false,
            choices: choices
                .into_iter()
                .map(|(prompt, summary)| SegmentChoice::new(prompt, summary))
                .collect(),
        }
    }

    /// Check this segment against the structural rules for `depth`.
    pub fn validate(&self, depth: u32, max_depth: u32) -> Result<(), ValidationError> {
        validate(self, depth, max_depth)
    }
}

/// Check a segment in rule order; the first violation is returned.
pub fn validate(
    segment: &StoryModelSegment,
    depth: u32,
    max_depth: u32,
) -> Result<(), ValidationError> {
    if segment.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if segment.narrative.trim().is_empty() {
        return Err(ValidationError::MissingNarrative);
    }
    if depth >= max_depth && !segment.is_ending {
        return Err(ValidationError::ChoicesAtMaxDepth);
    }
    if segment.is_ending && !segment.choices.is_empty() {
        return Err(ValidationError::EndingWithChoices);
    }
    if !segment.is_ending && segment.choices.is_empty() {
        return Err(ValidationError::MissingChoices);
    }

    for (i, choice) in segment.choices.iter().enumerate() {
        if choice.prompt_text.trim().is_empty() {
            return Err(ValidationError::EmptyChoicePrompt { index: i + 1 });
        }
        if choice.summary_text.trim().is_empty() {
            return Err(ValidationError::EmptyChoiceSummary { index: i + 1 });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_way() -> StoryModelSegment {
        StoryModelSegment::branching(
            "Crossroads",
            "Two roads part in the fog.",
            [("Go left", "The marsh"), ("Go right", "The hills")],
        )
    }

    #[test]
    fn test_valid_segments() {
        assert_eq!(two_way().validate(0, 2), Ok(()));
        assert_eq!(StoryModelSegment::ending("Home", "You rest.").validate(2, 2), Ok(()));
        // Endings may come early.
        assert_eq!(StoryModelSegment::ending("Home", "You rest.").validate(0, 2), Ok(()));
    }

    #[test]
    fn test_blank_title_and_narrative() {
        let mut segment = two_way();
        segment.title = "   ".to_string();
        assert_eq!(segment.validate(0, 2), Err(ValidationError::MissingTitle));

        let mut segment = two_way();
        segment.narrative = "\n\t".to_string();
        assert_eq!(segment.validate(0, 2), Err(ValidationError::MissingNarrative));
    }

    #[test]
    fn test_non_ending_at_max_depth() {
        assert_eq!(two_way().validate(2, 2), Err(ValidationError::ChoicesAtMaxDepth));
        assert_eq!(two_way().validate(3, 2), Err(ValidationError::ChoicesAtMaxDepth));

        // Still caught when the backend forgot the choices as well.
        let mut bare = two_way();
        bare.choices.clear();
        assert_eq!(bare.validate(2, 2), Err(ValidationError::ChoicesAtMaxDepth));
    }

    #[test]
    fn test_ending_with_choices() {
        let mut segment = two_way();
        segment.is_ending = true;
        assert_eq!(segment.validate(0, 2), Err(ValidationError::EndingWithChoices));
        assert_eq!(segment.validate(2, 2), Err(ValidationError::EndingWithChoices));
    }

    #[test]
    fn test_non_ending_without_choices() {
        let segment =
            StoryModelSegment::branching("Stuck", "Nothing happens.", Vec::<(&str, &str)>::new());
        assert_eq!(segment.validate(0, 2), Err(ValidationError::MissingChoices));
    }

    #[test]
    fn test_blank_choice_fields() {
        let segment = StoryModelSegment::branching(
            "Crossroads",
            "Fog.",
            [("Go left", "The marsh"), (" ", "The hills")],
        );
        let err = segment.validate(0, 2).unwrap_err();
        assert_eq!(err, ValidationError::EmptyChoicePrompt { index: 2 });
        assert!(err.to_string().contains("choice prompt was empty"));

        let segment = StoryModelSegment::branching("Crossroads", "Fog.", [("Go left", "")]);
        assert_eq!(
            segment.validate(0, 2),
            Err(ValidationError::EmptyChoiceSummary { index: 1 })
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let segment = StoryModelSegment {
            title: String::new(),
            narrative: String::new(),
            is_ending: true,
            choices: vec![SegmentChoice::new("", "")],
        };
        assert_eq!(segment.validate(5, 2), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "title": "The Gate",
            "narrative": "A gate of bone.",
            "isEnding": false,
            "choices": [{"prompt": "Knock", "summary": "Something answers"}]
        }"#;
        let segment: StoryModelSegment = serde_json::from_str(json).unwrap();
        assert!(!segment.is_ending);
        assert_eq!(segment.choices[0].prompt_text, "Knock");
        assert_eq!(segment.choices[0].summary_text, "Something answers");
    }

    #[test]
    fn test_missing_or_null_choices_are_empty() {
        let absent: StoryModelSegment =
            serde_json::from_str(r#"{"title": "End", "narrative": "Done.", "isEnding": true}"#)
                .unwrap();
        assert!(absent.choices.is_empty());

        let null: StoryModelSegment = serde_json::from_str(
            r#"{"title": "End", "narrative": "Done.", "isEnding": true, "choices": null}"#,
        )
        .unwrap();
        assert!(null.choices.is_empty());
    }

    #[test]
    fn test_missing_required_field_fails_to_parse() {
        let result =
            serde_json::from_str::<StoryModelSegment>(r#"{"title": "End", "narrative": "Done."}"#);
        assert!(result.is_err());
    }
}
