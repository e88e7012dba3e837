//! The generated story tree.
//!
//! A [`GeneratedStory`] owns its whole tree: each [`StoryChoice`] owns the
//! node it leads to, so there is no sharing and no cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An edge from a node to the node the reader reaches by taking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChoice {
    pub prompt_text: String,
    pub summary_text: String,
    /// Present once the branch has been expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<StoryNode>>,
}

impl StoryChoice {
    pub fn new(prompt_text: impl Into<String>, summary_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            summary_text: summary_text.into(),
            next: None,
        }
    }

    /// Attach the node this choice leads to.
    pub fn leading_to(mut self, node: StoryNode) -> Self {
        self.next = Some(Box::new(node));
        self
    }
}

/// One segment placed in the tree. No choices means the node is an ending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub title: String,
    pub narrative: String,
    #[serde(default)]
    pub choices: Vec<StoryChoice>,
}

impl StoryNode {
    pub fn new(title: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            narrative: narrative.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choice(mut self, choice: StoryChoice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// Nodes reachable from here, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(StoryNode::node_count).sum::<usize>()
    }

    /// Endings reachable from here.
    pub fn ending_count(&self) -> usize {
        if self.is_ending() {
            1
        } else {
            self.children().map(StoryNode::ending_count).sum()
        }
    }

    /// Depth of the deepest node below this one (0 for a lone node).
    pub fn height(&self) -> u32 {
        self.children()
            .map(|child| child.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Depth-first, pre-order walk yielding each node with its depth
    /// relative to this node. Siblings come in choice order.
    pub fn walk(&self) -> Vec<(u32, &StoryNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0u32, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children().collect::<Vec<_>>().into_iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    fn children(&self) -> impl Iterator<Item = &StoryNode> {
        self.choices.iter().filter_map(|c| c.next.as_deref())
    }
}

/// A finished story as handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStory {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub genre: String,
    pub inspiration_words: Vec<String>,
    pub root: StoryNode,
}

impl GeneratedStory {
    pub fn new(genre: impl Into<String>, inspiration_words: Vec<String>, root: StoryNode) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            genre: genre.into(),
            inspiration_words,
            root,
        }
    }

    /// The root segment's title doubles as the story title.
    pub fn title(&self) -> &str {
        &self.root.title
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn ending_count(&self) -> usize {
        self.root.ending_count()
    }

    pub fn height(&self) -> u32 {
        self.root.height()
    }

    pub fn walk(&self) -> Vec<(u32, &StoryNode)> {
        self.root.walk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoryNode {
        let sunk = StoryNode::new("Sunk", "The end.");
        let marsh = StoryNode::new("Marsh", "Wet.")
            .with_choice(StoryChoice::new("Wade", "Deeper").leading_to(sunk));
        let hills = StoryNode::new("Hills", "The end.");

        StoryNode::new("Root", "Start.")
            .with_choice(StoryChoice::new("Left", "Marsh").leading_to(marsh))
            .with_choice(StoryChoice::new("Right", "Hills").leading_to(hills))
    }

    #[test]
    fn test_counts() {
        let root = sample();
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.ending_count(), 2);
        assert_eq!(root.height(), 2);
        assert!(!root.is_ending());
    }

    #[test]
    fn test_walk_is_preorder_in_choice_order() {
        let root = sample();
        let titles: Vec<_> = root
            .walk()
            .iter()
            .map(|(d, n)| (*d, n.title.as_str()))
            .collect();
        assert_eq!(titles, vec![(0, "Root"), (1, "Marsh"), (2, "Sunk"), (1, "Hills")]);
    }

    #[test]
    fn test_unexpanded_choice_is_not_a_child() {
        let root =
            StoryNode::new("Root", "Start.").with_choice(StoryChoice::new("Wait", "Nothing"));
        assert_eq!(root.node_count(), 1);
        assert_eq!(root.height(), 0);
        // Has a choice, so it is not an ending even though nothing hangs off it.
        assert_eq!(root.ending_count(), 0);
    }

    #[test]
    fn test_serde_shape() {
        let root =
            StoryNode::new("Root", "Start.").with_choice(StoryChoice::new("Wait", "Nothing"));
        let story = GeneratedStory::new("mystery", vec!["key".into()], root);
        let json = serde_json::to_value(&story).unwrap();

        assert_eq!(json["genre"], "mystery");
        assert_eq!(json["root"]["choices"][0]["prompt_text"], "Wait");
        assert!(json["root"]["choices"][0].get("next").is_none());

        let back: GeneratedStory = serde_json::from_value(json).unwrap();
        assert_eq!(back, story);
    }
}
