//! Emphasis markers used by the search backend around matched terms.

use serde::{Deserialize, Serialize};

/// Tag inserted before a matched term in a highlight fragment.
pub const HIGHLIGHT_PRE_TAG: &str = "<em>";

/// Tag inserted after a matched term in a highlight fragment.
pub const HIGHLIGHT_POST_TAG: &str = "</em>";

/// Pre/post marker pair wrapped around matched terms.
///
/// The same pair is sent to the search backend when requesting highlights
/// and used by the reader to strip markup before inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightTags {
    pub pre: String,
    pub post: String,
}

impl Default for HighlightTags {
    fn default() -> Self {
        Self {
            pre: HIGHLIGHT_PRE_TAG.to_string(),
            post: HIGHLIGHT_POST_TAG.to_string(),
        }
    }
}

impl HighlightTags {
    /// Remove every occurrence of both markers, leaving the text otherwise intact.
    pub fn strip(&self, fragment: &str) -> String {
        fragment.replace(&self.pre, "").replace(&self.post, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markers() {
        let tags = HighlightTags::default();
        let fragment = "The <em>Colorado</em> School of Mines is in <em>Golden</em>.";
        assert_eq!(
            tags.strip(fragment),
            "The Colorado School of Mines is in Golden."
        );
    }

    #[test]
    fn test_strip_without_markers_is_identity() {
        let tags = HighlightTags::default();
        assert_eq!(tags.strip("plain text"), "plain text");
    }
}
