use serde::{Deserialize, Serialize};

/// Filtering behaviour attached to an edge mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModePolicy {
    /// Whether the "only DOI" toggle removes edges touching DOI-less nodes.
    pub doi_filter: bool,
    /// Whether synthetic topic nodes are displayable under this mode.
    pub topic_nodes: bool,
}

const DOCUMENT_POLICY: ModePolicy = ModePolicy {
    doi_filter: true,
    topic_nodes: false,
};

const TOPIC_POLICY: ModePolicy = ModePolicy {
    doi_filter: false,
    topic_nodes: true,
};

/// A named relation type. Unknown keys found in input keep their raw name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeMode {
    Citations,
    References,
    SharedRefs,
    Semantic,
    Suggested,
    TopicRelations,
    TopicMembership,
    Edges,
    Other(String),
}

impl EdgeMode {
    /// Preferred display order; citation-like relations first.
    pub const PRIORITY: [EdgeMode; 7] = [
        EdgeMode::Citations,
        EdgeMode::References,
        EdgeMode::SharedRefs,
        EdgeMode::Semantic,
        EdgeMode::Suggested,
        EdgeMode::TopicRelations,
        EdgeMode::TopicMembership,
    ];

    pub fn from_key(key: &str) -> Self {
        match key {
            "citations" => Self::Citations,
            "references" => Self::References,
            "shared_refs" => Self::SharedRefs,
            "semantic" => Self::Semantic,
            "suggested" => Self::Suggested,
            "topic_relations" => Self::TopicRelations,
            "topic_membership" => Self::TopicMembership,
            "edges" => Self::Edges,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Citations => "citations",
            Self::References => "references",
            Self::SharedRefs => "shared_refs",
            Self::Semantic => "semantic",
            Self::Suggested => "suggested",
            Self::TopicRelations => "topic_relations",
            Self::TopicMembership => "topic_membership",
            Self::Edges => "edges",
            Self::Other(key) => key.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Citations => "Citations",
            Self::References => "References",
            Self::SharedRefs => "Shared references",
            Self::Semantic => "Semantic similarity",
            Self::Suggested => "Suggested",
            Self::TopicRelations => "Topic relations",
            Self::TopicMembership => "Topic membership",
            Self::Edges => "Edges",
            Self::Other(key) => key.as_str(),
        }
    }

    pub fn policy(&self) -> ModePolicy {
        match self {
            Self::TopicRelations | Self::TopicMembership => TOPIC_POLICY,
            _ => DOCUMENT_POLICY,
        }
    }

    pub fn is_priority(&self) -> bool {
        Self::PRIORITY.contains(self)
    }
}

impl From<String> for EdgeMode {
    fn from(value: String) -> Self {
        Self::from_key(&value)
    }
}

impl From<EdgeMode> for String {
    fn from(value: EdgeMode) -> Self {
        value.key().to_owned()
    }
}

impl std::fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_back_to_the_same_variant() {
        for mode in EdgeMode::PRIORITY {
            assert_eq!(EdgeMode::from_key(mode.key()), mode);
        }
        assert_eq!(
            EdgeMode::from_key("co_authors"),
            EdgeMode::Other("co_authors".to_owned())
        );
    }

    #[test]
    fn topic_modes_skip_the_doi_filter() {
        assert!(!EdgeMode::TopicRelations.policy().doi_filter);
        assert!(EdgeMode::TopicMembership.policy().topic_nodes);
        assert!(EdgeMode::Semantic.policy().doi_filter);
        assert!(!EdgeMode::Other("x".into()).policy().topic_nodes);
    }

    #[test]
    fn serializes_as_plain_key() {
        let json = serde_json::to_string(&EdgeMode::SharedRefs).unwrap();
        assert_eq!(json, "\"shared_refs\"");
        let back: EdgeMode = serde_json::from_str("\"semantic\"").unwrap();
        assert_eq!(back, EdgeMode::Semantic);
    }
}
