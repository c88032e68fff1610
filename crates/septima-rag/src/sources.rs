use std::collections::HashSet;

use septima_index::PassageMatch;

use crate::types::{ChatMessage, ChatRole, GroupedResult, SourceRef};

/// One citation per parent document, in ranked order. The first occurrence of
/// a parent wins. The preview is taken from the group's best-scoring passage,
/// not from the first one in sermon order.
#[must_use]
pub fn sources_for_retrieval(groups: &[GroupedResult]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .filter(|g| seen.insert(g.parent_id.as_str()))
        .map(|g| SourceRef {
            parent_id: g.parent_id.clone(),
            title: g.title.clone(),
            main_reference: g.main_reference.clone(),
            text_preview: best_passage(&g.passages)
                .map(|p| p.text_preview.clone())
                .filter(|t| !t.is_empty()),
        })
        .collect()
}

// Earliest passage wins a score tie.
fn best_passage(passages: &[PassageMatch]) -> Option<&PassageMatch> {
    passages.iter().fold(None, |best: Option<&PassageMatch>, p| match best {
        Some(b) if b.score >= p.score => Some(b),
        _ => Some(p),
    })
}

/// Sources of the nearest earlier assistant turn that cited anything.
#[must_use]
pub fn sources_from_history(history: &[ChatMessage]) -> Vec<SourceRef> {
    history
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::Assistant && !m.sources.is_empty())
        .map(|m| m.sources.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use septima_index::MetadataKeys;

    use super::*;
    use crate::grouper::PassageGrouper;

    fn group(parent: &str, preview: &str) -> GroupedResult {
        GroupedResult {
            parent_id: parent.into(),
            title: format!("Title {parent}"),
            main_reference: None,
            preacher: None,
            metadata: HashMap::new(),
            passages: vec![PassageMatch {
                passage_id: format!("{parent}_p1"),
                parent_id: parent.into(),
                score: 0.5,
                text_preview: preview.into(),
                metadata: HashMap::new(),
            }],
            relevance_score: 0.5,
        }
    }

    #[test]
    fn dedups_by_parent_first_wins() {
        let sources = sources_for_retrieval(&[group("X", "first"), group("Y", ""), group("X", "second")]);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].parent_id, "X");
        assert_eq!(sources[0].text_preview.as_deref(), Some("first"));
        assert_eq!(sources[1].parent_id, "Y");
        assert!(sources[1].text_preview.is_none());
    }

    #[test]
    fn preview_comes_from_best_scoring_passage() {
        let ordered = |id: &str, score: f32, order: u32, preview: &str| PassageMatch {
            passage_id: id.into(),
            parent_id: "A".into(),
            score,
            text_preview: preview.into(),
            metadata: HashMap::from([
                ("sermon_id_base".to_owned(), "A".to_owned()),
                ("paragraph_order_in_sermon".to_owned(), order.to_string()),
            ]),
        };
        let groups = PassageGrouper::new(MetadataKeys::default(), 3).group(
            vec![
                ordered("A_p9", 0.95, 9, "Pray without ceasing."),
                ordered("A_p1", 0.30, 1, "Good evening, friends."),
            ],
            5,
        );
        assert_eq!(groups[0].passages[0].passage_id, "A_p1");

        let sources = sources_for_retrieval(&groups);
        assert_eq!(sources[0].text_preview.as_deref(), Some("Pray without ceasing."));
    }

    #[test]
    fn nearest_non_empty_assistant_sources() {
        let history = vec![
            ChatMessage::assistant("old", vec![SourceRef::new("S0", "zero")]),
            ChatMessage::assistant("a", vec![SourceRef::new("S1", "one")]),
            ChatMessage::user("q"),
            ChatMessage::assistant("b", vec![]),
        ];
        let sources = sources_from_history(&history);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].parent_id, "S1");
    }

    #[test]
    fn user_sources_are_ignored() {
        let mut user = ChatMessage::user("q");
        user.sources = vec![SourceRef::new("U", "user")];
        assert!(sources_from_history(&[user]).is_empty());
        assert!(sources_from_history(&[]).is_empty());
    }
}
