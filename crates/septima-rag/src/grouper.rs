use std::cmp::Ordering;
use std::collections::HashMap;

use septima_index::{MetadataKeys, PassageMatch};

use crate::types::GroupedResult;

pub(crate) const UNTITLED: &str = "Untitled sermon";

/// Folds passage-level matches into parent-document results.
#[derive(Debug, Clone)]
pub struct PassageGrouper {
    keys: MetadataKeys,
    passages_per_group: usize,
}

struct Bucket {
    parent_id: String,
    relevance: f32,
    // (retrieval position, passage)
    passages: Vec<(usize, PassageMatch)>,
}

impl PassageGrouper {
    #[must_use]
    pub fn new(keys: MetadataKeys, passages_per_group: usize) -> Self {
        Self {
            keys,
            passages_per_group: passages_per_group.max(1),
        }
    }

    /// Group `matches` by parent, rank groups by their best passage score and
    /// keep the first `limit`.
    ///
    /// Ties keep retrieval order. A passage without a parent becomes its own
    /// group under a synthetic id derived from its passage id.
    #[must_use]
    pub fn group(&self, matches: Vec<PassageMatch>, limit: usize) -> Vec<GroupedResult> {
        let mut buckets: Vec<Bucket> = Vec::new();
        let mut by_parent: HashMap<String, usize> = HashMap::new();

        for (pos, passage) in matches.into_iter().enumerate() {
            let parent_id = if passage.parent_id.is_empty() {
                synthetic_parent(&passage.passage_id, pos)
            } else {
                passage.parent_id.clone()
            };
            let idx = *by_parent.entry(parent_id.clone()).or_insert_with(|| {
                buckets.push(Bucket {
                    parent_id,
                    relevance: f32::NEG_INFINITY,
                    passages: Vec::new(),
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[idx];
            if passage.score > bucket.relevance {
                bucket.relevance = passage.score;
            }
            bucket.passages.push((pos, passage));
        }

        buckets.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(Ordering::Equal));
        buckets.truncate(limit);

        buckets.into_iter().map(|b| self.finish(b)).collect()
    }

    fn finish(&self, bucket: Bucket) -> GroupedResult {
        let Bucket {
            parent_id,
            relevance,
            mut passages,
        } = bucket;

        let first = passages.first().map(|(_, p)| p.metadata.clone()).unwrap_or_default();
        let field = |key: &str| first.get(key).filter(|v| !v.is_empty()).cloned();
        let title = field(&self.keys.title).unwrap_or_else(|| UNTITLED.to_owned());
        let main_reference = field(&self.keys.reference);
        let preacher = field(&self.keys.preacher);

        passages.sort_by(|(_, a), (_, b)| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        passages.truncate(self.passages_per_group);

        let orders: Option<Vec<f64>> = passages
            .iter()
            .map(|(_, p)| order_key(p, &self.keys.order))
            .collect();
        match orders {
            Some(orders) => {
                let mut keyed: Vec<(f64, PassageMatch)> =
                    orders.into_iter().zip(passages.into_iter().map(|(_, p)| p)).collect();
                keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
                passages = keyed.into_iter().map(|(_, p)| p).enumerate().collect();
            }
            None => passages.sort_by_key(|(pos, _)| *pos),
        }

        GroupedResult {
            parent_id,
            title,
            main_reference,
            preacher,
            metadata: first,
            passages: passages.into_iter().map(|(_, p)| p).collect(),
            relevance_score: relevance,
        }
    }
}

fn synthetic_parent(passage_id: &str, pos: usize) -> String {
    if passage_id.is_empty() {
        format!("orphan-#{pos}")
    } else {
        format!("orphan-{passage_id}")
    }
}

fn order_key(passage: &PassageMatch, key: &str) -> Option<f64> {
    passage
        .metadata
        .get(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn passage(id: &str, parent: &str, score: f32, order: Option<u32>) -> PassageMatch {
        let mut metadata = HashMap::new();
        if !parent.is_empty() {
            metadata.insert("sermon_id_base".to_owned(), parent.to_owned());
            metadata.insert("sermon_title_translated".to_owned(), format!("Sermon {parent}"));
        }
        if let Some(order) = order {
            metadata.insert("paragraph_order_in_sermon".to_owned(), order.to_string());
        }
        PassageMatch {
            passage_id: id.to_owned(),
            parent_id: parent.to_owned(),
            score,
            text_preview: format!("preview {id}"),
            metadata,
        }
    }

    fn grouper() -> PassageGrouper {
        PassageGrouper::new(MetadataKeys::default(), 3)
    }

    fn ids(groups: &[GroupedResult]) -> Vec<&str> {
        groups.iter().map(|g| g.parent_id.as_str()).collect()
    }

    #[test]
    fn max_score_beats_average() {
        let groups = grouper().group(
            vec![
                passage("a1", "A", 0.9, None),
                passage("a2", "A", 0.4, None),
                passage("b1", "B", 0.7, None),
            ],
            10,
        );
        assert_eq!(ids(&groups), vec!["A", "B"]);
        assert!((groups[0].relevance_score - 0.9).abs() < f32::EPSILON);
        assert!((groups[1].relevance_score - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn ties_keep_retrieval_order() {
        let groups = grouper().group(
            vec![
                passage("b1", "B", 0.5, None),
                passage("a1", "A", 0.5, None),
                passage("c1", "C", 0.5, None),
            ],
            10,
        );
        assert_eq!(ids(&groups), vec!["B", "A", "C"]);
    }

    #[test]
    fn truncates_groups_and_passages() {
        let matches = vec![
            passage("a1", "A", 0.95, Some(9)),
            passage("a2", "A", 0.90, Some(2)),
            passage("a3", "A", 0.85, Some(5)),
            passage("a4", "A", 0.80, Some(1)),
            passage("b1", "B", 0.70, None),
            passage("c1", "C", 0.60, None),
        ];
        let groups = grouper().group(matches, 2);
        assert_eq!(ids(&groups), vec!["A", "B"]);
        let a: Vec<&str> = groups[0].passages.iter().map(|p| p.passage_id.as_str()).collect();
        // top three by score, then in sermon order
        assert_eq!(a, vec!["a2", "a3", "a1"]);
    }

    #[test]
    fn missing_order_key_keeps_retrieval_order() {
        let matches = vec![
            passage("a1", "A", 0.6, Some(3)),
            passage("a2", "A", 0.9, None),
            passage("a3", "A", 0.7, Some(1)),
        ];
        let groups = grouper().group(matches, 5);
        let a: Vec<&str> = groups[0].passages.iter().map(|p| p.passage_id.as_str()).collect();
        assert_eq!(a, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn float_order_keys_sort_numerically() {
        let mut p1 = passage("a1", "A", 0.9, None);
        p1.metadata.insert("paragraph_order_in_sermon".into(), "10.0".into());
        let mut p2 = passage("a2", "A", 0.8, None);
        p2.metadata.insert("paragraph_order_in_sermon".into(), "9.0".into());
        let groups = grouper().group(vec![p1, p2], 5);
        assert_eq!(groups[0].passages[0].passage_id, "a2");
    }

    #[test]
    fn orphans_become_singletons() {
        let groups = grouper().group(
            vec![
                passage("x1", "", 0.8, None),
                passage("x2", "", 0.7, None),
                passage("", "", 0.6, None),
            ],
            10,
        );
        assert_eq!(ids(&groups), vec!["orphan-x1", "orphan-x2", "orphan-#2"]);
        assert!(groups.iter().all(|g| g.passages.len() == 1));
        assert_eq!(groups[0].title, UNTITLED);
    }

    #[test]
    fn group_metadata_from_first_passage() {
        let mut p = passage("a1", "A", 0.9, None);
        p.metadata
            .insert("main_scripture_passage_abbreviated".into(), "1 Thess 5:17".into());
        p.metadata.insert("preacher".into(), "C. H. Spurgeon".into());
        let groups = grouper().group(vec![p], 5);
        assert_eq!(groups[0].title, "Sermon A");
        assert_eq!(groups[0].main_reference.as_deref(), Some("1 Thess 5:17"));
        assert_eq!(groups[0].preacher.as_deref(), Some("C. H. Spurgeon"));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(grouper().group(Vec::new(), 5).is_empty());
        assert!(grouper().group(vec![passage("a", "A", 0.1, None)], 0).is_empty());
    }

    proptest! {
        #[test]
        fn groups_are_homogeneous_and_ranked(
            raw in prop::collection::vec((0u8..6, 0.0f32..1.0), 0..40),
            limit in 1usize..8,
        ) {
            let matches: Vec<PassageMatch> = raw
                .iter()
                .enumerate()
                .map(|(i, (parent, score))| passage(&format!("p{i}"), &format!("S{parent}"), *score, None))
                .collect();
            let groups = grouper().group(matches.clone(), limit);

            prop_assert!(groups.len() <= limit);
            for window in groups.windows(2) {
                prop_assert!(window[0].relevance_score >= window[1].relevance_score);
            }
            for g in &groups {
                prop_assert!(g.passages.len() <= 3);
                prop_assert!(g.passages.iter().all(|p| p.parent_id == g.parent_id));
                let best = matches
                    .iter()
                    .filter(|m| m.parent_id == g.parent_id)
                    .map(|m| m.score)
                    .fold(f32::NEG_INFINITY, f32::max);
                prop_assert!((g.relevance_score - best).abs() < f32::EPSILON);
            }
        }
    }
}
