use std::collections::HashSet;

use crate::{
    domain::ReplyRecord,
    page::driver::ReplyCandidate,
};

/// Dedup key for one reply. The 100-character prefix is deliberately coarse:
/// the same author repeating near-identical text within the window counts as
/// one reply, while identical text from different authors stays distinct.
pub fn reply_key(username: &str, text: &str) -> String {
    let snippet: String = text.chars().take(100).collect();
    format!("@{}:{}", username, snippet)
}

/// Walk the page-order candidates and produce records for the ones not seen
/// before. Keys are marked seen immediately, so even a duplicate within the
/// same pass yields a single record. Stops exactly at `max_replies` counting
/// what the session already holds.
pub fn collect_new_replies(
    candidates: &[ReplyCandidate],
    seen: &mut HashSet<String>,
    max_replies: usize,
    already_collected: usize,
) -> Vec<ReplyRecord> {
    let mut fresh = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        // cell 0 is the conversation's own post, never a reply
        if index == 0 {
            continue;
        }
        if already_collected + fresh.len() >= max_replies {
            break;
        }

        let (Some(author), Some(text)) = (candidate.author.as_deref(), candidate.text.as_deref())
        else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let key = reply_key(author, text);
        if seen.contains(&key) {
            continue;
        }
        seen.insert(key);
        fresh.push(ReplyRecord::new(candidate.cell, author, text));
    }

    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{bare_candidate, candidate};

    #[test]
    fn key_includes_author_and_text_prefix() {
        assert_eq!(reply_key("alice", "hello"), "@alice:hello");

        let long = "x".repeat(150);
        let key = reply_key("bob", &long);
        assert_eq!(key, format!("@bob:{}", "x".repeat(100)));

        // prefix is measured in characters, not bytes
        let unicode = "ü".repeat(120);
        let key = reply_key("carol", &unicode);
        assert_eq!(key.chars().count(), "@carol:".chars().count() + 100);
    }

    #[test]
    fn same_text_from_different_authors_is_distinct() {
        assert_ne!(reply_key("alice", "same"), reply_key("bob", "same"));
    }

    #[test]
    fn first_cell_is_always_skipped() {
        let cells = vec![candidate(1, "op", "the original post"), candidate(2, "a", "reply")];
        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 50, 0);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].username, "a");
    }

    #[test]
    fn invalid_and_empty_candidates_are_skipped() {
        let cells = vec![
            candidate(1, "op", "post"),
            bare_candidate(2),
            candidate(3, "a", "   \n  "),
            ReplyCandidate {
                cell: crate::domain::CellHandle(4),
                author: None,
                text: Some("orphan text".into()),
            },
            candidate(5, "b", "a real reply"),
        ];
        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 50, 0);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].username, "b");
        // only the collected reply's key got marked seen
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn seen_replies_never_repeat_across_passes() {
        let pass_one = vec![candidate(1, "op", "post"), candidate(2, "a", "hello")];
        let mut seen = HashSet::new();
        let first = collect_new_replies(&pass_one, &mut seen, 50, 0);
        assert_eq!(first.len(), 1);

        // second pass shows the same reply plus a new one
        let pass_two = vec![
            candidate(1, "op", "post"),
            candidate(2, "a", "hello"),
            candidate(3, "b", "another"),
        ];
        let second = collect_new_replies(&pass_two, &mut seen, 50, first.len());
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].username, "b");
    }

    #[test]
    fn duplicate_within_one_pass_collapses() {
        let cells = vec![
            candidate(1, "op", "post"),
            candidate(2, "a", "same words"),
            candidate(3, "a", "same words"),
        ];
        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 50, 0);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn cap_is_exact_and_counts_prior_collections() {
        let cells = vec![
            candidate(1, "op", "post"),
            candidate(2, "a", "one"),
            candidate(3, "b", "two"),
            candidate(4, "c", "three"),
        ];

        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 2, 0);
        assert_eq!(fresh.len(), 2);

        // with one already collected, only one slot remains
        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 2, 1);
        assert_eq!(fresh.len(), 1);

        // already at the cap: nothing is taken and nothing is marked seen
        let mut seen = HashSet::new();
        let fresh = collect_new_replies(&cells, &mut seen, 2, 2);
        assert!(fresh.is_empty());
        assert!(seen.is_empty());
    }
}
