//! Recent-articles merge
//!
//! Unlike the other topics, the article list is merged rather than
//! replaced: records are de-duplicated by id (the incoming record wins),
//! ordered newest-first by publication time and capped.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::Article;

/// Merge `incoming` into `existing`, newest first, at most `limit` entries
///
/// Articles whose `created_at` cannot be parsed sort after every dated
/// article. Equal timestamps keep incoming records ahead of existing ones.
pub fn merge_articles(existing: &[Article], incoming: Vec<Article>, limit: usize) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut merged: Vec<Article> = Vec::with_capacity(existing.len() + incoming.len());

    for article in incoming.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(article.id.clone()) {
            merged.push(article);
        }
    }

    // Stable sort keeps the incoming-first order for ties
    merged.sort_by(|a, b| newest_first(a, b));
    merged.truncate(limit);
    merged
}

fn newest_first(a: &Article, b: &Article) -> Ordering {
    match (a.published_at(), b.published_at()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, minute: u32, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            reposts_count: 0,
            comments_count: 0,
            attitudes_count: 0,
            region_name: String::new(),
            created_at: format!("2024-05-01 12:{:02}:00", minute),
            author_name: String::new(),
            article_url: String::new(),
            article_type: String::new(),
        }
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_merge_dedupes_and_caps() {
        let existing = vec![article("A", 1, "old A"), article("B", 2, "B")];
        let incoming = vec![article("A", 3, "new A"), article("C", 4, "C")];

        let merged = merge_articles(&existing, incoming, 2);

        assert_eq!(ids(&merged), vec!["C", "A"]);
        assert_eq!(merged[1].title, "new A");
    }

    #[test]
    fn test_merge_keeps_older_within_limit() {
        let existing = vec![article("A", 1, "old A"), article("B", 2, "B")];
        let incoming = vec![article("A", 3, "new A"), article("C", 4, "C")];

        let merged = merge_articles(&existing, incoming, 10);

        assert_eq!(ids(&merged), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_merge_into_empty_sorts_incoming() {
        let incoming = vec![article("X", 5, "x"), article("Y", 9, "y"), article("X", 1, "dup")];

        let merged = merge_articles(&[], incoming, 10);

        assert_eq!(ids(&merged), vec!["Y", "X"]);
        assert_eq!(merged[1].title, "x");
    }

    #[test]
    fn test_undated_articles_sort_last() {
        let mut undated = article("U", 0, "undated");
        undated.created_at = "unknown".to_string();
        let incoming = vec![undated, article("D", 3, "dated")];

        let merged = merge_articles(&[], incoming, 10);

        assert_eq!(ids(&merged), vec!["D", "U"]);
    }

    #[test]
    fn test_zero_limit_empties() {
        let merged = merge_articles(&[article("A", 1, "a")], Vec::new(), 0);
        assert!(merged.is_empty());
    }
}
