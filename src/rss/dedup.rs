//! Deduplication of fetched posts against stored ones.

use std::collections::HashSet;

use crate::post::Post;

/// Posts from `fresh` whose id does not appear in `stored`, in their
/// original order.
pub fn distinct_new_posts(fresh: Vec<Post>, stored: &[Post]) -> Vec<Post> {
    if stored.is_empty() {
        return fresh;
    }

    let seen: HashSet<&str> = stored.iter().map(|p| p.id.as_str()).collect();
    fresh
        .into_iter()
        .filter(|p| !seen.contains(p.id.as_str()))
        .collect()
}
