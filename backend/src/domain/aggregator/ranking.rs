//! Deterministic ordering rules for the derived views.

use std::cmp::Reverse;

use crate::domain::activity::{PostActivity, UserActivity, compare_ids};

/// Highest comment counts first, ties by ascending id, at most `limit`.
pub(super) fn rank_users(mut users: Vec<UserActivity>, limit: usize) -> Vec<UserActivity> {
    users.sort_by(|left, right| {
        right
            .comment_count
            .cmp(&left.comment_count)
            .then_with(|| compare_ids(&left.id, &right.id))
    });
    users.truncate(limit);
    users
}

/// Every post sharing the maximum comment count, by ascending id.
pub(super) fn most_commented(posts: Vec<PostActivity>) -> Vec<PostActivity> {
    let Some(max) = posts.iter().map(|post| post.comment_count).max() else {
        return Vec::new();
    };
    let mut leaders = posts
        .into_iter()
        .filter(|post| post.comment_count == max)
        .collect::<Vec<_>>();
    leaders.sort_by(|left, right| compare_ids(&left.id, &right.id));
    leaders
}

/// Newest `observed_at` first; equal instants put later traversal positions
/// first.
pub(super) fn latest_first(posts: Vec<PostActivity>) -> Vec<PostActivity> {
    let mut indexed = posts.into_iter().enumerate().collect::<Vec<_>>();
    indexed.sort_by_key(|(position, post)| (Reverse(post.observed_at), Reverse(*position)));
    indexed.into_iter().map(|(_, post)| post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rstest::rstest;

    use crate::test_support::clock::fixed_now;

    fn user(id: &str, comment_count: u64) -> UserActivity {
        UserActivity {
            id: id.to_owned(),
            name: format!("user {id}"),
            comment_count,
        }
    }

    fn post(id: &str, comment_count: u64, observed_offset_secs: i64) -> PostActivity {
        PostActivity {
            id: id.to_owned(),
            author_id: "1".to_owned(),
            author_name: "Ada".to_owned(),
            body: String::new(),
            comment_count,
            observed_at: fixed_now() + TimeDelta::seconds(observed_offset_secs),
        }
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| id(item).to_owned()).collect()
    }

    #[rstest]
    #[case(2, vec!["2", "10"])]
    #[case(5, vec!["2", "10", "3"])]
    #[case(0, vec![])]
    fn users_rank_by_count_then_numeric_id(#[case] limit: usize, #[case] expected: Vec<&str>) {
        let ranked = rank_users(vec![user("3", 1), user("10", 5), user("2", 5)], limit);
        assert_eq!(ids(&ranked, |u| u.id.as_str()), expected);
    }

    #[test]
    fn every_post_tied_for_the_maximum_is_trending() {
        let trending = most_commented(vec![
            post("9", 5, 0),
            post("2", 2, 0),
            post("4", 5, 0),
            post("1", 1, 0),
        ]);
        assert_eq!(ids(&trending, |p| p.id.as_str()), vec!["4", "9"]);
    }

    #[test]
    fn no_posts_means_no_trending() {
        assert!(most_commented(Vec::new()).is_empty());
    }

    #[test]
    fn feed_orders_by_observation_then_traversal_position() {
        let feed = latest_first(vec![post("1", 0, 0), post("2", 0, 5), post("3", 0, 0)]);
        assert_eq!(ids(&feed, |p| p.id.as_str()), vec!["2", "3", "1"]);
    }
}
