use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderBy {
    Date,
    Votes,
    #[default]
    Hot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

/// The fields a comment can be ordered by, extracted once per comment so the
/// comparator works the same over tree nodes and flat summaries.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub created_at: NaiveDateTime,
    pub score: i32,
    pub hotness: f64,
    pub id: i32,
}

/// Total order over comments for one request. Ties on the primary criterion
/// break by ascending id, independent of direction, so the same input always
/// yields the same tree.
#[derive(Debug, Clone, Copy)]
pub struct CommentOrder {
    pub by: OrderBy,
    pub direction: OrderDirection,
}

impl CommentOrder {
    pub fn compare(&self, a: &SortKey, b: &SortKey) -> Ordering {
        let ordering = match self.by {
            OrderBy::Date => a.created_at.cmp(&b.created_at),
            OrderBy::Votes => a.score.cmp(&b.score),
            OrderBy::Hot => a.hotness.total_cmp(&b.hotness),
        };
        let ordering = match self.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn key(id: i32, score: i32, hotness: f64, day: u32) -> SortKey {
        SortKey {
            created_at: NaiveDate::from_ymd_opt(2023, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            score,
            hotness,
            id,
        }
    }

    #[test]
    fn date_ascending() {
        let order = CommentOrder {
            by: OrderBy::Date,
            direction: OrderDirection::Asc,
        };
        let older = key(1, 0, 0.0, 1);
        let newer = key(2, 0, 0.0, 2);
        assert_eq!(order.compare(&older, &newer), Ordering::Less);
    }

    #[test]
    fn votes_descending() {
        let order = CommentOrder {
            by: OrderBy::Votes,
            direction: OrderDirection::Desc,
        };
        let low = key(1, 1, 0.0, 1);
        let high = key(2, 10, 0.0, 1);
        assert_eq!(order.compare(&high, &low), Ordering::Less);
    }

    #[test]
    fn hot_uses_hotness() {
        let order = CommentOrder {
            by: OrderBy::Hot,
            direction: OrderDirection::Desc,
        };
        let cold = key(1, 100, 0.1, 1);
        let hot = key(2, 0, 0.9, 1);
        assert_eq!(order.compare(&hot, &cold), Ordering::Less);
    }

    #[test]
    fn ties_break_by_ascending_id_regardless_of_direction() {
        for direction in [OrderDirection::Asc, OrderDirection::Desc] {
            let order = CommentOrder {
                by: OrderBy::Votes,
                direction,
            };
            let a = key(1, 5, 0.0, 1);
            let b = key(2, 5, 0.0, 1);
            assert_eq!(order.compare(&a, &b), Ordering::Less);
        }
    }
}
