use serde::{Deserialize, Serialize};

/// Sort order of an externally owned row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowOrder {
    #[default]
    Ascending,
    /// Newest first, as most log views show them.
    Descending,
}

/// Index of the row whose timestamp is closest to `t`.
///
/// Binary-searches for the first row at or past `t` in list order, then
/// compares it with its predecessor. On equal distance the row at or past
/// `t` wins, since it is examined first.
pub fn nearest_row(rows: &[i64], order: RowOrder, t: i64) -> Option<usize> {
    let split = match order {
        RowOrder::Ascending => rows.partition_point(|&r| r < t),
        RowOrder::Descending => rows.partition_point(|&r| r > t),
    };
    let candidates = [Some(split), split.checked_sub(1)];
    let mut best: Option<(usize, u64)> = None;
    for index in candidates.into_iter().flatten() {
        let Some(&row) = rows.get(index) else {
            continue;
        };
        let distance = row.abs_diff(t);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
