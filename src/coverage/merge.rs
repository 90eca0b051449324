/// Walk a sorted sequence and fold each element into the current block when
/// `absorb` accepts it, otherwise close the block and start a new one.
///
/// `absorb(current, next)` returns `true` after extending `current` with `next`.
/// Input must already be ordered by start.
pub fn coalesce_sorted<T, F>(items: impl IntoIterator<Item = T>, mut absorb: F) -> Vec<T>
where
    F: FnMut(&mut T, &T) -> bool,
{
    let mut blocks = Vec::new();
    let mut current: Option<T> = None;

    for item in items {
        if let Some(block) = current.as_mut() {
            if absorb(block, &item) {
                continue;
            }
        }
        if let Some(block) = current.replace(item) {
            blocks.push(block);
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_pairs(pairs: Vec<(i64, i64)>, gap: i64) -> Vec<(i64, i64)> {
        coalesce_sorted(pairs, |cur, next| {
            if next.0 - cur.1 <= gap {
                cur.1 = cur.1.max(next.1);
                true
            } else {
                false
            }
        })
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(merge_pairs(Vec::new(), 0).is_empty());
    }

    #[test]
    fn bridging_item_collapses_neighbours() {
        let merged = merge_pairs(vec![(0, 5), (5, 12), (12, 20), (30, 40)], 0);
        assert_eq!(merged, vec![(0, 20), (30, 40)]);
    }

    #[test]
    fn contained_item_keeps_outer_end() {
        let merged = merge_pairs(vec![(0, 100), (10, 20), (50, 60)], 0);
        assert_eq!(merged, vec![(0, 100)]);
    }
}
