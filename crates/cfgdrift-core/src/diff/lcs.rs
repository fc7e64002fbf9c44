//! Longest-common-subsequence alignment of ordered-list keys.

/// Index pairs `(old, new)` of elements kept in place, ascending on both sides
pub(crate) type Matches = Vec<(usize, usize)>;

/// Align two key sequences.
///
/// The common prefix and suffix are matched first, then a suffix DP table
/// over the remaining middle. Among minimal edit scripts the walk matches
/// equal heads immediately and otherwise deletes before inserting, so the
/// longest shared prefix always survives.
///
/// Returns `None` when the middle section needs more than `work_limit`
/// table cells.
pub(crate) fn align(old: &[&str], new: &[&str], work_limit: usize) -> Option<Matches> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let m = old_mid.len();
    let n = new_mid.len();

    let cells = (m + 1).checked_mul(n + 1)?;
    if cells > work_limit && m > 0 && n > 0 {
        return None;
    }

    let mut matches: Matches = (0..prefix).map(|i| (i, i)).collect();

    if m > 0 && n > 0 {
        let width = n + 1;
        let mut dp = vec![0u32; cells];
        for i in (0..m).rev() {
            for j in (0..n).rev() {
                dp[i * width + j] = if old_mid[i] == new_mid[j] {
                    dp[(i + 1) * width + j + 1] + 1
                } else {
                    dp[(i + 1) * width + j].max(dp[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0usize, 0usize);
        while i < m && j < n {
            if old_mid[i] == new_mid[j] {
                matches.push((prefix + i, prefix + j));
                i += 1;
                j += 1;
            } else if dp[(i + 1) * width + j] >= dp[i * width + j + 1] {
                i += 1;
            } else {
                j += 1;
            }
        }
    }

    let old_tail = old.len() - suffix;
    let new_tail = new.len() - suffix;
    matches.extend((0..suffix).map(|k| (old_tail + k, new_tail + k)));
    Some(matches)
}
