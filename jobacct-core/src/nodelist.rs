//! Node list expansion
//!
//! Turns compressed host-range notation (`cpu[01-03,05],gpu7`) into an
//! explicit comma-separated list.

use tracing::warn;

use crate::domain::job::NOT_AVAILABLE;

/// Placeholder the scheduler prints for jobs that never got nodes
const NONE_ASSIGNED: &str = "None assigned";

/// Largest range expanded into individual names
pub const MAX_RANGE_LEN: u64 = 100_000;

/// Expand a compressed node list
///
/// # Arguments
/// * `nodelist` - Raw `nodelist` column value
///
/// # Returns
/// Comma-joined node names in input order. Numeric range members lose their
/// leading zeros and ranges are emitted ascending even when written
/// descending. Non-numeric members are appended to the prefix verbatim.
pub fn expand_node_list(nodelist: &str) -> String {
    if nodelist == NONE_ASSIGNED {
        return NOT_AVAILABLE.to_string();
    }

    let mut nodes = Vec::new();
    for token in split_top_level(nodelist) {
        expand_token(token, &mut nodes);
    }
    nodes.join(",")
}

/// Split on commas that are not inside brackets
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in list.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn expand_token(token: &str, out: &mut Vec<String>) {
    let Some((prefix, rest)) = token.split_once('[') else {
        out.push(token.to_string());
        return;
    };

    let (spec, suffix) = rest.split_once(']').unwrap_or((rest, ""));

    for member in spec.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        match parse_member(member) {
            Some((lo, hi)) if lo.abs_diff(hi) >= MAX_RANGE_LEN => {
                warn!("Not expanding oversized node range {}{}", prefix, member);
                out.push(format!("{}{}{}", prefix, member, suffix));
            }
            Some((lo, hi)) => {
                for n in lo.min(hi)..=lo.max(hi) {
                    out.push(format!("{}{}{}", prefix, n, suffix));
                }
            }
            None => out.push(format!("{}{}{}", prefix, member, suffix)),
        }
    }
}

/// A range member as an inclusive numeric interval
fn parse_member(member: &str) -> Option<(u64, u64)> {
    match member.split_once('-') {
        Some((lo, hi)) => Some((lo.parse().ok()?, hi.parse().ok()?)),
        None => member.parse().ok().map(|n| (n, n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_ranges_and_singles() {
        assert_eq!(expand_node_list("cpu[01-03,05]"), "cpu1,cpu2,cpu3,cpu5");
    }

    #[test]
    fn test_none_assigned() {
        assert_eq!(expand_node_list("None assigned"), "N/A");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(expand_node_list(""), "");
    }

    #[test]
    fn test_plain_names_keep_order() {
        assert_eq!(expand_node_list("b002,a001"), "b002,a001");
    }

    #[test]
    fn test_mixed_groups() {
        assert_eq!(
            expand_node_list("a[1-2],g007,b[10]"),
            "a1,a2,g007,b10"
        );
    }

    #[test]
    fn test_descending_range_is_ascending() {
        assert_eq!(expand_node_list("n[3-1]"), "n1,n2,n3");
    }

    #[test]
    fn test_non_numeric_member_verbatim() {
        assert_eq!(expand_node_list("n[x,2]"), "nx,n2");
    }

    #[test]
    fn test_oversized_range_kept_verbatim() {
        assert_eq!(expand_node_list("n[0-99999999999],m1"), "n0-99999999999,m1");
        assert_eq!(expand_node_list("n[1-3,5-99999999999]"), "n1,n2,n3,n5-99999999999");
    }

    #[test]
    fn test_hyphenated_prefix() {
        assert_eq!(expand_node_list("gpu-a[1-2]"), "gpu-a1,gpu-a2");
    }
}
