//! Bulk Loader — parses `key,value` lines and drives inserts,
//! tolerating malformed input rather than aborting the whole load.

use crate::db::btree::engine::BTree;
use crate::error::EngineError;
use crate::info;

/// Per-line outcome counts from a single [`load`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub success: usize,
    pub duplicate: usize,
    pub malformed: usize,
    pub negative: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.success + self.duplicate + self.malformed + self.negative
    }
}

pub(crate) fn parse_unsigned_field(field: &str) -> Result<u64, &'static str> {
    let field = field.trim();
    if field.is_empty() {
        return Err("empty field");
    }
    if field.starts_with('-') || field.starts_with('+') {
        return Err("signed field");
    }
    field.parse::<u64>().map_err(|_| "not a decimal integer")
}

/// Load `key,value` pairs from `source`, one per line, inserting each
/// into `tree`. Malformed or negative lines are counted and skipped;
/// they never abort the load.
pub fn load(tree: &mut BTree, source: &str) -> Result<LoadSummary, EngineError> {
    let mut summary = LoadSummary::default();

    for raw_line in source.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key_field, value_field)) = line.split_once(',') else {
            summary.malformed += 1;
            continue;
        };

        let key_field = key_field.trim();
        let value_field = value_field.trim();

        match (parse_unsigned_field(key_field), parse_unsigned_field(value_field)) {
            (Err("signed field"), _) | (_, Err("signed field")) => {
                summary.negative += 1;
            }
            (Err(_), _) | (_, Err(_)) => {
                summary.malformed += 1;
            }
            (Ok(key), Ok(value)) => match tree.insert(key, value) {
                Ok(()) => summary.success += 1,
                Err(EngineError::DuplicateKey(_)) => summary.duplicate += 1,
                Err(e) => return Err(e),
            },
        }
    }

    info!(format!(
        "load complete: {} inserted, {} duplicate, {} malformed, {} negative",
        summary.success, summary.duplicate, summary.malformed, summary.negative
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_tree(dir: &std::path::Path) -> BTree {
        BTree::create(dir.join("idx"), "4337PRJ3", 3, false).unwrap()
    }

    #[test]
    fn counts_each_outcome_kind() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(1, 1).unwrap();

        let source = "1,99\n2,20\nnot_a_number,5\n3,-7\n  4 , 40 \n\n";
        let summary = load(&mut tree, source).unwrap();

        assert_eq!(summary.duplicate, 1); // key 1 already present
        assert_eq!(summary.success, 2); // 2,20 and 4,40
        assert_eq!(summary.malformed, 1); // not_a_number,5
        assert_eq!(summary.negative, 1); // 3,-7
        assert_eq!(summary.total(), 5);

        assert_eq!(tree.search(1).unwrap(), 1);
        assert_eq!(tree.search(2).unwrap(), 20);
        assert_eq!(tree.search(4).unwrap(), 40);
    }

    #[test]
    fn rejects_leading_plus_sign_as_negative_class() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let summary = load(&mut tree, "+5,10\n").unwrap();
        assert_eq!(summary.negative, 1);
    }

    #[test]
    fn blank_lines_are_skipped_without_counting() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        let summary = load(&mut tree, "\n\n1,2\n\n").unwrap();
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.success, 1);
    }
}
