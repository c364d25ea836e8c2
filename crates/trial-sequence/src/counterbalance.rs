//! Fixed counter-balancing tables.
//!
//! Each table row is one participant's method presentation order. The tables
//! are literal data carried over from the study design: across participants
//! every method appears in every ordinal position an equal number of times.
//! They are lookup constants, not computed at runtime.

/// Balanced order for the six-method study, 12 participants.
pub const SIX_METHOD: &[&[usize]] = &[
    &[4, 3, 2, 5, 1, 0],
    &[0, 4, 3, 2, 5, 1],
    &[1, 0, 4, 3, 2, 5],
    &[5, 2, 0, 1, 3, 4],
    &[3, 1, 5, 0, 4, 2],
    &[2, 5, 1, 4, 0, 3],
    &[4, 3, 2, 5, 1, 0],
    &[0, 4, 3, 2, 5, 1],
    &[1, 0, 4, 3, 2, 5],
    &[5, 2, 0, 1, 3, 4],
    &[3, 1, 5, 0, 4, 2],
    &[2, 5, 1, 4, 0, 3],
];

/// Balanced order for the four-method study, 12 participants.
pub const FOUR_METHOD: &[&[usize]] = &[
    &[2, 1, 3, 0],
    &[1, 2, 0, 3],
    &[3, 0, 2, 1],
    &[0, 3, 1, 2],
    &[2, 1, 3, 0],
    &[1, 2, 0, 3],
    &[3, 0, 2, 1],
    &[0, 3, 1, 2],
    &[2, 1, 3, 0],
    &[1, 2, 0, 3],
    &[3, 0, 2, 1],
    &[0, 3, 1, 2],
];

/// Alternating order for the two-method study, 12 participants.
pub const TWO_METHOD: &[&[usize]] = &[
    &[0, 1],
    &[1, 0],
    &[0, 1],
    &[1, 0],
    &[0, 1],
    &[1, 0],
    &[0, 1],
    &[1, 0],
    &[0, 1],
    &[1, 0],
    &[0, 1],
    &[1, 0],
];

/// Materialize a table as owned rows for embedding in a config.
pub fn to_rows(table: &[&[usize]]) -> Vec<Vec<usize>> {
    table.iter().map(|row| row.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_balanced(table: &[&[usize]], methods: usize) {
        for position in 0..methods {
            let mut counts = vec![0usize; methods];
            for row in table {
                counts[row[position]] += 1;
            }
            // Each method appears equally often at each ordinal position.
            assert!(
                counts.iter().all(|&c| c == table.len() / methods),
                "position {} unbalanced: {:?}",
                position,
                counts
            );
        }
    }

    #[test]
    fn test_rows_are_permutations() {
        for (table, methods) in [(SIX_METHOD, 6), (FOUR_METHOD, 4), (TWO_METHOD, 2)] {
            for row in table {
                let mut seen = vec![false; methods];
                for &m in *row {
                    assert!(m < methods);
                    assert!(!seen[m], "duplicate method {} in row {:?}", m, row);
                    seen[m] = true;
                }
            }
        }
    }

    #[test]
    fn test_tables_are_counterbalanced() {
        assert_balanced(SIX_METHOD, 6);
        assert_balanced(FOUR_METHOD, 4);
        assert_balanced(TWO_METHOD, 2);
    }

    #[test]
    fn test_twelve_participants_each() {
        assert_eq!(SIX_METHOD.len(), 12);
        assert_eq!(FOUR_METHOD.len(), 12);
        assert_eq!(TWO_METHOD.len(), 12);
    }
}
