//! Multiset grouping (spec.md §4.6), grounded on
//! `examples/original_source/src/query/codegen/proc/grouper.hpp`.

use graphdb_core::{Cell, ResultSet, Tuple, TupleExt};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Separator byte invalid in any `Cell::Display` output (none of the cell
/// variants ever emit a control character), so concatenating key-position
/// `Display` forms with it can't collide the way plain concatenation could.
const KEY_SEPARATOR: char = '\u{1}';

fn composite_key(tuple: &Tuple, key_positions: &[usize]) -> String {
    key_positions
        .iter()
        .map(|&pos| tuple.get_cell(pos).map(|c| c.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

/// A map from composite-key string to group index, a vector of per-group
/// tuple multisets, and on-demand aggregate accessors (spec.md §4.6).
#[derive(Debug, Default)]
pub struct Grouper {
    index: Mutex<HashMap<String, usize>>,
    groups: Mutex<Vec<Vec<Tuple>>>,
}

impl Grouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tuple` to the group identified by the values at
    /// `key_positions`, remembering which positions form the key.
    pub fn add_to_group(&self, tuple: Tuple, key_positions: &[usize]) {
        let key = composite_key(&tuple, key_positions);
        let mut index = self.index.lock();
        let mut groups = self.groups.lock();
        let group_idx = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group_idx].push(tuple);
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    /// For each group, emits the tuple containing only the key positions.
    pub fn finish(&self, key_positions: &[usize], result_set: &ResultSet) {
        let groups = self.groups.lock();
        for group in groups.iter() {
            let Some(representative) = group.first() else {
                continue;
            };
            let key_tuple: Tuple = key_positions
                .iter()
                .filter_map(|&pos| representative.get_cell(pos).cloned())
                .collect();
            result_set.append(key_tuple);
        }
    }

    /// Streams the `i`-th grouped tuple back to the downstream during finish.
    pub fn demat_tuple(&self, i: usize) -> Option<Tuple> {
        self.groups.lock().get(i).and_then(|g| g.first().cloned())
    }

    pub fn count(&self, group: usize) -> u64 {
        self.groups.lock().get(group).map(|g| g.len() as u64).unwrap_or(0)
    }

    pub fn total_count(&self) -> u64 {
        self.groups.lock().iter().map(|g| g.len() as u64).sum()
    }

    pub fn pcount(&self, group: usize) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            100.0 * self.count(group) as f64 / total as f64
        }
    }

    fn fold_numeric(&self, group: usize, position: usize) -> Vec<Cell> {
        self.groups
            .lock()
            .get(group)
            .map(|g| g.iter().filter_map(|t| t.get_cell(position).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn sum_int(&self, group: usize, position: usize) -> i64 {
        self.fold_numeric(group, position).iter().filter_map(Cell::as_int).sum()
    }

    pub fn sum_double(&self, group: usize, position: usize) -> f64 {
        self.fold_numeric(group, position).iter().filter_map(Cell::as_double).sum()
    }

    pub fn sum_uint(&self, group: usize, position: usize) -> u64 {
        self.fold_numeric(group, position).iter().filter_map(Cell::as_uint).sum()
    }

    pub fn avg(&self, group: usize, position: usize) -> f64 {
        let count = self.count(group);
        if count == 0 {
            0.0
        } else {
            self.sum_double(group, position) / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdb_core::ResultSet;

    #[test]
    fn identity_projection_yields_one_group_per_tuple() {
        let g = Grouper::new();
        g.add_to_group(vec![Cell::Int(1)], &[0]);
        g.add_to_group(vec![Cell::Int(2)], &[0]);
        g.add_to_group(vec![Cell::Int(1)], &[0]);
        assert_eq!(g.group_count(), 2);
        assert_eq!(g.total_count(), 3);
    }

    #[test]
    fn sum_and_avg_computed_on_demand() {
        let g = Grouper::new();
        g.add_to_group(vec![Cell::String("a".into()), Cell::Int(10)], &[0]);
        g.add_to_group(vec![Cell::String("a".into()), Cell::Int(20)], &[0]);
        g.add_to_group(vec![Cell::String("b".into()), Cell::Int(5)], &[0]);
        assert_eq!(g.group_count(), 2);
        let group_a = 0; // "a" inserted first
        assert_eq!(g.count(group_a), 2);
        assert_eq!(g.sum_int(group_a, 1), 30);
        assert_eq!(g.avg(group_a, 1), 15.0);
    }

    #[test]
    fn finish_emits_key_only_tuple_per_group() {
        let g = Grouper::new();
        g.add_to_group(vec![Cell::String("x".into()), Cell::Int(1)], &[0]);
        let rs = ResultSet::new();
        g.finish(&[0], &rs);
        assert_eq!(rs.data(), vec![vec![Cell::String("x".into())]]);
    }
}
