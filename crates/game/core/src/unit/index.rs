use std::collections::HashMap;

use crate::state::Position;
use crate::unit::GroupHandle;

/// Address of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub group: GroupHandle,
    pub cell: u16,
}

/// Position lookup for live cells.
#[derive(Debug, Default)]
pub struct CellIndex {
    by_position: HashMap<Position, Vec<CellRef>>,
}

impl CellIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: Position, cell: CellRef) {
        let refs = self.by_position.entry(position).or_default();
        if !refs.contains(&cell) {
            refs.push(cell);
        }
    }

    pub fn remove(&mut self, position: Position, cell: CellRef) {
        if let Some(refs) = self.by_position.get_mut(&position) {
            refs.retain(|existing| *existing != cell);
            if refs.is_empty() {
                self.by_position.remove(&position);
            }
        }
    }

    /// Drops every reference to `group`.
    pub fn remove_group(&mut self, group: GroupHandle) {
        self.by_position.retain(|_, refs| {
            refs.retain(|cell| cell.group != group);
            !refs.is_empty()
        });
    }

    /// Cells at `position`, in placement order. Returns an owned copy so
    /// callers can mutate groups while walking it.
    pub fn at(&self, position: Position) -> Vec<CellRef> {
        self.by_position.get(&position).cloned().unwrap_or_default()
    }

    pub fn groups_at(&self, position: Position) -> Vec<GroupHandle> {
        let mut groups: Vec<GroupHandle> = self
            .by_position
            .get(&position)
            .map(|refs| refs.iter().map(|cell| cell.group).collect())
            .unwrap_or_default();
        groups.dedup();
        groups
    }

    pub fn len(&self) -> usize {
        self.by_position.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_and_group_sweep() {
        let mut index = CellIndex::new();
        let a = GroupHandle::new(1, 0);
        let b = GroupHandle::new(2, 0);
        let here = Position::new(3, 3);

        index.insert(here, CellRef { group: a, cell: 0 });
        index.insert(here, CellRef { group: a, cell: 0 });
        index.insert(here, CellRef { group: b, cell: 4 });
        index.insert(Position::new(4, 3), CellRef { group: a, cell: 1 });
        assert_eq!(index.len(), 3);
        assert_eq!(index.groups_at(here), vec![a, b]);

        index.remove_group(a);
        assert_eq!(index.at(here), vec![CellRef { group: b, cell: 4 }]);
        assert!(index.at(Position::new(4, 3)).is_empty());

        index.remove(here, CellRef { group: b, cell: 4 });
        assert!(index.is_empty());
    }
}
