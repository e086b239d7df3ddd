use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Presentation state a UI keeps per row id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    pub selected: bool,
    pub expanded: bool,
}

impl ItemState {
    fn is_default(&self) -> bool {
        !self.selected && !self.expanded
    }
}

/// Selected/expanded flags keyed by row id. Only non-default states are
/// stored.
#[derive(Clone, Debug, Default)]
pub struct CollectionState {
    items: HashMap<u64, ItemState>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row_id: u64) -> ItemState {
        self.items.get(&row_id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, row_id: u64, state: ItemState) {
        if state.is_default() {
            self.items.remove(&row_id);
        } else {
            self.items.insert(row_id, state);
        }
    }

    pub fn set_selected(&mut self, row_id: u64, selected: bool) {
        let mut state = self.get(row_id);
        state.selected = selected;
        self.set(row_id, state);
    }

    pub fn set_expanded(&mut self, row_id: u64, expanded: bool) {
        let mut state = self.get(row_id);
        state.expanded = expanded;
        self.set(row_id, state);
    }

    pub fn clear_selection(&mut self) {
        for state in self.items.values_mut() {
            state.selected = false;
        }
        self.items.retain(|_, state| !state.is_default());
    }

    pub fn selected(&self) -> Vec<u64> {
        let mut out: Vec<u64> = self
            .items
            .iter()
            .filter(|(_, state)| state.selected)
            .map(|(row_id, _)| *row_id)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The states of `self` whose row ids are still live.
    pub fn carried_over(&self, live: &HashSet<u64>) -> Self {
        let items = self
            .items
            .iter()
            .filter(|(row_id, _)| live.contains(row_id))
            .map(|(row_id, state)| (*row_id, *state))
            .collect();
        Self { items }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionState, ItemState};
    use std::collections::HashSet;

    #[test]
    fn default_states_are_not_stored() {
        let mut state = CollectionState::new();
        state.set_selected(4, true);
        state.set_expanded(4, true);
        assert_eq!(
            state.get(4),
            ItemState {
                selected: true,
                expanded: true
            }
        );
        state.set_selected(4, false);
        state.set_expanded(4, false);
        assert!(state.is_empty());
        assert_eq!(state.get(99), ItemState::default());
    }

    #[test]
    fn clear_selection_keeps_expansion() {
        let mut state = CollectionState::new();
        state.set_selected(1, true);
        state.set_selected(2, true);
        state.set_expanded(2, true);
        assert_eq!(state.selected(), vec![1, 2]);
        state.clear_selection();
        assert!(state.selected().is_empty());
        assert!(state.get(2).expanded);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn carried_over_drops_dead_ids() {
        let mut state = CollectionState::new();
        state.set_expanded(1, true);
        state.set_selected(2, true);
        let live: HashSet<u64> = [1].into_iter().collect();
        let next = state.carried_over(&live);
        assert!(next.get(1).expanded);
        assert_eq!(next.get(2), ItemState::default());
    }
}
