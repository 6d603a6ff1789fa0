use super::cascade::{allowed_values, CascadeGraph, FilterOption};
use super::spec::{FilterPatch, FilterSpec};
use super::value::{FilterError, FilterField, FilterValue};
use std::collections::HashMap;

/// Structured filters plus raw search text for one screen.
///
/// Owned by a single screen; nothing here is shared or locked.
#[derive(Debug, Clone)]
pub struct FilterStore<F: FilterField> {
    filters: FilterSpec<F>,
    search: String,
    cascades: CascadeGraph<F>,
    universes: HashMap<F, Vec<FilterOption>>,
}

impl<F: FilterField> FilterStore<F> {
    pub fn new(cascades: CascadeGraph<F>) -> Self {
        Self {
            filters: FilterSpec::new(),
            search: String::new(),
            cascades,
            universes: HashMap::new(),
        }
    }

    pub fn filters(&self) -> &FilterSpec<F> {
        &self.filters
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Merge `patch` into the current filters.
    ///
    /// The whole patch is validated before anything is written, so a bad
    /// entry leaves the store untouched. Edits are then applied in order and
    /// each one resets every cascade descendant of its field, which means a
    /// child value given after its parent in the same patch is kept.
    ///
    /// Returns true if the resulting filters differ from the previous ones.
    pub fn apply(&mut self, patch: &FilterPatch<F>) -> Result<bool, FilterError> {
        let checked = patch
            .edits()
            .iter()
            .map(|(field, value)| field.check(value.clone()).map(|v| (*field, v)))
            .collect::<Result<Vec<_>, _>>()?;

        let before = self.filters.clone();
        for (field, value) in checked {
            self.filters.set(field, value);
            for child in self.cascades.descendants(field) {
                if self.filters.reset(child) {
                    tracing::trace!(parent = ?field, child = ?child, "Cascade reset");
                }
            }
        }

        let changed = self.filters != before;
        if changed {
            tracing::debug!(
                edits = patch.len(),
                active = self.filters.constrained_count(),
                "Filters applied"
            );
        }
        Ok(changed)
    }

    /// Replace the raw search text. Returns true if it changed.
    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.search {
            return false;
        }
        self.search = text;
        true
    }

    /// Reset every field to "no constraint" and empty the search text.
    pub fn clear(&mut self) {
        self.filters.clear();
        self.search.clear();
    }

    /// Constrained fields, plus one for a non-empty search.
    pub fn active_count(&self) -> usize {
        let search = usize::from(!self.search.trim().is_empty());
        self.filters.constrained_count() + search
    }

    /// Install the option universe of a cascaded child field.
    pub fn set_universe(&mut self, field: F, options: Vec<FilterOption>) {
        self.universes.insert(field, options);
    }

    /// Options of `field` that remain valid under its parent's current value.
    ///
    /// Fields without a parent yield their whole universe; fields without a
    /// universe yield nothing.
    pub fn allowed_values(&self, field: F) -> Vec<&FilterOption> {
        let Some(universe) = self.universes.get(&field) else {
            return Vec::new();
        };
        match self.cascades.parent_of(field) {
            Some(parent) => allowed_values(universe, self.filters.get(parent)),
            None => allowed_values(universe, &FilterValue::Any),
        }
    }
}
