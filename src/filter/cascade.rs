//! Parent → child dependencies between filter fields.
//!
//! The pure half lives in [`allowed_values`]: given a child field's option
//! universe and the parent's applied value, which options remain selectable.
//! The mutating half (resetting children when a parent changes) is done by
//! the store using [`CascadeGraph::descendants`].

use super::value::{FilterField, FilterValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Directed edge: changing `parent` invalidates `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CascadeRule<F: FilterField> {
    pub parent: F,
    pub child: F,
}

impl<F: FilterField> CascadeRule<F> {
    pub const fn new(parent: F, child: F) -> Self {
        Self { parent, child }
    }
}

/// One selectable value of a child field.
///
/// `owner` is the parent value the option belongs to (the subcategory's
/// category, the product's subcategory). Options with an `Any` owner are
/// only visible while the parent is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: FilterValue,
    pub label: String,
    #[serde(default)]
    pub owner: FilterValue,
}

impl FilterOption {
    pub fn new(
        value: impl Into<FilterValue>,
        label: impl Into<String>,
        owner: impl Into<FilterValue>,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            owner: owner.into(),
        }
    }
}

/// Subset of `universe` selectable under `parent`.
///
/// An unconstrained parent returns the universe unchanged; otherwise only
/// options owned by exactly that parent value are kept, in universe order.
pub fn allowed_values<'a>(
    universe: &'a [FilterOption],
    parent: &FilterValue,
) -> Vec<&'a FilterOption> {
    if parent.is_unconstrained() {
        return universe.iter().collect();
    }
    universe
        .iter()
        .filter(|option| &option.owner == parent)
        .collect()
}

/// All cascade edges of one screen. Independent chains may coexist.
#[derive(Debug, Clone)]
pub struct CascadeGraph<F: FilterField> {
    rules: Vec<CascadeRule<F>>,
}

impl<F: FilterField> Default for CascadeGraph<F> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<F: FilterField> CascadeGraph<F> {
    pub fn new(rules: impl IntoIterator<Item = CascadeRule<F>>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[CascadeRule<F>] {
        &self.rules
    }

    /// Direct parent of `child`, if any. The first matching rule wins.
    pub fn parent_of(&self, child: F) -> Option<F> {
        self.rules.iter().find(|r| r.child == child).map(|r| r.parent)
    }

    /// Every transitive descendant of `field`, breadth-first, each once.
    ///
    /// Cycles are tolerated; `field` itself is never returned.
    pub fn descendants(&self, field: F) -> Vec<F> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([field]);
        let mut queue = VecDeque::from([field]);

        while let Some(current) = queue.pop_front() {
            for rule in self.rules.iter().filter(|r| r.parent == current) {
                if seen.insert(rule.child) {
                    out.push(rule.child);
                    queue.push_back(rule.child);
                }
            }
        }
        out
    }
}
