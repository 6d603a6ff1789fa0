use super::value::{FilterError, FilterField, FilterValue};
use std::collections::BTreeMap;

/// Ordered mapping of filter field to value for one screen.
///
/// Only constrained values are stored, so two specs that constrain the same
/// fields the same way compare equal no matter how they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSpec<F: FilterField> {
    values: BTreeMap<F, FilterValue>,
}

impl<F: FilterField> Default for FilterSpec<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: FilterField> FilterSpec<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `field`; `Any` when unset.
    pub fn get(&self, field: F) -> &FilterValue {
        static ANY: FilterValue = FilterValue::Any;
        self.values.get(&field).unwrap_or(&ANY)
    }

    /// Set a value, returning true if the stored value changed.
    ///
    /// The caller is responsible for kind validation (see [`FilterField::check`]).
    pub(crate) fn set(&mut self, field: F, value: FilterValue) -> bool {
        let value = value.normalized();
        if value.is_unconstrained() {
            self.values.remove(&field).is_some()
        } else {
            self.values.insert(field, value.clone()).as_ref() != Some(&value)
        }
    }

    pub(crate) fn reset(&mut self, field: F) -> bool {
        self.values.remove(&field).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_constrained(&self, field: F) -> bool {
        self.values.contains_key(&field)
    }

    /// Number of constrained fields.
    pub fn constrained_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Constrained fields and their values, in field order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &FilterValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }
}

/// An ordered batch of filter edits.
///
/// Edits are applied in the order they were pushed; later edits see the
/// cascade resets caused by earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPatch<F: FilterField> {
    edits: Vec<(F, FilterValue)>,
}

impl<F: FilterField> Default for FilterPatch<F> {
    fn default() -> Self {
        Self { edits: Vec::new() }
    }
}

impl<F: FilterField> FilterPatch<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style edit.
    pub fn set(mut self, field: F, value: impl Into<FilterValue>) -> Self {
        self.edits.push((field, value.into()));
        self
    }

    pub fn push(&mut self, field: F, value: impl Into<FilterValue>) {
        self.edits.push((field, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn edits(&self) -> &[(F, FilterValue)] {
        &self.edits
    }

    /// Parse `name=value` pairs coming from outside the process.
    ///
    /// Field names are wire names. Values are parsed according to the
    /// field's kind; `any`, `null` and empty strings clear the field.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patch = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            let field =
                F::from_name(name).ok_or_else(|| FilterError::UnknownField(name.to_string()))?;
            let value = field
                .kind()
                .parse(raw)
                .map_err(|reason| FilterError::InvalidValue {
                    field: field.name(),
                    value: raw.to_string(),
                    reason,
                })?;
            patch.push(field, value);
        }
        Ok(patch)
    }
}

impl<F: FilterField> FromIterator<(F, FilterValue)> for FilterPatch<F> {
    fn from_iter<T: IntoIterator<Item = (F, FilterValue)>>(iter: T) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}
