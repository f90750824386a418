//! Ordered, duplicate-free criterion list.

use super::criterion::Criterion;
use crate::error::{ModelError, ModelResult};
use crate::xml::XmlElement;

use log::debug;
use serde_json::Value;

/// The rule list of a smart group or advanced search.
///
/// Each criterion's priority always equals its index. Every successful
/// mutation marks the list as needing a save; the owning object reads that
/// through [`needs_update`](Self::needs_update).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    criteria: Vec<Criterion>,
    needs_update: bool,
}

impl Criteria {
    /// Build from criteria in priority order.
    pub fn new(criteria: Vec<Criterion>) -> ModelResult<Self> {
        let mut list = Self::default();
        list.replace_all(criteria)?;
        list.needs_update = false;
        Ok(list)
    }

    /// Parse the classic `criterion` array, ordering by its priority field.
    pub fn from_classic(raw: &Value) -> ModelResult<Self> {
        let items = match raw {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            _ => return Err(ModelError::invalid_data("Criteria must be an array")),
        };
        let mut parsed = items
            .iter()
            .map(Criterion::from_classic)
            .collect::<ModelResult<Vec<_>>>()?;
        parsed.sort_by_key(Criterion::priority);
        Self::new(parsed)
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn get(&self, priority: usize) -> Option<&Criterion> {
        self.criteria.get(priority)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.criteria
    }

    /// True after any mutation since construction or the last save.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark the list as saved.
    pub fn clear_needs_update(&mut self) {
        self.needs_update = false;
    }

    /// Replace every criterion. The new list must be duplicate-free.
    pub fn replace_all(&mut self, criteria: Vec<Criterion>) -> ModelResult<()> {
        for (i, criterion) in criteria.iter().enumerate() {
            criterion_fields_ok(criterion)?;
            if criteria[..i].contains(criterion) {
                return Err(duplicate(criterion));
            }
        }
        self.criteria = criteria;
        self.renumber();
        Ok(())
    }

    pub fn append(&mut self, criterion: Criterion) -> ModelResult<()> {
        self.criterion_ok(&criterion, None)?;
        self.criteria.push(criterion);
        self.renumber();
        Ok(())
    }

    pub fn prepend(&mut self, criterion: Criterion) -> ModelResult<()> {
        self.criterion_ok(&criterion, None)?;
        self.criteria.insert(0, criterion);
        self.renumber();
        Ok(())
    }

    /// Insert so the new criterion takes `priority`; later ones shift down.
    pub fn insert_at(&mut self, priority: usize, criterion: Criterion) -> ModelResult<()> {
        if priority > self.criteria.len() {
            return Err(no_priority(priority));
        }
        self.criterion_ok(&criterion, None)?;
        self.criteria.insert(priority, criterion);
        self.renumber();
        Ok(())
    }

    /// Remove and return the criterion at `priority`.
    ///
    /// The last remaining criterion cannot be deleted.
    pub fn delete_at(&mut self, priority: usize) -> ModelResult<Criterion> {
        if priority >= self.criteria.len() {
            return Err(no_priority(priority));
        }
        if self.criteria.len() == 1 {
            return Err(ModelError::missing_data(
                "Criteria cannot be empty, at least one criterion is required",
            ));
        }
        let removed = self.criteria.remove(priority);
        self.renumber();
        Ok(removed)
    }

    /// Replace the criterion at `priority`.
    pub fn set_at(&mut self, priority: usize, criterion: Criterion) -> ModelResult<Criterion> {
        if priority >= self.criteria.len() {
            return Err(no_priority(priority));
        }
        self.criterion_ok(&criterion, Some(priority))?;
        let old = std::mem::replace(&mut self.criteria[priority], criterion);
        self.renumber();
        Ok(old)
    }

    /// Check a candidate: all fields present and no duplicate signature,
    /// skipping the slot about to be replaced.
    pub fn criterion_ok(&self, criterion: &Criterion, replacing: Option<usize>) -> ModelResult<()> {
        criterion_fields_ok(criterion)?;
        let clash = self
            .criteria
            .iter()
            .enumerate()
            .any(|(i, existing)| Some(i) != replacing && existing == criterion);
        if clash {
            return Err(duplicate(criterion));
        }
        Ok(())
    }

    /// `<criteria>` element with a leading `<size>`.
    pub fn to_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new("criteria").child(XmlElement::with_text("size", self.len()));
        for criterion in &self.criteria {
            xml.push(criterion.to_xml());
        }
        xml
    }

    fn renumber(&mut self) {
        for (i, criterion) in self.criteria.iter_mut().enumerate() {
            criterion.set_priority(i);
        }
        self.needs_update = true;
        debug!("Criteria renumbered, {} criteria", self.criteria.len());
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}

fn criterion_fields_ok(criterion: &Criterion) -> ModelResult<()> {
    if criterion.name().trim().is_empty() {
        return Err(ModelError::missing_data("Criterion name cannot be empty"));
    }
    criterion.search_type().check_value(criterion.value())
}

fn duplicate(criterion: &Criterion) -> ModelError {
    ModelError::invalid_data(format!("Criterion already present: {}", criterion))
}

fn no_priority(priority: usize) -> ModelError {
    ModelError::no_such_item("criterion priority", priority.to_string())
}
