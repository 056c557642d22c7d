use crate::{error::CollectionError, id::RecordId, record::Record};

/// Where a record sat, remembered by its neighbours as well as its index.
///
/// Other rows may be removed or inserted while an operation is in flight, so the neighbour
/// ids locate the record more reliably than the raw index does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    /// id of the record directly above
    pub after: Option<RecordId>,
    /// id of the record directly below
    pub before: Option<RecordId>,
}

impl Slot {
    /// A slot with no neighbours, resolved by index alone.
    pub fn at(index: usize) -> Self { Self { index, after: None, before: None } }
}

/// Ordered list of records with unique ids.
///
/// Lookups are linear; screen lists hold tens of records, not thousands.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self { Self { items: Vec::new() } }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self { Self::default() }

    /// Build from a fetched list, rejecting duplicated ids.
    pub fn from_items(items: Vec<T>) -> Result<Self, CollectionError> {
        let mut collection = Self { items: Vec::with_capacity(items.len()) };
        for item in items {
            collection.push(item)?;
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn position(&self, id: &RecordId) -> Option<usize> { self.items.iter().position(|item| item.id() == id) }

    pub fn contains(&self, id: &RecordId) -> bool { self.position(id).is_some() }

    pub fn get(&self, id: &RecordId) -> Option<&T> { self.items.iter().find(|item| item.id() == id) }

    pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

    pub fn ids(&self) -> Vec<RecordId> { self.items.iter().map(|item| item.id().clone()).collect() }

    pub fn as_slice(&self) -> &[T] { &self.items }

    pub fn to_vec(&self) -> Vec<T> { self.items.clone() }

    pub fn into_vec(self) -> Vec<T> { self.items }

    /// Append at the tail.
    pub fn push(&mut self, item: T) -> Result<(), CollectionError> {
        if self.contains(item.id()) {
            return Err(CollectionError::DuplicateId(item.id().clone()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Insert at `index`, clamped to the current length. Returns the index used.
    pub fn insert_at(&mut self, index: usize, item: T) -> Result<usize, CollectionError> {
        if self.contains(item.id()) {
            return Err(CollectionError::DuplicateId(item.id().clone()));
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        Ok(index)
    }

    /// The slot `id` currently occupies.
    pub fn slot_of(&self, id: &RecordId) -> Option<Slot> {
        let index = self.position(id)?;
        Some(Slot {
            index,
            after: index.checked_sub(1).map(|i| self.items[i].id().clone()),
            before: self.items.get(index + 1).map(|item| item.id().clone()),
        })
    }

    /// The slot an appended record would occupy.
    pub fn next_slot(&self) -> Slot {
        Slot { index: self.items.len(), after: self.items.last().map(|item| item.id().clone()), before: None }
    }

    /// Insert at `slot`: directly below its `after` neighbour, else directly above its `before`
    /// neighbour, else at its clamped index. Returns the index used.
    pub fn insert_at_slot(&mut self, slot: &Slot, item: T) -> Result<usize, CollectionError> {
        let index = match (
            slot.after.as_ref().and_then(|id| self.position(id)),
            slot.before.as_ref().and_then(|id| self.position(id)),
        ) {
            (Some(above), _) => above + 1,
            (None, Some(below)) => below,
            (None, None) => slot.index,
        };
        self.insert_at(index, item)
    }

    /// Swap the record stored under `id` for `item`, keeping its position.
    /// `item` may carry a different id as long as that id is not taken by another record.
    pub fn replace(&mut self, id: &RecordId, item: T) -> Result<T, CollectionError> {
        let index = self.position(id).ok_or_else(|| CollectionError::NotFound(id.clone()))?;
        if item.id() != id && self.contains(item.id()) {
            return Err(CollectionError::DuplicateId(item.id().clone()));
        }
        Ok(std::mem::replace(&mut self.items[index], item))
    }

    /// Remove by id, returning where it was and what it was.
    pub fn remove(&mut self, id: &RecordId) -> Option<(usize, T)> {
        let index = self.position(id)?;
        Some((index, self.items.remove(index)))
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter { self.items.iter() }
}
