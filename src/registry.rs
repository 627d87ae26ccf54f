//! Per-kind side tables

use std::{collections::HashMap, marker::PhantomData};

use crate::{
    error::{Error, Result},
    id::{PageId, ResourceId},
};

/// Maps identifiers of one kind to the records that realize them
///
/// Identifiers are handed out densely, starting at 0.
#[derive(Debug)]
pub struct Registry<I, T> {
    entries: Vec<T>,
    _kind: PhantomData<I>,
}

impl<I, T> Default for Registry<I, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            _kind: PhantomData,
        }
    }
}

impl<I: ResourceId, T> Registry<I, T> {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record and return its identifier
    pub fn register(&mut self, value: T) -> I {
        let id = I::from_raw(self.entries.len() as u32);
        self.entries.push(value);
        id
    }

    /// The identifier the next call to [`Registry::register`] returns
    pub fn next_id(&self) -> I {
        I::from_raw(self.entries.len() as u32)
    }

    /// Look up a record
    pub fn get(&self, id: I) -> Result<&T> {
        self.entries
            .get(id.raw() as usize)
            .ok_or(Error::UnknownResource {
                kind: I::KIND,
                id: id.raw(),
            })
    }

    /// Look up a record for modification
    pub fn get_mut(&mut self, id: I) -> Result<&mut T> {
        self.entries
            .get_mut(id.raw() as usize)
            .ok_or(Error::UnknownResource {
                kind: I::KIND,
                id: id.raw(),
            })
    }

    /// Check whether the identifier was handed out by this registry
    pub fn contains(&self, id: I) -> bool {
        (id.raw() as usize) < self.entries.len()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all records in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, value)| (I::from_raw(index as u32), value))
    }
}

/// Tracks which page a single-use resource was placed on
#[derive(Debug)]
pub struct UsageMap<I> {
    pages: HashMap<I, PageId>,
}

impl<I> Default for UsageMap<I> {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }
}

impl<I: ResourceId> UsageMap<I> {
    /// Fail with [`Error::AlreadyUsed`] if `id` is bound to some page
    pub fn check_unused(&self, id: I) -> Result<()> {
        match self.pages.get(&id) {
            Some(page) => Err(Error::AlreadyUsed {
                kind: I::KIND,
                id: id.raw(),
                page: page.raw(),
            }),
            None => Ok(()),
        }
    }

    /// Bind `id` to `page`
    ///
    /// Binding again to the same page is accepted; a different page is an
    /// [`Error::AlreadyUsed`] and leaves the map unchanged.
    pub fn mark_used(&mut self, id: I, page: PageId) -> Result<()> {
        match self.pages.get(&id) {
            Some(&owner) if owner != page => Err(Error::AlreadyUsed {
                kind: I::KIND,
                id: id.raw(),
                page: owner.raw(),
            }),
            Some(_) => Ok(()),
            None => {
                self.pages.insert(id, page);
                Ok(())
            }
        }
    }

    /// The page `id` was placed on, if any
    pub fn page_of(&self, id: I) -> Option<PageId> {
        self.pages.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{Registry, UsageMap};
    use crate::{
        error::Error,
        id::{FormWidgetId, ImageId, PageId},
    };

    #[test]
    fn test_register_and_get() {
        let mut reg: Registry<ImageId, &str> = Registry::new();
        let a = reg.register("a");
        let b = reg.register("b");
        assert_ne!(a, b);
        assert_eq!(*reg.get(b).unwrap(), "b");
        assert_eq!(reg.next_id(), ImageId::new(2));
        match reg.get(ImageId::new(7)) {
            Err(Error::UnknownResource { kind, id }) => {
                assert_eq!(kind, "Image");
                assert_eq!(id, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mark_used() {
        let mut usage = UsageMap::default();
        let w = FormWidgetId::new(0);
        usage.mark_used(w, PageId::new(0)).unwrap();
        usage.mark_used(w, PageId::new(0)).unwrap();
        assert!(matches!(
            usage.mark_used(w, PageId::new(1)),
            Err(Error::AlreadyUsed { page: 0, .. })
        ));
        assert_eq!(usage.page_of(w), Some(PageId::new(0)));
        assert!(usage.check_unused(FormWidgetId::new(1)).is_ok());
    }
}
