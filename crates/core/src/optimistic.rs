//! Optimistic list mutations with snapshot rollback.
//!
//! The pattern: take a [`Snapshot`], apply the change locally, call the
//! server, then either [`OptimisticList::restore`] the snapshot or replace the
//! speculative item with the server's copy.

/// An immutable copy of a list taken before a speculative change.
#[derive(Debug, Clone)]
pub struct Snapshot<T>(Vec<T>);

#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    items: Vec<T>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot(self.items.clone())
    }

    /// Roll back to `snapshot`. A plain assignment, no diffing.
    pub fn restore(&mut self, snapshot: Snapshot<T>) {
        self.items = snapshot.0;
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Replace the first item matching `pred`. Returns `false` if none did.
    pub fn replace_where(&mut self, pred: impl Fn(&T) -> bool, item: T) -> bool {
        match self.items.iter_mut().find(|existing| pred(existing)) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Remove and return the first item matching `pred`.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(pred)?;
        Some(self.items.remove(index))
    }
}
