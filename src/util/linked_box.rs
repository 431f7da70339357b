use std::collections::VecDeque;

/// A bounded FIFO buffer backed by a `VecDeque`.
///
/// New elements are appended at the back. Once the capacity is exceeded, the oldest
/// element at the front is evicted, so iteration always yields oldest-to-newest.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedBox<T> {
    /// `VecDeque` holding the actual data, oldest element first
    list: VecDeque<T>,
    /// Maximum number of retained elements
    size: usize,
}

impl<T> LinkedBox<T> {
    /// Creates a new, empty `LinkedBox` retaining at most `size` elements.
    pub fn new(size: usize) -> Self { Self { list: VecDeque::with_capacity(size + 1), size } }

    /// Appends an element, evicting the oldest one if the size limit is exceeded.
    ///
    /// # Returns
    /// The evicted element, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.list.push_back(item);
        if self.list.len() > self.size { self.list.pop_front() } else { None }
    }

    /// Iterates over the `n` most recent elements, oldest of those first.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &T> {
        self.list.iter().skip(self.list.len().saturating_sub(n))
    }

    /// Removes all elements while keeping the size limit.
    pub fn clear(&mut self) { self.list.clear(); }

    /// Returns the current number of elements.
    pub fn len(&self) -> usize { self.list.len() }

    /// Checks if the box is empty.
    pub fn is_empty(&self) -> bool { self.list.is_empty() }
}
