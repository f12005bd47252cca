use std::ops::{Index, IndexMut};

/// A resizable sequence indexed modulo its length.
///
/// Indices are signed so that walking backwards past the start wraps to the
/// end. Positions are plain integers and are never cached across mutations:
/// after an `insert` or `remove`, callers recompute the indices they need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircularVec<T> {
    items: Vec<T>,
}

impl<T> CircularVec<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maps a signed position onto `0..len`.
    ///
    /// Returns 0 for an empty sequence.
    #[must_use]
    pub fn wrap(&self, idx: isize) -> usize {
        let n = self.items.len();
        if n == 0 {
            return 0;
        }
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let wrapped = idx.rem_euclid(n as isize) as usize;
        wrapped
    }

    #[must_use]
    pub fn next(&self, idx: usize) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (idx + 1) % self.items.len()
        }
    }

    #[must_use]
    pub fn prev(&self, idx: usize) -> usize {
        let n = self.items.len();
        if n == 0 {
            0
        } else {
            (idx + n - 1) % n
        }
    }

    /// Element at a signed, wrapped position.
    #[must_use]
    pub fn at(&self, idx: isize) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(self.wrap(idx))
    }

    /// Inserts before the wrapped position `idx`; `idx == len` appends.
    pub fn insert(&mut self, idx: usize, item: T) {
        let pos = if idx >= self.items.len() {
            self.items.len()
        } else {
            idx
        };
        self.items.insert(pos, item);
    }

    /// Removes the element at the wrapped position `idx`.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let pos = idx % self.items.len();
        Some(self.items.remove(pos))
    }

    /// Replaces the elements strictly between `from` and `to` (walking forward,
    /// wrapping) with `item`, returning the index at which `item` now lives.
    ///
    /// If `from == to` the walk covers the whole cycle except `from`.
    pub fn replace_between(&mut self, from: usize, to: usize, item: T) -> usize {
        let n = self.items.len();
        if n == 0 {
            self.items.push(item);
            return 0;
        }
        let from = from % n;
        let to = to % n;

        // Number of elements strictly inside the forward span.
        let inner = (to + n - from - 1) % n;

        let mut item = Some(item);
        let mut kept = Vec::with_capacity(n - inner + 1);
        let mut at = 0;
        for (i, x) in std::mem::take(&mut self.items).into_iter().enumerate() {
            let offset = (i + n - from) % n;
            if (1..=inner).contains(&offset) {
                continue;
            }
            kept.push(x);
            if i == from {
                if let Some(v) = item.take() {
                    at = kept.len();
                    kept.push(v);
                }
            }
        }
        self.items = kept;
        at
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Index<usize> for CircularVec<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.items[idx % self.items.len()]
    }
}

impl<T> IndexMut<usize> for CircularVec<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        let n = self.items.len();
        &mut self.items[idx % n]
    }
}

impl<T> From<Vec<T>> for CircularVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn wraps_negative_and_large_indices() {
        let c = CircularVec::new(vec![10, 20, 30]);
        assert_eq!(c.wrap(-1), 2);
        assert_eq!(c.wrap(4), 1);
        assert_eq!(*c.at(-4).unwrap(), 30);
        assert_eq!(c[5], 30);
        assert_eq!(c.next(2), 0);
        assert_eq!(c.prev(0), 2);
    }

    #[test]
    fn replace_between_inside() {
        let mut c = CircularVec::new(vec![0, 1, 2, 3, 4]);
        let at = c.replace_between(1, 4, 9);
        assert_eq!(c.as_slice(), &[0, 1, 9, 4]);
        assert_eq!(at, 2);
    }

    #[test]
    fn replace_between_wrapping() {
        let mut c = CircularVec::new(vec![0, 1, 2, 3, 4]);
        let at = c.replace_between(3, 1, 9);
        assert_eq!(c.as_slice(), &[1, 2, 3, 9]);
        assert_eq!(c[at], 9);
    }

    #[test]
    fn replace_between_adjacent_inserts() {
        let mut c = CircularVec::new(vec![0, 1, 2]);
        let at = c.replace_between(2, 0, 7);
        assert_eq!(c.as_slice(), &[0, 1, 2, 7]);
        assert_eq!(at, 3);
    }
}
