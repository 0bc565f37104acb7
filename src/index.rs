use std::{fmt::Debug, hash::Hash, marker::PhantomData};

/// A trait to be implemented by any "index-like" types
pub trait Index: Copy + 'static + Eq + PartialEq + Debug + Hash {
    fn new(idx: usize) -> Self;

    fn index(self) -> usize;
}

/// Declares a `u32` newtype usable as the key of an [`IndexVec`]
#[macro_export]
macro_rules! simple_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
        $vis struct $name(u32);

        impl $crate::index::Index for $name {
            fn new(idx: usize) -> Self {
                Self(idx as _)
            }

            fn index(self) -> usize {
                self.0 as _
            }
        }
    };
}

/// An arena of `T` addressed by a typed index instead of a bare `usize`
pub struct IndexVec<I: Index, T> {
    raw: Vec<T>,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Index, T> IndexVec<I, T> {
    /// Constructs a new, empty `IndexVec<I, T>`.
    #[inline]
    pub const fn new() -> Self {
        IndexVec {
            raw: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Pushes an element to the array returning the index where it was pushed to.
    #[inline]
    pub fn push(&mut self, d: T) -> I {
        let idx = self.next_index();
        self.raw.push(d);
        idx
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.raw.iter()
    }

    pub fn indices(&self) -> impl Iterator<Item = I> + use<I, T> {
        (0..self.len()).map(|n| I::new(n))
    }

    pub fn enumerate(&self) -> impl Iterator<Item = (I, &'_ T)> {
        self.raw.iter().enumerate().map(|(i, v)| (I::new(i), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Gives the next index that will be assigned when `push` is called.
    #[inline]
    pub fn next_index(&self) -> I {
        I::new(self.len())
    }

    #[inline]
    pub fn get(&self, index: I) -> Option<&T> {
        self.raw.get(index.index())
    }

    #[inline]
    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.raw.get_mut(index.index())
    }
}

impl<I: Index, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Index, T: Debug> Debug for IndexVec<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.enumerate()).finish()
    }
}

impl<I: Index, T> core::ops::Index<I> for IndexVec<I, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: I) -> &Self::Output {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {index:?} out of bounds (len = {})", self.len()),
        }
    }
}

impl<I: Index, T> core::ops::IndexMut<I> for IndexVec<I, T> {
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index {index:?} out of bounds (len = {len})"),
        }
    }
}
