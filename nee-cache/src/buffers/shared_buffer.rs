use std::any;
use std::marker::PhantomData;
use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};

use bytemuck::Pod;

use crate::gpu::Storage;

/// Buffer of `T`s that many threads can read and write at once.
///
/// Items are stored as words of relaxed atomics; a read racing with a write
/// may observe a torn item (some words old, some new) and read-modify-write
/// sequences may lose updates, which is fine for the structures that live
/// here - but unlike a plain slice shared between threads, it's not UB.
pub struct SharedBuffer<T> {
    words: Vec<AtomicU32>,
    _marker: PhantomData<T>,
}

impl<T> SharedBuffer<T>
where
    T: Pod,
{
    const WORDS: usize = {
        assert!(mem::size_of::<T>() % 4 == 0);

        mem::size_of::<T>() / 4
    };

    pub fn new(label: impl AsRef<str>, len: usize) -> Self {
        let label = label.as_ref();

        log::info!(
            "Allocating shared buffer `{label}`; ty={}, len={len}",
            any::type_name::<T>(),
        );

        Self {
            words: (0..len * Self::WORDS).map(|_| AtomicU32::new(0)).collect(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len() / Self::WORDS
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn view(&self) -> SharedView<'_, T> {
        SharedView { buffer: self }
    }

    pub fn load(&self, idx: usize) -> T {
        let mut value = T::zeroed();
        let words = &self.words[idx * Self::WORDS..][..Self::WORDS];

        for (bytes, word) in bytemuck::bytes_of_mut(&mut value)
            .chunks_exact_mut(4)
            .zip(words)
        {
            bytes.copy_from_slice(&word.load(Ordering::Relaxed).to_ne_bytes());
        }

        value
    }

    pub fn store(&self, idx: usize, value: T) {
        let words = &self.words[idx * Self::WORDS..][..Self::WORDS];
        let bytes = bytemuck::bytes_of(&value);

        for (bytes, word) in bytes.chunks_exact(4).zip(words) {
            let mut buf = [0; 4];

            buf.copy_from_slice(bytes);
            word.store(u32::from_ne_bytes(buf), Ordering::Relaxed);
        }
    }

    /// Zeroes the entire buffer.
    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len()).map(|idx| self.load(idx)).collect()
    }
}

/// Handle through which the pass accesses a [`SharedBuffer`]; each task
/// creates its own.
pub struct SharedView<'a, T> {
    buffer: &'a SharedBuffer<T>,
}

impl<T> Clone for SharedView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedView<'_, T> {}

impl<T> Storage<T> for SharedView<'_, T>
where
    T: Pod,
{
    fn load(&self, idx: usize) -> T {
        self.buffer.load(idx)
    }

    fn store(&mut self, idx: usize, value: T) {
        self.buffer.store(idx, value);
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}
