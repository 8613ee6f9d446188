use spirv_std::arch::IndexUnchecked;

/// Buffer shared between all invocations of a pass.
///
/// There's no synchronization here: two invocations doing a read-modify-write
/// on the same index can lose one of the updates. Structures built on top of
/// this (the NEE cache, training vertices) are statistical estimators that
/// recover from such losses over the next frames.
pub trait Storage<T>
where
    T: Copy,
{
    fn load(&self, idx: usize) -> T;
    fn store(&mut self, idx: usize, value: T);
    fn len(&self) -> usize;
}

impl<T> Storage<T> for [T]
where
    T: Copy,
{
    fn load(&self, idx: usize) -> T {
        unsafe { *self.index_unchecked(idx) }
    }

    fn store(&mut self, idx: usize, value: T) {
        unsafe {
            *self.index_unchecked_mut(idx) = value;
        }
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }
}
