//! Parallel chunking helpers on top of rayon.

use rayon::prelude::*;


/// Multiplier for number of chunks relative to CPU threads.
/// Using 3x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Chunk size splitting `len` items into roughly `threads * 3` chunks, at least 1.
#[inline]
pub fn auto_chunk_size(len: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (len / num_chunks).max(1)
}

/// Extension trait for mutable parallel chunks with automatic sizing and offsets.
pub trait ParChunksMutAuto<T: Send> {
    /// Split into auto-sized mutable chunks yielding `(start_offset, chunk)` pairs.
    fn par_chunks_mut_auto<'a>(
        &'a mut self,
    ) -> impl IndexedParallelIterator<Item = (usize, &'a mut [T])>
    where
        T: 'a;
}

impl<T: Send> ParChunksMutAuto<T> for [T] {
    fn par_chunks_mut_auto<'a>(
        &'a mut self,
    ) -> impl IndexedParallelIterator<Item = (usize, &'a mut [T])>
    where
        T: 'a,
    {
        let chunk_size = auto_chunk_size(self.len());
        self.par_chunks_mut(chunk_size)
            .enumerate()
            .map(move |(idx, chunk)| (idx * chunk_size, chunk))
    }
}

/// Split two equally long slices into matching auto-sized chunks.
///
/// Yields `(start_offset, (a_chunk, b_chunk))`; both chunks cover the same index range.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn par_zip_chunks_mut_auto<'a, A: Send, B: Send>(
    a: &'a mut [A],
    b: &'a mut [B],
) -> impl IndexedParallelIterator<Item = (usize, (&'a mut [A], &'a mut [B]))> {
    assert_eq!(a.len(), b.len(), "Zipped slices must have equal length");
    let chunk_size = auto_chunk_size(a.len());
    a.par_chunks_mut(chunk_size)
        .zip(b.par_chunks_mut(chunk_size))
        .enumerate()
        .map(move |(idx, chunks)| (idx * chunk_size, chunks))
}
