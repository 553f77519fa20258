//! Splits encoded data points into transmission-sized chunks.

use std::num::NonZero;
use std::slice;

/// The most data points the backend accepts in one request.
pub const DEFAULT_MAX_CHUNK_SIZE: NonZero<usize> = NonZero::new(20).expect("20 is not zero");

/// Splits `items` into consecutive chunks of at most `max` items.
///
/// Every item lands in exactly one chunk, in the original order. No chunk is empty, so `N` items
/// yield `ceil(N / max)` chunks and an empty slice yields none.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use tally_report::batch;
///
/// let points = (0..45).collect::<Vec<_>>();
/// let sizes = batch::chunks(&points, NonZero::new(20).unwrap())
///     .map(<[_]>::len)
///     .collect::<Vec<_>>();
///
/// assert_eq!(sizes, [20, 20, 5]);
/// ```
pub fn chunks<T>(items: &[T], max: NonZero<usize>) -> Chunks<'_, T> {
    Chunks {
        inner: items.chunks(max.get()),
    }
}

/// Iterator returned by [`chunks()`].
#[derive(Clone, Debug)]
pub struct Chunks<'a, T> {
    inner: slice::Chunks<'a, T>,
}

impl<'a, T> Iterator for Chunks<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Chunks<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn nz(value: usize) -> NonZero<usize> {
        NonZero::new(value).unwrap()
    }

    #[test]
    fn default_ceiling_is_twenty() {
        assert_eq!(DEFAULT_MAX_CHUNK_SIZE.get(), 20);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let items: [u32; 0] = [];

        assert_eq!(chunks(&items, nz(20)).count(), 0);
    }

    #[test]
    fn thirty_items_in_chunks_of_twenty() {
        let items = (0..30).collect::<Vec<_>>();

        let chunks = chunks(&items, DEFAULT_MAX_CHUNK_SIZE).collect::<Vec<_>>();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 20);
        assert_eq!(chunks[1].len(), 10);
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let items = (0..40).collect::<Vec<_>>();

        assert_eq!(chunks(&items, nz(20)).len(), 2);
    }

    #[test]
    fn chunk_count_is_ceiling_of_ratio() {
        for len in 0..=50_usize {
            for max in 1..=7_usize {
                let items = vec![(); len];
                let chunks = chunks(&items, nz(max)).collect::<Vec<_>>();

                assert_eq!(chunks.len(), len.div_ceil(max));
                assert!(chunks.iter().all(|chunk| !chunk.is_empty() && chunk.len() <= max));
                assert_eq!(chunks.iter().map(|chunk| chunk.len()).sum::<usize>(), len);
            }
        }
    }

    #[test]
    fn order_is_preserved() {
        let items = (0..9).collect::<Vec<_>>();

        let flattened = chunks(&items, nz(4)).flatten().copied().collect::<Vec<_>>();

        assert_eq!(flattened, items);
    }
}
