//! Block partitioning for parallel loops
//!
//! Splits `[0, loopmax)` into contiguous blocks so that the longest block
//! (the critical path) is as short as `requested` workers allow, and then
//! uses the fewest workers that still achieve that critical path.

use std::ops::Range;

/// Result of partitioning a loop over a number of workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    loopmax: usize,
    block_size: usize,
    workers: usize,
}

/// Partition `[0, loopmax)` among at most `requested` workers.
///
/// `block_size = ceil(loopmax / requested)` and
/// `workers = ceil(loopmax / block_size)`. With `loopmax = 5` and
/// `requested = 4` this yields three blocks of sizes 2, 2 and 1.
///
/// # Panics
///
/// Panics if `loopmax` or `requested` is zero.
pub fn partition(loopmax: usize, requested: usize) -> Partition {
    assert!(loopmax > 0, "spawnloop: loopmax must be positive");
    assert!(requested > 0, "spawnloop: requested worker count must be positive");

    let block_size = loopmax.div_ceil(requested);
    let workers = loopmax.div_ceil(block_size);

    Partition {
        loopmax,
        block_size,
        workers,
    }
}

impl Partition {
    /// Length of the partitioned range
    pub fn loopmax(&self) -> usize {
        self.loopmax
    }

    /// Size of every block except possibly the last
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of workers actually used
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Range covered by worker `thr_num`
    ///
    /// # Panics
    ///
    /// Panics if `thr_num >= self.workers()`.
    pub fn block(&self, thr_num: usize) -> Range<usize> {
        assert!(
            thr_num < self.workers,
            "block {} out of range for {} workers",
            thr_num,
            self.workers
        );
        // min < loopmax for every valid index, so neither side can overflow
        let min = thr_num * self.block_size;
        let max = min + self.block_size.min(self.loopmax - min);
        min..max
    }

    /// All blocks, in worker order
    pub fn blocks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.workers).map(move |thr_num| self.block(thr_num))
    }

    /// Size of the final block, in `[1, block_size]`
    pub fn last_block_len(&self) -> usize {
        self.loopmax - (self.workers - 1) * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_fewer_workers_when_critical_path_allows() {
        let p = partition(5, 4);
        assert_eq!(p.block_size(), 2);
        assert_eq!(p.workers(), 3);
        let sizes: Vec<usize> = p.blocks().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_uneven_tail() {
        let p = partition(17, 4);
        assert_eq!(p.block_size(), 5);
        assert_eq!(p.workers(), 4);
        assert_eq!(p.block(3), 15..17);
        assert_eq!(p.last_block_len(), 2);
    }

    #[test]
    fn test_single_iteration_collapses() {
        let p = partition(1, 100);
        assert_eq!(p.block_size(), 1);
        assert_eq!(p.workers(), 1);
        assert_eq!(p.block(0), 0..1);
    }

    #[test]
    fn test_more_workers_than_needed() {
        let p = partition(3, 1);
        assert_eq!(p.workers(), 1);
        assert_eq!(p.block_size(), 3);

        let p = partition(8, 8);
        assert_eq!(p.workers(), 8);
        assert!(p.blocks().all(|b| b.len() == 1));
    }

    #[test]
    fn test_ranges_near_usize_max() {
        let p = partition(usize::MAX, 2);
        assert_eq!(p.block_size(), 1 << (usize::BITS - 1));
        assert_eq!(p.workers(), 2);
        assert_eq!(p.block(0), 0..p.block_size());
        assert_eq!(p.block(1), p.block_size()..usize::MAX);
        assert_eq!(p.last_block_len(), p.block(1).len());

        let p = partition(usize::MAX, usize::MAX);
        assert_eq!(p.block_size(), 1);
        assert_eq!(p.workers(), usize::MAX);
        assert_eq!(p.block(usize::MAX - 1), usize::MAX - 1..usize::MAX);
        assert_eq!(p.last_block_len(), 1);

        let p = partition(usize::MAX, 3);
        let covered: usize = p.blocks().map(|b| b.len()).sum();
        assert_eq!(covered, usize::MAX);
        assert_eq!(p.blocks().last().map(|b| b.end), Some(usize::MAX));
    }

    #[test]
    #[should_panic(expected = "loopmax must be positive")]
    fn test_zero_loopmax_panics() {
        partition(0, 4);
    }

    #[test]
    #[should_panic(expected = "requested worker count must be positive")]
    fn test_zero_workers_panics() {
        partition(4, 0);
    }
}
