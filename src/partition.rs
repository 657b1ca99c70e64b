//! Splitting a workload into the batches handed to worker tasks.

use serde::Serialize;

use crate::error::FanoutError;

/// A contiguous slice of the workload assigned to one worker task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch<T> {
    /// Position of this batch in partition order
    pub index: usize,
    /// Workload index of the first item
    pub offset: usize,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The batches of a workload plus what a batch cap left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    batches: Vec<Batch<T>>,
    total_items: usize,
    dropped_items: usize,
}

impl<T> Partition<T> {
    pub fn batches(&self) -> &[Batch<T>] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Batch<T>> {
        self.batches
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Items excluded because `max_batches` was smaller than the natural batch count.
    pub fn dropped_items(&self) -> usize {
        self.dropped_items
    }
}

/// Partitions `workload` into batches of `batch_size` items.
///
/// Batch `i` covers `[i * batch_size, (i + 1) * batch_size)`; the last batch
/// may be shorter. When `max_batches` is smaller than the natural batch count
/// only the first `max_batches` batches are kept and the tail of the workload
/// is dropped. The drop is logged and reported through
/// [`Partition::dropped_items`].
pub fn partition<T: Clone>(
    workload: &[T],
    batch_size: usize,
    max_batches: Option<usize>,
) -> Result<Partition<T>, FanoutError> {
    if batch_size == 0 {
        return Err(FanoutError::PartitionMisconfiguration(
            "batch_size must be positive".to_string(),
        ));
    }
    if max_batches == Some(0) {
        return Err(FanoutError::PartitionMisconfiguration(
            "max_batches must be positive when set".to_string(),
        ));
    }

    let num_batches = workload.len().div_ceil(batch_size);
    let kept = max_batches.map_or(num_batches, |cap| cap.min(num_batches));

    let batches: Vec<Batch<T>> = workload
        .chunks(batch_size)
        .take(kept)
        .enumerate()
        .map(|(index, items)| Batch {
            index,
            offset: index * batch_size,
            items: items.to_vec(),
        })
        .collect();

    let covered: usize = batches.iter().map(Batch::len).sum();
    let dropped_items = workload.len() - covered;
    if dropped_items > 0 {
        let total = workload.len();
        log::warn!(
            "batch cap keeps {kept} of {num_batches} batches; {dropped_items} of {total} items will not be dispatched"
        );
    }

    Ok(Partition {
        batches,
        total_items: workload.len(),
        dropped_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn sizes<T>(partition: &Partition<T>) -> Vec<usize> {
        partition.batches().iter().map(Batch::len).collect()
    }

    #[rstest]
    #[case(7, 3, vec![3, 3, 1])]
    #[case(6, 3, vec![3, 3])]
    #[case(2, 5, vec![2])]
    #[case(0, 4, vec![])]
    fn splits_sequentially(#[case] len: usize, #[case] batch_size: usize, #[case] want: Vec<usize>) {
        let workload: Vec<usize> = (0..len).collect();
        let partition = partition(&workload, batch_size, None).unwrap();
        assert_eq!(sizes(&partition), want);
        assert_eq!(partition.dropped_items(), 0);
    }

    #[test]
    fn batch_offsets_track_workload_positions() {
        let workload: Vec<usize> = (0..7).collect();
        let partition = partition(&workload, 3, None).unwrap();
        let offsets: Vec<usize> = partition.batches().iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
        assert_eq!(partition.batches()[2].items, vec![6]);
    }

    #[test]
    fn cap_drops_tail_items() {
        let workload: Vec<usize> = (0..10).collect();
        let partition = partition(&workload, 3, Some(2)).unwrap();
        assert_eq!(sizes(&partition), vec![3, 3]);
        assert_eq!(partition.dropped_items(), 4);
        let kept: Vec<usize> = partition
            .batches()
            .iter()
            .flat_map(|b| b.items.iter().copied())
            .collect();
        assert_eq!(kept, vec![0, 1, 2, 3, 4, 5]);
        assert!(!kept.contains(&6));
        assert!(!kept.contains(&9));
    }

    #[test]
    fn cap_larger_than_batch_count_keeps_everything() {
        let workload: Vec<usize> = (0..7).collect();
        let partition = partition(&workload, 3, Some(5)).unwrap();
        assert_eq!(sizes(&partition), vec![3, 3, 1]);
        assert_eq!(partition.dropped_items(), 0);
    }

    #[rstest]
    #[case(0, None)]
    #[case(3, Some(0))]
    fn rejects_non_positive_sizes(#[case] batch_size: usize, #[case] cap: Option<usize>) {
        let err = partition(&[1, 2, 3], batch_size, cap).unwrap_err();
        assert!(matches!(err, FanoutError::PartitionMisconfiguration(_)));
    }

    proptest! {
        #[test]
        fn concatenation_reproduces_workload(
            workload in prop::collection::vec(any::<u16>(), 1..200),
            batch_size in 1usize..40,
        ) {
            let partition = partition(&workload, batch_size, None).unwrap();
            let joined: Vec<u16> = partition
                .batches()
                .iter()
                .flat_map(|b| b.items.iter().copied())
                .collect();
            prop_assert_eq!(joined, workload.clone());
            prop_assert_eq!(partition.batches().len(), workload.len().div_ceil(batch_size));
        }

        #[test]
        fn capped_partition_keeps_exactly_max_batches(
            workload in prop::collection::vec(any::<u8>(), 1..200),
            batch_size in 1usize..20,
            cap in 1usize..10,
        ) {
            let natural = workload.len().div_ceil(batch_size);
            prop_assume!(cap < natural);
            let partition = partition(&workload, batch_size, Some(cap)).unwrap();
            prop_assert_eq!(partition.batches().len(), cap);
            prop_assert_eq!(partition.dropped_items(), workload.len() - cap * batch_size);
        }
    }
}
