//! Mapping from a requested record number to the batch that contains it.
//!
//! Records are numbered from 1 in the collection's timestamp-descending
//! order. Documents are fetched a whole batch at a time so the page can
//! step through the neighbouring records without another round trip.
//!
//! The batch is addressed by offset, so the backend still walks every
//! skipped document. That cost grows with the record number and is
//! accepted for the small collections this viewer targets.

use serde::Serialize;

use crate::document::DocumentRecord;

/// The contiguous slice of a collection that holds one requested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    /// Number of documents to skip; always a multiple of the batch size.
    pub offset: usize,
    /// Number of documents to fetch (the batch size).
    pub limit: usize,
    /// Position of the requested record within the batch, 0-based.
    pub index_in_batch: usize,
}

impl BatchWindow {
    /// Compute the window for a 1-based record number.
    ///
    /// A record number of 0 is treated as 1 and a batch size of 0 as 1.
    pub fn for_record(record: usize, batch_size: usize) -> Self {
        let record = record.max(1);
        let batch_size = batch_size.max(1);
        let position = record - 1;
        let offset = (position / batch_size) * batch_size;

        Self {
            offset,
            limit: batch_size,
            index_in_batch: position - offset,
        }
    }

    /// The 1-based record number of the first document in the batch.
    pub fn first_record(&self) -> usize {
        self.offset + 1
    }
}

/// Everything the collection page needs to render one record.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// Collection being browsed.
    pub collection: String,
    /// Requested record number, 1-based.
    pub record: usize,
    /// Total documents in the collection (0 when the count failed).
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
    /// 1-based record number of the first document in `docs`.
    pub batch_start: usize,
    /// The fetched batch.
    pub docs: Vec<DocumentRecord>,
    /// The requested record, or `None` when it lies past the fetched batch.
    pub current: Option<DocumentRecord>,
}

impl PageView {
    /// Assemble the view for `record` from the batch fetched for `window`.
    pub fn new(
        collection: impl Into<String>,
        record: usize,
        total: u64,
        window: BatchWindow,
        docs: Vec<DocumentRecord>,
    ) -> Self {
        let record = record.max(1);
        let current = docs.get(window.index_in_batch).cloned();

        Self {
            collection: collection.into(),
            record,
            total,
            has_prev: record > 1,
            has_next: (record as u64) < total,
            batch_start: window.first_record(),
            docs,
            current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<DocumentRecord> {
        (0..n)
            .map(|i| DocumentRecord {
                id: format!("doc{}", i),
                json: "{}".to_string(),
                timestamp: String::new(),
            })
            .collect()
    }

    #[test]
    fn record_25_of_batch_10() {
        let window = BatchWindow::for_record(25, 10);
        assert_eq!(window.offset, 20);
        assert_eq!(window.limit, 10);
        assert_eq!(window.index_in_batch, 4);
        assert_eq!(window.first_record(), 21);
    }

    #[test]
    fn batch_boundaries() {
        assert_eq!(BatchWindow::for_record(1, 25).offset, 0);
        assert_eq!(BatchWindow::for_record(25, 25).offset, 0);
        assert_eq!(BatchWindow::for_record(25, 25).index_in_batch, 24);
        assert_eq!(BatchWindow::for_record(26, 25).offset, 25);
        assert_eq!(BatchWindow::for_record(26, 25).index_in_batch, 0);
    }

    #[test]
    fn window_invariants_hold() {
        for b in 1..=12 {
            for r in 1..=200 {
                let w = BatchWindow::for_record(r, b);
                assert_eq!(w.offset % b, 0, "r={} b={}", r, b);
                assert!(w.offset <= r - 1 && r - 1 < w.offset + b, "r={} b={}", r, b);
                assert_eq!(w.index_in_batch, (r - 1) % b);
            }
        }
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        assert_eq!(BatchWindow::for_record(0, 10), BatchWindow::for_record(1, 10));
        let w = BatchWindow::for_record(3, 0);
        assert_eq!(w.limit, 1);
        assert_eq!(w.offset, 2);
    }

    #[test]
    fn view_selects_current_record() {
        let window = BatchWindow::for_record(13, 5);
        let view = PageView::new("logs", 13, 40, window, records(5));

        assert_eq!(view.batch_start, 11);
        assert_eq!(view.current.as_ref().map(|d| d.id.as_str()), Some("doc2"));
        assert!(view.has_prev);
        assert!(view.has_next);
    }

    #[test]
    fn prev_and_next_flags() {
        let window = BatchWindow::for_record(1, 5);
        let first = PageView::new("logs", 1, 3, window, records(3));
        assert!(!first.has_prev);
        assert!(first.has_next);

        let window = BatchWindow::for_record(3, 5);
        let last = PageView::new("logs", 3, 3, window, records(3));
        assert!(last.has_prev);
        assert!(!last.has_next);
    }

    #[test]
    fn record_past_total_renders_blank() {
        let window = BatchWindow::for_record(9, 5);
        let view = PageView::new("logs", 9, 7, window, records(2));

        assert!(view.current.is_none());
        assert!(!view.has_next);
        assert_eq!(view.docs.len(), 2);
    }

    #[test]
    fn unknown_total_disables_next() {
        let window = BatchWindow::for_record(1, 5);
        let view = PageView::new("logs", 1, 0, window, records(5));
        assert!(!view.has_next);
        assert!(view.current.is_some());
    }
}
