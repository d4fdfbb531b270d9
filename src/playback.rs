// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Playback over a cached batch.
//!
//! Each tick takes exactly `step` rows starting at the cursor, wrapping
//! circularly through the batch, and moves the cursor to
//! `(cursor + step) % len`. With cursor 98 over 100 rows and step 5 the
//! slice is rows 98, 99, 0, 1, 2 and the new cursor is 3.

use crate::table::{Table, TIMESTAMP};
use log::warn;
use serde::{Deserialize, Serialize};

/// Index into the cached batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackCursor(usize);

impl PlaybackCursor {
    pub fn new(position: usize) -> Self {
        Self(position)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    /// Back to the start of the batch.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Take the next `step` rows of `batch` starting at `cursor`.
///
/// Returns the slice and the advanced cursor. An empty batch, a zero step,
/// or a batch without a timestamp column yields an empty slice and leaves
/// the cursor unchanged.
pub fn advance(cursor: PlaybackCursor, batch: &Table, step: usize) -> (Table, PlaybackCursor) {
    let len = batch.len();
    if len == 0 || step == 0 {
        return (batch.take(std::iter::empty()), cursor);
    }
    if !batch.has_column(TIMESTAMP) {
        warn!("Cannot simulate real-time data without a timestamp column");
        return (batch.take(std::iter::empty()), cursor);
    }

    let start = if cursor.0 >= len { 0 } else { cursor.0 };
    let slice = batch.take((0..step).map(|offset| (start + offset) % len));
    (slice, PlaybackCursor((start + step) % len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column, ColumnKind};

    fn batch(len: usize) -> Table {
        let mut table = Table::new(vec![
            Column::new(TIMESTAMP, ColumnKind::Raw),
            Column::new("n", ColumnKind::Float),
        ]);
        for i in 0..len {
            table.push_row(vec![Cell::Null, Cell::Float(i as f64)]);
        }
        table
    }

    fn indices(slice: &Table) -> Vec<usize> {
        slice
            .floats("n")
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap() as usize)
            .collect()
    }

    #[test]
    fn test_advance_empty_batch() {
        let (slice, cursor) = advance(PlaybackCursor::new(0), &Table::empty(), 3);
        assert!(slice.is_empty());
        assert_eq!(cursor, PlaybackCursor::new(0));
    }

    #[test]
    fn test_advance_zero_step() {
        let (slice, cursor) = advance(PlaybackCursor::new(4), &batch(10), 0);
        assert!(slice.is_empty());
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_advance_consecutive() {
        let data = batch(10);
        let (slice, cursor) = advance(PlaybackCursor::new(2), &data, 3);
        assert_eq!(indices(&slice), vec![2, 3, 4]);
        assert_eq!(cursor.position(), 5);
        assert!(slice.same_layout(&data));
    }

    #[test]
    fn test_advance_wraps_circularly() {
        let (slice, cursor) = advance(PlaybackCursor::new(98), &batch(100), 5);
        assert_eq!(indices(&slice), vec![98, 99, 0, 1, 2]);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_advance_resets_out_of_range_cursor() {
        let (slice, cursor) = advance(PlaybackCursor::new(250), &batch(10), 2);
        assert_eq!(indices(&slice), vec![0, 1]);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_advance_step_larger_than_batch() {
        let (slice, cursor) = advance(PlaybackCursor::new(1), &batch(3), 5);
        assert_eq!(indices(&slice), vec![1, 2, 0, 1, 2]);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_advance_requires_timestamp() {
        let mut table = Table::new(vec![Column::new("n", ColumnKind::Float)]);
        table.push_row(vec![Cell::Float(1.0)]);
        let (slice, cursor) = advance(PlaybackCursor::new(0), &table, 1);
        assert!(slice.is_empty());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let data = batch(7);
        let mut cursor = PlaybackCursor::default();
        for _ in 0..7 {
            cursor = advance(cursor, &data, 3).1;
        }
        assert_eq!(cursor.position(), 0);
    }
}
