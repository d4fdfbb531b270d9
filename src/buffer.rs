// Powermon - Synthetic power monitoring core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-capacity rolling buffer of recent playback rows.

use crate::table::{Column, Row, Table};
use log::warn;
use std::collections::VecDeque;

/// Number of rows kept for display during simulated playback.
pub const MAX_BUFFER_SIZE: usize = 100;

/// Rolling window over the most recent rows, oldest evicted first.
///
/// The capacity holds from the first append on; a first slice larger than
/// the capacity is trimmed like any other.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    columns: Vec<Column>,
    rows: VecDeque<Row>,
    capacity: usize,
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingBuffer {
    /// Create an empty buffer with [`MAX_BUFFER_SIZE`] capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a slice in arrival order, then evict down to capacity.
    ///
    /// A non-empty slice whose column layout differs from the buffered rows
    /// restarts the buffer from that slice. Empty slices are ignored.
    pub fn append(&mut self, slice: &Table) {
        if slice.is_empty() {
            return;
        }
        if self.columns.as_slice() != slice.columns() {
            if !self.rows.is_empty() {
                warn!(
                    "Column layout changed, restarting buffer ({} rows dropped)",
                    self.rows.len()
                );
            }
            self.rows.clear();
            self.columns = slice.columns().to_vec();
        }

        self.rows.extend(slice.rows().iter().cloned());
        while self.rows.len() > self.capacity {
            self.rows.pop_front();
        }
    }

    /// Drop every buffered row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
    }

    /// Snapshot of the buffered rows as a table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.columns.clone());
        for row in &self.rows {
            table.push_row(row.clone());
        }
        table
    }
}
