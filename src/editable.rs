//! Host-side growable buffer that records every write as a dirty byte range.

use std::mem::size_of;

use bytemuck::Pod;

use crate::error::{LineStripError, Result};
use crate::range_set::ByteRangeSet;

/// Minimum element capacity applied on reallocation.
pub const DEFAULT_MIN_CAPACITY: usize = 64;

/// A resizable host buffer of `T` whose writes are tracked for upload.
///
/// Writes go through [`edit`](Self::edit), which hands out a bounded mutable
/// window and marks the window's bytes dirty. The window borrows the buffer,
/// so it cannot be held across a reallocation. Dirty ranges are stored as
/// byte offsets from the start of the buffer and therefore stay valid when
/// the backing storage moves.
#[derive(Debug)]
pub struct EditableBuffer<T: Pod> {
    host: Vec<T>,
    dirty: ByteRangeSet,
    min_capacity: usize,
    label: &'static str,
    disposed: bool,
}

impl<T: Pod> EditableBuffer<T> {
    /// Create a buffer with room for `capacity` elements.
    pub fn with_capacity(label: &'static str, capacity: usize) -> Result<Self> {
        let mut buffer = Self {
            host: Vec::new(),
            dirty: ByteRangeSet::new(),
            min_capacity: DEFAULT_MIN_CAPACITY,
            label,
            disposed: false,
        };
        buffer.reserve_total(capacity)?;
        Ok(buffer)
    }

    /// Override the floor used when the buffer reallocates.
    #[must_use]
    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity.max(1);
        self
    }

    /// Number of valid elements.
    pub fn len(&self) -> usize {
        self.host.len()
    }

    /// Whether the buffer holds no valid elements.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    /// Allocated capacity in elements.
    pub fn capacity(&self) -> usize {
        self.host.capacity()
    }

    /// Number of valid bytes.
    pub fn size_bytes(&self) -> usize {
        self.host.len() * size_of::<T>()
    }

    /// Allocated capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.host.capacity() * size_of::<T>()
    }

    /// Name used in log lines and errors.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Make room for `additional` elements past the current length.
    pub fn ensure_remaining(&mut self, additional: usize) -> Result<()> {
        let required = self
            .host
            .len()
            .checked_add(additional)
            .ok_or_else(|| self.alloc_error("capacity overflow".to_owned()))?;
        self.reserve_total(required)
    }

    /// Make sure the capacity is at least `required` elements, growing
    /// geometrically if it is not.
    pub fn reserve_total(&mut self, required: usize) -> Result<()> {
        self.check_live()?;
        let capacity = self.host.capacity();
        if required <= capacity {
            return Ok(());
        }

        let target = required
            .max(capacity.saturating_mul(2))
            .max(self.min_capacity);
        self.host
            .try_reserve_exact(target - self.host.len())
            .map_err(|e| self.alloc_error(e.to_string()))?;

        tracing::debug!(
            buffer = self.label,
            old_capacity = capacity,
            new_capacity = self.host.capacity(),
            "grew host buffer"
        );
        Ok(())
    }

    /// Return a writable window over elements `[offset, offset + count)`.
    ///
    /// The buffer's length is extended to cover the window if needed; any
    /// gap between the old length and `offset` is zero-filled. The window,
    /// and any zero-filled gap, are marked dirty before this returns, so the
    /// caller is expected to write every element of the window.
    pub fn edit(&mut self, offset: usize, count: usize) -> Result<&mut [T]> {
        self.check_live()?;
        let end = offset.checked_add(count).ok_or(LineStripError::Index {
            index: offset,
            reason: "edit range overflows",
        })?;

        let old_len = self.host.len();
        if end > old_len {
            self.reserve_total(end)?;
            self.host.resize(end, T::zeroed());
        }

        let stride = size_of::<T>();
        self.dirty
            .mark_dirty(offset.min(old_len) * stride, end * stride);
        Ok(&mut self.host[offset..end])
    }

    /// Like [`edit`](Self::edit), but the returned window also starts with
    /// the element before `offset` (when there is one). That element is
    /// readable and writable but is not marked dirty.
    pub fn edit_with_predecessor(&mut self, offset: usize, count: usize) -> Result<&mut [T]> {
        self.edit(offset, count)?;
        let start = offset.saturating_sub(1);
        Ok(&mut self.host[start..offset + count])
    }

    /// Read-only view of every valid element.
    pub fn host(&self) -> &[T] {
        &self.host
    }

    /// Byte view of every valid element, as the device would receive it.
    pub fn host_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.host)
    }

    /// Byte ranges written since the last [`take_dirty`](Self::take_dirty).
    pub fn dirty_byte_ranges(&self) -> &ByteRangeSet {
        &self.dirty
    }

    /// Hand over the pending dirty ranges and start tracking afresh.
    pub fn take_dirty(&mut self) -> ByteRangeSet {
        self.dirty.take()
    }

    /// Release the backing storage. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.host = Vec::new();
        self.dirty.clear();
        self.disposed = true;
        tracing::debug!(buffer = self.label, "disposed host buffer");
    }

    fn check_live(&self) -> Result<()> {
        if self.disposed {
            Err(LineStripError::Disposed(self.label))
        } else {
            Ok(())
        }
    }

    fn alloc_error(&self, reason: String) -> LineStripError {
        LineStripError::AllocationFailure {
            what: self.label,
            reason,
        }
    }
}
