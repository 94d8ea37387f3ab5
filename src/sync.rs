//! Turning drained dirty ranges into device upload operations.
//!
//! This part has no GL dependency: it decides *what* to transfer. The
//! `device` module (behind the `glow` feature) carries the plan out.

use std::ops::Range;

use crate::range_set::ByteRangeSet;

/// One column's state as of the end of a reconcile pass.
#[derive(Debug, Clone)]
pub struct ColumnSnapshot<'a> {
    /// Every valid byte of the host column.
    pub bytes: &'a [u8],
    /// Host allocation in bytes. A device buffer sized to this can absorb
    /// growth up to the host's next reallocation without being recreated.
    pub capacity_bytes: usize,
    /// Ranges written since the previous snapshot of this column.
    pub dirty: ByteRangeSet,
}

impl ColumnSnapshot<'_> {
    /// Work needed to bring a device buffer of `device_size_bytes` in line
    /// with this column.
    pub fn plan(&self, device_size_bytes: usize) -> UploadPlan {
        plan_uploads(
            &self.dirty,
            self.bytes.len(),
            self.capacity_bytes,
            device_size_bytes,
        )
    }
}

/// Upload work for one device buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// The device copy is already current.
    Unchanged,
    /// Upload each range in place; the device allocation is big enough.
    Ranges(Vec<Range<usize>>),
    /// Recreate the device storage at `size_bytes`, then upload the first
    /// `upload_bytes` bytes of the host column.
    Reallocate {
        /// New device allocation size.
        size_bytes: usize,
        /// Length of the valid host prefix to upload.
        upload_bytes: usize,
    },
}

impl UploadPlan {
    /// Total bytes this plan transfers.
    pub fn transfer_bytes(&self) -> usize {
        match self {
            Self::Unchanged => 0,
            Self::Ranges(ranges) => ranges.iter().map(ExactSizeIterator::len).sum(),
            Self::Reallocate { upload_bytes, .. } => *upload_bytes,
        }
    }
}

/// Decide how to sync a device buffer holding `device_size_bytes` with a
/// host column holding `host_len_bytes` valid bytes.
///
/// Ranges are clipped to the valid host region. When the host has outgrown
/// the device allocation, the whole valid region is uploaded into fresh
/// storage sized to the host capacity, so later appends can reuse it.
pub fn plan_uploads(
    dirty: &ByteRangeSet,
    host_len_bytes: usize,
    host_capacity_bytes: usize,
    device_size_bytes: usize,
) -> UploadPlan {
    if host_len_bytes > device_size_bytes {
        return UploadPlan::Reallocate {
            size_bytes: host_capacity_bytes.max(host_len_bytes),
            upload_bytes: host_len_bytes,
        };
    }

    let ranges: Vec<_> = dirty
        .ranges()
        .map(|r| r.start..r.end.min(host_len_bytes))
        .filter(|r| !r.is_empty())
        .collect();

    if ranges.is_empty() {
        UploadPlan::Unchanged
    } else {
        UploadPlan::Ranges(ranges)
    }
}
