//! The line strip: a growable polyline stored as three slot-aligned columns
//! (position, connectivity flags, mileage) with phantom end slots.
//!
//! A strip of logical size `N` occupies `N + 2` actual slots. Slot 0 is a
//! leading phantom that mirrors the first vertex, slots `1..=N` hold the
//! vertices, and slot `N + 1` is a trailing phantom that mirrors the last
//! vertex. The phantoms give the vertex shader a direction vector at both
//! ends of the line without special cases.
//!
//! Writes only touch the position column. [`LineStrip::reconcile`] brings the
//! phantoms, flags and mileage up to date for whatever was written since the
//! previous pass and hands back the dirty byte ranges of each column, so the
//! device copy can be patched rather than re-uploaded.

use std::mem::size_of;
use std::ops::Range;

use bytemuck::Pod;

use crate::config::LineStripConfig;
use crate::editable::EditableBuffer;
use crate::error::{LineStripError, Result};
use crate::mileage::update_mileage;
use crate::sync::ColumnSnapshot;
use crate::types::{LineFlags, Position};

/// Size of one slot in the position column.
const XY_STRIDE: usize = size_of::<Position>();

/// Largest logical size whose position column still fits GL's `i32` byte
/// offsets.
#[allow(clippy::cast_sign_loss)]
pub const MAX_LOGICAL_SIZE: usize = (i32::MAX as usize / XY_STRIDE) - 2;

/// Actual slot holding logical vertex `logical_index`.
pub const fn logical_to_actual_index(logical_index: usize) -> usize {
    logical_index + 1
}

/// Slots needed to store `logical_size` vertices.
pub const fn logical_to_actual_size(logical_size: usize) -> usize {
    if logical_size == 0 {
        0
    } else {
        logical_size + 2
    }
}

/// Vertices stored in `actual_size` slots.
pub const fn actual_to_logical_size(actual_size: usize) -> usize {
    if actual_size == 0 {
        0
    } else {
        actual_size - 2
    }
}

/// A polyline whose vertex attributes are kept in sync incrementally.
///
/// # Example
///
/// ```
/// # use line_strip_glow::{LineStrip, Position};
/// let mut strip = LineStrip::new(4)?;
/// strip.edit(0, 3)?.copy_from_slice(&[
///     Position::new(0.0, 0.0),
///     Position::new(1.0, 0.0),
///     Position::new(2.0, 0.0),
/// ]);
///
/// let snapshot = strip.reconcile(true, 1.0)?;
/// assert_eq!(snapshot.actual_size(), 5);
/// assert_eq!(strip.mileage(), &[0.0, 0.0, 1.0, 2.0, 2.0]);
/// # Ok::<(), line_strip_glow::LineStripError>(())
/// ```
#[derive(Debug)]
pub struct LineStrip {
    xy: EditableBuffer<Position>,
    flags: EditableBuffer<u8>,
    mileage: EditableBuffer<f32>,

    logical_size: usize,
    config: LineStripConfig,

    /// Lowest slot whose position changed since mileage was last computed.
    mileage_stale_from: Option<usize>,
    /// Aspect ratio the stored mileage was computed with.
    mileage_aspect: Option<f64>,
}

/// What the device copy of a strip should contain after a reconcile pass.
#[derive(Debug, Clone)]
pub struct StripSnapshot<'a> {
    /// Logical size at the time of the snapshot.
    pub logical_size: usize,
    /// Position column.
    pub xy: ColumnSnapshot<'a>,
    /// Flag column.
    pub flags: ColumnSnapshot<'a>,
    /// Mileage column, present only when it was requested.
    pub mileage: Option<ColumnSnapshot<'a>>,
}

impl StripSnapshot<'_> {
    /// Slots to draw.
    pub fn actual_size(&self) -> usize {
        logical_to_actual_size(self.logical_size)
    }
}

impl LineStrip {
    /// Create an empty strip with room for `logical_capacity` vertices.
    pub fn new(logical_capacity: usize) -> Result<Self> {
        Self::with_config(LineStripConfig::with_capacity(logical_capacity))
    }

    /// Create an empty strip sized and tuned by `config`.
    pub fn with_config(config: LineStripConfig) -> Result<Self> {
        let actual_capacity = logical_to_actual_size(config.initial_capacity);
        let min = config.min_buffer_capacity;
        Ok(Self {
            xy: column("xy", actual_capacity, min)?,
            flags: column("flags", actual_capacity, min)?,
            mileage: column("mileage", actual_capacity, min)?,
            logical_size: 0,
            config,
            mileage_stale_from: None,
            mileage_aspect: None,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &LineStripConfig {
        &self.config
    }

    /// Number of vertices.
    pub fn logical_size(&self) -> usize {
        self.logical_size
    }

    /// Number of slots, phantoms included.
    pub fn actual_size(&self) -> usize {
        logical_to_actual_size(self.logical_size)
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.xy.is_disposed()
    }

    /// Reserve room for `logical_additional` more vertices in every column.
    /// The logical size does not change.
    pub fn grow(&mut self, logical_additional: usize) -> Result<()> {
        self.check_live()?;
        let target = checked_logical_end(self.logical_size, logical_additional)?;
        let actual = logical_to_actual_size(target);
        self.xy.reserve_total(actual)?;
        self.flags.reserve_total(actual)?;
        self.mileage.reserve_total(actual)?;
        Ok(())
    }

    /// Writable positions for logical vertices `[logical_first,
    /// logical_first + logical_count)`.
    ///
    /// The strip grows to cover the window. Vertices skipped over by an edit
    /// that starts past the current end are zero-filled. Every position in the
    /// window is uploaded on the next pass, so all of it should be written.
    pub fn edit(&mut self, logical_first: usize, logical_count: usize) -> Result<&mut [Position]> {
        self.check_live()?;
        let end = checked_logical_end(logical_first, logical_count)?;
        if end > self.logical_size {
            // Reserve up front so the gap fill and the window cannot fail
            // between them.
            self.xy.reserve_total(logical_to_actual_index(end))?;
        }
        if logical_first > self.logical_size {
            // The skipped vertices start at the old trailing phantom's slot.
            self.xy
                .edit(
                    logical_to_actual_index(self.logical_size),
                    logical_first - self.logical_size,
                )?
                .fill(Position::default());
        }
        let window = self
            .xy
            .edit(logical_to_actual_index(logical_first), logical_count)?;
        self.logical_size = self.logical_size.max(end);
        Ok(window)
    }

    /// Writable positions for `logical_count` new vertices at the end.
    pub fn edit_append(&mut self, logical_count: usize) -> Result<&mut [Position]> {
        self.edit(self.logical_size, logical_count)
    }

    /// Append one vertex.
    pub fn push(&mut self, x: f32, y: f32) -> Result<()> {
        self.edit_append(1)?[0] = Position::new(x, y);
        Ok(())
    }

    /// Append vertices from interleaved `x0, y0, x1, y1, ...` coordinates.
    pub fn extend_xy(&mut self, interleaved: &[f32]) -> Result<()> {
        if interleaved.len() % 2 != 0 {
            return Err(LineStripError::InvalidArgument(format!(
                "interleaved xy slice has odd length {}",
                interleaved.len()
            )));
        }
        let window = self.edit_append(interleaved.len() / 2)?;
        for (dst, pair) in window.iter_mut().zip(interleaved.chunks_exact(2)) {
            *dst = Position::new(pair[0], pair[1]);
        }
        Ok(())
    }

    /// Position of logical vertex `logical_index`.
    pub fn position(&self, logical_index: usize) -> Result<Position> {
        self.check_live()?;
        if logical_index >= self.logical_size {
            return Err(LineStripError::Index {
                index: logical_index,
                reason: "past the last vertex",
            });
        }
        self.xy
            .host()
            .get(logical_to_actual_index(logical_index))
            .copied()
            .ok_or(LineStripError::Index {
                index: logical_index,
                reason: "past the last vertex",
            })
    }

    /// Host positions by actual slot, phantoms included.
    pub fn positions(&self) -> &[Position] {
        self.xy.host()
    }

    /// Host flag bytes by actual slot, as of the last reconcile pass.
    pub fn flags(&self) -> &[u8] {
        self.flags.host()
    }

    /// Host mileage by actual slot, as of the last pass that computed it.
    pub fn mileage(&self) -> &[f32] {
        self.mileage.host()
    }

    /// Position byte ranges written since the last reconcile pass.
    pub fn pending_xy_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.xy.dirty_byte_ranges().ranges()
    }

    /// Bring phantoms, flags and (if `need_mileage`) mileage up to date for
    /// everything written since the previous pass, and return what the
    /// device copy should now hold.
    ///
    /// Each column's dirty ranges move into the snapshot, so a second call
    /// with no edits in between reports nothing to upload. All column
    /// growth happens before the first write, so an allocation failure
    /// leaves the strip as it was.
    pub fn reconcile(&mut self, need_mileage: bool, ppv_aspect_ratio: f64) -> Result<StripSnapshot<'_>> {
        self.check_live()?;
        if need_mileage && !(ppv_aspect_ratio.is_finite() && ppv_aspect_ratio > 0.0) {
            return Err(LineStripError::InvalidArgument(format!(
                "aspect ratio must be finite and positive, got {ppv_aspect_ratio}"
            )));
        }

        let actual_size = self.actual_size();
        self.xy.reserve_total(actual_size)?;
        self.flags.reserve_total(actual_size)?;
        if need_mileage {
            self.mileage.reserve_total(actual_size)?;
        }

        if actual_size > 0 {
            let dirty_first = self.update_phantoms_and_flags()?;
            if let Some(first) = dirty_first {
                self.mileage_stale_from =
                    Some(self.mileage_stale_from.map_or(first, |stale| stale.min(first)));
            }
            if need_mileage {
                self.refresh_mileage(ppv_aspect_ratio)?;
            }
        }

        Ok(StripSnapshot {
            logical_size: self.logical_size,
            xy: snapshot_column(&mut self.xy),
            flags: snapshot_column(&mut self.flags),
            mileage: need_mileage.then(|| snapshot_column(&mut self.mileage)),
        })
    }

    /// Release all three columns. Later calls are no-ops; any other call
    /// after this fails with [`LineStripError::Disposed`].
    pub fn dispose(&mut self) {
        self.xy.dispose();
        self.flags.dispose();
        self.mileage.dispose();
        self.mileage_stale_from = None;
        self.mileage_aspect = None;
    }

    /// Rewrite the phantom slots and flags touched by pending position
    /// writes. Returns the lowest dirty slot, if any.
    fn update_phantoms_and_flags(&mut self) -> Result<Option<usize>> {
        let first_visible = logical_to_actual_index(0);
        let last_visible = logical_to_actual_index(self.logical_size - 1);

        let put_leader = self
            .xy
            .dirty_byte_ranges()
            .contains(first_visible * XY_STRIDE);
        if put_leader {
            let leader = self.xy.host()[first_visible];
            self.xy.edit(first_visible - 1, 1)?[0] = leader;
        }

        let put_trailer = self
            .xy
            .dirty_byte_ranges()
            .contains(last_visible * XY_STRIDE);
        if put_trailer {
            let trailer = self.xy.host()[last_visible];
            self.xy.edit(last_visible + 1, 1)?[0] = trailer;
        }

        // When the strip grew, the previous last vertex needs a join and the
        // previous trailing phantom became a real vertex.
        let old_last_visible = self.flags.len().saturating_sub(2);

        let dirty_slots: Vec<Range<usize>> = self
            .xy
            .dirty_byte_ranges()
            .ranges()
            .map(|r| r.start / XY_STRIDE..r.end / XY_STRIDE)
            .collect();

        for slots in &dirty_slots {
            let first = if put_trailer {
                slots.start.min(old_last_visible)
            } else {
                slots.start
            };
            let window = self.flags.edit(first, slots.end - first)?;
            for (offset, flags) in window.iter_mut().enumerate() {
                *flags = LineFlags::for_slot(first + offset, last_visible).bits();
            }
        }

        tracing::trace!(
            logical_size = self.logical_size,
            put_leader,
            put_trailer,
            dirty_slots = ?dirty_slots,
            "reconciled phantoms and flags"
        );
        Ok(dirty_slots.first().map(|r| r.start))
    }

    fn refresh_mileage(&mut self, ppv_aspect_ratio: f64) -> Result<()> {
        let recompute_all = match self.mileage_aspect {
            None => true,
            Some(previous) if self.config.aspect_changed(previous, ppv_aspect_ratio) => {
                tracing::debug!(
                    previous,
                    current = ppv_aspect_ratio,
                    "aspect ratio changed, recomputing all mileage"
                );
                true
            }
            Some(_) => false,
        };
        if recompute_all {
            self.mileage_aspect = Some(ppv_aspect_ratio);
            self.mileage_stale_from = Some(0);
        }

        let Some(stale_from) = self.mileage_stale_from.take() else {
            return Ok(());
        };

        // Chain from the slot before the first stale one, which must already
        // hold a computed value.
        let actual_size = self.actual_size();
        let first_write = stale_from.min(self.mileage.len()).min(actual_size);
        let window_first = first_write.saturating_sub(1);
        let window = self
            .mileage
            .edit_with_predecessor(first_write, actual_size - first_write)?;
        update_mileage(
            &self.xy.host()[window_first..actual_size],
            &self.flags.host()[window_first..actual_size],
            window,
            first_write - window_first,
            false,
            ppv_aspect_ratio,
        );

        tracing::trace!(
            first = first_write,
            end = actual_size,
            "recomputed mileage"
        );
        Ok(())
    }

    fn check_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(LineStripError::Disposed("line strip"))
        } else {
            Ok(())
        }
    }
}

fn column<T: Pod>(label: &'static str, capacity: usize, min_capacity: usize) -> Result<EditableBuffer<T>> {
    let mut buffer = EditableBuffer::with_capacity(label, 0)?.with_min_capacity(min_capacity);
    buffer.reserve_total(capacity)?;
    Ok(buffer)
}

fn snapshot_column<T: Pod>(buffer: &mut EditableBuffer<T>) -> ColumnSnapshot<'_> {
    let dirty = buffer.take_dirty();
    ColumnSnapshot {
        bytes: buffer.host_bytes(),
        capacity_bytes: buffer.capacity_bytes(),
        dirty,
    }
}

fn checked_logical_end(first: usize, count: usize) -> Result<usize> {
    first
        .checked_add(count)
        .filter(|&end| end <= MAX_LOGICAL_SIZE)
        .ok_or(LineStripError::Index {
            index: first,
            reason: "strip would exceed MAX_LOGICAL_SIZE",
        })
}
