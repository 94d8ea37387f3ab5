//! OpenGL side: device buffers mirroring a [`LineStrip`]'s columns.
//!
//! Each column gets one `ARRAY_BUFFER`. After a reconcile pass, every buffer
//! receives one `glBufferSubData` per dirty range, or is recreated when the
//! host column has outgrown it.

use std::sync::Arc;

use glow::HasContext;

use crate::error::{LineStripError, Result};
use crate::strip::LineStrip;
use crate::sync::{ColumnSnapshot, UploadPlan};

/// Usage hint for buffers that are patched most frames.
const BUFFER_USAGE: u32 = glow::DYNAMIC_DRAW;

/// Convert a byte count or offset to the `i32` GL expects.
fn gl_int(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| LineStripError::Index {
        index: value,
        reason: "exceeds GL's i32 range",
    })
}

/// Buffer objects to bind as vertex attributes for one draw.
#[derive(Debug, Clone, Copy)]
pub struct LineBufferHandles {
    /// `vec2` positions, one per slot.
    pub xy: glow::Buffer,
    /// One flag byte per slot.
    pub flags: glow::Buffer,
    /// One `float` mileage per slot, when it was requested.
    pub mileage: Option<glow::Buffer>,
    /// Slots to draw, phantoms included.
    pub vertex_count: i32,
}

/// A GL buffer object and the size of its current storage.
#[derive(Debug)]
pub struct DeviceBuffer {
    buffer: glow::Buffer,
    size_bytes: usize,
    label: &'static str,
}

impl DeviceBuffer {
    /// Create an empty buffer object. Storage is allocated on first sync.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    pub unsafe fn new(gl: &glow::Context, label: &'static str) -> Result<Self> {
        let buffer = unsafe { gl.create_buffer() }.map_err(|reason| {
            LineStripError::AllocationFailure {
                what: label,
                reason,
            }
        })?;
        Ok(Self {
            buffer,
            size_bytes: 0,
            label,
        })
    }

    /// The GL buffer name.
    pub fn buffer(&self) -> glow::Buffer {
        self.buffer
    }

    /// Bytes of storage currently allocated on the device.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Bring the device copy in line with `column`. Returns the number of
    /// bytes transferred.
    ///
    /// If the transfer cannot be expressed in GL's `i32` sizes, the buffer is
    /// marked empty so that the next sync re-uploads everything.
    ///
    /// # Safety
    ///
    /// Requires the context this buffer was created with to be current.
    /// Leaves `ARRAY_BUFFER` unbound.
    pub unsafe fn sync(&mut self, gl: &glow::Context, column: &ColumnSnapshot<'_>) -> Result<usize> {
        let plan = column.plan(self.size_bytes);
        let transferred = plan.transfer_bytes();
        let result = unsafe { self.apply(gl, &plan, column.bytes) };
        if result.is_err() {
            self.size_bytes = 0;
        }
        result.map(|()| transferred)
    }

    unsafe fn apply(&mut self, gl: &glow::Context, plan: &UploadPlan, bytes: &[u8]) -> Result<()> {
        match plan {
            UploadPlan::Unchanged => Ok(()),
            UploadPlan::Ranges(ranges) => {
                let offsets = ranges
                    .iter()
                    .map(|r| gl_int(r.start))
                    .collect::<Result<Vec<_>>>()?;
                unsafe {
                    gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffer));
                    for (range, offset) in ranges.iter().zip(offsets) {
                        gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset, &bytes[range.clone()]);
                    }
                    gl.bind_buffer(glow::ARRAY_BUFFER, None);
                }
                tracing::trace!(buffer = self.label, ranges = ranges.len(), "patched device buffer");
                Ok(())
            }
            UploadPlan::Reallocate {
                size_bytes,
                upload_bytes,
            } => {
                #[allow(clippy::cast_sign_loss)]
                let size = (*size_bytes).min(i32::MAX as usize).max(*upload_bytes);
                let gl_size = gl_int(size)?;
                unsafe {
                    gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffer));
                    gl.buffer_data_size(glow::ARRAY_BUFFER, gl_size, BUFFER_USAGE);
                    gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, &bytes[..*upload_bytes]);
                    gl.bind_buffer(glow::ARRAY_BUFFER, None);
                }
                tracing::debug!(
                    buffer = self.label,
                    old_size = self.size_bytes,
                    new_size = size,
                    "reallocated device buffer"
                );
                self.size_bytes = size;
                Ok(())
            }
        }
    }

    /// Delete the buffer object.
    ///
    /// # Safety
    ///
    /// Requires the context this buffer was created with to be current, and
    /// must be called at most once.
    pub unsafe fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_buffer(self.buffer) };
    }
}

/// A [`LineStrip`] paired with the GL buffers that mirror it.
///
/// Feed points through [`strip_mut`](Self::strip_mut), then call
/// [`device_buffers`](Self::device_buffers) once per frame to upload what
/// changed and get the buffers to bind.
///
/// # Example
///
/// ```no_run
/// # use line_strip_glow::{GlLineStrip, LineStrip};
/// # use std::sync::Arc;
/// # fn example(gl: Arc<glow::Context>) -> Result<(), line_strip_glow::LineStripError> {
/// let mut line = unsafe { GlLineStrip::new(gl, LineStrip::new(1024)?) }?;
///
/// // As data arrives:
/// line.strip_mut().push(0.0, 0.0)?;
/// line.strip_mut().push(1.0, 0.5)?;
///
/// // Each frame:
/// let handles = unsafe { line.device_buffers(true, 1.0) }?;
/// # let _ = handles;
///
/// // On teardown:
/// unsafe { line.destroy() };
/// # Ok(())
/// # }
/// ```
pub struct GlLineStrip {
    /// The OpenGL context, shared via [`Arc`] so it can be stored alongside
    /// the buffers that reference it.
    gl: Arc<glow::Context>,
    strip: LineStrip,
    xy: DeviceBuffer,
    flags: DeviceBuffer,
    mileage: DeviceBuffer,
    destroyed: bool,
}

impl GlLineStrip {
    /// Create device buffers for `strip`.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current and valid. The caller must ensure
    /// that [`destroy`](Self::destroy) is called before the context is
    /// dropped.
    pub unsafe fn new(gl: Arc<glow::Context>, strip: LineStrip) -> Result<Self> {
        let xy = unsafe { DeviceBuffer::new(&gl, "xy") }?;
        let flags = match unsafe { DeviceBuffer::new(&gl, "flags") } {
            Ok(flags) => flags,
            Err(e) => {
                unsafe { xy.destroy(&gl) };
                return Err(e);
            }
        };
        let mileage = match unsafe { DeviceBuffer::new(&gl, "mileage") } {
            Ok(mileage) => mileage,
            Err(e) => {
                unsafe {
                    xy.destroy(&gl);
                    flags.destroy(&gl);
                }
                return Err(e);
            }
        };

        Ok(Self {
            gl,
            strip,
            xy,
            flags,
            mileage,
            destroyed: false,
        })
    }

    /// The host-side strip.
    pub fn strip(&self) -> &LineStrip {
        &self.strip
    }

    /// The host-side strip, for edits.
    pub fn strip_mut(&mut self) -> &mut LineStrip {
        &mut self.strip
    }

    /// Reconcile the strip and upload every range that changed.
    ///
    /// `ppv_aspect_ratio` is the view's x/y pixels-per-value ratio; it only
    /// matters when `need_mileage` is set.
    ///
    /// # Safety
    ///
    /// Requires a current GL context matching the one passed to
    /// [`new`](Self::new).
    pub unsafe fn device_buffers(
        &mut self,
        need_mileage: bool,
        ppv_aspect_ratio: f64,
    ) -> Result<LineBufferHandles> {
        if self.destroyed {
            return Err(LineStripError::Disposed("GL line strip"));
        }

        let snapshot = self.strip.reconcile(need_mileage, ppv_aspect_ratio)?;
        let gl = &self.gl;

        // Attempt every column before reporting a failure; the snapshot's
        // dirty ranges are gone once this returns.
        let xy = unsafe { self.xy.sync(gl, &snapshot.xy) };
        let flags = unsafe { self.flags.sync(gl, &snapshot.flags) };
        let mileage = snapshot
            .mileage
            .as_ref()
            .map(|column| unsafe { self.mileage.sync(gl, column) })
            .transpose();
        let transferred = xy? + flags? + mileage?.unwrap_or(0);

        tracing::trace!(
            vertices = snapshot.actual_size(),
            transferred,
            "synced line strip to device"
        );

        Ok(LineBufferHandles {
            xy: self.xy.buffer(),
            flags: self.flags.buffer(),
            mileage: need_mileage.then(|| self.mileage.buffer()),
            vertex_count: gl_int(snapshot.actual_size())?,
        })
    }

    /// Delete the GL buffers and release the host columns. Later calls are
    /// no-ops.
    ///
    /// # Safety
    ///
    /// Must be called with the same GL context that was used to create the
    /// strip.
    pub unsafe fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let gl = &self.gl;
        unsafe {
            self.xy.destroy(gl);
            self.flags.destroy(gl);
            self.mileage.destroy(gl);
        }
        self.strip.dispose();
        self.destroyed = true;
    }
}
