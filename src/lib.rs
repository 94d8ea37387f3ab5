//! Incrementally updated polyline vertex buffers for OpenGL via [glow].
//!
//! This crate provides [`LineStrip`], a growable polyline whose per-vertex
//! attributes are kept ready for a line shader: positions, connectivity
//! flags and cumulative arc length ("mileage"). Points are written in place,
//! and each frame only the byte ranges that changed are uploaded to the GPU.
//!
//! # Features
//!
//! - **Phantom end slots**: every strip carries a leading and a trailing
//!   slot that mirror its end points, so join and cap math never needs a
//!   special case at the ends.
//! - **Derived flags**: `CONNECT` and `JOIN` bits are recomputed from slot
//!   position for exactly the slots an edit touched.
//! - **Incremental mileage**: arc length is recomputed from the first
//!   changed slot onward, optionally corrected for the view's aspect ratio.
//! - **Dirty-range uploads**: [`GlLineStrip`] issues one `glBufferSubData`
//!   per changed range, so the cost of a frame follows the size of the edit
//!   rather than the size of the line.
//!
//! The host side ([`LineStrip`], [`StripSnapshot`], [`UploadPlan`]) has no GL
//! dependency. The `glow` feature (on by default) adds [`GlLineStrip`].
//!
//! # Threading
//!
//! Nothing here locks. A strip is meant to be edited and reconciled on the
//! render thread; producers on other threads should hand points over through
//! a channel.
//!
//! # Safety
//!
//! Creating and using a [`GlLineStrip`] requires a valid, current OpenGL
//! context. Its GL methods are `unsafe` because they issue raw GL calls.
//!
//! [glow]: https://docs.rs/glow

mod config;
#[cfg(feature = "glow")]
mod device;
mod editable;
mod error;
mod mileage;
mod range_set;
mod strip;
mod sync;
mod types;

pub use config::LineStripConfig;
#[cfg(feature = "glow")]
pub use device::{DeviceBuffer, GlLineStrip, LineBufferHandles};
pub use editable::EditableBuffer;
pub use error::{LineStripError, Result};
pub use mileage::{distance, distance_with_aspect, ppv_aspect_ratio, update_mileage};
pub use range_set::ByteRangeSet;
pub use strip::{
    actual_to_logical_size, logical_to_actual_index, logical_to_actual_size, LineStrip,
    StripSnapshot, MAX_LOGICAL_SIZE,
};
pub use sync::{plan_uploads, ColumnSnapshot, UploadPlan};
pub use types::{LineFlags, Position};
