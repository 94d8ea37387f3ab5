//! Per-slot vertex attribute types.
//!
//! Each type is the element type of one column of a
//! [`LineStrip`](crate::LineStrip) and is laid out exactly as the vertex
//! shader reads it.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// A 2D position in data coordinates, uploaded as a `vec2` attribute.
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Construct from coordinates.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Position {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [f32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

bitflags! {
    /// Connectivity bits stored as one byte per slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LineFlags: u8 {
        /// A visible segment runs from the previous slot to this one.
        const CONNECT = 0b01;
        /// A join is drawn at this slot.
        const JOIN    = 0b10;
    }
}

impl LineFlags {
    /// Flags for a slot at `actual_index` in a strip whose last visible slot
    /// is `last_visible`. The first visible slot is always actual index 1.
    pub const fn for_slot(actual_index: usize, last_visible: usize) -> Self {
        if actual_index <= 1 || actual_index > last_visible {
            // Leading phantom, first visible, or trailing phantom.
            Self::empty()
        } else if actual_index == last_visible {
            Self::CONNECT
        } else {
            Self::CONNECT.union(Self::JOIN)
        }
    }
}
