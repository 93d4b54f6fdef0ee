//! Snapshot Model - Per-Tile Flag Tables
//!
//! A snapshot can only be built from sequences of equal length, so every
//! value of [`TileFlagsSnapshot`] satisfies the count invariant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("frame_important has {frame_important} entries but solid has {solid}")]
    LengthMismatch { frame_important: usize, solid: usize },

    #[error("tile count {0} does not fit in a 32-bit header")]
    CountOverflow(usize),

    #[error("declared tile count {declared} but tables hold {actual} entries")]
    CountMismatch { declared: u32, actual: usize },
}

/// Flags of a single tile type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileFlags {
    pub frame_important: bool,
    pub solid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSnapshot")]
pub struct TileFlagsSnapshot {
    tile_count: u32,
    frame_important: Vec<bool>,
    solid: Vec<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    tile_count: u32,
    frame_important: Vec<bool>,
    solid: Vec<bool>,
}

impl TryFrom<RawSnapshot> for TileFlagsSnapshot {
    type Error = SchemaError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let snapshot = Self::new(raw.frame_important, raw.solid)?;
        if snapshot.tile_count != raw.tile_count {
            return Err(SchemaError::CountMismatch {
                declared: raw.tile_count,
                actual: snapshot.solid.len(),
            });
        }
        Ok(snapshot)
    }
}

impl TileFlagsSnapshot {
    pub fn new(frame_important: Vec<bool>, solid: Vec<bool>) -> Result<Self, SchemaError> {
        if frame_important.len() != solid.len() {
            return Err(SchemaError::LengthMismatch {
                frame_important: frame_important.len(),
                solid: solid.len(),
            });
        }
        let tile_count = u32::try_from(frame_important.len())
            .map_err(|_| SchemaError::CountOverflow(frame_important.len()))?;

        Ok(Self { tile_count, frame_important, solid })
    }

    /// Copy host-owned tables into a snapshot.
    pub fn from_host(frame_important: &[bool], solid: &[bool]) -> Result<Self, SchemaError> {
        Self::new(frame_important.to_vec(), solid.to_vec())
    }

    pub fn empty() -> Self {
        Self { tile_count: 0, frame_important: vec![], solid: vec![] }
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn is_empty(&self) -> bool {
        self.tile_count == 0
    }

    pub fn frame_important(&self) -> &[bool] {
        &self.frame_important
    }

    pub fn solid(&self) -> &[bool] {
        &self.solid
    }

    /// `None` for tile IDs the host did not know about.
    pub fn is_frame_important(&self, tile_id: usize) -> Option<bool> {
        self.frame_important.get(tile_id).copied()
    }

    pub fn is_solid(&self, tile_id: usize) -> Option<bool> {
        self.solid.get(tile_id).copied()
    }

    pub fn get(&self, tile_id: usize) -> Option<TileFlags> {
        Some(TileFlags {
            frame_important: self.is_frame_important(tile_id)?,
            solid: self.is_solid(tile_id)?,
        })
    }

    /// Iterate `(tile_id, flags)` in ID order.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, TileFlags)> + '_ {
        self.frame_important
            .iter()
            .zip(&self.solid)
            .enumerate()
            .map(|(id, (&frame_important, &solid))| (id, TileFlags { frame_important, solid }))
    }

    pub fn frame_important_count(&self) -> usize {
        self.frame_important.iter().filter(|f| **f).count()
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|s| **s).count()
    }

    pub fn into_parts(self) -> (Vec<bool>, Vec<bool>) {
        (self.frame_important, self.solid)
    }
}

impl Default for TileFlagsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
