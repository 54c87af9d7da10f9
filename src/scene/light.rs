//! Light sources
//!
//! Five kinds: point, directional, spot, image-based (IBL) and area lights.
//! Area lights reference a shape and a primitive on it; IBL lights reference
//! a texture.

use super::{ShapeId, TextureId};
use glam::{Vec2, Vec3};

/// Kind-specific light payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Point {
        position: Vec3,
        intensity: Vec3,
    },
    Directional {
        direction: Vec3,
        intensity: Vec3,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        intensity: Vec3,
        /// Cosine-space inner/outer cone angles.
        cone_shape: Vec2,
    },
    Ibl {
        texture: TextureId,
        multiplier: f32,
    },
    Area {
        shape: ShapeId,
        prim_idx: u32,
    },
}

/// A light source with a dirty bit
#[derive(Debug, Clone)]
pub struct Light {
    kind: LightKind,
    dirty: bool,
}

impl Light {
    pub fn point(position: Vec3, intensity: Vec3) -> Self {
        Self::from_kind(LightKind::Point {
            position,
            intensity,
        })
    }

    pub fn directional(direction: Vec3, intensity: Vec3) -> Self {
        Self::from_kind(LightKind::Directional {
            direction,
            intensity,
        })
    }

    pub fn spot(position: Vec3, direction: Vec3, intensity: Vec3, cone_shape: Vec2) -> Self {
        Self::from_kind(LightKind::Spot {
            position,
            direction,
            intensity,
            cone_shape,
        })
    }

    pub fn ibl(texture: TextureId, multiplier: f32) -> Self {
        Self::from_kind(LightKind::Ibl {
            texture,
            multiplier,
        })
    }

    pub fn area(shape: ShapeId, prim_idx: u32) -> Self {
        Self::from_kind(LightKind::Area { shape, prim_idx })
    }

    fn from_kind(kind: LightKind) -> Self {
        Self { kind, dirty: true }
    }

    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: LightKind) {
        self.kind = kind;
        self.dirty = true;
    }

    /// The texture this light depends on, if any (IBL only).
    pub fn texture(&self) -> Option<TextureId> {
        match self.kind {
            LightKind::Ibl { texture, .. } => Some(texture),
            _ => None,
        }
    }

    pub fn is_ibl(&self) -> bool {
        matches!(self.kind, LightKind::Ibl { .. })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}
