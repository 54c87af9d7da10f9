//! Materials: single-BxDF leaves and two-child blend nodes
//!
//! A material exposes a map of named inputs; each input holds a constant,
//! a texture reference, or a reference to another material. Blend materials
//! reference two children through their `base_material` / `top_material`
//! inputs, which makes the material set a graph the compiler walks
//! transitively.

use super::{MaterialId, TextureId};
use glam::Vec4;
use std::collections::HashMap;

/// Shading model tag for single-BxDF materials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bxdf {
    Zero,
    Lambert,
    IdealReflect,
    IdealRefract,
    Emissive,
    Passthrough,
    Translucent,
    MicrofacetBeckmann,
    MicrofacetGGX,
    MicrofacetRefractionGGX,
    MicrofacetRefractionBeckmann,
}

impl Bxdf {
    /// True for the kinds whose roughness input drives the record first.
    pub fn is_microfacet(&self) -> bool {
        matches!(
            self,
            Bxdf::MicrofacetGGX
                | Bxdf::MicrofacetBeckmann
                | Bxdf::MicrofacetRefractionGGX
                | Bxdf::MicrofacetRefractionBeckmann
        )
    }
}

/// Combination mode for blend materials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendKind {
    Mix,
    Layered,
    FresnelBlend,
}

/// Material variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Single(Bxdf),
    Blend(BlendKind),
}

/// One named material input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialInput {
    Float(Vec4),
    /// A texture slot; `None` models a declared-but-unset texture binding.
    Texture(Option<TextureId>),
    Material(MaterialId),
}

impl From<Vec4> for MaterialInput {
    fn from(value: Vec4) -> Self {
        MaterialInput::Float(value)
    }
}

impl From<f32> for MaterialInput {
    fn from(value: f32) -> Self {
        MaterialInput::Float(Vec4::splat(value))
    }
}

impl From<TextureId> for MaterialInput {
    fn from(value: TextureId) -> Self {
        MaterialInput::Texture(Some(value))
    }
}

impl From<MaterialId> for MaterialInput {
    fn from(value: MaterialId) -> Self {
        MaterialInput::Material(value)
    }
}

/// Collector key for materials.
///
/// Covers the compiler-owned default material without giving it an arena
/// slot; every shape without an assigned material resolves to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialHandle {
    Default,
    Item(MaterialId),
}

/// A shading material with named inputs and a dirty bit
#[derive(Debug, Clone)]
pub struct Material {
    kind: MaterialKind,
    inputs: HashMap<String, MaterialInput>,
    dirty: bool,
}

impl Material {
    pub fn single(bxdf: Bxdf) -> Self {
        Self {
            kind: MaterialKind::Single(bxdf),
            inputs: HashMap::new(),
            dirty: true,
        }
    }

    pub fn blend(kind: BlendKind) -> Self {
        Self {
            kind: MaterialKind::Blend(kind),
            inputs: HashMap::new(),
            dirty: true,
        }
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn set_input(&mut self, name: &str, value: impl Into<MaterialInput>) {
        self.inputs.insert(name.to_string(), value.into());
        self.dirty = true;
    }

    /// Builder-style input assignment for construction chains.
    pub fn with_input(mut self, name: &str, value: impl Into<MaterialInput>) -> Self {
        self.set_input(name, value);
        self
    }

    pub fn input(&self, name: &str) -> Option<&MaterialInput> {
        self.inputs.get(name)
    }

    /// Materials referenced by any input (the dependency iterator).
    pub fn dependents(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.inputs.values().filter_map(|input| match input {
            MaterialInput::Material(id) => Some(*id),
            _ => None,
        })
    }

    /// Textures referenced by any input.
    pub fn textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.inputs.values().filter_map(|input| match input {
            MaterialInput::Texture(Some(id)) => Some(*id),
            _ => None,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_input_marks_dirty() {
        let mut mat = Material::single(Bxdf::Lambert);
        mat.set_dirty(false);
        mat.set_input("albedo", Vec4::ONE);
        assert!(mat.is_dirty());
    }

    #[test]
    fn test_dependents_and_textures() {
        let mat = Material::blend(BlendKind::Mix)
            .with_input("base_material", MaterialId(0))
            .with_input("top_material", MaterialId(1))
            .with_input("weight", TextureId(4));

        let mut deps: Vec<_> = mat.dependents().collect();
        deps.sort();
        assert_eq!(deps, vec![MaterialId(0), MaterialId(1)]);
        assert_eq!(mat.textures().collect::<Vec<_>>(), vec![TextureId(4)]);
    }

    #[test]
    fn test_unset_texture_input_yields_no_texture() {
        let mat =
            Material::single(Bxdf::Lambert).with_input("albedo", MaterialInput::Texture(None));
        assert_eq!(mat.textures().count(), 0);
    }
}
