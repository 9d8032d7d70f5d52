//! Codec for the CM3D2/COM3D2 binary asset formats.
//!
//! Materials (`.mate`, `.pmat`), dynamic-bone colliders (`.col`), cloth physics (`.phy`),
//! skinned meshes (`.model`) and appearance presets (`.preset`) decode into plain document
//! values and encode back byte for byte. With the `json` feature every document also has an
//! editable JSON form.

#![forbid(unsafe_code)]

mod binary;
mod collider;
mod document;
mod error;
mod material;
mod mesh;
mod physics;
mod pmat;
mod preset;
mod variant;
mod version;

#[cfg(feature = "json")]
pub mod json;

pub use binary::*;
pub use collider::*;
pub use document::*;
pub use error::{Error, Result};
pub use material::*;
pub use mesh::*;
pub use physics::*;
pub use pmat::*;
pub use preset::*;
pub use variant::{END_TAG, Variant, VariantFamily};
pub use version::*;

#[cfg(test)]
mod test_support;


#[cfg(test)]
mod document_tests;


#[cfg(test)]
mod collider_tests;

#[cfg(test)]
mod physics_tests;
