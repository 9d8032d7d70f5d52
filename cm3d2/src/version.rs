//! Format identities and the version gates that decide which optional fields exist.

use std::fmt;

pub const MATERIAL_SIGNATURE: &str = "CM3D2_MATERIAL";
pub const PMAT_SIGNATURE: &str = "CM3D2_PMATERIAL";
pub const COLLIDER_SIGNATURE: &str = "CM3D21_COL";
pub const PHYSICS_SIGNATURE: &str = "CM3D21_PHY";
pub const MESH_SIGNATURE: &str = "CM3D2_MESH";
pub const PRESET_SIGNATURE: &str = "CM3D2_PRESET";
pub const SKIN_THICKNESS_SIGNATURE: &str = "SkinThickness";

/// First mesh version that carries a per-bone scale flag (and optional scale).
pub const MESH_BONE_SCALE_VERSION: i32 = 2001;

/// First mesh version that carries the trailing `SkinThickness` flag.
pub const MESH_SKIN_THICKNESS_VERSION: i32 = 2100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FormatKind {
    Material,
    PMat,
    Collider,
    Physics,
    Mesh,
    Preset,
}

impl FormatKind {
    pub const ALL: [FormatKind; 6] = [
        FormatKind::Material,
        FormatKind::PMat,
        FormatKind::Collider,
        FormatKind::Physics,
        FormatKind::Mesh,
        FormatKind::Preset,
    ];

    pub fn signature(self) -> &'static str {
        match self {
            FormatKind::Material => MATERIAL_SIGNATURE,
            FormatKind::PMat => PMAT_SIGNATURE,
            FormatKind::Collider => COLLIDER_SIGNATURE,
            FormatKind::Physics => PHYSICS_SIGNATURE,
            FormatKind::Mesh => MESH_SIGNATURE,
            FormatKind::Preset => PRESET_SIGNATURE,
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FormatKind::Material => "mate",
            FormatKind::PMat => "pmat",
            FormatKind::Collider => "col",
            FormatKind::Physics => "phy",
            FormatKind::Mesh => "model",
            FormatKind::Preset => "preset",
        }
    }

    pub fn from_signature(signature: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.signature() == signature)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.extension().eq_ignore_ascii_case(extension))
    }

    /// Identify a file by its leading signature string.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let mut input = crate::BinaryReader::new(bytes);
        let signature = input.peek_string().ok()?;
        Self::from_signature(&signature)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatKind::Material => "material",
            FormatKind::PMat => "pmat",
            FormatKind::Collider => "collider",
            FormatKind::Physics => "physics",
            FormatKind::Mesh => "mesh",
            FormatKind::Preset => "preset",
        };
        f.write_str(name)
    }
}

/// Optional fields present for one document, computed once from its header version.
///
/// Decoders and encoders both consult the same value so that a decode/encode pair stays
/// symmetric. A field marked present may still be skipped by a per-record flag (bone scale)
/// or per-document flag (skin thickness).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldPresence {
    pub bone_scale: bool,
    pub skin_thickness: bool,
}

impl FieldPresence {
    pub fn for_version(kind: FormatKind, version: i32) -> Self {
        match kind {
            FormatKind::Mesh => Self {
                bone_scale: version >= MESH_BONE_SCALE_VERSION,
                skin_thickness: version >= MESH_SKIN_THICKNESS_VERSION,
            },
            FormatKind::Material
            | FormatKind::PMat
            | FormatKind::Collider
            | FormatKind::Physics
            | FormatKind::Preset => Self::default(),
        }
    }
}
