//! Dynamic-bone collider files (`.col`).

use crate::variant::{self, Variant, VariantFamily};
use crate::{BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, FormatKind, Result};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::Collider;

const TAG_CAPSULE: &str = "dbc";
const TAG_PLANE: &str = "dpc";
const TAG_BUST: &str = "dbm";
const TAG_MISSING: &str = "missing";

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ColliderFile {
    pub signature: String,
    pub version: i32,
    pub colliders: Vec<Collider>,
}

/// Transform and shape data shared by every non-placeholder collider.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ColliderBase {
    pub parent_name: String,
    pub self_name: String,
    pub local_position: [f32; 3],
    /// Quaternion, xyzw.
    pub local_rotation: [f32; 4],
    pub local_scale: [f32; 3],
    pub direction: i32,
    pub center: [f32; 3],
    pub bound: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum Collider {
    #[cfg_attr(feature = "json", serde(rename = "dbc"))]
    Capsule(CapsuleCollider),
    #[cfg_attr(feature = "json", serde(rename = "dpc"))]
    Plane(PlaneCollider),
    #[cfg_attr(feature = "json", serde(rename = "dbm"))]
    Bust(BustCollider),
    /// Placeholder left where a collider was removed; only the tag is stored.
    #[cfg_attr(feature = "json", serde(rename = "missing"))]
    Missing,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct CapsuleCollider {
    pub base: ColliderBase,
    pub radius: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneCollider {
    pub base: ColliderBase,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct BustCollider {
    pub base: ColliderBase,
    pub radius: f32,
    pub height: f32,
    pub scale_rate_mul_max: f32,
    pub center_rate_max: [f32; 3],
}

impl Collider {
    pub fn base(&self) -> Option<&ColliderBase> {
        match self {
            Collider::Capsule(c) => Some(&c.base),
            Collider::Plane(c) => Some(&c.base),
            Collider::Bust(c) => Some(&c.base),
            Collider::Missing => None,
        }
    }
}

impl ColliderBase {
    fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        Ok(Self {
            parent_name: input.read_string()?,
            self_name: input.read_string()?,
            local_position: input.read_f32_array()?,
            local_rotation: input.read_f32_array()?,
            local_scale: input.read_f32_array()?,
            direction: input.read_i32()?,
            center: input.read_f32_array()?,
            bound: input.read_i32()?,
        })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(&self.parent_name)?;
        out.write_string(&self.self_name)?;
        out.write_f32_array(&self.local_position)?;
        out.write_f32_array(&self.local_rotation)?;
        out.write_f32_array(&self.local_scale)?;
        out.write_i32(self.direction)?;
        out.write_f32_array(&self.center)?;
        out.write_i32(self.bound)
    }
}

impl Variant for Collider {
    const FAMILY: VariantFamily = VariantFamily::Collider;

    fn tag(&self) -> &'static str {
        match self {
            Collider::Capsule(_) => TAG_CAPSULE,
            Collider::Plane(_) => TAG_PLANE,
            Collider::Bust(_) => TAG_BUST,
            Collider::Missing => TAG_MISSING,
        }
    }

    fn read_payload<R: Read>(tag: &str, input: &mut BinaryReader<R>) -> Result<Option<Self>> {
        let collider = match tag {
            TAG_CAPSULE => Collider::Capsule(CapsuleCollider {
                base: ColliderBase::read(input)?,
                radius: input.read_f32()?,
                height: input.read_f32()?,
            }),
            TAG_PLANE => Collider::Plane(PlaneCollider {
                base: ColliderBase::read(input)?,
            }),
            TAG_BUST => Collider::Bust(BustCollider {
                base: ColliderBase::read(input)?,
                radius: input.read_f32()?,
                height: input.read_f32()?,
                scale_rate_mul_max: input.read_f32()?,
                center_rate_max: input.read_f32_array()?,
            }),
            TAG_MISSING => Collider::Missing,
            _ => return Ok(None),
        };
        Ok(Some(collider))
    }

    fn write_payload<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        match self {
            Collider::Capsule(c) => {
                c.base.write(out)?;
                out.write_f32(c.radius)?;
                out.write_f32(c.height)
            }
            Collider::Plane(c) => c.base.write(out),
            Collider::Bust(c) => {
                c.base.write(out)?;
                out.write_f32(c.radius)?;
                out.write_f32(c.height)?;
                out.write_f32(c.scale_rate_mul_max)?;
                out.write_f32_array(&c.center_rate_max)
            }
            Collider::Missing => Ok(()),
        }
    }
}

impl Document for ColliderFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let colliders = variant::read_counted(input)?;
        log::debug!("decoded collider file v{version} with {} colliders", colliders.len());
        Ok(Self {
            signature,
            version,
            colliders,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        variant::write_counted(out, &self.colliders)?;
        log::debug!(
            "encoded collider file v{} with {} colliders",
            self.version,
            self.colliders.len()
        );
        Ok(())
    }
}
