//! Cloth/bone physics parameter files (`.phy`).
//!
//! Five parameter blocks share one layout: a partial mode, a per-bone override list that is
//! only present in [`PartialMode::PARTIAL`], a default value and a distribution curve.
//!
//! The collider and exclusion counts near the end of the file are stored without any entries
//! following them. They are kept verbatim and never derived from a list.

use crate::error::ResultExt;
use crate::{BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, FormatKind, Result};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::Physics;

/// How a parameter is distributed over the bone chain. Unknown values are kept as read.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PartialMode(pub i32);

impl PartialMode {
    pub const STATIC_OR_CURVE: PartialMode = PartialMode(0);
    pub const PARTIAL: PartialMode = PartialMode(1);
    pub const FROM_BONE_NAME: PartialMode = PartialMode(2);

    /// Only this mode carries an override list on the wire.
    pub fn is_partial(self) -> bool {
        self == Self::PARTIAL
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FreezeAxis(pub i32);

impl FreezeAxis {
    pub const NONE: FreezeAxis = FreezeAxis(0);
    pub const X: FreezeAxis = FreezeAxis(1);
    pub const Y: FreezeAxis = FreezeAxis(2);
    pub const Z: FreezeAxis = FreezeAxis(3);
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct BoneValue {
    pub bone_name: String,
    pub value: f32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct AnimationCurve {
    pub keyframes: Vec<Keyframe>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ParameterBlock {
    pub partial_mode: PartialMode,
    /// Per-bone values. Ignored on encode unless the mode is [`PartialMode::PARTIAL`].
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub overrides: Vec<BoneValue>,
    pub value: f32,
    pub curve: AnimationCurve,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PhysicsFile {
    pub signature: String,
    pub version: i32,
    pub root_name: String,
    pub damping: ParameterBlock,
    pub elasticity: ParameterBlock,
    pub stiffness: ParameterBlock,
    pub inert: ParameterBlock,
    pub radius: ParameterBlock,
    pub end_length: f32,
    pub end_offset: [f32; 3],
    pub gravity: [f32; 3],
    pub force: [f32; 3],
    pub collider_file_name: String,
    /// Stored count only; no collider entries follow it.
    pub colliders_count: i32,
    /// Stored count only; no exclusion entries follow it.
    pub exclusions_count: i32,
    pub freeze_axis: FreezeAxis,
}

impl AnimationCurve {
    fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        let count = input.read_count("keyframe count")?;
        let mut keyframes = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let [time, value, in_tangent, out_tangent] = input.read_f32_array()?;
            keyframes.push(Keyframe {
                time,
                value,
                in_tangent,
                out_tangent,
            });
        }
        Ok(Self { keyframes })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_count("keyframe count", self.keyframes.len())?;
        for k in &self.keyframes {
            out.write_f32_array(&[k.time, k.value, k.in_tangent, k.out_tangent])?;
        }
        Ok(())
    }
}

impl ParameterBlock {
    fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        let partial_mode = PartialMode(input.read_i32().at(FORMAT, "partialMode")?);
        let mut overrides = Vec::new();
        if partial_mode.is_partial() {
            let count = input.read_count("override count").at(FORMAT, "overrides")?;
            overrides.reserve(count.min(4096));
            for index in 0..count {
                let bone_name = input
                    .read_string()
                    .at_with(FORMAT, || format!("overrides[{index}]"))?;
                let value = input
                    .read_f32()
                    .at_with(FORMAT, || format!("overrides[{index}]"))?;
                overrides.push(BoneValue { bone_name, value });
            }
        }
        let value = input.read_f32().at(FORMAT, "value")?;
        let curve = AnimationCurve::read(input).at(FORMAT, "curve")?;
        Ok(Self {
            partial_mode,
            overrides,
            value,
            curve,
        })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_i32(self.partial_mode.0)?;
        if self.partial_mode.is_partial() {
            out.write_count("override count", self.overrides.len())?;
            for bv in &self.overrides {
                out.write_string(&bv.bone_name)?;
                out.write_f32(bv.value)?;
            }
        } else if !self.overrides.is_empty() {
            log::warn!(
                "dropping {} bone overrides from a block in partial mode {}",
                self.overrides.len(),
                self.partial_mode.0
            );
        }
        out.write_f32(self.value)?;
        self.curve.write(out)
    }
}

impl PhysicsFile {
    /// The five parameter blocks in file order, with their field names.
    pub fn blocks(&self) -> [(&'static str, &ParameterBlock); 5] {
        [
            ("damping", &self.damping),
            ("elasticity", &self.elasticity),
            ("stiffness", &self.stiffness),
            ("inert", &self.inert),
            ("radius", &self.radius),
        ]
    }
}

impl Document for PhysicsFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let root_name = input.read_string().at(FORMAT, "rootName")?;
        let damping = ParameterBlock::read(input).at(FORMAT, "damping")?;
        let elasticity = ParameterBlock::read(input).at(FORMAT, "elasticity")?;
        let stiffness = ParameterBlock::read(input).at(FORMAT, "stiffness")?;
        let inert = ParameterBlock::read(input).at(FORMAT, "inert")?;
        let radius = ParameterBlock::read(input).at(FORMAT, "radius")?;
        let end_length = input.read_f32().at(FORMAT, "endLength")?;
        let end_offset = input.read_f32_array().at(FORMAT, "endOffset")?;
        let gravity = input.read_f32_array().at(FORMAT, "gravity")?;
        let force = input.read_f32_array().at(FORMAT, "force")?;
        let collider_file_name = input.read_string().at(FORMAT, "colliderFileName")?;
        let colliders_count = input.read_i32().at(FORMAT, "collidersCount")?;
        let exclusions_count = input.read_i32().at(FORMAT, "exclusionsCount")?;
        let freeze_axis = FreezeAxis(input.read_i32().at(FORMAT, "freezeAxis")?);
        log::debug!("decoded physics '{root_name}' v{version}");
        Ok(Self {
            signature,
            version,
            root_name,
            damping,
            elasticity,
            stiffness,
            inert,
            radius,
            end_length,
            end_offset,
            gravity,
            force,
            collider_file_name,
            colliders_count,
            exclusions_count,
            freeze_axis,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        out.write_string(&self.root_name).at(FORMAT, "rootName")?;
        for (name, block) in self.blocks() {
            block.write(out).at(FORMAT, name)?;
        }
        out.write_f32(self.end_length)?;
        out.write_f32_array(&self.end_offset)?;
        out.write_f32_array(&self.gravity)?;
        out.write_f32_array(&self.force)?;
        out.write_string(&self.collider_file_name)
            .at(FORMAT, "colliderFileName")?;
        out.write_i32(self.colliders_count)?;
        out.write_i32(self.exclusions_count)?;
        out.write_i32(self.freeze_axis.0)?;
        log::debug!("encoded physics '{}' v{}", self.root_name, self.version);
        Ok(())
    }
}
