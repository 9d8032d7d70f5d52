//! Skinned meshes (`.model`).
//!
//! Layout after the envelope, in order: name, root bone, the bone table split over three
//! passes (names, parent indices, transforms), skin bones and their bind poses, vertex data,
//! submesh index lists, embedded materials, the tagged trailer ending in `end`, and, from
//! version 2100, a flag-gated `SkinThickness` section.

use crate::error::ResultExt;
use crate::variant::{self, Variant, VariantFamily};
use crate::version::{FieldPresence, SKIN_THICKNESS_SIGNATURE};
use crate::{
    BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, Error, FormatKind, Material,
    Result,
};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::Mesh;

const TAG_MORPH: &str = "morph";

/// Version written into new `SkinThickness` sections.
pub const SKIN_THICKNESS_SECTION_VERSION: i32 = 1;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct MeshFile {
    pub signature: String,
    pub version: i32,
    pub name: String,
    pub root_bone_name: String,
    pub bones: Vec<Bone>,
    pub skin_bones: Vec<SkinBone>,
    pub vertices: Vec<Vertex>,
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub tangents: Vec<[f32; 4]>,
    /// One entry per vertex.
    pub bone_weights: Vec<BoneWeight>,
    /// Triangle indices per submesh, stored as u16 on the wire.
    pub submeshes: Vec<Vec<u32>>,
    pub materials: Vec<Material>,
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub morphs: Vec<MorphTarget>,
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Option::is_none"))]
    pub skin_thickness: Option<SkinThickness>,
    /// The stream ended where the thickness flag belongs; re-encoding writes no flag.
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "is_false"))]
    pub skin_thickness_flag_omitted: bool,
}

#[cfg(feature = "json")]
fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Bone {
    pub name: String,
    /// Nonzero marks bones that get a `_SCL_` companion; unrelated to `scale`.
    /// Kept as the stored byte.
    pub scl_flag: u8,
    pub parent_index: i32,
    pub position: [f32; 3],
    /// Quaternion, xyzw.
    pub rotation: [f32; 4],
    /// Only stored from version 2001.
    #[cfg_attr(feature = "json", serde(default, skip_serializing_if = "Option::is_none"))]
    pub scale: Option<[f32; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SkinBone {
    pub name: String,
    /// Row-major 4x4 matrix.
    pub bind_pose: [f32; 16],
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneWeight {
    pub indices: [u16; 4],
    pub weights: [f32; 4],
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphTarget {
    pub name: String,
    pub vertices: Vec<MorphVertex>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphVertex {
    pub index: u16,
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SkinThickness {
    /// Nonzero flag value that announced the section.
    #[cfg_attr(
        feature = "json",
        serde(default = "default_presence_flag", skip_serializing_if = "is_default_presence_flag")
    )]
    pub presence_flag: i32,
    pub version: i32,
    #[cfg_attr(feature = "json", serde(rename = "use"))]
    pub enabled: bool,
    /// Keyed groups in file order.
    pub groups: Vec<ThickGroup>,
}

#[cfg(feature = "json")]
fn default_presence_flag() -> i32 {
    1
}

#[cfg(feature = "json")]
fn is_default_presence_flag(flag: &i32) -> bool {
    *flag == 1
}

impl Default for SkinThickness {
    fn default() -> Self {
        Self {
            presence_flag: 1,
            version: SKIN_THICKNESS_SECTION_VERSION,
            enabled: false,
            groups: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ThickGroup {
    pub key: String,
    pub group_name: String,
    pub start_bone_name: String,
    pub end_bone_name: String,
    pub step_angle_degree: i32,
    pub points: Vec<ThickPoint>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ThickPoint {
    pub target_bone_name: String,
    pub ratio_segment_start_to_end: f32,
    pub distance_per_angle: Vec<ThickDefPerAngle>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ThickDefPerAngle {
    pub angle_degree: i32,
    pub vertex_index: i32,
    pub default_distance: f32,
}

impl MeshFile {
    /// A mesh with no content, carrying the standard signature.
    pub fn empty(version: i32) -> Self {
        Self {
            signature: FORMAT.signature().to_string(),
            version,
            name: String::new(),
            root_bone_name: String::new(),
            bones: Vec::new(),
            skin_bones: Vec::new(),
            vertices: Vec::new(),
            tangents: Vec::new(),
            bone_weights: Vec::new(),
            submeshes: Vec::new(),
            materials: Vec::new(),
            morphs: Vec::new(),
            skin_thickness: None,
            skin_thickness_flag_omitted: false,
        }
    }

    pub fn presence(&self) -> FieldPresence {
        FieldPresence::for_version(FORMAT, self.version)
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }
}

impl Variant for MorphTarget {
    const FAMILY: VariantFamily = VariantFamily::MeshBlock;

    fn tag(&self) -> &'static str {
        TAG_MORPH
    }

    fn read_payload<R: Read>(tag: &str, input: &mut BinaryReader<R>) -> Result<Option<Self>> {
        if tag != TAG_MORPH {
            return Ok(None);
        }
        let name = input.read_string()?;
        let count = input.read_count("morph vertex count")?;
        let mut vertices = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            vertices.push(MorphVertex {
                index: input.read_u16()?,
                position: input.read_f32_array()?,
                normal: input.read_f32_array()?,
            });
        }
        Ok(Some(Self { name, vertices }))
    }

    fn write_payload<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(&self.name)?;
        out.write_count("morph vertex count", self.vertices.len())?;
        for v in &self.vertices {
            out.write_u16(v.index)?;
            out.write_f32_array(&v.position)?;
            out.write_f32_array(&v.normal)?;
        }
        Ok(())
    }
}

impl SkinThickness {
    fn read<R: Read>(input: &mut BinaryReader<R>, presence_flag: i32) -> Result<Self> {
        let signature = input.read_string().at(FORMAT, "signature")?;
        if signature != SKIN_THICKNESS_SIGNATURE {
            return Err(Error::UnknownSignature {
                expected: SKIN_THICKNESS_SIGNATURE.to_string(),
                found: signature,
            })
            .at(FORMAT, "signature");
        }
        let version = input.read_i32().at(FORMAT, "version")?;
        let enabled = input.read_bool().at(FORMAT, "use")?;
        let group_count = input.read_count("thickness group count")?;
        let mut groups = Vec::with_capacity(group_count.min(256));
        for index in 0..group_count {
            let group = ThickGroup::read(input).at_with(FORMAT, || format!("groups[{index}]"))?;
            groups.push(group);
        }
        Ok(Self {
            presence_flag,
            version,
            enabled,
            groups,
        })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(SKIN_THICKNESS_SIGNATURE)?;
        out.write_i32(self.version)?;
        out.write_bool(self.enabled)?;
        out.write_count("thickness group count", self.groups.len())?;
        for (index, group) in self.groups.iter().enumerate() {
            group
                .write(out)
                .at_with(FORMAT, || format!("groups[{index}]"))?;
        }
        Ok(())
    }
}

impl ThickGroup {
    fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        let key = input.read_string()?;
        let group_name = input.read_string()?;
        let start_bone_name = input.read_string()?;
        let end_bone_name = input.read_string()?;
        let step_angle_degree = input.read_i32()?;
        let point_count = input.read_count("thickness point count")?;
        let mut points = Vec::with_capacity(point_count.min(256));
        for index in 0..point_count {
            let point = ThickPoint::read(input).at_with(FORMAT, || format!("points[{index}]"))?;
            points.push(point);
        }
        Ok(Self {
            key,
            group_name,
            start_bone_name,
            end_bone_name,
            step_angle_degree,
            points,
        })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(&self.key)?;
        out.write_string(&self.group_name)?;
        out.write_string(&self.start_bone_name)?;
        out.write_string(&self.end_bone_name)?;
        out.write_i32(self.step_angle_degree)?;
        out.write_count("thickness point count", self.points.len())?;
        for point in &self.points {
            point.write(out)?;
        }
        Ok(())
    }
}

impl ThickPoint {
    fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        let target_bone_name = input.read_string()?;
        let ratio_segment_start_to_end = input.read_f32()?;
        let count = input.read_count("thickness angle count")?;
        let mut distance_per_angle = Vec::with_capacity(count.min(256));
        for _ in 0..count {
            distance_per_angle.push(ThickDefPerAngle {
                angle_degree: input.read_i32()?,
                vertex_index: input.read_i32()?,
                default_distance: input.read_f32()?,
            });
        }
        Ok(Self {
            target_bone_name,
            ratio_segment_start_to_end,
            distance_per_angle,
        })
    }

    fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(&self.target_bone_name)?;
        out.write_f32(self.ratio_segment_start_to_end)?;
        out.write_count("thickness angle count", self.distance_per_angle.len())?;
        for def in &self.distance_per_angle {
            out.write_i32(def.angle_degree)?;
            out.write_i32(def.vertex_index)?;
            out.write_f32(def.default_distance)?;
        }
        Ok(())
    }
}

fn read_bones<R: Read>(
    input: &mut BinaryReader<R>,
    presence: FieldPresence,
) -> Result<Vec<Bone>> {
    let count = input.read_count("bone count").at(FORMAT, "bones")?;
    let mut bones = Vec::with_capacity(count.min(4096));
    for index in 0..count {
        let name = input
            .read_string()
            .at_with(FORMAT, || format!("bones[{index}].name"))?;
        let scl_flag = input
            .read_u8()
            .at_with(FORMAT, || format!("bones[{index}].sclFlag"))?;
        bones.push(Bone {
            name,
            scl_flag,
            ..Bone::default()
        });
    }
    for (index, bone) in bones.iter_mut().enumerate() {
        bone.parent_index = input
            .read_i32()
            .at_with(FORMAT, || format!("bones[{index}].parentIndex"))?;
    }
    for (index, bone) in bones.iter_mut().enumerate() {
        let path = || format!("bones[{index}]");
        bone.position = input.read_f32_array().at_with(FORMAT, path)?;
        bone.rotation = input.read_f32_array().at_with(FORMAT, path)?;
        if presence.bone_scale && input.read_bool().at_with(FORMAT, path)? {
            bone.scale = Some(
                input
                    .read_f32_array()
                    .at_with(FORMAT, || format!("bones[{index}].scale"))?,
            );
        }
    }
    Ok(bones)
}

fn write_bones<W: Write>(
    out: &mut BinaryWriter<W>,
    bones: &[Bone],
    presence: FieldPresence,
) -> Result<()> {
    out.write_count("bone count", bones.len())?;
    for bone in bones {
        out.write_string(&bone.name)?;
        out.write_u8(bone.scl_flag)?;
    }
    for bone in bones {
        out.write_i32(bone.parent_index)?;
    }
    let mut dropped = 0;
    for bone in bones {
        out.write_f32_array(&bone.position)?;
        out.write_f32_array(&bone.rotation)?;
        if presence.bone_scale {
            out.write_bool(bone.scale.is_some())?;
            if let Some(scale) = &bone.scale {
                out.write_f32_array(scale)?;
            }
        } else if bone.scale.is_some() {
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::warn!("mesh version has no bone scale; dropped scale of {dropped} bones");
    }
    Ok(())
}

impl Document for MeshFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let presence = FieldPresence::for_version(FORMAT, version);
        let name = input.read_string().at(FORMAT, "name")?;
        let root_bone_name = input.read_string().at(FORMAT, "rootBoneName")?;
        let bones = read_bones(input, presence)?;

        let vertex_count = input.read_count("vertex count").at(FORMAT, "vertexCount")?;
        let submesh_count = input.read_count("submesh count").at(FORMAT, "submeshCount")?;
        let skin_bone_count = input
            .read_count("skin bone count")
            .at(FORMAT, "skinBoneCount")?;

        let mut names = Vec::with_capacity(skin_bone_count.min(4096));
        for index in 0..skin_bone_count {
            names.push(
                input
                    .read_string()
                    .at_with(FORMAT, || format!("skinBones[{index}].name"))?,
            );
        }
        let mut skin_bones = Vec::with_capacity(names.len());
        for (index, name) in names.into_iter().enumerate() {
            let bind_pose = input
                .read_f32_array()
                .at_with(FORMAT, || format!("skinBones[{index}].bindPose"))?;
            skin_bones.push(SkinBone { name, bind_pose });
        }

        let mut vertices = Vec::with_capacity(vertex_count.min(1 << 16));
        for index in 0..vertex_count {
            let path = || format!("vertices[{index}]");
            vertices.push(Vertex {
                position: input.read_f32_array().at_with(FORMAT, path)?,
                normal: input.read_f32_array().at_with(FORMAT, path)?,
                uv: input.read_f32_array().at_with(FORMAT, path)?,
            });
        }

        let tangent_count = input.read_count("tangent count").at(FORMAT, "tangents")?;
        let mut tangents = Vec::with_capacity(tangent_count.min(1 << 16));
        for index in 0..tangent_count {
            tangents.push(
                input
                    .read_f32_array()
                    .at_with(FORMAT, || format!("tangents[{index}]"))?,
            );
        }

        let mut bone_weights = Vec::with_capacity(vertex_count.min(1 << 16));
        for index in 0..vertex_count {
            let path = || format!("boneWeights[{index}]");
            let mut indices = [0u16; 4];
            for slot in &mut indices {
                *slot = input.read_u16().at_with(FORMAT, path)?;
            }
            let weights = input.read_f32_array().at_with(FORMAT, path)?;
            bone_weights.push(BoneWeight { indices, weights });
        }

        let mut submeshes = Vec::with_capacity(submesh_count.min(256));
        for index in 0..submesh_count {
            let path = || format!("submeshes[{index}]");
            let count = input.read_count("index count").at_with(FORMAT, path)?;
            let mut indices = Vec::with_capacity(count.min(1 << 20));
            for _ in 0..count {
                indices.push(u32::from(input.read_u16().at_with(FORMAT, path)?));
            }
            submeshes.push(indices);
        }

        let material_count = input
            .read_count("material count")
            .at(FORMAT, "materialCount")?;
        let mut materials = Vec::with_capacity(material_count.min(256));
        for index in 0..material_count {
            materials.push(
                Material::read(input).at_with(FORMAT, || format!("materials[{index}]"))?,
            );
        }

        let morphs: Vec<MorphTarget> = variant::read_until_end(input).at(FORMAT, "trailer")?;

        let mut skin_thickness = None;
        let mut skin_thickness_flag_omitted = false;
        if presence.skin_thickness {
            if input.at_end()? {
                log::warn!(
                    "mesh '{name}' v{version} ends before the skin thickness flag; treating it as absent"
                );
                skin_thickness_flag_omitted = true;
            } else {
                let flag = input.read_i32().at(FORMAT, "skinThicknessFlag")?;
                if flag != 0 {
                    skin_thickness =
                        Some(SkinThickness::read(input, flag).at(FORMAT, "skinThickness")?);
                }
            }
        }

        log::debug!(
            "decoded mesh '{name}' v{version}: {} bones, {} vertices, {} submeshes, {} materials, {} morphs",
            bones.len(),
            vertices.len(),
            submeshes.len(),
            materials.len(),
            morphs.len()
        );
        Ok(Self {
            signature,
            version,
            name,
            root_bone_name,
            bones,
            skin_bones,
            vertices,
            tangents,
            bone_weights,
            submeshes,
            materials,
            morphs,
            skin_thickness,
            skin_thickness_flag_omitted,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        let presence = self.presence();
        if self.bone_weights.len() != self.vertices.len() {
            return Err(Error::InvalidLength {
                what: "bone weight count",
                length: self.bone_weights.len() as i64,
                offset: out.position(),
            })
            .at(FORMAT, "boneWeights");
        }

        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        out.write_string(&self.name).at(FORMAT, "name")?;
        out.write_string(&self.root_bone_name)
            .at(FORMAT, "rootBoneName")?;
        write_bones(out, &self.bones, presence).at(FORMAT, "bones")?;

        out.write_count("vertex count", self.vertices.len())?;
        out.write_count("submesh count", self.submeshes.len())?;
        out.write_count("skin bone count", self.skin_bones.len())?;
        for bone in &self.skin_bones {
            out.write_string(&bone.name).at(FORMAT, "skinBones")?;
        }
        for bone in &self.skin_bones {
            out.write_f32_array(&bone.bind_pose)?;
        }
        for v in &self.vertices {
            out.write_f32_array(&v.position)?;
            out.write_f32_array(&v.normal)?;
            out.write_f32_array(&v.uv)?;
        }
        out.write_count("tangent count", self.tangents.len())?;
        for t in &self.tangents {
            out.write_f32_array(t)?;
        }
        for w in &self.bone_weights {
            for &i in &w.indices {
                out.write_u16(i)?;
            }
            out.write_f32_array(&w.weights)?;
        }

        for (index, submesh) in self.submeshes.iter().enumerate() {
            let path = || format!("submeshes[{index}]");
            out.write_count("index count", submesh.len())
                .at_with(FORMAT, path)?;
            for &i in submesh {
                let narrow = u16::try_from(i)
                    .map_err(|_| Error::InvalidLength {
                        what: "triangle index",
                        length: i64::from(i),
                        offset: out.position(),
                    })
                    .at_with(FORMAT, path)?;
                out.write_u16(narrow)?;
            }
        }

        out.write_count("material count", self.materials.len())?;
        for (index, material) in self.materials.iter().enumerate() {
            material
                .write(out)
                .at_with(FORMAT, || format!("materials[{index}]"))?;
        }

        variant::write_until_end(out, &self.morphs).at(FORMAT, "trailer")?;

        if presence.skin_thickness {
            match &self.skin_thickness {
                None if self.skin_thickness_flag_omitted => {}
                None => out.write_i32(0)?,
                Some(thickness) => {
                    // a zero flag would hide the section that follows
                    let flag = match thickness.presence_flag {
                        0 => 1,
                        flag => flag,
                    };
                    out.write_i32(flag)?;
                    thickness.write(out).at(FORMAT, "skinThickness")?;
                }
            }
        } else if self.skin_thickness.is_some() {
            log::warn!(
                "mesh '{}' v{} predates skin thickness; section not written",
                self.name,
                self.version
            );
        }

        log::debug!(
            "encoded mesh '{}' v{} with {} vertices",
            self.name,
            self.version,
            self.vertices.len()
        );
        Ok(())
    }
}
