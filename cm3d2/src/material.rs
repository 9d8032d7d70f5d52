//! Materials: the standalone `.mate` file and the material block embedded in meshes.

use crate::error::ResultExt;
use crate::variant::{self, Variant, VariantFamily};
use crate::{BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, FormatKind, Result};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::Material;

const TAG_TEX: &str = "tex";
const TAG_COL: &str = "col";
const TAG_VEC: &str = "vec";
const TAG_F: &str = "f";

const TEX_2D: &str = "tex2d";
const TEX_CUBE: &str = "cube";
const TEX_RT: &str = "texRT";
const TEX_NULL: &str = "null";

/// A `.mate` file. The file-level `name` is separate from the embedded material's name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct MateFile {
    pub signature: String,
    pub version: i32,
    pub name: String,
    pub material: Material,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Material {
    pub name: String,
    pub shader_name: String,
    pub shader_filename: String,
    pub properties: Vec<Property>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum Property {
    #[cfg_attr(feature = "json", serde(rename = "tex"))]
    Texture(TexProperty),
    #[cfg_attr(feature = "json", serde(rename = "col"))]
    Color(ColorProperty),
    #[cfg_attr(feature = "json", serde(rename = "vec"))]
    Vector(VectorProperty),
    #[cfg_attr(feature = "json", serde(rename = "f"))]
    Float(FloatProperty),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct TexProperty {
    pub name: String,
    pub texture: Texture,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "subTag")
)]
pub enum Texture {
    #[cfg_attr(feature = "json", serde(rename = "tex2d"))]
    Tex2d(TextureRef),
    #[cfg_attr(feature = "json", serde(rename = "cube"))]
    Cube(TextureRef),
    /// Render texture; both strings are legacy and ignored by the game.
    #[cfg_attr(feature = "json", serde(rename = "texRT"))]
    RenderTexture(RenderTextureRef),
    #[cfg_attr(feature = "json", serde(rename = "null"))]
    Null,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureRef {
    pub name: String,
    pub path: String,
    pub offset: [f32; 2],
    pub scale: [f32; 2],
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderTextureRef {
    pub first: String,
    pub second: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorProperty {
    pub name: String,
    /// RGBA.
    pub color: [f32; 4],
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorProperty {
    pub name: String,
    pub value: [f32; 4],
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatProperty {
    pub name: String,
    pub value: f32,
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Texture(p) => &p.name,
            Property::Color(p) => &p.name,
            Property::Vector(p) => &p.name,
            Property::Float(p) => &p.name,
        }
    }
}

impl Variant for Property {
    const FAMILY: VariantFamily = VariantFamily::Property;

    fn tag(&self) -> &'static str {
        match self {
            Property::Texture(_) => TAG_TEX,
            Property::Color(_) => TAG_COL,
            Property::Vector(_) => TAG_VEC,
            Property::Float(_) => TAG_F,
        }
    }

    fn read_payload<R: Read>(tag: &str, input: &mut BinaryReader<R>) -> Result<Option<Self>> {
        if ![TAG_TEX, TAG_COL, TAG_VEC, TAG_F].contains(&tag) {
            return Ok(None);
        }
        let name = input.read_string()?;
        let property = match tag {
            TAG_TEX => Property::Texture(TexProperty {
                texture: variant::read_tagged(input).at(FORMAT, "texture")?,
                name,
            }),
            TAG_COL => Property::Color(ColorProperty {
                color: input.read_f32_array()?,
                name,
            }),
            TAG_VEC => Property::Vector(VectorProperty {
                value: input.read_f32_array()?,
                name,
            }),
            _ => Property::Float(FloatProperty {
                value: input.read_f32()?,
                name,
            }),
        };
        Ok(Some(property))
    }

    fn write_payload<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(self.name())?;
        match self {
            Property::Texture(p) => variant::write_tagged(out, &p.texture),
            Property::Color(p) => out.write_f32_array(&p.color),
            Property::Vector(p) => out.write_f32_array(&p.value),
            Property::Float(p) => out.write_f32(p.value),
        }
    }
}

impl Variant for Texture {
    const FAMILY: VariantFamily = VariantFamily::Texture;

    fn tag(&self) -> &'static str {
        match self {
            Texture::Tex2d(_) => TEX_2D,
            Texture::Cube(_) => TEX_CUBE,
            Texture::RenderTexture(_) => TEX_RT,
            Texture::Null => TEX_NULL,
        }
    }

    fn read_payload<R: Read>(tag: &str, input: &mut BinaryReader<R>) -> Result<Option<Self>> {
        Ok(Some(match tag {
            TEX_2D => Texture::Tex2d(read_texture_ref(input)?),
            TEX_CUBE => Texture::Cube(read_texture_ref(input)?),
            TEX_RT => Texture::RenderTexture(RenderTextureRef {
                first: input.read_string()?,
                second: input.read_string()?,
            }),
            TEX_NULL => Texture::Null,
            _ => return Ok(None),
        }))
    }

    fn write_payload<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        match self {
            Texture::Tex2d(t) | Texture::Cube(t) => {
                out.write_string(&t.name)?;
                out.write_string(&t.path)?;
                out.write_f32_array(&t.offset)?;
                out.write_f32_array(&t.scale)
            }
            Texture::RenderTexture(t) => {
                out.write_string(&t.first)?;
                out.write_string(&t.second)
            }
            Texture::Null => Ok(()),
        }
    }
}

fn read_texture_ref<R: Read>(input: &mut BinaryReader<R>) -> Result<TextureRef> {
    Ok(TextureRef {
        name: input.read_string()?,
        path: input.read_string()?,
        offset: input.read_f32_array()?,
        scale: input.read_f32_array()?,
    })
}

impl Material {
    pub(crate) fn read<R: Read>(input: &mut BinaryReader<R>) -> Result<Self> {
        let name = input.read_string().at(FORMAT, "name")?;
        let shader_name = input.read_string().at(FORMAT, "shaderName")?;
        let shader_filename = input.read_string().at(FORMAT, "shaderFilename")?;
        let properties = variant::read_until_end(input)?;
        Ok(Self {
            name,
            shader_name,
            shader_filename,
            properties,
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        out.write_string(&self.name).at(FORMAT, "name")?;
        out.write_string(&self.shader_name).at(FORMAT, "shaderName")?;
        out.write_string(&self.shader_filename)
            .at(FORMAT, "shaderFilename")?;
        variant::write_until_end(out, &self.properties)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }
}

impl Document for MateFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let name = input.read_string().at(FORMAT, "name")?;
        let material = Material::read(input).at(FORMAT, "material")?;
        log::debug!(
            "decoded material '{name}' v{version} with {} properties",
            material.properties.len()
        );
        Ok(Self {
            signature,
            version,
            name,
            material,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        out.write_string(&self.name).at(FORMAT, "name")?;
        self.material.write(out).at(FORMAT, "material")?;
        log::debug!("encoded material '{}' v{}", self.name, self.version);
        Ok(())
    }
}
