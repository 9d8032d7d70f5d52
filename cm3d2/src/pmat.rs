//! Render-queue overrides (`.pmat`).

use crate::error::ResultExt;
use crate::{BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, FormatKind, Result};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::PMat;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a of the UTF-8 bytes of `name`, reinterpreted as i32.
///
/// This is the value stored in [`PMatFile::hash`] for a given material name.
pub fn material_name_hash(name: &str) -> i32 {
    let hash = name.bytes().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    });
    hash as i32
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PMatFile {
    pub signature: String,
    pub version: i32,
    pub hash: i32,
    pub material_name: String,
    pub render_queue: f32,
    pub shader: String,
}

impl PMatFile {
    /// True when `hash` matches the hash of `material_name`.
    pub fn hash_matches(&self) -> bool {
        self.hash == material_name_hash(&self.material_name)
    }

    /// Recomputes `hash` from `material_name`.
    pub fn rehash(&mut self) {
        self.hash = material_name_hash(&self.material_name);
    }
}

impl Document for PMatFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let hash = input.read_i32().at(FORMAT, "hash")?;
        let material_name = input.read_string().at(FORMAT, "materialName")?;
        let render_queue = input.read_f32().at(FORMAT, "renderQueue")?;
        let shader = input.read_string().at(FORMAT, "shader")?;
        log::debug!("decoded pmat '{material_name}' v{version}, queue {render_queue}");
        Ok(Self {
            signature,
            version,
            hash,
            material_name,
            render_queue,
            shader,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        out.write_i32(self.hash)?;
        out.write_string(&self.material_name)
            .at(FORMAT, "materialName")?;
        out.write_f32(self.render_queue)?;
        out.write_string(&self.shader).at(FORMAT, "shader")?;
        log::debug!("encoded pmat '{}' v{}", self.material_name, self.version);
        Ok(())
    }
}
