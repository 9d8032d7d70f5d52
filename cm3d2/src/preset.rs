//! Appearance presets (`.preset`).
//!
//! Only the header and thumbnail are decoded. The property list, colors and body settings
//! that follow are kept as raw bytes so a preset re-encodes unchanged.

use crate::error::ResultExt;
use crate::{BinaryReader, BinaryWriter, DecodeOptions, Document, Envelope, FormatKind, Result};
use std::io::{Read, Write};

const FORMAT: FormatKind = FormatKind::Preset;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PresetType(pub i32);

impl PresetType {
    pub const WEAR: PresetType = PresetType(0);
    pub const BODY: PresetType = PresetType(1);
    pub const ALL: PresetType = PresetType(2);
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PresetFile {
    pub signature: String,
    pub version: i32,
    pub preset_type: PresetType,
    /// PNG bytes; the length prefix is derived on encode.
    pub thumbnail: Vec<u8>,
    /// Everything after the thumbnail, undecoded.
    pub body: Vec<u8>,
}

impl Document for PresetFile {
    const FORMAT: FormatKind = FORMAT;

    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self> {
        let Envelope { signature, version } = Envelope::read(input, FORMAT, options)?;
        let preset_type = PresetType(input.read_i32().at(FORMAT, "presetType")?);
        let thumbnail_len = input
            .read_count("thumbnail length")
            .at(FORMAT, "thumbnailLength")?;
        let thumbnail = input.read_bytes(thumbnail_len).at(FORMAT, "thumbnail")?;
        let body = input.read_to_end().at(FORMAT, "body")?;
        log::debug!(
            "decoded preset v{version} type {}: {} thumbnail bytes, {} body bytes",
            preset_type.0,
            thumbnail.len(),
            body.len()
        );
        Ok(Self {
            signature,
            version,
            preset_type,
            thumbnail,
            body,
        })
    }

    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()> {
        Envelope::write(out, FORMAT, &self.signature, self.version)?;
        out.write_i32(self.preset_type.0)?;
        out.write_count("thumbnail length", self.thumbnail.len())
            .at(FORMAT, "thumbnailLength")?;
        out.write_bytes(&self.thumbnail)?;
        out.write_bytes(&self.body)?;
        log::debug!("encoded preset v{}", self.version);
        Ok(())
    }
}
