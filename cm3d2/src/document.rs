use crate::binary::DEFAULT_PEEK_LIMIT;
use crate::error::ResultExt;
use crate::{
    BinaryReader, BinaryWriter, ColliderFile, Error, FormatKind, MateFile, MeshFile,
    PMatFile, PhysicsFile, PresetFile, Result,
};
use std::io::{Read, Write};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeOptions {
    /// Reject files whose signature differs from the format constant.
    pub strict_signature: bool,
    /// Largest string, in bytes, that may be inspected before it is consumed.
    pub peek_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict_signature: false,
            peek_limit: DEFAULT_PEEK_LIMIT,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_signature: true,
            ..Self::default()
        }
    }
}

/// The `{signature, version}` header every format starts with.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub signature: String,
    pub version: i32,
}

impl Envelope {
    pub(crate) fn read<R: Read>(
        input: &mut BinaryReader<R>,
        format: FormatKind,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let signature = input.read_string().at(format, "signature")?;
        if signature != format.signature() {
            if options.strict_signature {
                let err = Error::UnknownSignature {
                    expected: format.signature().to_string(),
                    found: signature,
                };
                return Err(err.in_field(format, "signature".to_string()));
            }
            log::warn!(
                "{format} signature '{signature}' differs from '{}', decoding anyway",
                format.signature()
            );
        }
        let version = input.read_i32().at(format, "version")?;
        Ok(Self { signature, version })
    }

    pub(crate) fn write<W: Write>(
        out: &mut BinaryWriter<W>,
        format: FormatKind,
        signature: &str,
        version: i32,
    ) -> Result<()> {
        out.write_string(signature).at(format, "signature")?;
        out.write_i32(version).at(format, "version")
    }
}

/// One file format: a decode/encode pair over byte streams.
pub trait Document: Sized {
    const FORMAT: FormatKind;

    /// Reads the envelope and body.
    fn read_from<R: Read>(input: &mut BinaryReader<R>, options: &DecodeOptions) -> Result<Self>;

    /// Writes the envelope and body.
    fn write_to<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()>;

    /// Decodes one document from `reader`.
    ///
    /// The reader buffers ahead, so `reader` should hold exactly this document: bytes that
    /// follow it may be consumed and are not returned.
    fn decode<R: Read>(reader: R) -> Result<Self> {
        Self::decode_with(reader, &DecodeOptions::default())
    }

    fn decode_with<R: Read>(reader: R, options: &DecodeOptions) -> Result<Self> {
        let mut input = BinaryReader::with_peek_limit(reader, options.peek_limit);
        Self::read_from(&mut input, options)
    }

    fn encode<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = BinaryWriter::new(writer);
        self.write_to(&mut out)?;
        out.flush()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = BinaryWriter::new(Vec::new());
        self.write_to(&mut out)?;
        Ok(out.into_inner())
    }
}

/// A decoded document of any supported format.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "format", rename_all = "lowercase")
)]
pub enum AnyDocument {
    Material(MateFile),
    PMat(PMatFile),
    Collider(ColliderFile),
    Physics(PhysicsFile),
    Mesh(MeshFile),
    Preset(PresetFile),
}

impl AnyDocument {
    pub fn format(&self) -> FormatKind {
        match self {
            AnyDocument::Material(_) => FormatKind::Material,
            AnyDocument::PMat(_) => FormatKind::PMat,
            AnyDocument::Collider(_) => FormatKind::Collider,
            AnyDocument::Physics(_) => FormatKind::Physics,
            AnyDocument::Mesh(_) => FormatKind::Mesh,
            AnyDocument::Preset(_) => FormatKind::Preset,
        }
    }

    /// Decodes as `format`, regardless of the signature found in the stream.
    pub fn decode_as<R: Read>(format: FormatKind, reader: R, options: &DecodeOptions) -> Result<Self> {
        let mut input = BinaryReader::with_peek_limit(reader, options.peek_limit);
        Self::read_as(format, &mut input, options)
    }

    /// Decodes after identifying the format from the leading signature.
    pub fn decode_detect<R: Read>(reader: R, options: &DecodeOptions) -> Result<Self> {
        let mut input = BinaryReader::with_peek_limit(reader, options.peek_limit);
        let signature = input.peek_string()?;
        let format = FormatKind::from_signature(&signature).ok_or(Error::UnknownSignature {
            expected: "a known asset signature".to_string(),
            found: signature,
        })?;
        Self::read_as(format, &mut input, options)
    }

    fn read_as<R: Read>(
        format: FormatKind,
        input: &mut BinaryReader<R>,
        options: &DecodeOptions,
    ) -> Result<Self> {
        Ok(match format {
            FormatKind::Material => AnyDocument::Material(MateFile::read_from(input, options)?),
            FormatKind::PMat => AnyDocument::PMat(PMatFile::read_from(input, options)?),
            FormatKind::Collider => AnyDocument::Collider(ColliderFile::read_from(input, options)?),
            FormatKind::Physics => AnyDocument::Physics(PhysicsFile::read_from(input, options)?),
            FormatKind::Mesh => AnyDocument::Mesh(MeshFile::read_from(input, options)?),
            FormatKind::Preset => AnyDocument::Preset(PresetFile::read_from(input, options)?),
        })
    }

    pub fn encode<W: Write>(&self, writer: W) -> Result<()> {
        match self {
            AnyDocument::Material(doc) => doc.encode(writer),
            AnyDocument::PMat(doc) => doc.encode(writer),
            AnyDocument::Collider(doc) => doc.encode(writer),
            AnyDocument::Physics(doc) => doc.encode(writer),
            AnyDocument::Mesh(doc) => doc.encode(writer),
            AnyDocument::Preset(doc) => doc.encode(writer),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}
