//! Tag-dispatched records.
//!
//! Each polymorphic family is a closed enum implementing [`Variant`]: the tag string is read
//! first, then the family decodes the payload for the tags it knows. Unknown tags surface as
//! [`Error::UnsupportedVariant`] and are never skipped.

use crate::error::ResultExt;
use crate::{BinaryReader, BinaryWriter, Error, FormatKind, Result};
use std::fmt;
use std::io::{Read, Write};

/// Reserved tag ending a list that has no count prefix.
pub const END_TAG: &str = "end";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariantFamily {
    Property,
    Texture,
    Collider,
    MeshBlock,
}

impl VariantFamily {
    fn format(self) -> FormatKind {
        match self {
            VariantFamily::Property | VariantFamily::Texture => FormatKind::Material,
            VariantFamily::Collider => FormatKind::Collider,
            VariantFamily::MeshBlock => FormatKind::Mesh,
        }
    }

    fn list_name(self) -> &'static str {
        match self {
            VariantFamily::Property => "properties",
            VariantFamily::Texture => "textures",
            VariantFamily::Collider => "colliders",
            VariantFamily::MeshBlock => "blocks",
        }
    }
}

impl fmt::Display for VariantFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantFamily::Property => "property",
            VariantFamily::Texture => "texture",
            VariantFamily::Collider => "collider",
            VariantFamily::MeshBlock => "mesh block",
        };
        f.write_str(name)
    }
}

pub trait Variant: Sized {
    const FAMILY: VariantFamily;

    /// Tag written in front of this value.
    fn tag(&self) -> &'static str;

    /// Decodes the payload following `tag`, or `None` when the tag is not part of the family.
    fn read_payload<R: Read>(tag: &str, input: &mut BinaryReader<R>) -> Result<Option<Self>>;

    fn write_payload<W: Write>(&self, out: &mut BinaryWriter<W>) -> Result<()>;
}

pub(crate) fn read_tagged<V: Variant, R: Read>(input: &mut BinaryReader<R>) -> Result<V> {
    let offset = input.position();
    let tag = input.read_string()?;
    log::trace!("{} '{tag}' at offset {offset}", V::FAMILY);
    V::read_payload(&tag, input)?.ok_or(Error::UnsupportedVariant {
        family: V::FAMILY,
        tag,
        offset,
    })
}

pub(crate) fn write_tagged<V: Variant, W: Write>(out: &mut BinaryWriter<W>, value: &V) -> Result<()> {
    out.write_string(value.tag())?;
    value.write_payload(out)
}

/// Reads records until the `end` sentinel, which is consumed but not returned.
pub(crate) fn read_until_end<V: Variant, R: Read>(input: &mut BinaryReader<R>) -> Result<Vec<V>> {
    let mut items = Vec::new();
    while !input.consume_sentinel(END_TAG)? {
        let index = items.len();
        let item = read_tagged(input)
            .at_with(V::FAMILY.format(), || format!("{}[{index}]", V::FAMILY.list_name()))?;
        items.push(item);
    }
    Ok(items)
}

/// Writes every record followed by exactly one `end` sentinel.
pub(crate) fn write_until_end<V: Variant, W: Write>(
    out: &mut BinaryWriter<W>,
    items: &[V],
) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        write_tagged(out, item)
            .at_with(V::FAMILY.format(), || format!("{}[{index}]", V::FAMILY.list_name()))?;
    }
    out.write_string(END_TAG)
}

/// Reads an i32 count followed by that many tagged records.
pub(crate) fn read_counted<V: Variant, R: Read>(input: &mut BinaryReader<R>) -> Result<Vec<V>> {
    let count = input.read_count("record count")?;
    let mut items = Vec::with_capacity(count.min(4096));
    for index in 0..count {
        let item = read_tagged(input)
            .at_with(V::FAMILY.format(), || format!("{}[{index}]", V::FAMILY.list_name()))?;
        items.push(item);
    }
    Ok(items)
}

pub(crate) fn write_counted<V: Variant, W: Write>(
    out: &mut BinaryWriter<W>,
    items: &[V],
) -> Result<()> {
    out.write_count("record count", items.len())?;
    for (index, item) in items.iter().enumerate() {
        write_tagged(out, item)
            .at_with(V::FAMILY.format(), || format!("{}[{index}]", V::FAMILY.list_name()))?;
    }
    Ok(())
}
