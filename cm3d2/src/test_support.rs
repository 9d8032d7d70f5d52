#![allow(dead_code)]

/// Byte builder for hand-written fixtures, independent of `BinaryWriter`.
#[derive(Default)]
pub(crate) struct Fixture {
    bytes: Vec<u8>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn u8(mut self, v: u8) -> Self {
        self.bytes.push(v);
        self
    }

    pub(crate) fn bool(self, v: bool) -> Self {
        self.u8(u8::from(v))
    }

    pub(crate) fn u16(mut self, v: u16) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn i32(mut self, v: i32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn f32(mut self, v: f32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn floats(self, values: &[f32]) -> Self {
        values.iter().fold(self, |f, &v| f.f32(v))
    }

    /// Varint length prefix followed by the UTF-8 body.
    pub(crate) fn str(mut self, s: &str) -> Self {
        let mut len = s.len();
        loop {
            let byte = (len & 0x7F) as u8;
            len >>= 7;
            if len == 0 {
                self.bytes.push(byte);
                break;
            }
            self.bytes.push(byte | 0x80);
        }
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Mesh envelope followed by the mesh name and a root bone named `root`.
pub(crate) fn mesh_header(version: i32, name: &str) -> Fixture {
    Fixture::new()
        .str("CM3D2_MESH")
        .i32(version)
        .str(name)
        .str("root")
}
