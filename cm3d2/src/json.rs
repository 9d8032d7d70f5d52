//! Editable JSON projection of decoded documents.
//!
//! Every document type maps field for field. Polymorphic records carry their wire tag in a
//! discriminator field (`type` for properties and colliders, `subTag` for textures) and
//! [`AnyDocument`](crate::AnyDocument) carries the format name in `format`.
//!
//! Non-finite floats have no JSON form; serde_json writes them as `null`, which does not
//! read back.

use crate::Error;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait JsonDocument: Serialize + DeserializeOwned {
    fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::JsonWrite {
            message: e.to_string(),
        })
    }

    fn to_json_string_pretty(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::JsonWrite {
            message: e.to_string(),
        })
    }

    fn from_json_str(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }

    fn from_json_slice(input: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }
}

impl<T: Serialize + DeserializeOwned> JsonDocument for T {}
