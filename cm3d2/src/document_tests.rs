use crate::test_support::Fixture;
use crate::{AnyDocument, ColliderFile, DecodeOptions, Document, Error, FormatKind, PhysicsFile};

fn collider_bytes() -> Vec<u8> {
    Fixture::new()
        .str("CM3D21_COL")
        .i32(24102)
        .i32(1)
        .str("missing")
        .build()
}

#[test]
fn formats_are_identified_by_signature_and_extension() {
    for kind in FormatKind::ALL {
        assert_eq!(FormatKind::from_signature(kind.signature()), Some(kind));
        assert_eq!(FormatKind::from_extension(kind.extension()), Some(kind));
        let header = Fixture::new().str(kind.signature()).i32(1000).build();
        assert_eq!(FormatKind::detect(&header), Some(kind));
    }
    assert_eq!(FormatKind::from_extension("MODEL"), Some(FormatKind::Mesh));
    assert_eq!(FormatKind::from_extension("tex"), None);
    assert_eq!(FormatKind::detect(b""), None);
    assert_eq!(FormatKind::detect(&Fixture::new().str("CM3D2_TEX").build()), None);
}

#[test]
fn detected_decode_picks_the_format() {
    let bytes = collider_bytes();
    let doc = AnyDocument::decode_detect(bytes.as_slice(), &DecodeOptions::default())
        .expect("decode");
    assert_eq!(doc.format(), FormatKind::Collider);
    assert!(matches!(&doc, AnyDocument::Collider(c) if c.colliders.len() == 1));
    assert_eq!(doc.to_bytes().expect("encode"), bytes);
    assert_eq!(
        doc,
        AnyDocument::Collider(ColliderFile::from_bytes(&bytes).expect("direct"))
    );
}

#[test]
fn unknown_signature_cannot_be_detected() {
    let bytes = Fixture::new().str("CM3D2_TEX").i32(1010).build();
    let err = AnyDocument::decode_detect(bytes.as_slice(), &DecodeOptions::default())
        .expect_err("unknown");
    assert!(matches!(err, Error::UnknownSignature { found, .. } if found == "CM3D2_TEX"));
}

#[test]
fn explicit_format_ignores_the_signature_unless_strict() {
    let header_len = Fixture::new().str("CM3D21_COL").i32(24102).len();
    let mut bytes = Fixture::new().str("CM3D21_PHX").i32(24102).build();
    bytes.extend_from_slice(&collider_bytes()[header_len..]);

    let permissive = DecodeOptions::default();
    let doc = AnyDocument::decode_as(FormatKind::Collider, bytes.as_slice(), &permissive)
        .expect("permissive");
    assert_eq!(doc.format(), FormatKind::Collider);

    let strict = DecodeOptions::strict();
    let err = AnyDocument::decode_as(FormatKind::Collider, bytes.as_slice(), &strict)
        .expect_err("strict");
    assert!(matches!(err.root(), Error::UnknownSignature { .. }));
}

#[test]
fn peek_limit_applies_to_sentinel_checks() {
    let long_name = "p".repeat(300);
    let bytes = Fixture::new()
        .str("CM3D2_MATERIAL")
        .i32(1000)
        .str("m")
        .str("m")
        .str("s")
        .str("sf")
        .str("f")
        .str(&long_name)
        .f32(1.0)
        .str("end")
        .build();
    let options = DecodeOptions {
        peek_limit: 64,
        ..DecodeOptions::default()
    };

    // the long name is read, never peeked
    let doc = AnyDocument::decode_as(FormatKind::Material, bytes.as_slice(), &options)
        .expect("decode");
    assert_eq!(doc.to_bytes().expect("encode"), bytes);

    let bytes = Fixture::new()
        .str("CM3D2_MATERIAL")
        .i32(1000)
        .str("m")
        .str("m")
        .str("s")
        .str("sf")
        .str(&long_name)
        .build();
    let err = AnyDocument::decode_as(FormatKind::Material, bytes.as_slice(), &options)
        .expect_err("peek overflow");
    assert_eq!(err.field_path(), Some("material"));
    assert!(matches!(err.root(), Error::PeekOverflow { limit: 64, .. }));
}

#[test]
fn truncated_physics_is_an_error_not_a_partial_document() {
    let bytes = Fixture::new().str("CM3D21_PHY").i32(24102).str("root").build();
    let err = PhysicsFile::from_bytes(&bytes).expect_err("truncated");
    assert_eq!(err.field_path(), Some("damping.partialMode"));
    assert!(matches!(err.root(), Error::TruncatedInput { .. }));
}

#[test]
fn decode_buffers_past_the_end_of_the_document() {
    let mut both = collider_bytes();
    both.extend_from_slice(&collider_bytes());
    let mut rest = both.as_slice();
    let first = ColliderFile::decode(&mut rest).expect("decode");
    assert_eq!(first.colliders.len(), 1);
    assert!(rest.is_empty(), "{} bytes left unread", rest.len());
}
