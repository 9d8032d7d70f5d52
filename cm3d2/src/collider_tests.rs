use crate::test_support::Fixture;
use crate::{
    BustCollider, CapsuleCollider, Collider, ColliderBase, ColliderFile, Document, Error,
    PlaneCollider, VariantFamily,
};

fn base_fixture(f: Fixture, self_name: &str) -> Fixture {
    f.str("Bip01 Spine")
        .str(self_name)
        .floats(&[0.1, 0.2, 0.3])
        .floats(&[0.0, 0.0, 0.0, 1.0])
        .floats(&[1.0, 1.0, 1.0])
        .i32(1)
        .floats(&[0.0, 0.05, 0.0])
        .i32(0)
}

fn expected_base(self_name: &str) -> ColliderBase {
    ColliderBase {
        parent_name: "Bip01 Spine".into(),
        self_name: self_name.into(),
        local_position: [0.1, 0.2, 0.3],
        local_rotation: [0.0, 0.0, 0.0, 1.0],
        local_scale: [1.0, 1.0, 1.0],
        direction: 1,
        center: [0.0, 0.05, 0.0],
        bound: 0,
    }
}

#[test]
fn capsule_collider_round_trips() {
    let f = Fixture::new().str("CM3D21_COL").i32(24102).i32(1).str("dbc");
    let bytes = base_fixture(f, "hip_col").f32(0.5).f32(1.0).build();

    let file = ColliderFile::from_bytes(&bytes).expect("decode");
    assert_eq!(file.version, 24102);
    assert_eq!(
        file.colliders,
        vec![Collider::Capsule(CapsuleCollider {
            base: expected_base("hip_col"),
            radius: 0.5,
            height: 1.0,
        })]
    );
    assert_eq!(file.to_bytes().expect("encode"), bytes);
}

#[test]
fn mixed_colliders_keep_order_and_placeholders() {
    let f = Fixture::new().str("CM3D21_COL").i32(24102).i32(4).str("dpc");
    let f = base_fixture(f, "floor").str("missing").str("dbm");
    let bytes = base_fixture(f, "mune_L")
        .f32(0.08)
        .f32(0.0)
        .f32(1.5)
        .floats(&[0.0, 0.01, 0.02])
        .str("missing")
        .build();

    let file = ColliderFile::from_bytes(&bytes).expect("decode");
    assert_eq!(file.colliders.len(), 4);
    assert_eq!(
        file.colliders[0],
        Collider::Plane(PlaneCollider {
            base: expected_base("floor"),
        })
    );
    assert_eq!(file.colliders[1], Collider::Missing);
    assert_eq!(
        file.colliders[2],
        Collider::Bust(BustCollider {
            base: expected_base("mune_L"),
            radius: 0.08,
            height: 0.0,
            scale_rate_mul_max: 1.5,
            center_rate_max: [0.0, 0.01, 0.02],
        })
    );
    assert!(file.colliders[3].base().is_none());
    assert_eq!(
        file.colliders[2].base().map(|b| b.self_name.as_str()),
        Some("mune_L")
    );

    assert_eq!(file.to_bytes().expect("encode"), bytes);
}

#[test]
fn unknown_collider_tag_fails_with_its_index() {
    let bytes = Fixture::new()
        .str("CM3D21_COL")
        .i32(24102)
        .i32(2)
        .str("missing")
        .str("dsc")
        .build();

    let err = ColliderFile::from_bytes(&bytes).expect_err("unknown tag");
    assert_eq!(err.field_path(), Some("colliders[1]"));
    assert!(matches!(
        err.root(),
        Error::UnsupportedVariant { family: VariantFamily::Collider, tag, .. } if tag == "dsc"
    ));
}

#[test]
fn negative_collider_count_is_invalid() {
    let bytes = Fixture::new().str("CM3D21_COL").i32(24102).i32(-3).build();
    let err = ColliderFile::from_bytes(&bytes).expect_err("negative count");
    assert!(matches!(err.root(), Error::InvalidLength { length: -3, .. }));
}

#[test]
fn collider_count_shorter_than_payload_stops_reading() {
    let bytes = Fixture::new()
        .str("CM3D21_COL")
        .i32(24102)
        .i32(3)
        .str("missing")
        .build();
    let err = ColliderFile::from_bytes(&bytes).expect_err("truncated");
    assert_eq!(err.field_path(), Some("colliders[1]"));
    assert!(matches!(err.root(), Error::TruncatedInput { .. }));
}
