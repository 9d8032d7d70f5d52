use crate::test_support::Fixture;
use crate::{
    AnimationCurve, BoneValue, Document, Error, FreezeAxis, Keyframe, ParameterBlock,
    PartialMode, PhysicsFile,
};

fn block(f: Fixture, mode: i32, overrides: &[(&str, f32)], value: f32, keys: &[[f32; 4]]) -> Fixture {
    let mut f = f.i32(mode);
    if mode == 1 {
        f = f.i32(overrides.len() as i32);
        for (name, v) in overrides {
            f = f.str(name).f32(*v);
        }
    }
    f = f.f32(value).i32(keys.len() as i32);
    for k in keys {
        f = f.floats(k);
    }
    f
}

fn tail(f: Fixture) -> Fixture {
    f.f32(0.2)
        .floats(&[0.0, -0.1, 0.0])
        .floats(&[0.0, -0.98, 0.0])
        .floats(&[0.0, 0.0, 0.0])
        .str("skirt.col")
        .i32(2)
        .i32(5)
        .i32(2)
}

fn sample() -> Vec<u8> {
    let f = Fixture::new().str("CM3D21_PHY").i32(24102).str("Skirt");
    let f = block(f, 1, &[("Skirt_A", 0.3), ("Skirt_B", 0.4)], 0.2, &[]);
    let f = block(f, 0, &[], 0.1, &[[0.0, 1.0, 0.0, 0.0], [1.0, 0.5, -0.5, -0.5]]);
    let f = block(f, 2, &[], 0.3, &[]);
    let f = block(f, 0, &[], 0.0, &[]);
    let f = block(f, 0, &[], 0.05, &[[0.5, 0.5, 0.0, 0.0]]);
    tail(f).build()
}

#[test]
fn sample_round_trips_exactly() {
    let bytes = sample();
    let phy = PhysicsFile::from_bytes(&bytes).expect("decode");

    assert_eq!(phy.root_name, "Skirt");
    assert_eq!(phy.damping.partial_mode, PartialMode::PARTIAL);
    assert_eq!(
        phy.damping.overrides,
        vec![
            BoneValue {
                bone_name: "Skirt_A".into(),
                value: 0.3,
            },
            BoneValue {
                bone_name: "Skirt_B".into(),
                value: 0.4,
            },
        ]
    );
    assert_eq!(phy.elasticity.curve.keyframes.len(), 2);
    assert_eq!(
        phy.elasticity.curve.keyframes[1],
        Keyframe {
            time: 1.0,
            value: 0.5,
            in_tangent: -0.5,
            out_tangent: -0.5,
        }
    );
    assert_eq!(phy.stiffness.partial_mode, PartialMode::FROM_BONE_NAME);
    assert!(phy.stiffness.overrides.is_empty());
    assert!(phy.inert.curve.keyframes.is_empty());
    assert_eq!(phy.gravity, [0.0, -0.98, 0.0]);
    assert_eq!(phy.collider_file_name, "skirt.col");
    assert_eq!(phy.freeze_axis, FreezeAxis::Y);

    assert_eq!(phy.to_bytes().expect("encode"), bytes);
}

#[test]
fn collider_and_exclusion_counts_are_kept_verbatim() {
    let mut phy = PhysicsFile::from_bytes(&sample()).expect("decode");
    assert_eq!(phy.colliders_count, 2);
    assert_eq!(phy.exclusions_count, 5);

    phy.colliders_count = 9;
    let bytes = phy.to_bytes().expect("encode");
    // counts sit right before the trailing freeze axis, with nothing after them
    let n = bytes.len();
    assert_eq!(&bytes[n - 12..n - 8], &9i32.to_le_bytes());
    assert_eq!(&bytes[n - 8..n - 4], &5i32.to_le_bytes());
    assert_eq!(PhysicsFile::from_bytes(&bytes).expect("re-decode").colliders_count, 9);
}

#[test]
fn overrides_are_only_written_in_partial_mode() {
    let mut phy = PhysicsFile::from_bytes(&sample()).expect("decode");
    let original = phy.to_bytes().expect("encode");

    phy.elasticity.overrides.push(BoneValue {
        bone_name: "ignored".into(),
        value: 9.0,
    });
    let bytes = phy.to_bytes().expect("encode");
    assert_eq!(bytes, original, "non-partial block wrote overrides");

    let decoded = PhysicsFile::from_bytes(&bytes).expect("decode");
    assert!(decoded.elasticity.overrides.is_empty());
}

#[test]
fn switching_to_partial_mode_writes_the_list() {
    let mut phy = PhysicsFile::from_bytes(&sample()).expect("decode");
    let before = phy.to_bytes().expect("encode").len();

    phy.radius = ParameterBlock {
        partial_mode: PartialMode::PARTIAL,
        overrides: vec![
            BoneValue {
                bone_name: "a".into(),
                value: 1.0,
            },
            BoneValue {
                bone_name: "b".into(),
                value: 2.0,
            },
        ],
        value: 0.05,
        curve: AnimationCurve::default(),
    };
    let bytes = phy.to_bytes().expect("encode");
    // count + two (name, value) pairs, minus the dropped keyframe
    assert_eq!(bytes.len(), before + 4 + 2 * (2 + 4) - 16);

    let decoded = PhysicsFile::from_bytes(&bytes).expect("decode");
    assert_eq!(decoded.radius, phy.radius);
}

#[test]
fn unknown_modes_and_axes_survive() {
    let f = Fixture::new().str("CM3D21_PHY").i32(24102).str("Hair");
    let f = block(f, 7, &[], 0.2, &[]);
    let f = (0..4).fold(f, |f, _| block(f, 0, &[], 0.0, &[]));
    let mut bytes = tail(f).build();
    let n = bytes.len();
    bytes[n - 4..].copy_from_slice(&42i32.to_le_bytes());

    let phy = PhysicsFile::from_bytes(&bytes).expect("decode");
    assert_eq!(phy.damping.partial_mode, PartialMode(7));
    assert!(!phy.damping.partial_mode.is_partial());
    assert_eq!(phy.freeze_axis, FreezeAxis(42));
    assert_eq!(phy.to_bytes().expect("encode"), bytes);
}

#[test]
fn truncated_block_reports_its_path() {
    let f = Fixture::new().str("CM3D21_PHY").i32(24102).str("Skirt");
    let bytes = f.i32(1).i32(2).str("Skirt_A").build();

    let err = PhysicsFile::from_bytes(&bytes).expect_err("truncated");
    assert_eq!(err.field_path(), Some("damping.overrides[0]"));
    assert!(matches!(err.root(), Error::TruncatedInput { .. }));
}
