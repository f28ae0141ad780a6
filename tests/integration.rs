//! Integration tests for polywire.
//!
//! These tests exercise the codec end to end through the public API.

use polywire::codec::{Encoder, Var};
use polywire::context::{CommonFlags, DataFlags, WireConfig, NATIVE_BIG_ENDIAN, NATIVE_BITNESS_32};
use polywire::protocol::{decode_message, encode_message, encode_message_in, HEADER_SIZE};
use polywire::{
    from_bytes, to_bytes, to_bytes_in, wire_record, BulkSafety, Decoder, Handle, InterfaceId,
    ObjectArena, Result, Strategy, VersionDescriptor, Versioned, Wire, WireContext, WireError,
};
use zerocopy::{FromBytes, Immutable, IntoBytes};

fn foreign_order() -> CommonFlags {
    CommonFlags::for_wire(!NATIVE_BIG_ENDIAN, NATIVE_BITNESS_32)
}

fn graph_flags() -> DataFlags {
    DataFlags::empty()
        .with(DataFlags::ALLOW_REFERENCE_FIELDS)
        .with(DataFlags::CHECK_CYCLIC_REFERENCES)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable)]
#[repr(C)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

wire_record!(Vec3 { x, y, z }, bulk = WhenAlignmentFixed);

#[derive(Debug, Clone, PartialEq)]
struct Mesh {
    name: String,
    vertices: Vec<Vec3>,
    indices: Vec<u16>,
    flags: [bool; 3],
    id: usize,
}

wire_record!(Mesh { name, vertices, indices, flags, id });

fn mesh() -> Mesh {
    Mesh {
        name: "cube".into(),
        vertices: vec![
            Vec3 { x: 0.0, y: 1.0, z: -1.0 },
            Vec3 { x: 2.5, y: -3.25, z: 4.0 },
        ],
        indices: vec![0, 1, 0, 513],
        flags: [true, false, true],
        id: 4096,
    }
}

#[test]
fn test_roundtrip_under_flag_combinations() {
    let data_flags = [
        DataFlags::empty(),
        DataFlags::empty().with(DataFlags::ALIGNMENT_MAY_DIFFER),
        DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER),
        DataFlags::empty().with(DataFlags::DISABLE_BULK_OPTIMIZATION),
    ];
    let common_flags = [
        CommonFlags::native(),
        foreign_order(),
        CommonFlags::for_wire(NATIVE_BIG_ENDIAN, true),
    ];

    for data in data_flags {
        for common in common_flags {
            let ctx = WireContext::new(0)
                .with_common_flags(common)
                .with_data_flags(data);
            let bytes = to_bytes(&mesh(), ctx).unwrap();
            let decoded = from_bytes::<Mesh>(&bytes, ctx).unwrap();
            assert_eq!(decoded.value, mesh(), "flags {common:?} {data:?}");
            assert_eq!(decoded.consumed, bytes.len());
        }
    }
}

#[test]
fn test_bulk_and_field_images_match_on_native_peer() {
    let ctx = WireContext::new(0);
    assert_eq!(Strategy::select::<Vec3>(&ctx), Strategy::Bulk);
    let bulk = to_bytes(&mesh(), ctx).unwrap();

    let no_bulk = ctx.with_data_flags(DataFlags::empty().with(DataFlags::DISABLE_BULK_OPTIMIZATION));
    assert_eq!(Strategy::select::<Vec3>(&no_bulk), Strategy::Fields);
    let fields = to_bytes(&mesh(), no_bulk).unwrap();

    assert_eq!(bulk, fields);
}

#[test]
fn test_endianness_matches_native_value() {
    let value: u32 = 0x0102_0304;
    let native = to_bytes(&value, WireContext::new(0)).unwrap();
    let foreign_ctx = WireContext::new(0).with_common_flags(foreign_order());
    let foreign = to_bytes(&value, foreign_ctx).unwrap();

    let mut reversed = native.to_vec();
    reversed.reverse();
    assert_eq!(&foreign[..], &reversed[..]);
    assert_eq!(from_bytes::<u32>(&foreign, foreign_ctx).unwrap().value, value);

    // single bytes are never swapped
    let bytes = to_bytes(&vec![1u8, 2, 3], foreign_ctx).unwrap();
    assert_eq!(&bytes[bytes.len() - 3..], &[1, 2, 3]);
}

// ---------------------------------------------------------------------------
// Width adaptation
// ---------------------------------------------------------------------------

#[test]
fn test_widening_is_lossless() {
    let ctx = WireContext::new(0)
        .with_data_flags(DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER));
    let bytes = to_bytes(&Var(-5i16), ctx).unwrap();
    assert_eq!(bytes[0], 2);
    assert_eq!(from_bytes::<Var<i64>>(&bytes, ctx).unwrap().value, Var(-5));
}

#[test]
fn test_word_width_follows_bitness() {
    let flags = DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER);
    let narrow = WireContext::new(0)
        .with_common_flags(CommonFlags::for_wire(NATIVE_BIG_ENDIAN, true))
        .with_data_flags(flags);
    let wide = narrow.with_common_flags(CommonFlags::for_wire(NATIVE_BIG_ENDIAN, false));

    assert_eq!(to_bytes(&7usize, narrow).unwrap().len(), 1 + 4);
    assert_eq!(to_bytes(&7usize, wide).unwrap().len(), 1 + 8);

    // a 64-bit writer's small counters are readable at any word size
    let bytes = to_bytes(&vec![9u8; 3], wide).unwrap();
    assert_eq!(from_bytes::<Vec<u8>>(&bytes, narrow).unwrap().value, vec![9u8; 3]);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_word_overflow_writes_nothing() {
    let ctx = WireContext::new(0)
        .with_common_flags(CommonFlags::for_wire(NATIVE_BIG_ENDIAN, true))
        .with_data_flags(DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER));

    let mut enc = Encoder::new(ctx).unwrap();
    enc.field(&1u8).unwrap();
    let err = enc.field(&(u32::MAX as usize + 1)).unwrap_err();
    assert!(matches!(err, WireError::ValueOverflow { .. }));
    assert_eq!(enc.position(), 1);
}

#[derive(Debug, PartialEq)]
struct WideSample {
    x: u8,
    y: Var<u64>,
}

wire_record!(WideSample { x, y });

#[derive(Debug, PartialEq)]
struct NarrowSample {
    x: u8,
    y: Var<u32>,
}

wire_record!(NarrowSample { x, y });

#[test]
fn test_narrowing_reader() {
    let ctx = WireContext::new(0)
        .with_data_flags(DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER));

    let fits = to_bytes(&WideSample { x: 3, y: Var(u32::MAX as u64) }, ctx).unwrap();
    assert_eq!(fits.len(), 1 + 1 + 8);
    let decoded = from_bytes::<NarrowSample>(&fits, ctx).unwrap().value;
    assert_eq!(decoded, NarrowSample { x: 3, y: Var(u32::MAX) });

    let too_big = to_bytes(&WideSample { x: 3, y: Var(u32::MAX as u64 + 1) }, ctx).unwrap();
    let err = from_bytes::<NarrowSample>(&too_big, ctx).unwrap_err();
    assert!(matches!(err, WireError::DataCorrupted(_)));
}

// ---------------------------------------------------------------------------
// Packed record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable)]
#[repr(C, packed)]
struct Packed {
    x: u8,
    y: u16,
}

impl Wire for Packed {
    const BULK: BulkSafety = BulkSafety::Always;

    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        let Packed { x, y } = *self;
        enc.field(&x)?;
        enc.field(&y)
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(Packed {
            x: dec.field()?,
            y: dec.field()?,
        })
    }

    polywire::bulk_hooks!();
}

#[test]
fn test_packed_record_bytes() {
    let ctx = WireContext::new(0).with_common_flags(CommonFlags::for_wire(false, NATIVE_BITNESS_32));
    if !NATIVE_BIG_ENDIAN {
        assert_eq!(Strategy::select::<Packed>(&ctx), Strategy::Bulk);
    }

    let bytes = to_bytes(&Packed { x: 3, y: 4 }, ctx).unwrap();
    assert_eq!(&bytes[..], &[0x03, 0x04, 0x00]);

    let decoded = from_bytes::<Packed>(&[0x03, 0x04, 0x00], ctx).unwrap();
    assert_eq!(decoded.value, Packed { x: 3, y: 4 });
    assert_eq!(decoded.consumed, 3);
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Node {
    value: u32,
    next: Option<Handle<Node>>,
}

wire_record!(Node { value, next });

#[test]
fn test_null_reference_roundtrip() {
    let node = Node { value: 1, next: None };

    let plain = WireContext::new(0)
        .with_data_flags(DataFlags::empty().with(DataFlags::ALLOW_REFERENCE_FIELDS));
    let bytes = to_bytes(&node, plain).unwrap();
    assert_eq!(bytes.len(), 4 + 1);
    assert!(from_bytes::<Node>(&bytes, plain).unwrap().value.next.is_none());

    let graph = WireContext::new(0).with_data_flags(graph_flags());
    let bytes = to_bytes(&node, graph).unwrap();
    assert_eq!(bytes.len(), 4 + std::mem::size_of::<usize>());
    let decoded = from_bytes::<Node>(&bytes, graph).unwrap();
    assert!(decoded.value.next.is_none());
    assert!(decoded.arena.is_empty());
}

#[test]
fn test_references_need_permission() {
    let err = to_bytes(&Node { value: 1, next: None }, WireContext::new(0)).unwrap_err();
    assert!(matches!(err, WireError::UnsupportedSettingsForType));
}

#[test]
fn test_self_cycle_keeps_identity() {
    let mut arena = ObjectArena::new();
    let a = arena.insert(Node { value: 42, next: None });
    arena.get_mut(a).unwrap().next = Some(a);

    let ctx = WireContext::new(0).with_data_flags(graph_flags());
    let bytes = to_bytes_in(&Some(a), &arena, ctx).unwrap();
    // new sentinel, value, back-reference
    let word = std::mem::size_of::<usize>();
    assert_eq!(bytes.len(), word + 4 + word);

    let decoded = from_bytes::<Option<Handle<Node>>>(&bytes, ctx).unwrap();
    let root = decoded.value.unwrap();
    let node = decoded.arena.get(root).unwrap();
    assert_eq!(node.value, 42);
    assert_eq!(node.next, Some(root));
    assert_eq!(decoded.arena.len(), 1);
}

#[test]
fn test_two_node_cycle() {
    let mut arena = ObjectArena::new();
    let a = arena.insert(Node { value: 1, next: None });
    let b = arena.insert(Node { value: 2, next: Some(a) });
    arena.get_mut(a).unwrap().next = Some(b);

    let ctx = WireContext::new(0)
        .with_common_flags(foreign_order())
        .with_data_flags(graph_flags());
    let bytes = to_bytes_in(&Some(a), &arena, ctx).unwrap();

    let decoded = from_bytes::<Option<Handle<Node>>>(&bytes, ctx).unwrap();
    let first = decoded.value.unwrap();
    let second = decoded.arena.get(first).unwrap().next.unwrap();
    assert_eq!(decoded.arena.get(second).unwrap().value, 2);
    assert_eq!(decoded.arena.get(second).unwrap().next, Some(first));
}

#[test]
fn test_handles_enumerate_decoded_objects() {
    let mut arena = ObjectArena::new();
    let tail = arena.insert(Node { value: 2, next: None });
    let head = arena.insert(Node { value: 1, next: Some(tail) });

    let ctx = WireContext::new(0).with_data_flags(graph_flags());
    let bytes = to_bytes_in(&Some(head), &arena, ctx).unwrap();
    let mut decoded = from_bytes::<Option<Handle<Node>>>(&bytes, ctx).unwrap();

    let values: Vec<u32> = decoded
        .arena
        .handles::<Node>()
        .map(|h| decoded.arena.get(h).unwrap().value)
        .collect();
    assert_eq!(values, vec![1, 2]);

    let root = decoded.value.unwrap();
    let owned = decoded.arena.take(root).unwrap();
    assert_eq!(owned.value, 1);
    assert_eq!(decoded.arena.len(), 1);
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

const SETTINGS_ID: InterfaceId = InterfaceId(0x5e77_1165);
const SETTINGS_V0: VersionDescriptor = VersionDescriptor::new(SETTINGS_ID, 0, &[0]);
const SETTINGS_V1: VersionDescriptor = VersionDescriptor::new(SETTINGS_ID, 1, &[1, 0]);
const SETTINGS_V2: VersionDescriptor = VersionDescriptor::new(SETTINGS_ID, 2, &[2, 1, 0]);

#[derive(Debug, PartialEq)]
struct SettingsV0 {
    width: u32,
}

wire_record!(SettingsV0 { width }, version = SETTINGS_V0);

#[derive(Debug, PartialEq)]
struct SettingsV1 {
    width: u32,
    height: u32,
}

wire_record!(SettingsV1 { width, height }, version = SETTINGS_V1, convert);

impl Versioned for SettingsV1 {
    type Older = SettingsV0;

    fn to_older(&self) -> Option<SettingsV0> {
        Some(SettingsV0 { width: self.width })
    }

    fn from_older(older: SettingsV0) -> Option<Self> {
        Some(SettingsV1 {
            width: older.width,
            height: 480,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Settings {
    width: u32,
    height: u32,
    title: String,
}

wire_record!(Settings { width, height, title }, version = SETTINGS_V2, convert);

impl Versioned for Settings {
    type Older = SettingsV1;

    fn to_older(&self) -> Option<SettingsV1> {
        Some(SettingsV1 {
            width: self.width,
            height: self.height,
        })
    }

    fn from_older(older: SettingsV1) -> Option<Self> {
        Some(Settings {
            width: older.width,
            height: older.height,
            title: "untitled".into(),
        })
    }
}

#[test]
fn test_version_chain_to_origin_and_back() {
    let current = Settings {
        width: 640,
        height: 360,
        title: "main".into(),
    };
    let origin = WireContext::new(0);
    let bytes = to_bytes(&current, origin).unwrap();
    assert_eq!(bytes.len(), 4);

    let decoded = from_bytes::<Settings>(&bytes, origin).unwrap().value;
    assert_eq!(
        decoded,
        Settings {
            width: 640,
            height: 480,
            title: "untitled".into(),
        }
    );
}

#[test]
fn test_version_chain_is_readable_by_old_build() {
    let current = Settings {
        width: 800,
        height: 600,
        title: "x".into(),
    };
    let ctx = WireContext::new(1);
    let bytes = to_bytes(&current, ctx).unwrap();

    let old: SettingsV1 = from_bytes(&bytes, ctx).unwrap().value;
    assert_eq!(old, SettingsV1 { width: 800, height: 600 });
}

#[test]
fn test_versioned_sequence_elements() {
    let ctx = WireContext::new(0);
    let list = vec![
        Settings {
            width: 1,
            height: 1,
            title: "a".into(),
        },
        Settings {
            width: 2,
            height: 2,
            title: "b".into(),
        },
    ];
    let bytes = to_bytes(&list, ctx).unwrap();
    let decoded = from_bytes::<Vec<Settings>>(&bytes, ctx).unwrap().value;
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[1].width, 2);
    assert_eq!(decoded[1].height, 480);
}

// ---------------------------------------------------------------------------
// Messages and configuration
// ---------------------------------------------------------------------------

#[test]
fn test_message_from_json_config() {
    let config = WireConfig::from_json(
        r#"{ "interface_version": 1, "bitness32": true, "integer_width_may_differ": true }"#,
    )
    .unwrap();
    let ctx = config.to_context().unwrap();

    let settings = Settings {
        width: 10,
        height: 20,
        title: "dropped".into(),
    };
    let bytes = encode_message(&settings, 3, ctx).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 8);

    let msg = decode_message::<Settings>(&bytes).unwrap();
    assert_eq!(msg.header.interface_id, SETTINGS_ID);
    assert_eq!(msg.header.interface_version, 1);
    assert_eq!(msg.value.title, "untitled");
    assert_eq!(msg.value.height, 20);
}

#[test]
fn test_message_with_cycle() {
    let mut arena = ObjectArena::new();
    let a = arena.insert(Node { value: 5, next: None });
    arena.get_mut(a).unwrap().next = Some(a);

    let ctx = WireContext::new(0).with_data_flags(graph_flags());
    let bytes = encode_message_in(&Some(a), &arena, 0, ctx).unwrap();
    let msg = decode_message::<Option<Handle<Node>>>(&bytes).unwrap();
    let root = msg.value.unwrap();
    assert_eq!(msg.arena.get(root).unwrap().next, Some(root));
}

#[test]
fn test_truncated_input_is_corruption() {
    let ctx = WireContext::new(0);
    let bytes = to_bytes(&mesh(), ctx).unwrap();
    for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        let err = from_bytes::<Mesh>(&bytes[..cut], ctx).unwrap_err();
        assert!(matches!(err, WireError::DataCorrupted(_)), "cut at {cut}: {err}");
    }
}
