//! Rejection of malformed, truncated, and misused input.
mod common;

use {
    common::{extra, Fruit, Holder, Scalars},
    flatmsg::{
        list::{BoolItems, EnumItems, PodItems, StructItems, TableItems, TextItems, UnionItems},
        read_message, Error, TableSchema, Writer, MESSAGE_MAGIC,
    },
};

fn u48_at(data: &[u8], at: usize) -> usize {
    let lo = u32::from_le_bytes(data[at..at + 4].try_into().unwrap()) as u64;
    let hi = u16::from_le_bytes(data[at + 4..at + 6].try_into().unwrap()) as u64;
    (lo | hi << 32) as usize
}

/// Offset of the root table's payload inside a finalized message.
fn root_payload(data: &[u8]) -> usize {
    u48_at(data, 4) + 10
}

#[test]
fn list_index_bounds() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    let numbers = h.add_list::<PodItems<i32>>(&mut w, Holder::NUMBERS, 3);
    numbers.set(&mut w, 2, 7);
    let data = w.finalize(h);

    let h = read_message::<Holder>(&data).unwrap();
    let numbers = h.get_list::<PodItems<i32>>(Holder::NUMBERS).unwrap().unwrap();
    assert_eq!(numbers.get(2).unwrap(), 7);
    assert_eq!(numbers.get(3), Err(Error::OutOfRange { index: 3, len: 3 }));
    assert_eq!(
        numbers.get(usize::MAX),
        Err(Error::OutOfRange { index: usize::MAX, len: 3 })
    );
}

#[test]
fn corrupt_object_magic_poisons_only_that_object() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    h.add_text(&mut w, Holder::NAME, "target");
    h.add_bytes(&mut w, Holder::BLOB, b"sibling");
    let mut data = w.finalize(h);

    // Flip one byte of the text object's magic.
    let text_header = u48_at(&data, root_payload(&data) + Holder::NAME);
    data[text_header] ^= 0xFF;

    let h = read_message::<Holder>(&data).unwrap();
    assert!(matches!(
        h.get_text(Holder::NAME),
        Err(Error::BadMagic { .. })
    ));
    // The sibling object is untouched and still decodes.
    assert_eq!(h.get_bytes(Holder::BLOB).unwrap(), Some(&b"sibling"[..]));
}

#[test]
fn wrong_table_type_is_a_bad_magic() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    h.add_table::<Scalars>(&mut w, Holder::CHILD);
    let data = w.finalize(h);

    let h = read_message::<Holder>(&data).unwrap();
    // Asking for a Holder where a Scalars was written fails the magic check.
    assert!(matches!(
        h.get_table::<Holder>(Holder::CHILD),
        Err(Error::BadMagic { .. })
    ));
}

#[test]
fn truncated_list_payload_fails_on_access() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    let numbers = h.add_list::<PodItems<i32>>(&mut w, Holder::NUMBERS, 31);
    numbers.set(&mut w, 30, 1);
    let data = w.finalize(h);

    let cut = &data[..data.len() - 4];
    // The table itself is intact: scalar fields still read.
    let h = read_message::<Holder>(cut).unwrap();
    assert_eq!(h.get_pod(Holder::ID, 0u32), 0);
    // Following the pointer to the short object is what fails.
    assert!(matches!(
        h.get_list::<PodItems<i32>>(Holder::NUMBERS),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn truncated_root_fails_at_read_message() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    let data = w.finalize(h);
    assert!(matches!(
        read_message::<Holder>(&data[..30]),
        Err(Error::Truncated { .. })
    ));
    assert!(matches!(
        read_message::<Holder>(&[1, 2, 3]),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn message_magic_is_checked() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    let mut data = w.finalize(h);
    data[0] ^= 1;
    assert!(matches!(
        read_message::<Holder>(&data),
        Err(Error::BadMagic { offset: 0, expected: MESSAGE_MAGIC, .. })
    ));
}

#[test]
fn message_without_root_is_rejected() {
    // A zero root pointer resolves to offset 0, where the message magic
    // cannot match any table's.
    let mut data = MESSAGE_MAGIC.to_le_bytes().to_vec();
    data.extend_from_slice(&[0; 6]);
    assert!(matches!(
        read_message::<Scalars>(&data),
        Err(Error::BadMagic { offset: 0, found, expected })
            if found == MESSAGE_MAGIC && expected == Scalars::MAGIC
    ));
}

#[test]
fn inplace_child_must_follow_its_owner() {
    let mut w = Writer::new();
    let first = w.add_table::<Holder>();
    let _second = w.add_table::<Holder>();
    // The cursor has moved past `first`; attaching its in-place child now
    // would land inside `second`.
    assert!(matches!(
        first.add_text_inplace(&mut w, Holder::NOTE, "late"),
        Err(Error::InplaceOrder { .. })
    ));
}

#[test]
fn inplace_child_survives_later_sibling_writes() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    h.add_text_inplace(&mut w, Holder::NOTE, "pinned").unwrap();
    // Ordinary field writes and fresh heap allocations after the in-place
    // child must leave its bytes alone.
    h.set_pod(&mut w, Holder::ID, 99u32);
    h.add_text(&mut w, Holder::NAME, "later sibling");
    let data = w.finalize(h);

    let h = read_message::<Holder>(&data).unwrap();
    assert_eq!(h.get_text_inplace(Holder::NOTE).unwrap(), Some("pinned"));
    assert_eq!(h.get_pod(Holder::ID, 0u32), 99);
    assert_eq!(h.get_text(Holder::NAME).unwrap(), Some("later sibling"));
}

#[test]
#[should_panic(expected = "different writer")]
fn cross_writer_handles_are_rejected() {
    let mut w1 = Writer::new();
    let mut w2 = Writer::new();
    let table = w1.add_table::<Holder>();
    table.set_pod(&mut w2, Holder::ID, 1u32);
}

#[test]
fn empty_union_payload_access_fails() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    let data = w.finalize(h);

    let h = read_message::<Holder>(&data).unwrap();
    let u = h.get_union(Holder::EXTRA);
    assert!(u.is_empty());
    assert_eq!(u.get_text(), Err(Error::EmptyUnion));
    assert_eq!(u.get_bytes(), Err(Error::EmptyUnion));
    assert!(matches!(u.get_table::<Scalars>(), Err(Error::EmptyUnion)));
}

/// Exercise every accessor shape against a buffer; all failures must be
/// errors, never panics.
fn walk(data: &[u8]) {
    let Ok(h) = read_message::<Holder>(data) else {
        return;
    };
    let _ = h.get_pod(Holder::ID, 0u32);
    let _ = h.get_text(Holder::NAME);
    let _ = h.get_bytes(Holder::BLOB);
    let _ = h.get_text_inplace(Holder::NOTE);
    let _ = h.get_struct::<common::Vec3>(Holder::POINTS);
    if let Ok(Some(list)) = h.get_list::<PodItems<i32>>(Holder::NUMBERS) {
        for item in list.iter() {
            let _ = item;
        }
    }
    if let Ok(Some(list)) = h.get_list::<BoolItems>(Holder::BOOLS) {
        let _ = list.get(0);
    }
    if let Ok(Some(list)) = h.get_list::<EnumItems<Fruit>>(Holder::NUMBERS) {
        let _ = list.get(0);
    }
    if let Ok(Some(list)) = h.get_list::<StructItems<common::Vec3>>(Holder::POINTS) {
        let _ = list.get(0);
    }
    if let Ok(Some(list)) = h.get_list::<TextItems>(Holder::NAMES) {
        for item in list.iter() {
            let _ = item;
        }
    }
    if let Ok(Some(list)) = h.get_list::<TableItems<Scalars>>(Holder::CHILDREN) {
        for item in list.iter() {
            let _ = item;
        }
    }
    if let Ok(Some(list)) = h.get_list::<UnionItems>(Holder::UNIONS) {
        for item in list.iter().flatten() {
            let _ = item.get_text();
            let _ = item.get_list::<PodItems<i32>>();
        }
    }
    let u = h.get_union(Holder::EXTRA);
    let _ = u.get_text();
    let _ = u.get_table::<Scalars>();
    let iu = h.get_union_inplace(Holder::INNER);
    let _ = iu.get_text();
    let _ = iu.get_struct::<common::Vec3>();
}

#[test]
fn every_truncation_of_a_rich_message_errors_cleanly() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    h.set_pod(&mut w, Holder::ID, 7u32);
    h.add_text(&mut w, Holder::NAME, "name");
    h.add_bytes(&mut w, Holder::BLOB, b"blob");
    let numbers = h.add_list::<PodItems<i32>>(&mut w, Holder::NUMBERS, 4);
    numbers.set(&mut w, 0, -1);
    let names = h.add_list::<TextItems>(&mut w, Holder::NAMES, 2);
    names.add(&mut w, 0, "x");
    let child = h.add_table::<Scalars>(&mut w, Holder::CHILD);
    child.set_pod(&mut w, Scalars::A, 1u8);
    let u = h.union_at(&w, Holder::EXTRA);
    u.add_text(&mut w, extra::NOTE, "u");
    let data = w.finalize(h);

    for len in 0..data.len() {
        walk(&data[..len]);
    }
    walk(&data);
}

#[test]
fn every_single_byte_corruption_errors_cleanly() {
    let mut w = Writer::new();
    let h = w.add_table::<Holder>();
    h.add_text(&mut w, Holder::NAME, "abc");
    let numbers = h.add_list::<PodItems<i32>>(&mut w, Holder::NUMBERS, 2);
    numbers.set(&mut w, 1, 5);
    let data = w.finalize(h);

    for at in 0..data.len() {
        let mut copy = data.clone();
        copy[at] = copy[at].wrapping_add(1);
        walk(&copy);
        copy[at] = 0xFF;
        walk(&copy);
    }
}
