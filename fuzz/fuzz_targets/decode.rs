//! Arbitrary bytes through every reader accessor: failures must be errors,
//! never panics or out-of-bounds reads.
#![no_main]

use {
    flatmsg::{
        list::{BoolItems, BytesItems, EnumItems, PodItems, StructItems, TableItems, TextItems, UnionItems},
        read_message,
        schema::{read_field, write_field},
        Enum, StructSchema, TableSchema, MESSAGE_MAGIC,
    },
    libfuzzer_sys::fuzz_target,
};

struct Probe;

impl TableSchema for Probe {
    const MAGIC: u32 = 0x1BADB002;
    const DEFAULT: &'static [u8] = &[0; 64];
}

#[derive(Clone, Copy)]
struct Pair {
    a: u32,
    b: u32,
}

impl StructSchema for Pair {
    const WIDTH: usize = 8;

    fn read(src: &[u8]) -> Self {
        Self {
            a: read_field(src, 0),
            b: read_field(src, 4),
        }
    }

    fn write(&self, dst: &mut [u8]) {
        write_field(dst, 0, self.a);
        write_field(dst, 4, self.b);
    }
}

#[derive(Clone, Copy)]
enum Tri {
    A,
    B,
}

impl Enum for Tri {
    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Tri::A),
            1 => Some(Tri::B),
            _ => None,
        }
    }

    fn index(self) -> u8 {
        match self {
            Tri::A => 0,
            Tri::B => 1,
        }
    }
}

fn walk(data: &[u8]) {
    let Ok(table) = read_message::<Probe>(data) else {
        return;
    };
    for field in (0..64).step_by(2) {
        let _ = table.get_pod(field, 0u64);
        let _ = table.get_bit(field, (field % 8) as u32, false);
        let _ = table.get_optional::<u32>((field, 1), field + 2);
        let _ = table.get_enum::<Tri>(field, 255);
        let _ = table.get_struct::<Pair>(field);
        let _ = table.get_text(field);
        let _ = table.get_bytes(field);
        let _ = table.get_table::<Probe>(field);
        let _ = table.get_text_inplace(field);
        let _ = table.get_bytes_inplace(field);

        if let Ok(Some(list)) = table.get_list::<PodItems<u64>>(field) {
            for item in list.iter().take(1 << 12) {
                let _ = item;
            }
        }
        if let Ok(Some(list)) = table.get_list::<BoolItems>(field) {
            for item in list.iter().take(1 << 12) {
                let _ = item;
            }
        }
        if let Ok(Some(list)) = table.get_list::<EnumItems<Tri>>(field) {
            let _ = list.get(0);
        }
        if let Ok(Some(list)) = table.get_list::<StructItems<Pair>>(field) {
            let _ = list.get(0);
        }
        if let Ok(Some(list)) = table.get_list::<TextItems>(field) {
            for item in list.iter().take(1 << 10) {
                let _ = item;
            }
        }
        if let Ok(Some(list)) = table.get_list::<BytesItems>(field) {
            let _ = list.get(0);
        }
        if let Ok(Some(list)) = table.get_list::<TableItems<Probe>>(field) {
            for child in list.iter().take(64).flatten().flatten() {
                let _ = child.get_pod(0, 0u8);
                let _ = child.get_text(0);
            }
        }
        if let Ok(Some(list)) = table.get_list::<UnionItems>(field) {
            for slot in list.iter().take(1 << 10).flatten() {
                let _ = slot.variant();
                let _ = slot.get_text();
                let _ = slot.get_bytes();
                let _ = slot.get_table::<Probe>();
                let _ = slot.get_list::<PodItems<u32>>();
                let _ = slot.get_struct::<Pair>();
            }
        }
        if let Ok(Some(list)) = table.get_list_inplace::<PodItems<u32>>(field) {
            let _ = list.get(0);
        }

        let union = table.get_union(field);
        let _ = union.get_text();
        let _ = union.get_table::<Probe>();
        let inplace = table.get_union_inplace(field);
        let _ = inplace.get_bytes();
        let _ = inplace.get_struct::<Pair>();
    }
}

fuzz_target!(|data: &[u8]| {
    walk(data);

    // Stamping the message magic lets the fuzzer reach past the first gate.
    if data.len() >= 4 {
        let mut patched = data.to_vec();
        patched[..4].copy_from_slice(&MESSAGE_MAGIC.to_le_bytes());
        walk(&patched);
    }
});
