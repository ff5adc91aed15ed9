//! Union codec: a 2-byte variant tag plus a 48-bit payload word.
//!
//! Tag 0 means empty. In a table field the payload word is either the
//! payload object's header offset or, for in-place unions, its size (the
//! payload then sits directly after the owning table). In a list, every slot
//! is a fixed 8-byte cell addressing its payload by offset.
use {
    crate::{
        error::{empty_union, inplace_order, Result},
        list::{ListIn, ListItem, ListLayout, ListOut},
        reader::{load_header, Region},
        schema::{StructSchema, TableSchema},
        table::{ptr_to, TableIn, TableOut},
        wire::{u48_to_usize, BYTES_MAGIC, LIST_MAGIC, TEXT_MAGIC},
        writer::{BytesOut, TextOut, Writer},
    },
    core::str,
};

/// Where a union's payload lives, as recorded by its slot.
#[derive(Clone, Copy)]
pub(crate) enum UnionLoc {
    /// No payload word (offset 0 on the wire).
    None,
    /// Header offset of a heap object; magic still to be validated.
    Offset(u64),
    /// Positionally derived in-place payload: already past any header, no
    /// magic to check.
    Inplace { offset: usize, size: u64 },
}

/// Read-only view of one union slot.
///
/// The caller matches on [`variant`](Self::variant) and then invokes the
/// accessor for that variant's payload shape; generated code guards the
/// accessors with the tag.
#[derive(Clone, Copy)]
pub struct UnionIn<'a> {
    buf: &'a [u8],
    tag: u16,
    loc: UnionLoc,
}

impl<'a> UnionIn<'a> {
    pub(crate) fn new(buf: &'a [u8], tag: u16, loc: UnionLoc) -> Self {
        Self { buf, tag, loc }
    }

    /// The 2-byte variant tag; 0 is the empty union.
    #[inline]
    pub fn variant(&self) -> u16 {
        self.tag
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tag == 0
    }

    /// Resolve the payload span of a magic-tagged heap object, skipping the
    /// magic check for positionally derived in-place payloads.
    fn object(&self, expected: u32) -> Result<(usize, usize)> {
        match self.loc {
            UnionLoc::None => Err(empty_union()),
            UnionLoc::Offset(at) => load_header(self.buf, u48_to_usize(at)?, expected),
            UnionLoc::Inplace { offset, size } => Ok((offset, u48_to_usize(size)?)),
        }
    }

    pub fn get_table<T: TableSchema>(&self) -> Result<TableIn<'a, T>> {
        match self.loc {
            UnionLoc::None => Err(empty_union()),
            UnionLoc::Offset(at) => TableIn::load(self.buf, u48_to_usize(at)?),
            UnionLoc::Inplace { offset, size } => {
                Ok(TableIn::over(Region::new(self.buf, offset, u48_to_usize(size)?)?))
            }
        }
    }

    pub fn get_text(&self) -> Result<&'a str> {
        let (payload, size) = self.object(TEXT_MAGIC)?;
        let region = Region::new(self.buf, payload, size)?;
        Ok(str::from_utf8(region.bytes())?)
    }

    pub fn get_bytes(&self) -> Result<&'a [u8]> {
        let (payload, size) = self.object(BYTES_MAGIC)?;
        Ok(Region::new(self.buf, payload, size)?.bytes())
    }

    pub fn get_list<K: ListItem<'a>>(&self) -> Result<ListIn<'a, K>> {
        let (payload, count) = self.object(LIST_MAGIC)?;
        ListIn::load(self.buf, payload, count)
    }

    /// A struct-valued variant, carried inline with no heap object.
    pub fn get_struct<S: StructSchema>(&self) -> Result<S> {
        let offset = match self.loc {
            UnionLoc::None => return Err(empty_union()),
            UnionLoc::Offset(at) => u48_to_usize(at)?,
            UnionLoc::Inplace { offset, .. } => offset,
        };
        let region = Region::new(self.buf, offset, S::WIDTH)?;
        Ok(S::read(region.bytes()))
    }
}

/// Handle to a union slot under construction.
///
/// Slots obtained from a table field know their owner's end and accept
/// in-place members; slots inside union lists address payloads by offset
/// only.
#[derive(Clone, Copy)]
pub struct UnionOut {
    slot: usize,
    container_end: Option<usize>,
    writer: u64,
}

impl UnionOut {
    pub(crate) fn new(slot: usize, container_end: Option<usize>, writer: u64) -> Self {
        Self {
            slot,
            container_end,
            writer,
        }
    }

    fn store(&self, w: &mut Writer, tag: u16, value: u64) {
        w.check(self.writer);
        w.arena.set_pod(self.slot, tag);
        w.arena.set_u48(self.slot + 2, value);
    }

    pub fn set_table<T: TableSchema>(&self, w: &mut Writer, tag: u16, value: TableOut<T>) {
        w.check(value.writer_id());
        self.store(w, tag, ptr_to(value.start()));
    }

    pub fn add_table<T: TableSchema>(&self, w: &mut Writer, tag: u16) -> TableOut<T> {
        let child = w.add_table::<T>();
        self.set_table(w, tag, child);
        child
    }

    pub fn set_text(&self, w: &mut Writer, tag: u16, value: TextOut) {
        w.check(value.writer);
        self.store(w, tag, ptr_to(value.offset));
    }

    pub fn add_text(&self, w: &mut Writer, tag: u16, text: &str) -> TextOut {
        let child = w.add_text(text);
        self.set_text(w, tag, child);
        child
    }

    pub fn set_bytes(&self, w: &mut Writer, tag: u16, value: BytesOut) {
        w.check(value.writer);
        self.store(w, tag, ptr_to(value.offset));
    }

    pub fn add_bytes(&self, w: &mut Writer, tag: u16, bytes: &[u8]) -> BytesOut {
        let child = w.add_bytes(bytes);
        self.set_bytes(w, tag, child);
        child
    }

    pub fn set_list<K: ListLayout>(&self, w: &mut Writer, tag: u16, value: ListOut<K>) {
        w.check(value.writer_id());
        self.store(w, tag, ptr_to(value.start()));
    }

    pub fn add_list<K: ListLayout>(&self, w: &mut Writer, tag: u16, len: usize) -> ListOut<K> {
        let child = w.add_list::<K>(len);
        self.set_list(w, tag, child);
        child
    }

    fn inplace_check(&self, w: &Writer) -> Result<()> {
        w.check(self.writer);
        let end = match self.container_end {
            Some(end) => end,
            None => panic!("in-place union members require a table-field slot"),
        };
        if w.arena.len() != end {
            return Err(inplace_order(end, w.arena.len()));
        }
        Ok(())
    }

    /// Construct a default-filled, headerless table directly after the
    /// union's owner; the slot records the tag and the table's size.
    pub fn add_table_inplace<T: TableSchema>(&self, w: &mut Writer, tag: u16) -> Result<TableOut<T>> {
        self.inplace_check(w)?;
        self.store(w, tag, T::DEFAULT.len() as u64);
        let start = w.arena.alloc(T::DEFAULT.len(), 0);
        w.arena.copy_from(start, T::DEFAULT);
        Ok(TableOut::new(start, self.writer))
    }

    pub fn add_text_inplace(&self, w: &mut Writer, tag: u16, text: &str) -> Result<()> {
        self.inplace_check(w)?;
        self.store(w, tag, text.len() as u64);
        let offset = w.arena.alloc(text.len() + 1, 0);
        w.arena.copy_from(offset, text.as_bytes());
        Ok(())
    }

    pub fn add_bytes_inplace(&self, w: &mut Writer, tag: u16, bytes: &[u8]) -> Result<()> {
        self.inplace_check(w)?;
        self.store(w, tag, bytes.len() as u64);
        let offset = w.arena.alloc(bytes.len(), 0);
        w.arena.copy_from(offset, bytes);
        Ok(())
    }

    pub fn add_list_inplace<K: ListLayout>(
        &self,
        w: &mut Writer,
        tag: u16,
        len: usize,
    ) -> Result<ListOut<K>> {
        self.inplace_check(w)?;
        self.store(w, tag, len as u64);
        let start = w.arena.alloc(K::byte_len(len), K::FILL);
        Ok(ListOut::new(start, len, self.writer))
    }

    /// Write a struct-valued variant inline after the union's owner.
    pub fn add_struct_inplace<S: StructSchema>(&self, w: &mut Writer, tag: u16, value: S) -> Result<()> {
        self.inplace_check(w)?;
        self.store(w, tag, S::WIDTH as u64);
        let offset = w.arena.alloc(S::WIDTH, 0);
        value.write(w.arena.slice_mut(offset, S::WIDTH));
        Ok(())
    }
}
