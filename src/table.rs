//! Table codec: fixed-size records with defaulted, bounds-checked fields.
//!
//! A table's payload is `declared_size` bytes of fixed-offset fields. The
//! declared size travels in the object header, and readers treat any field
//! offset at or past it as absent: old readers skip trailing fields written
//! by newer schemas, new readers see defaults for fields older writers never
//! knew. That defaulting is the compatibility mechanism, not an error.
use {
    crate::{
        error::{inplace_order, Result},
        list::{ListIn, ListItem, ListLayout, ListOut},
        reader::{load_header, Region, ZERO},
        schema::{Enum, StructSchema, TableSchema},
        union::{UnionIn, UnionLoc, UnionOut},
        wire::{u48_to_usize, Pod, BYTES_MAGIC, HEADER_SIZE, LIST_MAGIC, TEXT_MAGIC},
        writer::{BytesOut, TextOut, Writer},
    },
    core::{marker::PhantomData, str},
};

/// Read-only view of one table inside a finalized message.
pub struct TableIn<'a, T: TableSchema> {
    region: Region<'a>,
    _schema: PhantomData<T>,
}

impl<T: TableSchema> Clone for TableIn<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: TableSchema> Copy for TableIn<'_, T> {}

impl<'a, T: TableSchema> TableIn<'a, T> {
    /// Follow a header at absolute offset `at`, validating magic and span.
    pub(crate) fn load(buf: &'a [u8], at: usize) -> Result<Self> {
        let (payload, size) = load_header(buf, at, T::MAGIC)?;
        Ok(Self::over(Region::new(buf, payload, size)?))
    }

    /// Wrap an already-located payload (in-place union members, whose
    /// position and size come from the owner rather than a header).
    pub(crate) fn over(region: Region<'a>) -> Self {
        Self {
            region,
            _schema: PhantomData,
        }
    }

    /// The table's declared size as written, which may differ from
    /// `T::DEFAULT.len()` when reader and writer schemas have diverged.
    pub fn declared_size(&self) -> usize {
        self.region.len()
    }

    /// A scalar field, or `default` when the field lies outside the table's
    /// declared size.
    #[inline]
    pub fn get_pod<P: Pod>(&self, field: usize, default: P) -> P {
        self.region.get_pod(field).unwrap_or(default)
    }

    /// A boolean stored as one bit of the byte at `field`.
    #[inline]
    pub fn get_bit(&self, field: usize, bit: u32, default: bool) -> bool {
        self.region.get_bit(field, bit, default)
    }

    /// An optional scalar guarded by a presence bit. Absent reads as `None`,
    /// never as the field type's default: "unset" and "legacy default" are
    /// distinct, observable conditions.
    #[inline]
    pub fn get_optional<P: Pod>(&self, has: (usize, u32), field: usize) -> Option<P> {
        if !self.get_bit(has.0, has.1, false) {
            return None;
        }
        self.region.get_pod(field)
    }

    /// A one-byte enum field. 255 and indices unknown to this schema
    /// version decode as `None`.
    #[inline]
    pub fn get_enum<E: Enum>(&self, field: usize, default: u8) -> Option<E> {
        E::from_index(self.get_pod(field, default))
    }

    /// An inline struct field; zero-filled when outside the declared size.
    pub fn get_struct<S: StructSchema>(&self, field: usize) -> S {
        match self.region.slice(field, S::WIDTH) {
            Some(bytes) => S::read(bytes),
            None => S::read(&ZERO[..S::WIDTH]),
        }
    }

    /// Raw 48-bit field value, 0 when outside the declared size.
    #[inline]
    fn pointer(&self, field: usize) -> u64 {
        self.region.get_u48(field).unwrap_or(0)
    }

    /// Whether the pointer or in-place field at `field` holds a value.
    /// Backs the `has_*` accessors generated for heap-object fields.
    #[inline]
    pub fn has_field(&self, field: usize) -> bool {
        self.pointer(field) != 0
    }

    /// A pointer field to another table. 0 is null; otherwise the target's
    /// magic and span are validated before the view is handed out.
    pub fn get_table<U: TableSchema>(&self, field: usize) -> Result<Option<TableIn<'a, U>>> {
        match self.pointer(field) {
            0 => Ok(None),
            at => TableIn::load(self.region.buf(), u48_to_usize(at)?).map(Some),
        }
    }

    /// A pointer field to a text object, decoded as strict UTF-8.
    pub fn get_text(&self, field: usize) -> Result<Option<&'a str>> {
        match self.pointer(field) {
            0 => Ok(None),
            at => {
                let (payload, size) = load_header(self.region.buf(), u48_to_usize(at)?, TEXT_MAGIC)?;
                let region = Region::new(self.region.buf(), payload, size)?;
                Ok(Some(str::from_utf8(region.bytes())?))
            }
        }
    }

    /// A pointer field to a byte blob.
    pub fn get_bytes(&self, field: usize) -> Result<Option<&'a [u8]>> {
        match self.pointer(field) {
            0 => Ok(None),
            at => {
                let (payload, size) =
                    load_header(self.region.buf(), u48_to_usize(at)?, BYTES_MAGIC)?;
                Ok(Some(Region::new(self.region.buf(), payload, size)?.bytes()))
            }
        }
    }

    /// A pointer field to a list of elements of kind `K`.
    pub fn get_list<K: ListItem<'a>>(&self, field: usize) -> Result<Option<ListIn<'a, K>>> {
        match self.pointer(field) {
            0 => Ok(None),
            at => {
                let (payload, count) =
                    load_header(self.region.buf(), u48_to_usize(at)?, LIST_MAGIC)?;
                ListIn::load(self.region.buf(), payload, count).map(Some)
            }
        }
    }

    /// An in-place text child: the field stores only the byte length, and
    /// the payload sits directly after this table. No magic is checked; the
    /// position is derived, not followed.
    pub fn get_text_inplace(&self, field: usize) -> Result<Option<&'a str>> {
        match self.pointer(field) {
            0 => Ok(None),
            size => {
                let region =
                    Region::new(self.region.buf(), self.region.end(), u48_to_usize(size)?)?;
                Ok(Some(str::from_utf8(region.bytes())?))
            }
        }
    }

    /// An in-place byte-blob child.
    pub fn get_bytes_inplace(&self, field: usize) -> Result<Option<&'a [u8]>> {
        match self.pointer(field) {
            0 => Ok(None),
            size => Ok(Some(
                Region::new(self.region.buf(), self.region.end(), u48_to_usize(size)?)?.bytes(),
            )),
        }
    }

    /// An in-place list child; the field stores the element count.
    pub fn get_list_inplace<K: ListItem<'a>>(&self, field: usize) -> Result<Option<ListIn<'a, K>>> {
        match self.pointer(field) {
            0 => Ok(None),
            count => {
                ListIn::load(self.region.buf(), self.region.end(), u48_to_usize(count)?).map(Some)
            }
        }
    }

    /// A union field whose payload, if any, is addressed by offset.
    pub fn get_union(&self, field: usize) -> UnionIn<'a> {
        let tag = self.get_pod(field, 0u16);
        let loc = match self.pointer(field + 2) {
            0 => UnionLoc::None,
            at => UnionLoc::Offset(at),
        };
        UnionIn::new(self.region.buf(), tag, loc)
    }

    /// A union field whose payload is written in place after this table;
    /// the slot stores the payload size instead of an offset.
    pub fn get_union_inplace(&self, field: usize) -> UnionIn<'a> {
        let tag = self.get_pod(field, 0u16);
        UnionIn::new(
            self.region.buf(),
            tag,
            UnionLoc::Inplace {
                offset: self.region.end(),
                size: self.pointer(field + 2),
            },
        )
    }
}

/// Handle to a table under construction. A plain offset token: copying it is
/// free, and every mutation borrows the [`Writer`] exclusively.
pub struct TableOut<T: TableSchema> {
    start: usize,
    writer: u64,
    _schema: PhantomData<T>,
}

impl<T: TableSchema> Clone for TableOut<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: TableSchema> Copy for TableOut<T> {}

/// 48-bit pointer encoding: the stored value is the target's header offset
/// (payload start minus the header), with 0 reserved for null.
pub(crate) fn ptr_to(payload_offset: usize) -> u64 {
    (payload_offset - HEADER_SIZE) as u64
}

impl<T: TableSchema> TableOut<T> {
    pub(crate) fn new(start: usize, writer: u64) -> Self {
        Self {
            start,
            writer,
            _schema: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) fn writer_id(&self) -> u64 {
        self.writer
    }

    /// One past the payload, where an in-place child must begin.
    #[inline]
    fn end(&self) -> usize {
        self.start + T::DEFAULT.len()
    }

    #[inline]
    fn field(&self, w: &Writer, offset: usize, width: usize) -> usize {
        w.check(self.writer);
        assert!(
            offset + width <= T::DEFAULT.len(),
            "field outside table payload"
        );
        self.start + offset
    }

    pub fn set_pod<P: Pod>(&self, w: &mut Writer, field: usize, value: P) {
        let at = self.field(w, field, P::WIDTH);
        w.arena.set_pod(at, value);
    }

    pub fn set_bit(&self, w: &mut Writer, field: usize, bit: u32, value: bool) {
        let at = self.field(w, field, 1);
        w.arena.set_bit(at, bit, value);
    }

    /// Set an optional scalar: stores the value and flips its presence bit.
    pub fn set_optional<P: Pod>(&self, w: &mut Writer, has: (usize, u32), field: usize, value: P) {
        self.set_bit(w, has.0, has.1, true);
        self.set_pod(w, field, value);
    }

    pub fn set_enum<E: Enum>(&self, w: &mut Writer, field: usize, value: Option<E>) {
        self.set_pod(w, field, value.map(E::index).unwrap_or(255));
    }

    pub fn set_struct<S: StructSchema>(&self, w: &mut Writer, field: usize, value: S) {
        let at = self.field(w, field, S::WIDTH);
        value.write(w.arena.slice_mut(at, S::WIDTH));
    }

    fn set_ptr(&self, w: &mut Writer, field: usize, value: u64) {
        let at = self.field(w, field, 6);
        w.arena.set_u48(at, value);
    }

    /// Store a pointer to a previously constructed table, or null.
    pub fn set_table<U: TableSchema>(&self, w: &mut Writer, field: usize, value: Option<TableOut<U>>) {
        let ptr = value.map_or(0, |t| {
            w.check(t.writer);
            ptr_to(t.start)
        });
        self.set_ptr(w, field, ptr);
    }

    /// Construct a table of type `U` and store a pointer to it in one step.
    pub fn add_table<U: TableSchema>(&self, w: &mut Writer, field: usize) -> TableOut<U> {
        let child = w.add_table::<U>();
        self.set_table(w, field, Some(child));
        child
    }

    pub fn set_text(&self, w: &mut Writer, field: usize, value: Option<TextOut>) {
        let ptr = value.map_or(0, |t| {
            w.check(t.writer);
            ptr_to(t.offset)
        });
        self.set_ptr(w, field, ptr);
    }

    pub fn add_text(&self, w: &mut Writer, field: usize, text: &str) -> TextOut {
        let child = w.add_text(text);
        self.set_text(w, field, Some(child));
        child
    }

    pub fn set_bytes(&self, w: &mut Writer, field: usize, value: Option<BytesOut>) {
        let ptr = value.map_or(0, |b| {
            w.check(b.writer);
            ptr_to(b.offset)
        });
        self.set_ptr(w, field, ptr);
    }

    pub fn add_bytes(&self, w: &mut Writer, field: usize, bytes: &[u8]) -> BytesOut {
        let child = w.add_bytes(bytes);
        self.set_bytes(w, field, Some(child));
        child
    }

    pub fn set_list<K: ListLayout>(&self, w: &mut Writer, field: usize, value: Option<ListOut<K>>) {
        let ptr = value.map_or(0, |l| {
            w.check(l.writer_id());
            ptr_to(l.start())
        });
        self.set_ptr(w, field, ptr);
    }

    pub fn add_list<K: ListLayout>(&self, w: &mut Writer, field: usize, len: usize) -> ListOut<K> {
        let child = w.add_list::<K>(len);
        self.set_list(w, field, Some(child));
        child
    }

    /// Verify the arena cursor still sits at this table's end, the
    /// precondition for every in-place child.
    fn inplace_check(&self, w: &Writer) -> Result<()> {
        w.check(self.writer);
        if w.arena.len() != self.end() {
            return Err(inplace_order(self.end(), w.arena.len()));
        }
        Ok(())
    }

    /// Write `text` directly after this table, storing only its length in
    /// the field. Must be the first allocation after the table itself.
    pub fn add_text_inplace(&self, w: &mut Writer, field: usize, text: &str) -> Result<()> {
        self.inplace_check(w)?;
        self.set_ptr(w, field, text.len() as u64);
        let offset = w.arena.alloc(text.len() + 1, 0);
        w.arena.copy_from(offset, text.as_bytes());
        Ok(())
    }

    /// Write `bytes` directly after this table.
    pub fn add_bytes_inplace(&self, w: &mut Writer, field: usize, bytes: &[u8]) -> Result<()> {
        self.inplace_check(w)?;
        self.set_ptr(w, field, bytes.len() as u64);
        let offset = w.arena.alloc(bytes.len(), 0);
        w.arena.copy_from(offset, bytes);
        Ok(())
    }

    /// Allocate a headerless list directly after this table, storing the
    /// element count in the field.
    pub fn add_list_inplace<K: ListLayout>(
        &self,
        w: &mut Writer,
        field: usize,
        len: usize,
    ) -> Result<ListOut<K>> {
        self.inplace_check(w)?;
        self.set_ptr(w, field, len as u64);
        let start = w.arena.alloc(K::byte_len(len), K::FILL);
        Ok(ListOut::new(start, len, self.writer))
    }

    /// The union slot at `field`, payloads addressed by offset.
    pub fn union_at(&self, w: &Writer, field: usize) -> UnionOut {
        let slot = self.field(w, field, 8);
        UnionOut::new(slot, None, self.writer)
    }

    /// The union slot at `field`, payloads written in place after this
    /// table.
    pub fn union_inplace_at(&self, w: &Writer, field: usize) -> UnionOut {
        let slot = self.field(w, field, 8);
        UnionOut::new(slot, Some(self.end()), self.writer)
    }
}
