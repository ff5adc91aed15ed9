//! Construction entry points and the finalize step.
use {
    crate::{
        arena::Arena,
        list::{ListLayout, ListOut},
        table::TableOut,
        wire::{BYTES_MAGIC, HEADER_SIZE, LIST_MAGIC, MESSAGE_MAGIC, TEXT_MAGIC},
        TableSchema,
    },
    std::sync::atomic::{AtomicU64, Ordering},
};

/// Source of per-writer handle ids; setters reject handles minted by
/// another writer.
static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

/// Builds one message into a growable buffer.
///
/// Objects are appended bottom-up (or top-down via in-place children);
/// handles returned from the `add_*` methods are plain offset tokens, valid
/// for as long as the writer lives, and every mutation goes through
/// `&mut Writer` so the borrow checker enforces exclusive access.
/// [`Writer::finalize`] consumes the writer, which makes finalizing twice or
/// reading a half-built message unrepresentable.
pub struct Writer {
    pub(crate) arena: Arena,
    pub(crate) id: u64,
}

impl Writer {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// A writer whose backing buffer starts at `capacity` bytes, for callers
    /// that know their message size and want to avoid regrowth.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Arena::with_capacity(capacity.max(HEADER_SIZE));
        arena.alloc(HEADER_SIZE, 0);
        Self {
            arena,
            id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn check(&self, handle_writer: u64) {
        assert_eq!(
            handle_writer, self.id,
            "handle belongs to a different writer"
        );
    }

    /// Construct a table of type `T`, default-filled.
    pub fn add_table<T: TableSchema>(&mut self) -> TableOut<T> {
        let start = self.arena.alloc_table(T::MAGIC, T::DEFAULT);
        TableOut::new(start, self.id)
    }

    /// Construct a heap text object holding `text`.
    pub fn add_text(&mut self, text: &str) -> TextOut {
        let raw = text.as_bytes();
        // One uncounted NUL terminator follows the payload.
        let offset = self
            .arena
            .alloc_object(TEXT_MAGIC, raw.len() as u64, raw.len() + 1);
        self.arena.copy_from(offset, raw);
        TextOut {
            offset,
            writer: self.id,
        }
    }

    /// Construct a heap byte-blob object holding `bytes`.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> BytesOut {
        let offset = self
            .arena
            .alloc_object(BYTES_MAGIC, bytes.len() as u64, bytes.len());
        self.arena.copy_from(offset, bytes);
        BytesOut {
            offset,
            writer: self.id,
        }
    }

    /// Construct a list of `len` elements of kind `K`, filled with the
    /// kind's default byte pattern.
    pub fn add_list<K: ListLayout>(&mut self, len: usize) -> ListOut<K> {
        let start =
            self.arena
                .alloc_object_filled(LIST_MAGIC, len as u64, K::byte_len(len), K::FILL);
        ListOut::new(start, len, self.id)
    }

    /// Stamp the message header with `root` and return the finished buffer.
    pub fn finalize<T: TableSchema>(mut self, root: TableOut<T>) -> Vec<u8> {
        self.check(root.writer_id());
        self.arena.set_pod(0, MESSAGE_MAGIC);
        self.arena
            .set_u48(4, (root.start() - HEADER_SIZE) as u64);
        self.arena.into_inner()
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a constructed heap text object.
#[derive(Clone, Copy)]
pub struct TextOut {
    pub(crate) offset: usize,
    pub(crate) writer: u64,
}

/// Handle to a constructed heap byte-blob object.
#[derive(Clone, Copy)]
pub struct BytesOut {
    pub(crate) offset: usize,
    pub(crate) writer: u64,
}
