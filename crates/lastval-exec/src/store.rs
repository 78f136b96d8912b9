//! Last-value store: the most recent slave record per key, served by key
//! lookups from a master stream.
//!
//! Placement policy on `put`:
//!
//! ```text
//! new key ---------------------------------------------> append
//! existing key, size <= capacity ----------------------> overwrite in place
//! existing key, size >  capacity --> retire old block --+
//!                                                       |
//!     free total <  reuse threshold -------------------> append
//!     free total >= reuse threshold --> first fit? -yes-> reuse block
//!                                                   -no-> append
//! ```
//!
//! Appended blocks get extra capacity (the growth margin) so a slightly
//! larger value for the same key can still be written in place.

use crate::encoder::RecordEncoder;
use crate::key::{KeyColumns, KeyWriter};
use crate::layout::ValueLayout;
use crate::metadata::RecordMetadata;
use crate::record::{Record, RecordCursor};
use crate::slot_map::KeyedSlotMap;
use crate::symbol::SymbolFacade;
use crate::view::RecordView;
use lastval_common::{
    ArenaOffset, ColumnType, LastValError, PageGeometry, Result, StoreConfig,
};
use lastval_memory::{Block, FreeList, PageArena, inflated_capacity};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Seam between the execution pipeline and a keep-latest-per-key map.
pub trait LastRecordMap {
    /// Stores `record` as the latest value of its key.
    fn put(&mut self, record: &dyn Record) -> Result<()>;

    /// Looks up the latest value for the key of master `record`.
    fn get(&mut self, record: &dyn Record) -> Result<Option<RecordView<'_>>>;

    /// Returns the value schema.
    fn metadata(&self) -> &RecordMetadata;

    /// Binds the slave source whose symbol tables resolve stored symbols.
    fn bind(&mut self, cursor: &dyn RecordCursor) -> Result<()>;

    /// Releases all memory. Further operations fail.
    fn close(&mut self);
}

/// Operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub puts: u64,
    /// Blocks appended to the arena.
    pub appends: u64,
    /// Updates written over the key's existing block.
    pub overwrites: u64,
    /// Updates that outgrew the key's block.
    pub relocations: u64,
    /// Relocations served from the free list.
    pub reuses: u64,
    pub lookups: u64,
    pub misses: u64,
}

/// Page-arena backed [`LastRecordMap`].
pub struct LastValueStore {
    geometry: PageGeometry,
    growth_margin_percent: u32,
    reuse_threshold: usize,
    arena: PageArena,
    free_list: FreeList,
    slots: KeyedSlotMap,
    key_writer: KeyWriter,
    master_keys: KeyColumns,
    slave_keys: KeyColumns,
    layout: ValueLayout,
    symbols: Option<Arc<dyn SymbolFacade>>,
    /// Value column index to slave column index, for symbol columns.
    sym_remap: HashMap<usize, usize>,
    scratch: String,
    stats: StoreStats,
    closed: bool,
}

impl LastValueStore {
    /// Creates a store for the given master and slave shapes.
    ///
    /// `key_columns` name columns present in both shapes. Key types must
    /// match, except that STRING and SYMBOL keys match each other.
    pub fn new(
        master: &RecordMetadata,
        slave: &RecordMetadata,
        key_columns: &[&str],
        config: StoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        let geometry = config.geometry();

        let mut master_indexes = Vec::with_capacity(key_columns.len());
        let mut master_types = Vec::with_capacity(key_columns.len());
        let mut slave_indexes = Vec::with_capacity(key_columns.len());
        let mut slave_types = Vec::with_capacity(key_columns.len());

        for (position, &name) in key_columns.iter().enumerate() {
            if key_columns[..position].contains(&name) {
                return Err(LastValError::DuplicateKeyColumn(name.to_string()));
            }
            let master_index = master.column_index(name)?;
            let slave_index = slave.column_index(name)?;
            let master_type = master.column_type(master_index);
            let slave_type = slave.column_type(slave_index);

            for column_type in [master_type, slave_type] {
                if column_type == ColumnType::Binary {
                    return Err(LastValError::UnsupportedType(column_type));
                }
            }
            if !master_type.key_compatible(slave_type) {
                return Err(LastValError::KeyTypeMismatch {
                    column: name.to_string(),
                    master: master_type,
                    slave: slave_type,
                });
            }

            master_indexes.push(master_index);
            master_types.push(master_type);
            slave_indexes.push(slave_index);
            slave_types.push(slave_type);
        }

        let layout = ValueLayout::new(slave, &slave_indexes, geometry.max_record_size())?;

        debug!(
            page_size = geometry.page_size(),
            fixed_size = layout.fixed_size(),
            value_columns = layout.column_count(),
            key_columns = key_columns.len(),
            "Created last value store"
        );

        Ok(Self {
            geometry,
            growth_margin_percent: config.growth_margin_percent,
            reuse_threshold: config.effective_reuse_threshold(),
            arena: PageArena::new(geometry),
            free_list: FreeList::new(),
            slots: KeyedSlotMap::with_capacity(slave_types.clone(), config.key_capacity),
            key_writer: KeyWriter::new(),
            master_keys: KeyColumns::new(master_indexes, master_types),
            slave_keys: KeyColumns::new(slave_indexes, slave_types),
            layout,
            symbols: None,
            sym_remap: HashMap::new(),
            scratch: String::new(),
            stats: StoreStats::default(),
            closed: false,
        })
    }

    /// Stores `record` as the latest value of its key.
    ///
    /// Fails with `RecordTooLarge` if the encoded value exceeds the maximum
    /// record size; the store is left unchanged in that case.
    pub fn put<R: Record + ?Sized>(&mut self, record: &R) -> Result<()> {
        self.ensure_open()?;

        let size = self.layout.encoded_size(record);
        let max = self.geometry.max_record_size();
        if size > max {
            return Err(LastValError::RecordTooLarge { size, max });
        }
        self.stats.puts += 1;

        self.key_writer.clear();
        self.slave_keys.write(record, &mut self.key_writer);
        let (slot, created) = self.slots.get_or_create(self.key_writer.as_bytes());

        let offset = if created {
            self.append(size)?
        } else {
            let current = self.arena.block(self.slots.offset(slot))?;
            if current.fits(size) {
                self.stats.overwrites += 1;
                current.offset
            } else {
                self.relocate(current, size)?
            }
        };
        self.slots.set_offset(slot, offset);

        let payload = self.arena.payload_mut(offset)?;
        RecordEncoder::new(&self.layout).write(record, payload);
        Ok(())
    }

    /// Looks up the latest value for the key of master `record`.
    ///
    /// Returns `Ok(None)` if no slave record with that key was stored.
    pub fn get<R: Record + ?Sized>(&mut self, record: &R) -> Result<Option<RecordView<'_>>> {
        self.ensure_open()?;
        self.stats.lookups += 1;

        self.key_writer.clear();
        self.master_keys.write(record, &mut self.key_writer);
        let Some(slot) = self.slots.get_existing(self.key_writer.as_bytes()) else {
            self.stats.misses += 1;
            return Ok(None);
        };

        let offset = self.slots.offset(slot);
        let payload = self.arena.payload(offset)?;
        Ok(Some(RecordView::new(
            payload,
            offset,
            &self.layout,
            self.symbols.as_deref(),
            &self.sym_remap,
            &mut self.scratch,
        )))
    }

    /// Binds the slave source. Symbol columns of returned views resolve
    /// through its symbol tables.
    pub fn bind(&mut self, cursor: &dyn RecordCursor) -> Result<()> {
        self.ensure_open()?;
        self.sym_remap.clear();
        for col in 0..self.layout.column_count() {
            if self.layout.column_type(col) == ColumnType::Symbol {
                self.sym_remap.insert(col, self.layout.value_index(col));
            }
        }
        self.symbols = Some(cursor.symbol_facade());
        Ok(())
    }

    /// Binds `cursor` and stores every record it yields. Returns the number
    /// of records stored.
    pub fn ingest(&mut self, cursor: &mut dyn RecordCursor) -> Result<usize> {
        self.bind(&*cursor)?;
        let mut count = 0;
        while let Some(record) = cursor.next_record() {
            self.put(record)?;
            count += 1;
        }
        debug!(count, keys = self.slots.len(), "Ingested slave records");
        Ok(count)
    }

    /// Releases all pages and keys. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let pages = self.arena.page_count();
        let keys = self.slots.len();

        self.arena.release_all();
        self.free_list.clear();
        self.slots.clear();
        self.symbols = None;
        self.sym_remap.clear();
        self.scratch = String::new();
        self.closed = true;

        debug!(pages, keys, "Closed last value store");
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the value schema.
    pub fn metadata(&self) -> &RecordMetadata {
        self.layout.metadata()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Returns the largest value, in bytes, a single record may encode to.
    pub fn max_record_size(&self) -> usize {
        self.geometry.max_record_size()
    }

    /// Returns the number of distinct keys stored.
    pub fn key_count(&self) -> usize {
        self.slots.len()
    }

    pub fn page_count(&self) -> usize {
        self.arena.page_count()
    }

    /// Returns the arena offset the next append starts from.
    pub fn append_offset(&self) -> ArenaOffset {
        self.arena.append_offset()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// Returns the summed capacity of retired blocks.
    pub fn free_list_size(&self) -> usize {
        self.free_list.total_size()
    }

    pub fn free_block_count(&self) -> usize {
        self.free_list.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(LastValError::StoreClosed);
        }
        Ok(())
    }

    fn append(&mut self, size: usize) -> Result<ArenaOffset> {
        let capacity = inflated_capacity(
            size,
            self.growth_margin_percent,
            self.geometry.max_record_size(),
        );
        let block = self.arena.append_block(capacity)?;
        self.stats.appends += 1;
        Ok(block.offset)
    }

    /// Moves a value that outgrew `current` to a new block.
    fn relocate(&mut self, current: Block, size: usize) -> Result<ArenaOffset> {
        self.stats.relocations += 1;
        self.free_list.add(current.offset, current.capacity);

        if self.free_list.total_size() >= self.reuse_threshold {
            if let Some(block) = self.free_list.find_and_remove(size) {
                self.stats.reuses += 1;
                debug!(
                    from = %current.offset,
                    to = %block.offset,
                    size,
                    capacity = block.capacity,
                    "Reused free block"
                );
                return Ok(block.offset);
            }
        }

        let offset = self.append(size)?;
        debug!(from = %current.offset, to = %offset, size, "Relocated record");
        Ok(offset)
    }
}

impl LastRecordMap for LastValueStore {
    fn put(&mut self, record: &dyn Record) -> Result<()> {
        LastValueStore::put(self, record)
    }

    fn get(&mut self, record: &dyn Record) -> Result<Option<RecordView<'_>>> {
        LastValueStore::get(self, record)
    }

    fn metadata(&self) -> &RecordMetadata {
        LastValueStore::metadata(self)
    }

    fn bind(&mut self, cursor: &dyn RecordCursor) -> Result<()> {
        LastValueStore::bind(self, cursor)
    }

    fn close(&mut self) {
        LastValueStore::close(self)
    }
}

impl Drop for LastValueStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LastValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastValueStore")
            .field("page_size", &self.geometry.page_size())
            .field("keys", &self.slots.len())
            .field("pages", &self.arena.page_count())
            .field("append_offset", &self.arena.append_offset())
            .field("free_list_size", &self.free_list.total_size())
            .field("closed", &self.closed)
            .finish()
    }
}
