//! Keep-latest-per-key record map for LATEST BY style joins.
//!
//! A [`LastValueStore`] ingests slave records and keeps, per distinct key,
//! only the most recent one. Master records then look up that value by the
//! same key columns. Values live in a page arena and are read back through
//! a borrowed [`RecordView`].

pub mod chars;
pub mod encoder;
pub mod key;
pub mod layout;
pub mod mem;
pub mod metadata;
pub mod record;
pub mod slot_map;
pub mod store;
pub mod symbol;
pub mod view;

pub use chars::Utf16Str;
pub use encoder::RecordEncoder;
pub use key::{KeyColumns, KeyWriter};
pub use layout::ValueLayout;
pub use metadata::{ColumnMetadata, RecordMetadata};
pub use record::{Record, RecordCursor};
pub use slot_map::{KeyedSlotMap, SlotId};
pub use store::{LastRecordMap, LastValueStore, StoreStats};
pub use symbol::{SymbolFacade, SymbolTable};
pub use view::RecordView;
