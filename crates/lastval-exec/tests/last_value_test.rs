//! Last-value store integration tests.
//!
//! Exercises the store end to end through in-memory records:
//! - latest value per key, absent keys
//! - round trip of every storable column type
//! - in-place overwrite, relocation and free-list reuse
//! - record size limits and page tail handling
//! - symbol keys and symbol resolution after bind
//! - lifecycle and error reporting
//!
//! Set RUST_LOG=debug to see placement decisions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;

use lastval_common::{ArenaOffset, ColumnType, LastValError, StoreConfig};
use lastval_exec::mem::{MemSymbolFacade, MemSymbolTable, RowRecord, Value, VecRecordCursor};
use lastval_exec::{LastRecordMap, LastValueStore, RecordMetadata};

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key_only(name: &str, column_type: ColumnType) -> RecordMetadata {
    RecordMetadata::from_pairs(&[(name, column_type)])
}

/// `{k: INT, s: STRING}` store keyed on `k`.
fn text_store(config: StoreConfig) -> LastValueStore {
    let slave = RecordMetadata::from_pairs(&[("k", ColumnType::Int), ("s", ColumnType::String)]);
    LastValueStore::new(&key_only("k", ColumnType::Int), &slave, &["k"], config).unwrap()
}

fn text_row(key: i32, len: usize) -> RowRecord {
    RowRecord::new(vec![Value::Int(key), Value::String("x".repeat(len))])
}

fn probe(key: i32) -> RowRecord {
    RowRecord::new(vec![Value::Int(key)])
}

// =============================================================================
// Latest Value Per Key
// =============================================================================

#[test]
fn test_latest_value_scenario() {
    init_tracing();

    let slave = RecordMetadata::from_pairs(&[
        ("id", ColumnType::Int),
        ("name", ColumnType::String),
        ("score", ColumnType::Double),
    ]);
    let master = key_only("id", ColumnType::Int);
    let mut store = LastValueStore::new(&master, &slave, &["id"], StoreConfig::default()).unwrap();

    let row = |id: i32, name: &str, score: f64| {
        RowRecord::new(vec![
            Value::Int(id),
            Value::String(name.to_string()),
            Value::Double(score),
        ])
    };
    store.put(&row(1, "abc", 1.5)).unwrap();
    store.put(&row(2, "xyz", 2.5)).unwrap();
    store.put(&row(1, "abcdef", 9.9)).unwrap();

    assert_eq!(store.metadata().column_count(), 2);
    assert_eq!(store.metadata().column_index("score").unwrap(), 1);

    {
        let mut view = store.get(&probe(1)).unwrap().unwrap();
        assert_eq!(view.get_str(0), "abcdef");
        assert_eq!(view.get_double(1), 9.9);
    }
    {
        let mut view = store.get(&probe(2)).unwrap().unwrap();
        assert_eq!(view.get_str(0), "xyz");
        assert_eq!(view.get_double(1), 2.5);
    }
    assert!(store.get(&probe(3)).unwrap().is_none());

    let stats = store.stats();
    assert_eq!(stats.puts, 3);
    assert_eq!(stats.lookups, 3);
    assert_eq!(stats.misses, 1);
    assert_eq!(store.key_count(), 2);
}

#[test]
fn test_absent_key_is_not_zero_record() {
    let mut store = text_store(StoreConfig::default());
    store.put(&text_row(0, 0)).unwrap();

    assert!(store.get(&probe(0)).unwrap().is_some());
    assert!(store.get(&probe(1)).unwrap().is_none());
    assert!(store.get(&probe(-1)).unwrap().is_none());
}

#[test]
fn test_random_updates_match_model() {
    init_tracing();

    let slave = RecordMetadata::from_pairs(&[
        ("seq", ColumnType::Long),
        ("k", ColumnType::Int),
        ("s", ColumnType::String),
    ]);
    let mut store = LastValueStore::new(
        &key_only("k", ColumnType::Int),
        &slave,
        &["k"],
        StoreConfig::with_page_size(4096),
    )
    .unwrap();

    let alphabet: Vec<char> = "abcxyzé€😀".chars().collect();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut model: HashMap<i32, (i64, String)> = HashMap::new();

    for seq in 0..5_000i64 {
        let key = rng.random_range(0..64);
        let len = rng.random_range(0..300);
        let text: String = (0..len)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();

        store
            .put(&RowRecord::new(vec![
                Value::Long(seq),
                Value::Int(key),
                Value::String(text.clone()),
            ]))
            .unwrap();
        model.insert(key, (seq, text));
    }

    assert_eq!(store.key_count(), model.len());
    for key in 0..80 {
        match (store.get(&probe(key)).unwrap(), model.get(&key)) {
            (Some(mut view), Some((seq, text))) => {
                assert_eq!(view.get_long(0), *seq, "seq for key {}", key);
                assert_eq!(view.get_str(1), text.as_str(), "text for key {}", key);
            }
            (None, None) => {}
            (found, expected) => panic!(
                "key {}: store has value {}, model has value {}",
                key,
                found.is_some(),
                expected.is_some()
            ),
        }
    }

    let stats = store.stats();
    assert_eq!(stats.puts, 5_000);
    assert_eq!(stats.appends + stats.overwrites + stats.reuses, 5_000);
}

// =============================================================================
// Round Trip
// =============================================================================

fn all_types_store() -> LastValueStore {
    let slave = RecordMetadata::from_pairs(&[
        ("id", ColumnType::Long),
        ("b", ColumnType::Boolean),
        ("by", ColumnType::Byte),
        ("sh", ColumnType::Short),
        ("i", ColumnType::Int),
        ("l", ColumnType::Long),
        ("f", ColumnType::Float),
        ("d", ColumnType::Double),
        ("dt", ColumnType::Date),
        ("sym", ColumnType::Symbol),
        ("s", ColumnType::String),
    ]);
    LastValueStore::new(
        &key_only("id", ColumnType::Long),
        &slave,
        &["id"],
        StoreConfig::default(),
    )
    .unwrap()
}

fn all_types_row(id: i64, table: &mut MemSymbolTable, text: String) -> RowRecord {
    RowRecord::new(vec![
        Value::Long(id),
        Value::Boolean(true),
        Value::Byte(i8::MIN),
        Value::Short(i16::MAX),
        Value::Int(-123_456),
        Value::Long(i64::MIN + 1),
        Value::Float(f32::MIN_POSITIVE),
        Value::Double(-0.0),
        Value::Date(1_700_000_000_123),
        Value::symbol(table, "sym"),
        Value::String(text),
    ])
}

#[test]
fn test_round_trip_all_types() {
    let mut store = all_types_store();
    let mut table = MemSymbolTable::new();
    table.intern("first");

    let lengths = [0usize, 1, 1_000];
    for (id, &len) in lengths.iter().enumerate() {
        let text: String = "ab€".chars().cycle().take(len).collect();
        store
            .put(&all_types_row(id as i64, &mut table, text))
            .unwrap();
    }

    for (id, &len) in lengths.iter().enumerate() {
        let expected: String = "ab€".chars().cycle().take(len).collect();
        let mut view = store
            .get(&RowRecord::new(vec![Value::Long(id as i64)]))
            .unwrap()
            .unwrap();

        assert!(view.get_bool(0));
        assert_eq!(view.get_byte(1), i8::MIN);
        assert_eq!(view.get_short(2), i16::MAX);
        assert_eq!(view.get_int(3), -123_456);
        assert_eq!(view.get_long(4), i64::MIN + 1);
        assert_eq!(view.get_float(5).to_bits(), f32::MIN_POSITIVE.to_bits());
        assert_eq!(view.get_double(6).to_bits(), (-0.0f64).to_bits());
        assert_eq!(view.get_date(7), 1_700_000_000_123);
        assert_eq!(view.get_sym_code(8), 1);
        assert_eq!(view.get_str_len(9), len);
        assert_eq!(view.get_flyweight_str(9), expected.as_str());
        assert_eq!(view.get_str(9), expected);
        assert_eq!(view.row_id(), None);
    }
}

#[test]
fn test_longest_string_that_fits_a_page() {
    let mut store = all_types_store();
    let mut table = MemSymbolTable::new();
    let max = store.max_record_size();
    assert_eq!(max, 16 * 1024 - 4);

    // 44 fixed bytes plus a 4-byte length leave room for this many units.
    let fit = (max - 44 - 4) / 2;
    let text: String = "q".repeat(fit);
    store.put(&all_types_row(1, &mut table, text.clone())).unwrap();

    let mut view = store
        .get(&RowRecord::new(vec![Value::Long(1)]))
        .unwrap()
        .unwrap();
    assert_eq!(view.capacity(), max);
    assert_eq!(view.get_str(9), text);

    let err = store
        .put(&all_types_row(2, &mut table, "q".repeat(fit + 1)))
        .unwrap_err();
    assert!(matches!(err, LastValError::RecordTooLarge { max: m, .. } if m == max));
    assert_eq!(store.key_count(), 1);
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn test_growth_relocates_and_shrink_stays() {
    let mut store = text_store(StoreConfig::with_page_size(1024));

    store.put(&text_row(1, 10)).unwrap(); // 28 bytes, capacity 30
    store.put(&text_row(2, 5)).unwrap();
    let first = store.get(&probe(1)).unwrap().unwrap().address();

    store.put(&text_row(1, 40)).unwrap(); // 88 bytes, capacity 96
    let grown = store.get(&probe(1)).unwrap().unwrap().address();
    assert_ne!(first, grown);

    // The neighbour is untouched by the relocation.
    {
        let mut view = store.get(&probe(2)).unwrap().unwrap();
        assert_eq!(view.get_str(0), "xxxxx");
    }

    let append_offset = store.append_offset();
    for len in [44, 1, 0] {
        store.put(&text_row(1, len)).unwrap();
        let mut view = store.get(&probe(1)).unwrap().unwrap();
        assert_eq!(view.address(), grown);
        assert_eq!(view.capacity(), 96);
        assert_eq!(view.get_str(0).len(), len);
    }
    assert_eq!(store.append_offset(), append_offset);
    assert_eq!(store.stats().relocations, 1);
    assert_eq!(store.stats().overwrites, 3);
}

#[test]
fn test_free_list_reuse_after_threshold() {
    init_tracing();
    let mut store = text_store(StoreConfig::with_page_size(1024));
    assert_eq!(store.max_record_size(), 1020);

    // Each key lands in a 96-byte block, then outgrows it.
    for key in 0..11 {
        store.put(&text_row(key, 40)).unwrap();
    }
    for key in 0..11 {
        store.put(&text_row(key, 50)).unwrap();
    }
    assert_eq!(store.free_list_size(), 11 * 96);
    assert_eq!(store.free_block_count(), 11);
    assert_eq!(store.stats().reuses, 0);

    store.put(&text_row(100, 0)).unwrap();
    let pages = store.page_count();
    let append_offset = store.append_offset();

    // The free total is past the threshold, so growth takes a retired block.
    store.put(&text_row(100, 40)).unwrap();
    assert_eq!(store.stats().reuses, 1);
    assert_eq!(store.page_count(), pages);
    assert_eq!(store.append_offset(), append_offset);

    let mut view = store.get(&probe(100)).unwrap().unwrap();
    assert_eq!(view.address(), ArenaOffset::ZERO);
    assert_eq!(view.get_str(0), "x".repeat(40));
    drop(view);

    assert_eq!(store.free_list_size(), 11 * 96 + 8 - 96);
    let mut view = store.get(&probe(0)).unwrap().unwrap();
    assert_eq!(view.get_str(0), "x".repeat(50));
}

#[test]
fn test_free_list_ignored_below_threshold() {
    let mut store = text_store(StoreConfig::with_page_size(1024));
    for key in 0..2 {
        store.put(&text_row(key, 40)).unwrap();
        store.put(&text_row(key, 50)).unwrap();
    }
    store.put(&text_row(100, 0)).unwrap();
    let append_offset = store.append_offset();

    // A fitting 96-byte block is retired, but the free total is small.
    store.put(&text_row(100, 40)).unwrap();
    assert_eq!(store.stats().reuses, 0);
    assert!(store.append_offset() > append_offset);
    let view = store.get(&probe(100)).unwrap().unwrap();
    assert_eq!(view.address(), append_offset);
}

#[test]
fn test_page_tail_is_abandoned() {
    let mut store = text_store(StoreConfig::with_page_size(256));

    // 208 bytes, capacity 228, footprint 232.
    store.put(&text_row(1, 100)).unwrap();
    store.put(&text_row(2, 100)).unwrap();

    assert_eq!(store.page_count(), 2);
    assert_eq!(store.append_offset(), ArenaOffset(256 + 232));
    let view = store.get(&probe(2)).unwrap().unwrap();
    assert_eq!(view.address(), ArenaOffset(256));
    assert_eq!(store.free_block_count(), 0);
}

#[test]
fn test_max_record_capacity_is_clamped_to_page() {
    let mut store = text_store(StoreConfig::with_page_size(256));

    // 8 + 244 = 252 = max record size; the margin would overflow the page.
    store.put(&text_row(1, 122)).unwrap();
    store.put(&text_row(2, 0)).unwrap();

    let view = store.get(&probe(1)).unwrap().unwrap();
    assert_eq!(view.capacity(), 252);
    assert_eq!(store.page_count(), 2);
    let view = store.get(&probe(2)).unwrap().unwrap();
    assert_eq!(view.address(), ArenaOffset(256));
}

// =============================================================================
// Size Limits
// =============================================================================

#[test]
fn test_fixed_layout_too_large_for_page() {
    let mut columns = vec![("k", ColumnType::Int)];
    let names: Vec<String> = (0..8).map(|i| format!("c{}", i)).collect();
    for name in &names {
        columns.push((name.as_str(), ColumnType::Long));
    }
    let slave = RecordMetadata::from_pairs(&columns);

    // 64 fixed bytes against a 60-byte maximum.
    let err = LastValueStore::new(
        &key_only("k", ColumnType::Int),
        &slave,
        &["k"],
        StoreConfig::with_page_size(64),
    )
    .unwrap_err();
    assert!(matches!(err, LastValError::RecordTooLarge { size: 64, max: 60 }));
}

#[test]
fn test_page_size_is_rounded_up() {
    let store = text_store(StoreConfig::with_page_size(1000));
    assert_eq!(store.geometry().page_size(), 1024);
    assert_eq!(store.max_record_size(), 1020);
}

// =============================================================================
// Symbols
// =============================================================================

#[test]
fn test_symbol_keys_match_across_dictionaries() {
    let slave = RecordMetadata::from_pairs(&[
        ("ticker", ColumnType::Symbol),
        ("px", ColumnType::Double),
    ]);
    let master = RecordMetadata::from_pairs(&[
        ("ts", ColumnType::Date),
        ("ticker", ColumnType::Symbol),
    ]);
    let mut store = LastValueStore::new(&master, &slave, &["ticker"], StoreConfig::default())
        .unwrap();

    let mut slave_table = MemSymbolTable::new();
    for (ticker, px) in [("AAPL", 1.0), ("MSFT", 2.0), ("AAPL", 3.0)] {
        let sym = Value::symbol(&mut slave_table, ticker);
        store
            .put(&RowRecord::new(vec![sym, Value::Double(px)]))
            .unwrap();
    }
    store
        .put(&RowRecord::new(vec![Value::null_symbol(), Value::Double(4.0)]))
        .unwrap();

    // The master dictionary codes MSFT as 0 and AAPL as 1.
    let mut master_table = MemSymbolTable::new();
    let msft = Value::symbol(&mut master_table, "MSFT");
    let aapl = Value::symbol(&mut master_table, "AAPL");

    let lookup = |store: &mut LastValueStore, sym: Value| {
        store
            .get(&RowRecord::new(vec![Value::Date(0), sym]))
            .unwrap()
            .map(|view| view.get_double(0))
    };
    assert_eq!(lookup(&mut store, aapl), Some(3.0));
    assert_eq!(lookup(&mut store, msft), Some(2.0));
    assert_eq!(lookup(&mut store, Value::null_symbol()), Some(4.0));
    let goog = Value::symbol(&mut master_table, "GOOG");
    assert_eq!(lookup(&mut store, goog), None);
}

#[test]
fn test_string_master_key_matches_symbol_slave_key() {
    let slave = RecordMetadata::from_pairs(&[
        ("ticker", ColumnType::Symbol),
        ("qty", ColumnType::Int),
    ]);
    let master = key_only("ticker", ColumnType::String);
    let mut store = LastValueStore::new(&master, &slave, &["ticker"], StoreConfig::default())
        .unwrap();

    let mut table = MemSymbolTable::new();
    let sym = Value::symbol(&mut table, "EURUSD");
    store
        .put(&RowRecord::new(vec![sym, Value::Int(10)]))
        .unwrap();

    let view = store
        .get(&RowRecord::new(vec![Value::String("EURUSD".to_string())]))
        .unwrap()
        .unwrap();
    assert_eq!(view.get_int(0), 10);
}

#[test]
fn test_symbol_values_resolve_after_ingest() {
    init_tracing();

    let slave = RecordMetadata::from_pairs(&[
        ("venue", ColumnType::Symbol),
        ("ticker", ColumnType::Symbol),
        ("px", ColumnType::Double),
    ]);
    let master = key_only("ticker", ColumnType::Symbol);
    let mut store = LastValueStore::new(&master, &slave, &["ticker"], StoreConfig::default())
        .unwrap();

    let mut facade = MemSymbolFacade::new();
    facade.table_mut(0).intern("XLON");
    let mut rows = Vec::new();
    for (venue, ticker, px) in [("XNYS", "IBM", 1.0), ("XNAS", "IBM", 2.0), ("XNYS", "HPQ", 3.0)] {
        let venue = Value::symbol(facade.table_mut(0), venue);
        let ticker = Value::symbol(facade.table_mut(1), ticker);
        rows.push(RowRecord::new(vec![venue, ticker, Value::Double(px)]));
    }
    let mut cursor = VecRecordCursor::new(rows, Arc::new(facade));

    assert_eq!(store.ingest(&mut cursor).unwrap(), 3);
    assert_eq!(store.key_count(), 2);

    let mut master_table = MemSymbolTable::new();
    let ibm = Value::symbol(&mut master_table, "IBM");
    let view = store.get(&RowRecord::new(vec![ibm])).unwrap().unwrap();
    assert_eq!(view.get_sym_code(0), 2);
    assert_eq!(view.get_sym(0).unwrap(), Some("XNAS"));
    assert_eq!(view.get_double(1), 2.0);
}

#[test]
fn test_symbol_read_before_bind_fails() {
    let slave = RecordMetadata::from_pairs(&[("k", ColumnType::Int), ("s", ColumnType::Symbol)]);
    let mut store = LastValueStore::new(
        &key_only("k", ColumnType::Int),
        &slave,
        &["k"],
        StoreConfig::default(),
    )
    .unwrap();

    let mut table = MemSymbolTable::new();
    let sym = Value::symbol(&mut table, "a");
    store.put(&RowRecord::new(vec![Value::Int(1), sym])).unwrap();

    let view = store.get(&probe(1)).unwrap().unwrap();
    assert_eq!(view.get_sym_code(0), 0);
    assert!(matches!(
        view.get_sym(0),
        Err(LastValError::SymbolTableNotBound { column: 0 })
    ));
}

// =============================================================================
// Errors and Lifecycle
// =============================================================================

#[test]
fn test_binary_columns_rejected() {
    let slave = RecordMetadata::from_pairs(&[("k", ColumnType::Int), ("blob", ColumnType::Binary)]);
    let err = LastValueStore::new(
        &key_only("k", ColumnType::Int),
        &slave,
        &["k"],
        StoreConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LastValError::UnsupportedType(ColumnType::Binary)));

    let slave = RecordMetadata::from_pairs(&[("blob", ColumnType::Binary), ("v", ColumnType::Int)]);
    let err = LastValueStore::new(
        &key_only("blob", ColumnType::Binary),
        &slave,
        &["blob"],
        StoreConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LastValError::UnsupportedType(ColumnType::Binary)));
}

#[test]
fn test_binary_access_on_view_fails() {
    let mut store = text_store(StoreConfig::default());
    store.put(&text_row(1, 1)).unwrap();
    let view = store.get(&probe(1)).unwrap().unwrap();

    let err = view.get_bin(0).unwrap_err();
    assert!(matches!(err, LastValError::UnsupportedOperation(_)));
    assert!(view.get_bin_len(0).is_err());
}

#[test]
fn test_key_type_mismatch() {
    let slave = RecordMetadata::from_pairs(&[("id", ColumnType::Int), ("v", ColumnType::Int)]);
    let err = LastValueStore::new(
        &key_only("id", ColumnType::Long),
        &slave,
        &["id"],
        StoreConfig::default(),
    )
    .unwrap_err();

    match err {
        LastValError::KeyTypeMismatch {
            column,
            master,
            slave,
        } => {
            assert_eq!(column, "id");
            assert_eq!(master, ColumnType::Long);
            assert_eq!(slave, ColumnType::Int);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_key_column() {
    let slave = RecordMetadata::from_pairs(&[("id", ColumnType::Int), ("v", ColumnType::Int)]);
    let err = LastValueStore::new(
        &key_only("other", ColumnType::Int),
        &slave,
        &["id"],
        StoreConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Column not found: id");
}

#[test]
fn test_close_releases_and_isolates() {
    let mut store = text_store(StoreConfig::with_page_size(1024));
    for key in 0..20 {
        store.put(&text_row(key, 30)).unwrap();
    }
    assert!(store.page_count() > 1);

    LastRecordMap::close(&mut store);
    assert!(store.is_closed());
    assert_eq!(store.page_count(), 0);
    assert_eq!(store.allocated_bytes(), 0);
    assert!(matches!(store.put(&text_row(0, 1)), Err(LastValError::StoreClosed)));
    assert!(matches!(store.get(&probe(0)), Err(LastValError::StoreClosed)));
    store.close();

    let mut fresh = text_store(StoreConfig::with_page_size(1024));
    assert!(fresh.get(&probe(0)).unwrap().is_none());
    assert_eq!(fresh.page_count(), 0);
    fresh.put(&text_row(0, 1)).unwrap();
    let view = fresh.get(&probe(0)).unwrap().unwrap();
    assert_eq!(view.address(), ArenaOffset::ZERO);
}

#[test]
fn test_composite_key() {
    let slave = RecordMetadata::from_pairs(&[
        ("venue", ColumnType::String),
        ("qty", ColumnType::Long),
        ("side", ColumnType::Byte),
    ]);
    let master = RecordMetadata::from_pairs(&[
        ("side", ColumnType::Byte),
        ("venue", ColumnType::String),
    ]);
    let mut store =
        LastValueStore::new(&master, &slave, &["venue", "side"], StoreConfig::default()).unwrap();
    assert_eq!(store.metadata().column_count(), 1);

    for (venue, qty, side) in [("A", 1, 0), ("A", 2, 1), ("B", 3, 0), ("A", 4, 0)] {
        store
            .put(&RowRecord::new(vec![
                Value::String(venue.to_string()),
                Value::Long(qty),
                Value::Byte(side),
            ]))
            .unwrap();
    }
    assert_eq!(store.key_count(), 3);

    let mut qty = |side: i8, venue: &str| {
        store
            .get(&RowRecord::new(vec![
                Value::Byte(side),
                Value::String(venue.to_string()),
            ]))
            .unwrap()
            .map(|view| view.get_long(0))
    };
    assert_eq!(qty(0, "A"), Some(4));
    assert_eq!(qty(1, "A"), Some(2));
    assert_eq!(qty(0, "B"), Some(3));
    assert_eq!(qty(1, "B"), None);
}
