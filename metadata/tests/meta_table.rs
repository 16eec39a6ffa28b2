use kv::contract::MemTxnKv;
use metadata::cancellation::Cancellation;
use metadata::config::MetaTableConfig;
use metadata::entities::{Collection, DataType, FieldSchema, Proxy, Schema, Segment, Tenant};
use metadata::error::MetaError;
use metadata::table::MetaTable;

fn collection(id: i64, name: &str) -> Collection {
    Collection {
        id,
        schema: Schema {
            name: name.to_string(),
            fields: vec![FieldSchema { field_id: 1, name: "embedding".to_string(), data_type: DataType::VectorFloat }],
        },
        create_time: 0,
        segment_ids: Vec::new(),
        partition_tags: Vec::new(),
    }
}

fn segment(id: i64, coll_id: i64, tag: &str) -> Segment {
    Segment {
        segment_id: id,
        collection_id: coll_id,
        partition_tag: tag.to_string(),
        num_rows: 0,
        open_time: 0,
        close_time: 0,
        binlog_file_paths: Vec::new(),
    }
}

/// A whole tenant/proxy/collection/partition/segment lifecycle through one
/// table, mirroring how a real caller would sequence these calls.
#[test]
fn full_lifecycle_across_all_entity_kinds() {
    let t = MetaTable::new(MemTxnKv::new(), MetaTableConfig::default()).unwrap();

    t.add_tenant(Tenant { id: 1, name: "acme".to_string() }, &Cancellation::none()).unwrap();
    t.add_proxy(Proxy { id: 1, address: "10.0.0.1:19530".to_string() }, &Cancellation::none()).unwrap();
    t.add_collection(collection(1, "embeddings"), &Cancellation::none()).unwrap();
    t.add_partition(1, "2026q3".to_string(), &Cancellation::none()).unwrap();
    t.add_segment(segment(100, 1, "2026q3"), &Cancellation::none()).unwrap();
    t.add_segment(segment(101, 1, "_default"), &Cancellation::none()).unwrap();
    t.close_segment(100, 777, &Cancellation::none()).unwrap();

    assert!(t.has_tenant(1));
    assert!(t.has_proxy(1));
    assert!(t.has_partition(1, "2026q3"));
    assert_eq!(t.get_segment_by_id(100).unwrap().close_time, 777);

    let c = t.get_collection_by_name("embeddings").unwrap();
    assert_eq!(c.segment_ids.len(), 2);
    assert_eq!(c.partition_tags, vec!["_default".to_string(), "2026q3".to_string()]);

    t.delete_collection(1, &Cancellation::none()).unwrap();
    assert!(!t.has_collection(1));
    assert!(matches!(t.get_segment_by_id(100), Err(MetaError::NotFound(_))));
    assert!(matches!(t.get_segment_by_id(101), Err(MetaError::NotFound(_))));
}

/// I5: a collection cannot accumulate more partitions than configured.
#[test]
fn partition_limit_is_enforced() {
    let config = MetaTableConfig { max_partition_num: 2, ..MetaTableConfig::default() };
    let t = MetaTable::new(MemTxnKv::new(), config).unwrap();
    t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();

    t.add_partition(1, "p1".to_string(), &Cancellation::none()).unwrap();
    assert!(matches!(
        t.add_partition(1, "p2".to_string(), &Cancellation::none()),
        Err(MetaError::LimitExceeded(_))
    ));
}

/// I2: a segment can never reference a collection/partition it doesn't belong to.
#[test]
fn add_segment_rejects_unknown_collection() {
    let t = MetaTable::new(MemTxnKv::new(), MetaTableConfig::default()).unwrap();
    let err = t.add_segment(segment(100, 404, "_default"), &Cancellation::none()).unwrap_err();
    assert!(matches!(err, MetaError::NotFound(_)));
}

/// Mutations made after `cancel.cancel()` fires must be rejected up front,
/// before any KV call or index mutation is attempted.
#[test]
fn canceled_signal_blocks_further_mutation() {
    let t = MetaTable::new(MemTxnKv::new(), MetaTableConfig::default()).unwrap();
    let cancel = Cancellation::none();
    cancel.cancel();

    let err = t.add_collection(collection(1, "c1"), &cancel).unwrap_err();
    assert!(matches!(err, MetaError::Canceled));
    assert!(t.list_collections().is_empty());
}

/// Restarting the process (a fresh `MetaTable` over the same store) must
/// recover the exact state left behind, including partitions and open
/// segments — the whole point of durability.
#[test]
fn a_fresh_table_over_the_same_store_recovers_full_state() {
    let kv = MemTxnKv::new();
    {
        let t = MetaTable::new(kv, MetaTableConfig::default()).unwrap();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_partition(1, "p1".to_string(), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "p1"), &Cancellation::none()).unwrap();
        t.add_tenant(Tenant { id: 9, name: "t9".to_string() }, &Cancellation::none()).unwrap();

        let t2 = MetaTable::new(t.into_kv(), MetaTableConfig::default()).unwrap();
        assert!(t2.has_tenant(9));
        assert_eq!(t2.get_collection_by_name("c1").unwrap().segment_ids, vec![100]);
        assert!(t2.has_partition(1, "p1"));
        assert_eq!(t2.get_segment_by_id(100).unwrap().partition_tag, "p1".to_string());
    }
}

/// Many readers may run concurrently against the same table; none of them
/// should observe a torn write.
#[test]
fn concurrent_readers_never_see_a_torn_collection() {
    let t = std::sync::Arc::new(MetaTable::new(MemTxnKv::new(), MetaTableConfig::default()).unwrap());
    t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
    t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = std::sync::Arc::clone(&t);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let c = t.get_collection_by_name("c1").unwrap();
                    assert_eq!(c.segment_ids, vec![100]);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
