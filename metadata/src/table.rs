//! The Metadata Table: exclusive owner of the five in-memory indices, and
//! the only thing in this crate that talks to a [`TxnKv`] store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use kv::contract::TxnKv;
use kv::error::KvError;

use crate::cancellation::Cancellation;
use crate::config::MetaTableConfig;
use crate::entities::{Collection, CollectionId, Proxy, Segment, SegmentId, Tenant, Timestamp, UniqueId};
use crate::error::MetaError;
use crate::keys;
use crate::serializer;

/// Collection-, partition-, and segment-scoped indices, guarded together by
/// `ddLock` since they are updated together under I2/I3/I6.
#[derive(Default)]
struct DdState {
    coll_by_id: HashMap<UniqueId, Collection>,
    coll_by_name: HashMap<String, UniqueId>,
    seg_by_id: HashMap<UniqueId, Segment>,
}

pub struct MetaTable<K: TxnKv> {
    kv: K,
    config: MetaTableConfig,
    tenant_lock: RwLock<HashMap<UniqueId, Tenant>>,
    proxy_lock: RwLock<HashMap<UniqueId, Proxy>>,
    dd_lock: RwLock<DdState>,
    poisoned: AtomicBool,
}

fn decode_err(e: MetaError) -> MetaError {
    match e {
        MetaError::MalformedRecord(msg) => MetaError::CorruptState(msg),
        other => other,
    }
}

fn store_unavailable(source: KvError) -> MetaError {
    MetaError::StoreUnavailable { source, reload_error: None }
}

impl<K: TxnKv> MetaTable<K> {
    pub fn new(kv: K, config: MetaTableConfig) -> Result<Self, MetaError> {
        let tenants = Self::scan_tenants(&kv)?;
        let proxies = Self::scan_proxies(&kv)?;
        let dd = Self::scan_dd(&kv)?;
        log::info!(
            "metadata table recovered: {} tenants, {} proxies, {} collections, {} segments",
            tenants.len(),
            proxies.len(),
            dd.coll_by_id.len(),
            dd.seg_by_id.len()
        );
        Ok(MetaTable {
            kv,
            config,
            tenant_lock: RwLock::new(tenants),
            proxy_lock: RwLock::new(proxies),
            dd_lock: RwLock::new(dd),
            poisoned: AtomicBool::new(false),
        })
    }

    fn scan_tenants(kv: &K) -> Result<HashMap<UniqueId, Tenant>, MetaError> {
        let rows = kv.load_with_prefix(keys::TENANT_PREFIX).map_err(store_unavailable)?;
        let mut out = HashMap::with_capacity(rows.len());
        for (_, v) in rows {
            let t = serializer::decode_tenant(&v).map_err(decode_err)?;
            out.insert(t.id, t);
        }
        Ok(out)
    }

    fn scan_proxies(kv: &K) -> Result<HashMap<UniqueId, Proxy>, MetaError> {
        let rows = kv.load_with_prefix(keys::PROXY_PREFIX).map_err(store_unavailable)?;
        let mut out = HashMap::with_capacity(rows.len());
        for (_, v) in rows {
            let p = serializer::decode_proxy(&v).map_err(decode_err)?;
            out.insert(p.id, p);
        }
        Ok(out)
    }

    fn scan_dd(kv: &K) -> Result<DdState, MetaError> {
        let coll_rows = kv.load_with_prefix(keys::COLLECTION_PREFIX).map_err(store_unavailable)?;
        let mut coll_by_id = HashMap::with_capacity(coll_rows.len());
        let mut coll_by_name = HashMap::with_capacity(coll_rows.len());
        for (_, v) in coll_rows {
            let c = serializer::decode_collection(&v).map_err(decode_err)?;
            coll_by_name.insert(c.schema.name.clone(), c.id);
            coll_by_id.insert(c.id, c);
        }

        let seg_rows = kv.load_with_prefix(keys::SEGMENT_PREFIX).map_err(store_unavailable)?;
        let mut seg_by_id = HashMap::with_capacity(seg_rows.len());
        for (_, v) in seg_rows {
            let s = serializer::decode_segment(&v).map_err(decode_err)?;
            seg_by_id.insert(s.segment_id, s);
        }

        Ok(DdState { coll_by_id, coll_by_name, seg_by_id })
    }

    /// Full rebuild from the store, regardless of the poisoned flag. Clears
    /// `poisoned` on success; leaves it set on failure.
    pub fn force_reload(&self) -> Result<(), MetaError> {
        let tenants = Self::scan_tenants(&self.kv)?;
        let proxies = Self::scan_proxies(&self.kv)?;
        let dd = Self::scan_dd(&self.kv)?;

        *self.tenant_lock.write().expect("tenant lock poisoned") = tenants;
        *self.proxy_lock.write().expect("proxy lock poisoned") = proxies;
        *self.dd_lock.write().expect("dd lock poisoned") = dd;
        self.poisoned.store(false, Ordering::SeqCst);
        log::info!("metadata table force-reloaded successfully");
        Ok(())
    }

    /// Releases the underlying store, e.g. to reopen a fresh table over it
    /// after a simulated restart.
    pub fn into_kv(self) -> K {
        self.kv
    }

    fn check_not_poisoned(&self) -> Result<(), MetaError> {
        if self.poisoned.load(Ordering::SeqCst) {
            return Err(MetaError::CorruptState(
                "table is poisoned by a prior failed reload; call force_reload".to_string(),
            ));
        }
        Ok(())
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
    }

    /// Scoped compensating reload for `tenantLock`-guarded mutations: the
    /// KV write failed, so the in-memory mutation is discarded and the
    /// tenant index is rebuilt from the store in its place.
    fn compensate_tenants(&self, write_err: KvError, guard: &mut HashMap<UniqueId, Tenant>) -> MetaError {
        match Self::scan_tenants(&self.kv) {
            Ok(fresh) => {
                *guard = fresh;
                store_unavailable(write_err)
            }
            Err(reload_err) => {
                self.poison();
                log::error!("tenant reload after failed write also failed: {reload_err}");
                MetaError::StoreUnavailable { source: write_err, reload_error: Some(Box::new(reload_err)) }
            }
        }
    }

    fn compensate_proxies(&self, write_err: KvError, guard: &mut HashMap<UniqueId, Proxy>) -> MetaError {
        match Self::scan_proxies(&self.kv) {
            Ok(fresh) => {
                *guard = fresh;
                store_unavailable(write_err)
            }
            Err(reload_err) => {
                self.poison();
                log::error!("proxy reload after failed write also failed: {reload_err}");
                MetaError::StoreUnavailable { source: write_err, reload_error: Some(Box::new(reload_err)) }
            }
        }
    }

    fn compensate_dd(&self, write_err: KvError, guard: &mut DdState) -> MetaError {
        match Self::scan_dd(&self.kv) {
            Ok(fresh) => {
                *guard = fresh;
                store_unavailable(write_err)
            }
            Err(reload_err) => {
                self.poison();
                log::error!("collection/segment reload after failed write also failed: {reload_err}");
                MetaError::StoreUnavailable { source: write_err, reload_error: Some(Box::new(reload_err)) }
            }
        }
    }

    // ---- tenant / proxy ------------------------------------------------

    pub fn add_tenant(&self, t: Tenant, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.tenant_lock.write().expect("tenant lock poisoned");
        let encoded = serializer::encode_tenant(&t);
        match self.kv.save(&keys::tenant_key(t.id), &encoded) {
            Ok(()) => {
                guard.insert(t.id, t);
                Ok(())
            }
            Err(e) => Err(self.compensate_tenants(e, &mut guard)),
        }
    }

    pub fn has_tenant(&self, id: UniqueId) -> bool {
        self.tenant_lock.read().expect("tenant lock poisoned").contains_key(&id)
    }

    pub fn add_proxy(&self, p: Proxy, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.proxy_lock.write().expect("proxy lock poisoned");
        let encoded = serializer::encode_proxy(&p);
        match self.kv.save(&keys::proxy_key(p.id), &encoded) {
            Ok(()) => {
                guard.insert(p.id, p);
                Ok(())
            }
            Err(e) => Err(self.compensate_proxies(e, &mut guard)),
        }
    }

    pub fn has_proxy(&self, id: UniqueId) -> bool {
        self.proxy_lock.read().expect("proxy lock poisoned").contains_key(&id)
    }

    // ---- collections ----------------------------------------------------

    pub fn add_collection(&self, mut c: Collection, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        if !c.segment_ids.is_empty() {
            return Err(MetaError::BadArgument("new collection must have no segments".to_string()));
        }
        if guard.coll_by_name.contains_key(&c.schema.name) {
            return Err(MetaError::AlreadyExists(c.schema.name));
        }
        if c.partition_tags.is_empty() {
            c.partition_tags.push(self.config.default_partition_tag.clone());
        }

        let encoded = serializer::encode_collection(&c);
        match self.kv.save(&keys::collection_key(c.id), &encoded) {
            Ok(()) => {
                guard.coll_by_name.insert(c.schema.name.clone(), c.id);
                guard.coll_by_id.insert(c.id, c);
                log::info!("added collection {}", encoded.lines().next().unwrap_or_default());
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    pub fn delete_collection(&self, id: CollectionId, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        let Some(c) = guard.coll_by_id.get(&id) else {
            return Err(MetaError::NotFound(format!("collection {id}")));
        };
        let name = c.schema.name.clone();
        let segs = c.segment_ids.clone();

        let removes: Vec<String> =
            std::iter::once(keys::collection_key(id)).chain(segs.iter().map(|s| keys::segment_key(*s))).collect();

        match self.kv.multi_remove(&removes) {
            Ok(()) => {
                guard.coll_by_id.remove(&id);
                guard.coll_by_name.remove(&name);
                for s in segs {
                    guard.seg_by_id.remove(&s);
                }
                log::info!("deleted collection {id}");
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    pub fn has_collection(&self, id: CollectionId) -> bool {
        self.dd_lock.read().expect("dd lock poisoned").coll_by_id.contains_key(&id)
    }

    pub fn get_collection_by_name(&self, name: &str) -> Result<Collection, MetaError> {
        let guard = self.dd_lock.read().expect("dd lock poisoned");
        let id = guard.coll_by_name.get(name).ok_or_else(|| MetaError::NotFound(name.to_string()))?;
        Ok(guard.coll_by_id[id].clone())
    }

    pub fn list_collections(&self) -> Vec<String> {
        self.dd_lock.read().expect("dd lock poisoned").coll_by_name.keys().cloned().collect()
    }

    // ---- partitions -------------------------------------------------------

    pub fn add_partition(
        &self,
        coll_id: CollectionId,
        tag: String,
        cancel: &Cancellation,
    ) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        let Some(existing) = guard.coll_by_id.get(&coll_id) else {
            return Err(MetaError::NotFound(format!("collection {coll_id}")));
        };
        if existing.partition_tags.len() as i64 >= self.config.max_partition_num {
            return Err(MetaError::LimitExceeded(format!(
                "collection {coll_id} already has {} partitions",
                existing.partition_tags.len()
            )));
        }
        if existing.partition_tags.contains(&tag) {
            return Err(MetaError::AlreadyExists(tag));
        }

        let mut updated = existing.clone();
        updated.partition_tags.push(tag);

        let encoded = serializer::encode_collection(&updated);
        match self.kv.save(&keys::collection_key(coll_id), &encoded) {
            Ok(()) => {
                guard.coll_by_id.insert(coll_id, updated);
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    pub fn has_partition(&self, coll_id: CollectionId, tag: &str) -> bool {
        self.dd_lock
            .read()
            .expect("dd lock poisoned")
            .coll_by_id
            .get(&coll_id)
            .is_some_and(|c| c.partition_tags.iter().any(|t| t == tag))
    }

    pub fn delete_partition(
        &self,
        coll_id: CollectionId,
        tag: &str,
        cancel: &Cancellation,
    ) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        if tag == self.config.default_partition_tag {
            return Err(MetaError::Forbidden("the default partition cannot be deleted".to_string()));
        }

        let mut guard = self.dd_lock.write().expect("dd lock poisoned");
        let Some(existing) = guard.coll_by_id.get(&coll_id) else {
            return Err(MetaError::NotFound(format!("collection {coll_id}")));
        };
        if !existing.partition_tags.iter().any(|t| t == tag) {
            return Err(MetaError::NotFound(format!("partition {tag}")));
        }

        let mut keep_segments = Vec::new();
        let mut drop_segments = Vec::new();
        for seg_id in &existing.segment_ids {
            let seg = guard
                .seg_by_id
                .get(seg_id)
                .ok_or_else(|| MetaError::CorruptState(format!("segment {seg_id} missing from index")))?;
            if seg.partition_tag == tag {
                drop_segments.push(*seg_id);
            } else {
                keep_segments.push(*seg_id);
            }
        }

        let mut updated = existing.clone();
        updated.partition_tags.retain(|t| t != tag);
        // Defensive: membership was already checked above, so this can never
        // trip, but we keep the check rather than assume it away.
        debug_assert!(updated.partition_tags.len() < existing.partition_tags.len());
        updated.segment_ids = keep_segments;

        let encoded = serializer::encode_collection(&updated);
        let removes: Vec<String> = drop_segments.iter().map(|s| keys::segment_key(*s)).collect();

        match self.kv.multi_save_and_remove(&[(keys::collection_key(coll_id), encoded)], &removes) {
            Ok(()) => {
                guard.coll_by_id.insert(coll_id, updated);
                for s in drop_segments {
                    guard.seg_by_id.remove(&s);
                }
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    // ---- segments -----------------------------------------------------

    pub fn add_segment(&self, s: Segment, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");
        self.add_segment_locked(s, &mut guard)
    }

    fn add_segment_locked(&self, s: Segment, guard: &mut DdState) -> Result<(), MetaError> {
        let Some(existing) = guard.coll_by_id.get(&s.collection_id) else {
            return Err(MetaError::NotFound(format!("collection {}", s.collection_id)));
        };
        if !existing.partition_tags.contains(&s.partition_tag) {
            return Err(MetaError::BadArgument(format!(
                "partition {} does not belong to collection {}",
                s.partition_tag, s.collection_id
            )));
        }

        let mut updated = existing.clone();
        updated.segment_ids.push(s.segment_id);

        let coll_encoded = serializer::encode_collection(&updated);
        let seg_encoded = serializer::encode_segment(&s);
        let saves = [
            (keys::collection_key(s.collection_id), coll_encoded),
            (keys::segment_key(s.segment_id), seg_encoded),
        ];

        match self.kv.multi_save(&saves) {
            Ok(()) => {
                guard.coll_by_id.insert(s.collection_id, updated);
                guard.seg_by_id.insert(s.segment_id, s);
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, guard)),
        }
    }

    pub fn update_segment(&self, s: Segment, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        let already_owned = guard
            .coll_by_id
            .get(&s.collection_id)
            .is_some_and(|c| c.segment_ids.contains(&s.segment_id));

        if !already_owned {
            return self.add_segment_locked(s, &mut guard);
        }

        let encoded = serializer::encode_segment(&s);
        match self.kv.save(&keys::segment_key(s.segment_id), &encoded) {
            Ok(()) => {
                guard.seg_by_id.insert(s.segment_id, s);
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    pub fn get_segment_by_id(&self, id: SegmentId) -> Result<Segment, MetaError> {
        self.dd_lock
            .read()
            .expect("dd lock poisoned")
            .seg_by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("segment {id}")))
    }

    pub fn delete_segment(&self, seg_id: SegmentId, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        let Some(seg) = guard.seg_by_id.get(&seg_id) else {
            return Err(MetaError::NotFound(format!("segment {seg_id}")));
        };
        let coll_id = seg.collection_id;
        let Some(existing) = guard.coll_by_id.get(&coll_id) else {
            return Err(MetaError::NotFound(format!("collection {coll_id}")));
        };

        let mut updated = existing.clone();
        updated.segment_ids.retain(|s| *s != seg_id);

        let encoded = serializer::encode_collection(&updated);
        match self.kv.multi_save_and_remove(&[(keys::collection_key(coll_id), encoded)], &[keys::segment_key(seg_id)])
        {
            Ok(()) => {
                guard.coll_by_id.insert(coll_id, updated);
                guard.seg_by_id.remove(&seg_id);
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }

    pub fn close_segment(&self, seg_id: SegmentId, close_ts: Timestamp, cancel: &Cancellation) -> Result<(), MetaError> {
        self.check_not_poisoned()?;
        cancel.check()?;
        let mut guard = self.dd_lock.write().expect("dd lock poisoned");

        let Some(existing) = guard.seg_by_id.get(&seg_id) else {
            return Err(MetaError::NotFound(format!("segment {seg_id}")));
        };
        let mut updated = existing.clone();
        updated.close_time = close_ts;

        let encoded = serializer::encode_segment(&updated);
        match self.kv.save(&keys::segment_key(seg_id), &encoded) {
            Ok(()) => {
                guard.seg_by_id.insert(seg_id, updated);
                Ok(())
            }
            Err(e) => Err(self.compensate_dd(e, &mut guard)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DataType, FieldSchema, Schema};
    use kv::contract::{FaultyTxnKv, MemTxnKv};

    fn collection(id: UniqueId, name: &str) -> Collection {
        Collection {
            id,
            schema: Schema {
                name: name.to_string(),
                fields: vec![FieldSchema { field_id: 1, name: "v".to_string(), data_type: DataType::VectorFloat }],
            },
            create_time: 0,
            segment_ids: Vec::new(),
            partition_tags: Vec::new(),
        }
    }

    fn segment(id: UniqueId, coll_id: UniqueId, tag: &str) -> Segment {
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

    fn table() -> MetaTable<MemTxnKv> {
        MetaTable::new(MemTxnKv::new(), MetaTableConfig::default()).unwrap()
    }

    #[test]
    fn scenario_1_add_collection_gets_default_partition() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        assert_eq!(t.list_collections(), vec!["c1".to_string()]);
        assert_eq!(t.get_collection_by_name("c1").unwrap().partition_tags, vec!["_default".to_string()]);
    }

    #[test]
    fn scenario_2_duplicate_name_rejected() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        let err = t.add_collection(collection(2, "c1"), &Cancellation::none()).unwrap_err();
        assert!(matches!(err, MetaError::AlreadyExists(_)));
    }

    #[test]
    fn scenario_3_add_segment_updates_collection() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        assert_eq!(t.get_collection_by_name("c1").unwrap().segment_ids, vec![100]);
        assert_eq!(t.get_segment_by_id(100).unwrap().close_time, 0);
    }

    #[test]
    fn scenario_4_delete_partition_drops_its_segments() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        t.add_partition(1, "p1".to_string(), &Cancellation::none()).unwrap();
        t.add_segment(segment(101, 1, "p1"), &Cancellation::none()).unwrap();

        t.delete_partition(1, "p1", &Cancellation::none()).unwrap();

        assert!(matches!(t.get_segment_by_id(101), Err(MetaError::NotFound(_))));
        let c = t.get_collection_by_name("c1").unwrap();
        assert_eq!(c.segment_ids, vec![100]);
        assert_eq!(c.partition_tags, vec!["_default".to_string()]);
    }

    #[test]
    fn scenario_5_close_segment_survives_reload() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        t.close_segment(100, 42, &Cancellation::none()).unwrap();
        t.force_reload().unwrap();
        assert_eq!(t.get_segment_by_id(100).unwrap().close_time, 42);
    }

    #[test]
    fn scenario_6_failed_write_leaves_no_trace() {
        let t = MetaTable::new(FaultyTxnKv::new(MemTxnKv::new()), MetaTableConfig::default()).unwrap();
        t.kv.fail_next_mutations(1);
        let err = t.add_collection(collection(3, "c3"), &Cancellation::none()).unwrap_err();
        assert!(matches!(err, MetaError::StoreUnavailable { reload_error: None, .. }));
        assert!(!t.has_collection(3));
        assert!(!t.list_collections().contains(&"c3".to_string()));
    }

    #[test]
    fn property_p5_delete_segment_is_idempotent() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        t.delete_segment(100, &Cancellation::none()).unwrap();
        assert!(matches!(t.delete_segment(100, &Cancellation::none()), Err(MetaError::NotFound(_))));
    }

    #[test]
    fn property_p6_delete_collection_cascades_segments() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        t.delete_collection(1, &Cancellation::none()).unwrap();
        assert!(matches!(t.get_segment_by_id(100), Err(MetaError::NotFound(_))));
    }

    #[test]
    fn property_p7_default_partition_is_protected() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        assert!(matches!(
            t.delete_partition(1, "_default", &Cancellation::none()),
            Err(MetaError::Forbidden(_))
        ));
    }

    #[test]
    fn add_segment_rejects_unknown_partition_tag() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        let err = t.add_segment(segment(100, 1, "nope"), &Cancellation::none()).unwrap_err();
        assert!(matches!(err, MetaError::BadArgument(_)));
    }

    #[test]
    fn update_segment_behaves_as_add_when_unowned() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.update_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        assert_eq!(t.get_collection_by_name("c1").unwrap().segment_ids, vec![100]);
    }

    #[test]
    fn update_segment_in_place_does_not_touch_collection() {
        let t = table();
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        t.add_segment(segment(100, 1, "_default"), &Cancellation::none()).unwrap();
        let mut s = segment(100, 1, "_default");
        s.num_rows = 9;
        t.update_segment(s, &Cancellation::none()).unwrap();
        assert_eq!(t.get_segment_by_id(100).unwrap().num_rows, 9);
        assert_eq!(t.get_collection_by_name("c1").unwrap().segment_ids, vec![100]);
    }

    #[test]
    fn tenant_and_proxy_round_trip_through_table() {
        let t = table();
        t.add_tenant(Tenant { id: 1, name: "t1".to_string() }, &Cancellation::none()).unwrap();
        t.add_proxy(Proxy { id: 2, address: "127.0.0.1:19530".to_string() }, &Cancellation::none()).unwrap();
        assert!(t.has_tenant(1));
        assert!(t.has_proxy(2));
        assert!(!t.has_tenant(2));
    }

    #[test]
    fn force_reload_clears_poisoned_state() {
        let t = MetaTable::new(FaultyTxnKv::new(MemTxnKv::new()), MetaTableConfig::default()).unwrap();
        t.kv.fail_next_mutations(1);
        assert!(t.add_collection(collection(1, "c1"), &Cancellation::none()).is_err());
        assert!(t.force_reload().is_ok());
        t.add_collection(collection(1, "c1"), &Cancellation::none()).unwrap();
        assert!(t.has_collection(1));
    }
}
