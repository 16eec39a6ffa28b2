//! A `TxnKv` backed by a real etcd cluster, gated behind the `etcd` feature.
//!
//! Grounded in the root-prefixed namespace and `Save`/`Load`/`LoadWithPrefix`
//! semantics exercised by `etcd_kv_test.go`'s `EtcdKV`: every key this
//! backend touches is joined under a configured root path, so one etcd
//! cluster can host several independent tables. `etcd-client`'s async API
//! is bridged to `TxnKv`'s synchronous contract with
//! `futures::executor::block_on`, which is sound here because the caller
//! holds its lock for the whole call and nothing else runs concurrently
//! on that lock.

use etcd_client::{Client, Compare, GetOptions, Txn, TxnOp};

use crate::contract::TxnKv;
use crate::error::{CResult, KvError};

pub struct EtcdTxnKv {
    client: Client,
    root: String,
}

impl EtcdTxnKv {
    pub async fn connect<E: AsRef<str>>(endpoints: &[E], root: &str) -> CResult<Self> {
        let client = Client::connect(endpoints, None).await.map_err(|e| KvError::Backend(e.to_string()))?;
        Ok(EtcdTxnKv { client, root: root.trim_end_matches('/').to_string() })
    }

    fn namespaced(&self, key: &str) -> String {
        namespace(&self.root, key)
    }

    fn strip_root<'a>(&self, key: &'a str) -> &'a str {
        strip_root(&self.root, key)
    }
}

fn namespace(root: &str, key: &str) -> String {
    format!("{}/{}", root, key.trim_start_matches('/'))
}

fn strip_root<'a>(root: &str, key: &'a str) -> &'a str {
    key.strip_prefix(root).unwrap_or(key).trim_start_matches('/')
}

impl TxnKv for EtcdTxnKv {
    fn load(&self, key: &str) -> CResult<String> {
        let namespaced = self.namespaced(key);
        futures::executor::block_on(async {
            let mut kv = self.client.kv_client();
            let resp = kv.get(namespaced.clone(), None).await.map_err(|e| KvError::Backend(e.to_string()))?;
            let kv_pair = resp.kvs().first().ok_or_else(|| KvError::NotFound(key.to_string()))?;
            String::from_utf8(kv_pair.value().to_vec()).map_err(|e| KvError::Backend(e.to_string()))
        })
    }

    fn load_with_prefix(&self, prefix: &str) -> CResult<Vec<(String, String)>> {
        let namespaced = self.namespaced(prefix);
        futures::executor::block_on(async {
            let mut kv = self.client.kv_client();
            let resp = kv
                .get(namespaced, Some(GetOptions::new().with_prefix().with_sort(
                    etcd_client::SortTarget::Key,
                    etcd_client::SortOrder::Ascend,
                )))
                .await
                .map_err(|e| KvError::Backend(e.to_string()))?;
            resp.kvs()
                .iter()
                .map(|kv| {
                    let k = String::from_utf8(kv.key().to_vec()).map_err(|e| KvError::Backend(e.to_string()))?;
                    let v = String::from_utf8(kv.value().to_vec()).map_err(|e| KvError::Backend(e.to_string()))?;
                    Ok((self.strip_root(&k).to_string(), v))
                })
                .collect()
        })
    }

    fn save(&self, key: &str, value: &str) -> CResult<()> {
        let namespaced = self.namespaced(key);
        futures::executor::block_on(async {
            let mut kv = self.client.kv_client();
            kv.put(namespaced, value.to_string(), None).await.map_err(|e| KvError::Backend(e.to_string()))?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> CResult<()> {
        let namespaced = self.namespaced(key);
        futures::executor::block_on(async {
            let mut kv = self.client.kv_client();
            kv.delete(namespaced, None).await.map_err(|e| KvError::Backend(e.to_string()))?;
            Ok(())
        })
    }

    fn multi_save(&self, kvs: &[(String, String)]) -> CResult<()> {
        self.multi_save_and_remove(kvs, &[])
    }

    fn multi_remove(&self, keys: &[String]) -> CResult<()> {
        self.multi_save_and_remove(&[], keys)
    }

    fn multi_save_and_remove(&self, saves: &[(String, String)], removes: &[String]) -> CResult<()> {
        let ops: Vec<TxnOp> = saves
            .iter()
            .map(|(k, v)| TxnOp::put(self.namespaced(k), v.clone(), None))
            .chain(removes.iter().map(|k| TxnOp::delete(self.namespaced(k), None)))
            .collect();

        futures::executor::block_on(async {
            let mut kv = self.client.kv_client();
            // An empty `when` clause always evaluates true, so `and_then`
            // always runs: this commits every op as one atomic unit.
            let txn = Txn::new().when(Vec::<Compare>::new()).and_then(ops);
            kv.txn(txn).await.map_err(|e| KvError::Backend(e.to_string()))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_keys_under_the_configured_root() {
        assert_eq!(namespace("/by-dev/meta", "/tenant/1"), "/by-dev/meta/tenant/1");
        assert_eq!(namespace("/by-dev/meta", "tenant/1"), "/by-dev/meta/tenant/1");
    }

    #[test]
    fn strips_root_back_off_a_namespaced_key() {
        assert_eq!(strip_root("/by-dev/meta", "/by-dev/meta/tenant/1"), "tenant/1");
    }
}
