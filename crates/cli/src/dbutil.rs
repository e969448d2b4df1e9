//! One-shot database utilities that open the persistent store directly
//! and never touch the resolver pipeline (§4.9). No teacher analogue —
//! the teacher's storage is long-lived and has no dump/merge/expire CLI
//! mode.

use std::io::{BufRead, Write};

use revlog_application::ports::ResolutionStore;
use revlog_domain::RuntimeError;

pub async fn dump(store: &dyn ResolutionStore, out: &mut impl Write) -> Result<(), RuntimeError> {
    for (key, record) in store.dump().await? {
        writeln!(out, "{key} {} {} {}", record.name, record.origin, record.timestamp)
            .map_err(|e| RuntimeError::MalformedReply(format!("write failed: {e}")))?;
    }
    Ok(())
}

pub async fn merge(
    store: &dyn ResolutionStore,
    input: impl BufRead,
    now: i64,
) -> Result<usize, RuntimeError> {
    let mut count = 0;
    for line in input.lines() {
        let line = line.map_err(|e| RuntimeError::MalformedReply(format!("read failed: {e}")))?;
        let mut parts = line.split_whitespace();
        let (Some(key), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        store.merge(key, name, now).await?;
        count += 1;
    }
    Ok(count)
}

pub async fn expire(store: &dyn ResolutionStore, cutoff: i64) -> Result<u64, RuntimeError> {
    store.expire(cutoff).await
}

/// Prints every distinct address literal in `input` that has no store
/// record, without issuing any query or mutating the store (§4.9
/// `--unresolved`).
pub async fn unresolved(
    store: &dyn ResolutionStore,
    input: impl BufRead,
    anywhere: bool,
    out: &mut impl Write,
) -> Result<(), RuntimeError> {
    let mut seen = std::collections::HashSet::new();
    for line in input.lines() {
        let line = line.map_err(|e| RuntimeError::MalformedReply(format!("read failed: {e}")))?;
        for occurrence in revlog_domain::scan_line(&line, anywhere) {
            let key = occurrence.host.to_string();
            if !seen.insert(key.clone()) {
                continue;
            }
            if store.get(&key).await?.is_none() {
                writeln!(out, "{key}").map_err(|e| RuntimeError::MalformedReply(format!("write failed: {e}")))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use revlog_domain::{Origin, StoreRecord};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, StoreRecord>>);

    #[async_trait]
    impl ResolutionStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<StoreRecord>, RuntimeError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn put(&self, key: &str, record: &StoreRecord) -> Result<(), RuntimeError> {
            self.0.lock().unwrap().insert(key.to_string(), record.clone());
            Ok(())
        }
        async fn dump(&self) -> Result<Vec<(String, StoreRecord)>, RuntimeError> {
            let mut entries: Vec<_> = self
                .0
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(entries)
        }
        async fn merge(&self, key: &str, name: &str, now: i64) -> Result<(), RuntimeError> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), StoreRecord::new(name.to_string(), Origin::Merged, now));
            Ok(())
        }
        async fn expire(&self, cutoff: i64) -> Result<u64, RuntimeError> {
            let mut map = self.0.lock().unwrap();
            let before = map.len();
            map.retain(|_, v| v.timestamp >= cutoff);
            Ok((before - map.len()) as u64)
        }
    }

    #[tokio::test]
    async fn merge_parses_whitespace_pairs_and_ignores_malformed_lines() {
        let store = MapStore::default();
        let input = std::io::Cursor::new(b"10.0.0.1 host-a\nbad-line\n10.0.0.2 host-b\n".to_vec());
        let count = merge(&store, input, 99).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.get("10.0.0.1").await.unwrap().unwrap().name, "host-a");
    }

    #[tokio::test]
    async fn unresolved_lists_each_distinct_address_once() {
        let store = MapStore::default();
        store
            .put("10.0.0.1", &StoreRecord::new("known".to_string(), Origin::Nameserver, 1))
            .await
            .unwrap();
        let input = std::io::Cursor::new(b"10.0.0.1 and 10.0.0.2\n10.0.0.2 again\n".to_vec());
        let mut out = Vec::new();
        unresolved(&store, input, true, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10.0.0.2\n");
    }

    #[tokio::test]
    async fn dump_formats_key_name_origin_timestamp() {
        let store = MapStore::default();
        store
            .put("10.0.0.1", &StoreRecord::new("a.example".to_string(), Origin::Recursed, 7))
            .await
            .unwrap();
        let mut out = Vec::new();
        dump(&store, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10.0.0.1 a.example R 7\n");
    }
}
