//! Storage Module Tests
//!
//! Validates the in-memory table against the read contract the engine relies on.
//!
//! ## Test Scopes
//! - **Primary queries**: hash key lookups, range predicates, limits.
//! - **Indexes**: reverse-lookup and canonical-word projections, lagging projections.
//! - **Scan**: pagination, continuation tokens, contains filter.
//! - **Instrumentation**: call counters and fault injection.

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::storage::memory::{InMemoryTable, TableOp};
    use crate::storage::table::*;
    use serde_json::json;

    fn record(pk: &str, sk: &str, source: &str, target: &str) -> Record {
        let value = json!({
            "PK": pk,
            "SK": sk,
            "SourceWord": source,
            "TargetWord": target,
        });
        value.as_object().unwrap().clone()
    }

    fn indexed(pk: &str, sk: &str, lkp: &str, src_lang: &str, canonical: &str) -> Record {
        let mut r = record(pk, sk, "w", "w");
        r.insert("LKP".into(), json!(lkp));
        r.insert("SRC_LANG".into(), json!(src_lang));
        r.insert("CanonicalWord".into(), json!(canonical));
        r
    }

    fn pk_of(record: &Record) -> String {
        record["PK"].as_str().unwrap().to_string()
    }

    fn sk_of(record: &Record) -> String {
        record["SK"].as_str().unwrap().to_string()
    }

    // ============================================================
    // PRIMARY TABLE
    // ============================================================

    #[tokio::test]
    async fn test_query_by_hash_key() {
        let table = InMemoryTable::new();
        table.put_record(record("SRC#en#cat", "TGT#es#POS#noun", "cat", "gato")).unwrap();
        table.put_record(record("SRC#en#cat", "TGT#fr#POS#noun", "cat", "chat")).unwrap();
        table.put_record(record("SRC#en#dog", "TGT#es#POS#noun", "dog", "perro")).unwrap();

        let records = table.query(KeyQuery::hash("SRC#en#cat")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| pk_of(r) == "SRC#en#cat"));

        let missing = table.query(KeyQuery::hash("SRC#en#bird")).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_query_range_predicates() {
        let table = InMemoryTable::new();
        table.put_record(record("SRC#en#run", "TGT#es#POS#verb", "run", "correr")).unwrap();
        table.put_record(record("SRC#en#run", "TGT#es#POS#noun", "run", "carrera")).unwrap();
        table.put_record(record("SRC#en#run", "TGT#de#POS#verb", "run", "laufen")).unwrap();

        let spanish = table
            .query(KeyQuery::hash("SRC#en#run").with_range(RangeCondition::BeginsWith("TGT#es#".into())))
            .await
            .unwrap();
        assert_eq!(spanish.len(), 2);

        let exact = table
            .query(KeyQuery::hash("SRC#en#run").with_range(RangeCondition::Equals("TGT#de#POS#verb".into())))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(sk_of(&exact[0]), "TGT#de#POS#verb");
    }

    #[tokio::test]
    async fn test_query_respects_limit() {
        let table = InMemoryTable::new();
        for pos in ["noun", "verb", "adj", "adv"] {
            table
                .put_record(record("SRC#en#fast", &format!("TGT#es#POS#{}", pos), "fast", "x"))
                .unwrap();
        }

        let records = table.query(KeyQuery::hash("SRC#en#fast").with_limit(3)).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_put_replaces_same_identity() {
        let table = InMemoryTable::new();
        table.put_record(record("SRC#en#cat", "TGT#es#POS#noun", "cat", "gato")).unwrap();
        table.put_record(record("SRC#en#cat", "TGT#es#POS#noun", "cat", "gata")).unwrap();

        assert_eq!(table.len(), 1);
        let records = table.query(KeyQuery::hash("SRC#en#cat")).await.unwrap();
        assert_eq!(records[0]["TargetWord"], "gata");
    }

    #[test]
    fn test_put_rejects_record_without_keys() {
        let table = InMemoryTable::new();
        let mut r = record("SRC#en#cat", "TGT#es#POS#noun", "cat", "gato");
        r.remove("SK");

        let result = table.put_record(r);
        assert!(matches!(result, Err(StoreError::MissingKey("SK"))));
        assert!(table.is_empty());
    }

    // ============================================================
    // SECONDARY INDEXES
    // ============================================================

    #[tokio::test]
    async fn test_reverse_lookup_maps_to_many_sources() {
        let table = InMemoryTable::new();
        table
            .put_record(indexed("SRC#es#hola", "TGT#en#POS#interj", "LKP#en#hello", "SRC_LANG#es", "hello"))
            .unwrap();
        table
            .put_record(indexed("SRC#fr#salut", "TGT#en#POS#interj", "LKP#en#hello", "SRC_LANG#fr", "hello"))
            .unwrap();

        let all = table
            .query_index(TableIndex::ReverseLookup, KeyQuery::hash("LKP#en#hello"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let french = table
            .query_index(
                TableIndex::ReverseLookup,
                KeyQuery::hash("LKP#en#hello").with_range(RangeCondition::Equals("SRC_LANG#fr".into())),
            )
            .await
            .unwrap();
        assert_eq!(french.len(), 1);
        assert_eq!(pk_of(&french[0]), "SRC#fr#salut");
    }

    #[tokio::test]
    async fn test_canonical_word_index() {
        let table = InMemoryTable::new();
        table
            .put_record(indexed("SRC#es#perro", "TGT#en#POS#noun", "LKP#en#dog", "SRC_LANG#es", "dog"))
            .unwrap();

        let records = table
            .query_index(TableIndex::CanonicalWord, KeyQuery::hash("dog"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(pk_of(&records[0]), "SRC#es#perro");
    }

    #[tokio::test]
    async fn test_replacing_record_moves_projection() {
        let table = InMemoryTable::new();
        table
            .put_record(indexed("SRC#es#perro", "TGT#en#POS#noun", "LKP#en#dog", "SRC_LANG#es", "dog"))
            .unwrap();
        table
            .put_record(indexed("SRC#es#perro", "TGT#en#POS#noun", "LKP#en#hound", "SRC_LANG#es", "hound"))
            .unwrap();

        let old = table
            .query_index(TableIndex::ReverseLookup, KeyQuery::hash("LKP#en#dog"))
            .await
            .unwrap();
        assert!(old.is_empty());

        let new = table
            .query_index(TableIndex::CanonicalWord, KeyQuery::hash("hound"))
            .await
            .unwrap();
        assert_eq!(new.len(), 1);
    }

    #[tokio::test]
    async fn test_lagging_projection_is_skipped() {
        let table = InMemoryTable::new();
        table
            .put_record(indexed("SRC#es#perro", "TGT#en#POS#noun", "LKP#en#dog", "SRC_LANG#es", "dog"))
            .unwrap();

        assert!(table.evict_primary_row(&EntryKey::new("SRC#es#perro", "TGT#en#POS#noun")));

        let records = table
            .query_index(TableIndex::ReverseLookup, KeyQuery::hash("LKP#en#dog"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    // ============================================================
    // SCAN
    // ============================================================

    #[tokio::test]
    async fn test_scan_paginates_whole_table() {
        let table = InMemoryTable::new();
        for i in 0..25 {
            table
                .put_record(record(&format!("SRC#en#w{:02}", i), "TGT#es#POS#noun", "w", "w"))
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut start = None;
        let mut pages = 0;
        loop {
            let page = table
                .scan(ScanRequest {
                    filter: None,
                    batch_size: 10,
                    start,
                })
                .await
                .unwrap();
            pages += 1;
            seen.extend(page.records.iter().map(pk_of));
            match page.next {
                Some(token) => start = Some(token),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 25);
        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 25, "No record may appear on two pages");
    }

    #[tokio::test]
    async fn test_scan_filter_applies_after_page_read() {
        let table = InMemoryTable::new();
        table.put_record(record("SRC#en#a", "TGT#es#POS#noun", "apple", "manzana")).unwrap();
        table.put_record(record("SRC#en#b", "TGT#es#POS#noun", "banana", "platano")).unwrap();
        table.put_record(record("SRC#en#c", "TGT#es#POS#noun", "pineapple", "pina")).unwrap();

        let filter = ContainsFilter {
            fields: vec![ATTR_SOURCE_WORD, ATTR_TARGET_WORD],
            needle: "apple".to_string(),
        };

        let first = table
            .scan(ScanRequest {
                filter: Some(filter.clone()),
                batch_size: 2,
                start: None,
            })
            .await
            .unwrap();
        // a and b evaluated, only a matches
        assert_eq!(first.records.len(), 1);
        assert!(first.next.is_some());

        let second = table
            .scan(ScanRequest {
                filter: Some(filter),
                batch_size: 2,
                start: first.next,
            })
            .await
            .unwrap();
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0]["SourceWord"], "pineapple");
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn test_scan_rejects_foreign_token() {
        let table = InMemoryTable::new();
        let result = table
            .scan(ScanRequest {
                filter: None,
                batch_size: 10,
                start: Some(ContinuationToken("garbage".into())),
            })
            .await;
        assert!(matches!(result, Err(StoreError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_scan_unbounded_batch_after_token_returns_rest() {
        let table = InMemoryTable::new();
        for i in 0..4 {
            table
                .put_record(record(&format!("SRC#en#w{}", i), "TGT#es#POS#noun", "w", "w"))
                .unwrap();
        }

        let first = table
            .scan(ScanRequest {
                filter: None,
                batch_size: 1,
                start: None,
            })
            .await
            .unwrap();
        assert_eq!(first.records.len(), 1);

        let rest = table
            .scan(ScanRequest {
                filter: None,
                batch_size: usize::MAX,
                start: first.next,
            })
            .await
            .unwrap();
        assert_eq!(
            rest.records.iter().map(pk_of).collect::<Vec<_>>(),
            vec!["SRC#en#w1", "SRC#en#w2", "SRC#en#w3"]
        );
        assert!(rest.next.is_none());
    }

    // ============================================================
    // BATCH GET & INSTRUMENTATION
    // ============================================================

    #[tokio::test]
    async fn test_batch_get_skips_missing_keys() {
        let table = InMemoryTable::new();
        table.put_record(record("SRC#en#cat", "TGT#es#POS#noun", "cat", "gato")).unwrap();

        let records = table
            .batch_get(&[
                EntryKey::new("SRC#en#cat", "TGT#es#POS#noun"),
                EntryKey::new("SRC#en#cat", "TGT#fr#POS#noun"),
            ])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fault_injection_and_counters() {
        let table = InMemoryTable::new();
        table.fail(TableOp::Index(TableIndex::CanonicalWord), "index offline");

        let failed = table
            .query_index(TableIndex::CanonicalWord, KeyQuery::hash("dog"))
            .await;
        assert!(matches!(failed, Err(StoreError::Transport(ref m)) if m == "index offline"));

        // Other operations are unaffected
        assert!(table.query(KeyQuery::hash("SRC#en#dog")).await.is_ok());

        table.heal(TableOp::Index(TableIndex::CanonicalWord));
        assert!(table
            .query_index(TableIndex::CanonicalWord, KeyQuery::hash("dog"))
            .await
            .is_ok());

        assert_eq!(table.call_count(TableOp::Index(TableIndex::CanonicalWord)), 2);
        assert_eq!(table.call_count(TableOp::Query), 1);
        assert_eq!(table.call_count(TableOp::Scan), 0);
    }

    #[tokio::test]
    async fn test_fail_after_lets_earlier_calls_through() {
        let table = InMemoryTable::new();
        assert!(table.query(KeyQuery::hash("SRC#en#dog")).await.is_ok());

        table.fail_after(TableOp::Query, 2, "throttled");
        assert!(table.query(KeyQuery::hash("SRC#en#dog")).await.is_ok());
        assert!(table.query(KeyQuery::hash("SRC#en#dog")).await.is_ok());
        assert!(matches!(
            table.query(KeyQuery::hash("SRC#en#dog")).await,
            Err(StoreError::Transport(ref m)) if m == "throttled"
        ));
        assert!(table.query(KeyQuery::hash("SRC#en#dog")).await.is_err());
        assert_eq!(table.call_count(TableOp::Query), 5);
    }

    #[test]
    fn test_oversized_latency_saturates() {
        let table = InMemoryTable::new();
        table.set_latency(std::time::Duration::MAX);
        assert_eq!(table.latency(), std::time::Duration::from_millis(u64::MAX));

        table.set_latency(std::time::Duration::from_millis(250));
        assert_eq!(table.latency(), std::time::Duration::from_millis(250));
    }

    #[test]
    fn test_entry_key_display_is_composite() {
        let key = EntryKey::new("SRC#en#cat", "TGT#es#POS#noun");
        assert_eq!(key.to_string(), "SRC#en#cat|TGT#es#POS#noun");
    }
}
