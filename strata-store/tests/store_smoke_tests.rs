//! End-to-end scenarios across both tiers: generate, accessor lookups,
//! member-aligned loads, clustering changes, and tier consistency.

use std::collections::{BTreeMap, BTreeSet};

use strata_test_utils::{
    AmplitudeProvider, CacheError, ClusterCache, ClusterId, ClusteringChange, FieldValue,
    MeanAmplitudeProvider, MemberIndex, MockRecording, RegistryError, StoreConfig, StoreError,
    TieredStore, WaveformProvider,
};
use tempfile::TempDir;

const WAVEFORM_WIDTH: usize = 4;

fn members_map(pairs: &[(ClusterId, &[MemberIndex])]) -> BTreeMap<ClusterId, Vec<MemberIndex>> {
    pairs.iter().map(|(id, m)| (*id, m.to_vec())).collect()
}

fn build_cache(dir: &TempDir) -> ClusterCache<MockRecording> {
    let store = TieredStore::open(StoreConfig::new().with_disk_root(dir.path()))
        .expect("store creation should succeed");
    let mut cache = ClusterCache::new(MockRecording::new("session-07", WAVEFORM_WIDTH), store);
    cache
        .register_provider(Box::new(MeanAmplitudeProvider))
        .expect("registration should succeed");
    cache
        .register_provider(Box::new(AmplitudeProvider))
        .expect("registration should succeed");
    cache
        .register_provider(Box::new(WaveformProvider))
        .expect("registration should succeed");
    cache
}

fn generated_cache(dir: &TempDir) -> ClusterCache<MockRecording> {
    let mut cache = build_cache(dir);
    cache
        .generate(members_map(&[(1, &[0, 1]), (2, &[2])]))
        .expect("generate should succeed");
    cache
}

#[test]
fn test_generate_populates_both_tiers() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);

    assert_eq!(cache.store().cluster_ids().unwrap(), vec![1, 2]);

    let all = cache.store().load_all(1).unwrap();
    assert!(all.contains_key("mean_amplitude"));
    assert!(all.contains_key("amplitude"));
    assert!(all.contains_key("waveform"));

    // The disk tier keeps one zero-padded container per cluster.
    assert!(dir.path().join("00001.json").exists());
    assert!(dir.path().join("00002.json").exists());
}

#[test]
fn test_accessor_lookup_reaches_the_right_tier() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);
    let model = cache.model().clone();

    assert_eq!(
        cache.field("amplitude", 2).unwrap(),
        Some(FieldValue::Vector(vec![model.amplitude(2)]))
    );
    let expected_mean =
        (model.amplitude(0) as f64 + model.amplitude(1) as f64) / 2.0;
    assert_eq!(
        cache.field("mean_amplitude", 1).unwrap(),
        Some(FieldValue::Scalar(expected_mean))
    );

    let Some(FieldValue::Matrix(waveform)) = cache.field("waveform", 1).unwrap() else {
        panic!("expected a cached waveform matrix");
    };
    assert_eq!(waveform.rows(), 2);
    assert_eq!(waveform.row(1), Some(model.waveform(1).as_slice()));
}

#[test]
fn test_bulk_load_orders_rows_by_requested_members() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);
    let model = cache.model().clone();

    // Concatenated membership is [0, 1, 2]; request across clusters and out
    // of order.
    let out = cache.load("amplitude", &[2, 1], &[2, 0]).unwrap();
    assert_eq!(
        out,
        FieldValue::Vector(vec![model.amplitude(2), model.amplitude(0)])
    );

    let out = cache.load("waveform", &[1, 2], &[1, 2, 0]).unwrap();
    let FieldValue::Matrix(m) = out else {
        panic!("expected matrix");
    };
    assert_eq!(m.row(0), Some(model.waveform(1).as_slice()));
    assert_eq!(m.row(1), Some(model.waveform(2).as_slice()));
    assert_eq!(m.row(2), Some(model.waveform(0).as_slice()));
}

#[test]
fn test_bulk_load_rejects_foreign_member() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);

    let err = cache.load("amplitude", &[1], &[2]).unwrap_err();
    assert!(matches!(
        err,
        CacheError::Registry(RegistryError::MemberNotFound { member: 2 })
    ));
}

#[test]
fn test_update_assign_replaces_deleted_with_added() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let mut cache = generated_cache(&dir);
    let model = cache.model().clone();
    let untouched_before = cache.field("amplitude", 2).unwrap();

    let change = ClusteringChange::assign(
        BTreeSet::from([1]),
        BTreeSet::from([3]),
        members_map(&[(3, &[0, 1])]),
    );
    cache.update(&change).unwrap();

    assert_eq!(cache.store().cluster_ids().unwrap(), vec![2, 3]);
    assert_eq!(cache.field("amplitude", 1).unwrap(), None);
    assert!(!dir.path().join("00001.json").exists());
    assert_eq!(
        cache.field("amplitude", 3).unwrap(),
        Some(FieldValue::Vector(vec![
            model.amplitude(0),
            model.amplitude(1)
        ]))
    );
    assert_eq!(cache.field("amplitude", 2).unwrap(), untouched_before);
}

#[test]
fn test_update_merge_combines_clusters() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let mut cache = generated_cache(&dir);

    let change = ClusteringChange::merge(
        BTreeSet::from([1, 2]),
        BTreeSet::from([4]),
        members_map(&[(4, &[0, 1, 2])]),
    );
    cache.update(&change).unwrap();

    assert_eq!(cache.store().cluster_ids().unwrap(), vec![4]);
    let Some(FieldValue::Matrix(m)) = cache.field("waveform", 4).unwrap() else {
        panic!("expected a cached waveform matrix");
    };
    assert_eq!(m.rows(), 3);
}

#[test]
fn test_delete_clears_both_tiers_for_the_cluster() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let mut cache = generated_cache(&dir);

    cache.store_mut().delete(&[1]).unwrap();

    assert_eq!(cache.field("amplitude", 1).unwrap(), None);
    assert_eq!(cache.field("waveform", 1).unwrap(), None);
    assert!(cache.store().load_all(1).unwrap().is_empty());
    assert_eq!(cache.store().cluster_ids().unwrap(), vec![2]);
}

#[test]
fn test_absent_cluster_loads_resolve_to_nothing() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);

    assert!(cache.store().load_all(42).unwrap().is_empty());
    assert_eq!(cache.field("amplitude", 42).unwrap(), None);
    let out = cache
        .store()
        .load_fields(42, &["amplitude".to_string(), "waveform".to_string()])
        .unwrap();
    assert!(out.values().all(|v| v.is_none()));
}

#[test]
fn test_tier_disagreement_is_fatal() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let cache = generated_cache(&dir);

    std::fs::remove_file(dir.path().join("00002.json")).unwrap();

    let err = cache.store().cluster_ids().unwrap_err();
    assert!(matches!(
        err,
        CacheError::Store(StoreError::Inconsistency { .. })
    ));
}

#[test]
fn test_duplicate_provider_field_is_rejected() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let mut cache = build_cache(&dir);

    let err = cache
        .register_provider(Box::new(AmplitudeProvider))
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Registry(RegistryError::DuplicateAccessor { field }) if field == "amplitude"
    ));
}

#[test]
fn test_disk_tier_survives_reopen() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let model = {
        let cache = generated_cache(&dir);
        cache.model().clone()
    };

    // A fresh store over the same directory sees the cached waveforms.
    let mut store = TieredStore::open(StoreConfig::new().with_disk_root(dir.path()))
        .expect("reopen should succeed");
    store
        .register_field("waveform", strata_test_utils::Location::Disk)
        .unwrap();
    let Some(FieldValue::Matrix(m)) = store.load_field(1, "waveform").unwrap() else {
        panic!("expected the waveform to survive the reopen");
    };
    assert_eq!(m.row(0), Some(model.waveform(0).as_slice()));
}
