//! Table cache: hits on unchanged files, reload on a new mtime.

use peergroup_core::{cache::TableCache, error::PeerError};
use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime},
};

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("peergroup-cache-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn set_mtime(path: &PathBuf, at: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(at).unwrap();
}

#[test]
fn unchanged_file_is_served_from_cache() {
    let path = scratch_file(
        "grad_hit.csv",
        "institution_id,year,institution_name,metric_value\n1,2023,Alpha,50\n",
    );
    let mut cache = TableCache::new();

    assert_eq!(cache.metric_table(&path, "metric_value").unwrap().len(), 1);
    assert_eq!(cache.metric_table(&path, "metric_value").unwrap().len(), 1);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1), "Expected one miss then one hit; got {stats:?}");
    assert_eq!(cache.len(), 1);
    assert!(cache.loaded_at(&path).is_some());

    fs::remove_file(&path).ok();
}

#[test]
fn modified_file_is_reloaded() {
    let path = scratch_file(
        "grad_reload.csv",
        "institution_id,year,institution_name,metric_value\n1,2023,Alpha,50\n",
    );
    let base = SystemTime::now() - Duration::from_secs(3_600);
    set_mtime(&path, base);

    let mut cache = TableCache::new();
    assert_eq!(cache.metric_table(&path, "metric_value").unwrap().len(), 1);

    fs::write(
        &path,
        "institution_id,year,institution_name,metric_value\n1,2023,Alpha,50\n2,2023,Beta,60\n",
    )
    .unwrap();
    set_mtime(&path, base + Duration::from_secs(60));

    assert_eq!(cache.metric_table(&path, "metric_value").unwrap().len(), 2);
    assert_eq!(cache.stats().misses, 2);
    assert_eq!(cache.stats().hits, 0);

    fs::remove_file(&path).ok();
}

#[test]
fn metric_column_is_part_of_the_key() {
    let path = scratch_file(
        "grad_columns.csv",
        "institution_id,year,institution_name,grad_rate,retention\n1,2023,Alpha,50,70\n",
    );
    let mut cache = TableCache::new();

    let grad = cache.metric_table(&path, "grad_rate").unwrap().records()[0].metric_value;
    let retention = cache.metric_table(&path, "retention").unwrap().records()[0].metric_value;

    assert_eq!(grad, Some(50.0));
    assert_eq!(retention, Some(70.0));
    assert_eq!(cache.stats().misses, 2);

    cache.clear();
    assert!(cache.is_empty());

    fs::remove_file(&path).ok();
}

#[test]
fn headcount_tables_are_cached_separately() {
    let path = scratch_file("heads.csv", "unitid,year,ft_ug_headcount\n1,2023,1500\n");
    let mut cache = TableCache::new();

    assert_eq!(cache.headcount_table(&path).unwrap().len(), 1);
    assert_eq!(cache.headcount_table(&path).unwrap().records()[0].headcount, Some(1_500.0));
    assert_eq!(cache.stats().hits, 1);

    fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_a_load_error() {
    let mut cache = TableCache::new();
    let err = cache
        .metric_table(std::path::Path::new("/nonexistent/grad_long.csv"), "metric_value")
        .unwrap_err();
    assert!(matches!(err, PeerError::DataLoad { .. }), "got {err:?}");
    assert!(cache.is_empty());
}
