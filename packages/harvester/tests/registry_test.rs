//! Registry loading, overlay precedence and adapter dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use statute_harvester::registry::create_source;
use statute_harvester::{HarvesterError, SourceConfig, SourceRegistry, SourceType};

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// The overlay directory shipped with the repository.
fn shipped_sources() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../sources")
}

#[test]
fn test_builtin_jurisdictions() {
    let registry = SourceRegistry::builtin_only();
    let ids: Vec<String> = registry
        .list_jurisdictions()
        .into_iter()
        .map(|summary| summary.jurisdiction)
        .collect();

    assert_eq!(
        ids,
        vec!["us", "us-ga", "us-il", "us-mi", "us-nc", "us-ny", "us-oh", "us-pa"]
    );
}

#[test]
fn test_shipped_overlays_load() {
    let registry = SourceRegistry::new(shipped_sources());

    let california = registry.get_config("us-ca").unwrap();
    assert_eq!(california.source_type, SourceType::Html);
    assert_eq!(california.priority_codes, vec!["RTC", "WIC"]);
    assert_eq!(california.code_name("RTC"), Some("Revenue and Taxation Code"));

    let texas = registry.get_config("US-TX").unwrap();
    assert_eq!(texas.name, "Texas");
    assert!(registry.get_config("us").is_some());
}

#[test]
fn test_overlay_replaces_builtin() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "us-oh.yaml",
        r#"
name: Ohio (mirror)
source_type: html
base_url: https://mirror.example.org
section_url_pattern: /orc/{section}
codes:
  "57": Taxation
"#,
    );

    let registry = SourceRegistry::new(dir.path());
    let ohio = registry.get_config("US-OH").unwrap();
    assert_eq!(ohio.jurisdiction, "us-oh");
    assert_eq!(ohio.name, "Ohio (mirror)");
    assert_eq!(ohio.base_url, "https://mirror.example.org");
    assert!(ohio.priority_codes.is_empty());
    assert_eq!(ohio.codes.len(), 1);
}

#[test]
fn test_bad_overlay_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(&dir, "broken.yaml", "name: [unclosed");
    write(
        &dir,
        "us-wy.yml",
        "name: Wyoming\nsource_type: html\nbase_url: https://wyoleg.gov\nsection_url_pattern: /statutes/{section}\n",
    );
    write(
        &dir,
        "us-zz.yaml",
        "source_type: html\nbase_url: https://x.gov\nsection_url_pattern: /{section}\ncodes:\n  A: a\npriority_codes: [B]\n",
    );
    write(&dir, "notes.txt", "not an overlay");

    let registry = SourceRegistry::new(dir.path());
    assert!(registry.get_config("us-wy").is_some());
    assert!(registry.get_config("broken").is_none());
    assert!(registry.get_config("us-zz").is_none());
    assert!(registry.get_config("us").is_some());
}

#[test]
fn test_table_is_loaded_once() {
    let dir = TempDir::new().unwrap();
    let registry = SourceRegistry::new(dir.path());
    assert!(registry.get_config("us-wy").is_none());

    write(
        &dir,
        "us-wy.yaml",
        "source_type: html\nbase_url: https://wyoleg.gov\nsection_url_pattern: /statutes/{section}\n",
    );
    assert!(registry.get_config("us-wy").is_none());
    assert!(SourceRegistry::new(dir.path()).get_config("us-wy").is_some());
}

#[test]
fn test_concurrent_first_access_loads_once() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "us-wy.yaml",
        "name: Wyoming\nbase_url: https://wyoleg.gov\nsection_url_pattern: /statutes/{section}\n",
    );
    let registry = SourceRegistry::new(dir.path());
    let barrier = Barrier::new(8);

    let loaded: Vec<Arc<SourceConfig>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.get_config("us-wy").unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    // One load means every thread sees the same stored entry.
    assert!(loaded.iter().all(|config| Arc::ptr_eq(config, &loaded[0])));

    fs::remove_file(dir.path().join("us-wy.yaml")).unwrap();
    let again = registry.get_config("us-wy").unwrap();
    assert!(Arc::ptr_eq(&again, &loaded[0]));
}

#[test]
fn test_oversized_rate_limit_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "us-wy.yaml",
        "base_url: https://wyoleg.gov\nsection_url_pattern: /statutes/{section}\nrate_limit: 1.0e30\n",
    );

    let registry = SourceRegistry::new(dir.path());
    assert!(registry.get_config("us-wy").is_none());
    assert!(matches!(
        registry.get_source("us-wy").err().unwrap(),
        HarvesterError::ConfigNotFound { .. }
    ));

    let unchecked = SourceConfig::new("us-wy", "Wyoming", SourceType::Html, "https://wyoleg.gov")
        .with_patterns("/statutes/{section}", "/statutes")
        .with_rate_limit(1.0e30);
    let source = create_source(Arc::new(unchecked)).unwrap();
    assert_eq!(source.adapter_name(), "html");
}

#[test]
fn test_register_is_visible_immediately() {
    let registry = SourceRegistry::builtin_only();
    let config = SourceConfig::new("ignored", "Vermont", SourceType::Html, "https://legislature.vermont.gov")
        .with_patterns("/statutes/section/{code}/{section}", "/statutes/title/{code}")
        .with_codes([("32", "Taxation and Finance")]);

    registry.register("US-VT", config).unwrap();

    let vermont = registry.get_config("us-vt").unwrap();
    assert_eq!(vermont.jurisdiction, "us-vt");
    let source = registry.get_source("us-vt").unwrap();
    assert_eq!(source.jurisdiction(), "us-vt");
    assert_eq!(source.adapter_name(), "html");
    assert_eq!(source.list_codes().len(), 1);
}

#[test]
fn test_register_rejects_invalid_config() {
    let registry = SourceRegistry::builtin_only();
    let config = SourceConfig::new("", "Broken", SourceType::Html, "https://x.gov");

    let err = registry.register("us-xx", config).unwrap_err();
    assert!(matches!(err, HarvesterError::InvalidConfig { .. }));
    assert!(registry.get_config("us-xx").is_none());
}

#[test]
fn test_get_source_dispatch() {
    let registry = SourceRegistry::builtin_only();

    assert_eq!(registry.get_source("us").unwrap().adapter_name(), "uslm");
    assert_eq!(registry.get_source("us-oh").unwrap().adapter_name(), "html");
    assert_eq!(
        registry.get_source("us-ny").unwrap().adapter_name(),
        "ny-legislation"
    );

    let err = registry.get_source("us-zz").err().unwrap();
    assert!(matches!(err, HarvesterError::ConfigNotFound { .. }));
}

#[test]
fn test_codes_by_priority_for_builtin() {
    let registry = SourceRegistry::builtin_only();
    let us = registry.get_config("us").unwrap();
    let order: Vec<&str> = us.codes_by_priority().collect();
    assert_eq!(&order[..3], &["26", "42", "7"]);
    assert_eq!(order.len(), us.codes.len());
}
