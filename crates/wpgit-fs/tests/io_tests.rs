use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use wpgit_fs::io::{self, LockGuard};
use wpgit_fs::{ConfigStore, NormalizedPath};

#[test]
fn test_write_atomic_creates_parents_and_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("state/plugins.json"));

    io::write_text(&path, "{}").unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "{}");
    let leftovers: Vec<_> = fs::read_dir(temp.path().join("state"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_concurrent_writes_never_interleave() {
    let temp = TempDir::new().unwrap();
    let path = Arc::new(NormalizedPath::new(temp.path().join("shared.txt")));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|id| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..10 {
                    io::write_text(&path, &format!("thread{id}:write{i}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = io::read_text(&path).unwrap();
    assert_eq!(content.matches("thread").count(), 1);
}

#[test]
fn test_lock_guard_serializes_critical_sections() {
    let temp = TempDir::new().unwrap();
    let target = Arc::new(temp.path().join("counter.txt"));
    fs::write(target.as_ref(), "0").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let target = Arc::clone(&target);
            thread::spawn(move || {
                for _ in 0..25 {
                    let _guard = LockGuard::acquire(&target).unwrap();
                    let n: u32 = fs::read_to_string(target.as_ref()).unwrap().parse().unwrap();
                    fs::write(target.as_ref(), (n + 1).to_string()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(fs::read_to_string(target.as_ref()).unwrap(), "100");
}

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

#[test]
fn test_config_store_round_trips_each_format() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new();
    let value = Sample {
        name: "widget".into(),
        count: 3,
    };

    for file in ["c.toml", "c.json", "c.yaml"] {
        let path = NormalizedPath::new(temp.path().join(file));
        store.save(&path, &value).unwrap();
        let loaded: Sample = store.load(&path).unwrap();
        assert_eq!(loaded, value, "format {file}");
    }
}

#[test]
fn test_config_store_rejects_unknown_extension() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("c.ini"));
    fs::write(path.to_native(), "x=1").unwrap();
    let result: wpgit_fs::Result<Sample> = ConfigStore::new().load(&path);
    assert!(matches!(result, Err(wpgit_fs::Error::UnsupportedFormat { .. })));
}
