use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;
use vegamdb::{AnnoyConfig, CodecError, IndexKind, IvfConfig, VegamDb, VegamError};

fn random_rows(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

fn assert_same_answers(a: &VegamDb, b: &VegamDb, queries: &[Vec<f32>], k: usize) {
    for query in queries {
        let before = a.search(query, k).unwrap();
        let after = b.search(query, k).unwrap();
        assert_eq!(before.ids, after.ids);
        assert_eq!(before.distances, after.distances);
    }
}

#[test]
fn flat_round_trip() {
    let rows = random_rows(100, 32, 42);
    let mut db = VegamDb::new();
    db.add_vector_batch(&rows).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("flat.vegam");
    db.save(&path).unwrap();
    assert!(path.exists());

    let mut loaded = VegamDb::new();
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 100);
    assert_eq!(loaded.dimension(), 32);
    assert_eq!(loaded.index_kind(), IndexKind::Flat);
    assert_same_answers(&db, &loaded, &rows[..5], 5);
}

#[test]
fn ivf_round_trip() {
    let rows = random_rows(500, 32, 42);
    let mut db = VegamDb::new();
    db.add_vector_batch(&rows).unwrap();
    db.use_ivf_index_with(IvfConfig {
        n_clusters: 5,
        max_iters: 50,
        n_probe: 3,
        seed: Some(42),
    });
    db.build_index().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("ivf.vegam");
    db.save(&path).unwrap();

    let mut loaded = VegamDb::new();
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 500);
    assert_eq!(loaded.index_kind(), IndexKind::Ivf);
    assert!(loaded.is_index_built());
    assert_same_answers(&db, &loaded, &rows[..5], 5);
}

#[test]
fn annoy_round_trip() {
    let rows = random_rows(500, 32, 42);
    let mut db = VegamDb::new();
    db.add_vector_batch(&rows).unwrap();
    db.use_annoy_index_with(AnnoyConfig {
        num_trees: 5,
        k_leaf: 50,
        use_priority_queue: true,
        seed: Some(42),
    });
    db.build_index().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("annoy.vegam");
    db.save(&path).unwrap();

    let mut loaded = VegamDb::new();
    loaded.load(&path).unwrap();

    assert_eq!(loaded.size(), 500);
    assert_eq!(loaded.index_kind(), IndexKind::Annoy);
    assert!(loaded.is_index_built());
    assert_same_answers(&db, &loaded, &rows[..5], 5);
}

#[test]
fn second_save_is_byte_identical() {
    let rows = random_rows(200, 16, 9);
    let mut db = VegamDb::new();
    db.add_vector_batch(&rows).unwrap();
    db.use_ivf_index_with(IvfConfig {
        n_clusters: 4,
        max_iters: 50,
        n_probe: 2,
        seed: Some(9),
    });
    db.build_index().unwrap();

    let dir = tempdir().unwrap();
    let first = dir.path().join("first.vegam");
    let second = dir.path().join("second.vegam");

    db.save(&first).unwrap();
    let mut loaded = VegamDb::new();
    loaded.load(&first).unwrap();
    loaded.save(&second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn unbuilt_index_saves_as_flat() {
    let rows = random_rows(50, 8, 3);
    let mut db = VegamDb::new();
    db.add_vector_batch(&rows).unwrap();
    db.use_ivf_index(4, 50, 1);
    // Never built: nothing trained to persist

    let dir = tempdir().unwrap();
    let path = dir.path().join("unbuilt.vegam");
    db.save(&path).unwrap();

    let mut loaded = VegamDb::new();
    loaded.load(&path).unwrap();
    assert_eq!(loaded.index_kind(), IndexKind::Flat);
    assert_eq!(loaded.size(), 50);
}

#[test]
fn save_leaves_no_temp_file() {
    let mut db = VegamDb::new();
    db.add_vector(&[1.0, 2.0]).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.vegam");
    db.save(&path).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("clean.vegam.tmp").exists());
}

#[test]
fn empty_db_round_trips() {
    let db = VegamDb::new();
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.vegam");
    db.save(&path).unwrap();

    let mut loaded = VegamDb::new();
    loaded.load(&path).unwrap();
    assert_eq!(loaded.size(), 0);
    assert_eq!(loaded.dimension(), 0);
    assert!(loaded.search(&[1.0], 3).unwrap().ids.is_empty());
}

// ------------------------------------------------------- corrupt files

fn saved_bytes() -> Vec<u8> {
    let mut db = VegamDb::new();
    db.add_vector(&[1.0, 2.0, 3.0]).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("victim.vegam");
    db.save(&path).unwrap();
    fs::read(&path).unwrap()
}

fn load_bytes(bytes: &[u8]) -> VegamError {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.vegam");
    fs::write(&path, bytes).unwrap();

    let mut db = VegamDb::new();
    db.load(&path).unwrap_err()
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = saved_bytes();
    bytes[..4].copy_from_slice(b"XXXX");
    let err = load_bytes(&bytes);
    assert!(matches!(err, VegamError::Codec(CodecError::BadMagic)));
}

#[test]
fn unsupported_version_is_rejected() {
    let mut bytes = saved_bytes();
    bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
    let err = load_bytes(&bytes);
    assert!(matches!(
        err,
        VegamError::Codec(CodecError::UnsupportedVersion(9))
    ));
}

#[test]
fn truncated_file_is_rejected() {
    let bytes = saved_bytes();
    let err = load_bytes(&bytes[..10]);
    assert!(matches!(
        err,
        VegamError::Codec(CodecError::Truncated { .. })
    ));
}

#[test]
fn unknown_index_kind_is_rejected() {
    let mut bytes = saved_bytes();
    // The flat payload ends with the kind tag
    *bytes.last_mut().unwrap() = 7;
    let err = load_bytes(&bytes);
    assert!(matches!(
        err,
        VegamError::Codec(CodecError::UnknownIndexKind(7))
    ));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = saved_bytes();
    bytes.push(0);
    let err = load_bytes(&bytes);
    assert!(matches!(
        err,
        VegamError::Codec(CodecError::TrailingBytes { extra: 1 })
    ));
}

#[test]
fn failed_load_leaves_the_db_untouched() {
    let mut db = VegamDb::new();
    db.add_vector(&[5.0, 6.0]).unwrap();
    db.add_vector(&[7.0, 8.0]).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.vegam");
    fs::write(&path, b"not a database").unwrap();

    assert!(db.load(&path).is_err());
    assert_eq!(db.size(), 2);
    assert_eq!(db.get_vector(0), Some(&[5.0, 6.0][..]));
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = tempdir().unwrap();
    let mut db = VegamDb::new();
    let err = db.load(dir.path().join("nope.vegam")).unwrap_err();
    assert!(matches!(err, VegamError::Io(_)));
}
