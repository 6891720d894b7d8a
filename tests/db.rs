use vegamdb::{StoreError, VegamDb, VegamError};

#[test]
fn add_single_vector() {
    let mut db = VegamDb::new();
    let id = db.add_vector(&[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(id, 0);
    assert_eq!(db.size(), 1);
    assert_eq!(db.dimension(), 3);
}

#[test]
fn add_many_vectors_accumulates_ids() {
    let mut db = VegamDb::new();
    for i in 0..100 {
        let id = db.add_vector(&[i as f32; 10]).unwrap();
        assert_eq!(id, i);
    }
    assert_eq!(db.size(), 100);
    assert_eq!(db.dimension(), 10);
}

#[test]
fn mixed_ingest_paths_accumulate() {
    let mut db = VegamDb::new();
    db.add_vector(&[1.0, 2.0, 3.0]).unwrap();
    db.add_array(&[4.0, 5.0, 6.0], &[3]).unwrap();

    let flat: Vec<f32> = (0..30).map(|i| i as f32).collect();
    let ids = db.add_array(&flat, &[10, 3]).unwrap();

    assert_eq!(db.size(), 12);
    assert_eq!(ids, (2..12).collect::<Vec<u64>>());
}

#[test]
fn dimension_mismatch_on_second_add() {
    let mut db = VegamDb::new();
    db.add_vector(&[1.0, 2.0, 3.0]).unwrap();

    let err = db.add_vector(&[1.0, 2.0]).unwrap_err();
    assert!(matches!(
        err,
        VegamError::Store(StoreError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(db.size(), 1);
}

#[test]
fn three_dimensional_array_is_rejected() {
    let mut db = VegamDb::new();
    let err = db.add_array(&[0.0; 24], &[2, 3, 4]).unwrap_err();
    assert!(matches!(
        err,
        VegamError::Store(StoreError::InvalidShape { ndim: 3 })
    ));
    assert_eq!(db.size(), 0);
}

#[test]
fn batch_add_is_all_or_nothing() {
    let mut db = VegamDb::new();
    db.add_vector(&[0.0, 0.0]).unwrap();

    let rows = vec![vec![1.0, 1.0], vec![2.0, 2.0, 2.0], vec![3.0, 3.0]];
    assert!(db.add_vector_batch(&rows).is_err());
    assert_eq!(db.size(), 1);

    let ids = db
        .add_vector_batch(&[vec![1.0, 1.0], vec![2.0, 2.0]])
        .unwrap();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn empty_db_reports_zero() {
    let db = VegamDb::new();
    assert_eq!(db.size(), 0);
    assert_eq!(db.dimension(), 0);
}

#[test]
fn search_on_empty_db_returns_empty() {
    let db = VegamDb::new();
    let result = db.search(&[1.0, 2.0, 3.0], 5).unwrap();
    assert!(result.ids.is_empty());
    assert!(result.distances.is_empty());
}

#[test]
fn get_vector_round_trips() {
    let mut db = VegamDb::new();
    db.add_vector(&[1.5, -2.5]).unwrap();
    assert_eq!(db.get_vector(0), Some(&[1.5, -2.5][..]));
    assert_eq!(db.get_vector(1), None);
}

#[test]
fn stats_reflect_state() {
    let mut db = VegamDb::new();
    for i in 0..30 {
        db.add_vector(&[i as f32, 0.0]).unwrap();
    }

    let stats = db.stats();
    assert_eq!(stats.count, 30);
    assert_eq!(stats.dimension, 2);
    assert!(stats.index_built);
    assert_eq!(stats.index_memory_bytes, 0);

    db.use_ivf_index(3, 10, 1);
    let stats = db.stats();
    assert!(!stats.index_built);

    db.build_index().unwrap();
    let stats = db.stats();
    assert!(stats.index_built);
    assert!(stats.index_memory_bytes > 0);
}
