use std::sync::Arc;
use std::thread;

use sthilbert::prelude::*;
use sthilbert::{MemoryTable, composite_key};

fn city_extent() -> BoundingRect {
    // Roughly Manhattan.
    BoundingRect::new(-74.05, 40.68, -73.90, 40.88).unwrap()
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_end_to_end_build_and_scan() {
    init_logs();
    let config = IndexConfig::default()
        .with_density_threshold(4.0)
        .with_max_depth(8);
    let index = StIndex::new(config).unwrap();

    let base_ts = 1_640_995_200_000i64; // 2022-01-01T00:00:00Z
    let records: Vec<SpatialPoint> = (0..200)
        .map(|i| {
            let x = -74.05 + (i as f64 * 0.00071) % 0.15;
            let y = 40.68 + (i as f64 * 0.00093) % 0.20;
            SpatialPoint::new(x, y, base_ts + i * 60_000, format!("pickup_{}", i))
        })
        .collect();

    let stats = index.build(records, &city_extent()).unwrap();
    assert_eq!(stats.records_indexed + stats.records_dropped, 200);
    assert_eq!(stats.records_dropped, 0);
    assert!(stats.buckets >= 1);
    assert!(stats.subspaces >= stats.buckets);

    // A full scan returns every record, under byte-ordered keys.
    let all = index
        .range_scan(b"", composite_key(i64::MAX, u64::MAX).as_bytes())
        .unwrap();
    let total: usize = all.iter().map(|(_, set)| set.len()).sum();
    assert_eq!(total, 200);
    for pair in all.windows(2) {
        assert!(pair[0].0 < pair[1].0, "keys must come back in ascending order");
    }
}

#[test]
fn test_keys_order_time_before_space() {
    // One point per 30-minute period, placed so later periods get spatially
    // "earlier" cells. Temporal order must still win.
    let config = IndexConfig::default()
        .with_density_threshold(1.0)
        .with_max_depth(4)
        .with_period_ms(1_800_000)
        .with_max_span(4);
    let index = StIndex::new(config).unwrap();
    let extent = BoundingRect::new(0.0, 0.0, 16.0, 16.0).unwrap();

    let records = vec![
        SpatialPoint::new(15.0, 15.0, 0, "t0 far corner"),
        SpatialPoint::new(0.0, 0.0, 1_800_000, "t1 origin"),
        SpatialPoint::new(8.0, 0.0, 3_600_000, "t2 mid"),
    ];
    index.build(records, &extent).unwrap();

    let all = index
        .range_scan(b"", composite_key(i64::MAX, u64::MAX).as_bytes())
        .unwrap();
    let payloads: Vec<&[u8]> = all.iter().map(|(_, set)| set[0].payload.as_ref()).collect();
    assert_eq!(
        payloads,
        vec![b"t0 far corner".as_ref(), b"t1 origin", b"t2 mid"]
    );
}

#[test]
fn test_bin_prefix_scan_isolates_a_period() {
    let config = IndexConfig::default()
        .with_density_threshold(2.0)
        .with_max_depth(6)
        .with_period_ms(1_800_000)
        .with_max_span(48);
    let index = StIndex::new(config).unwrap();
    let extent = BoundingRect::new(0.0, 0.0, 64.0, 64.0).unwrap();

    let mut records = Vec::new();
    for period in 0..3i64 {
        for i in 0..10 {
            let ts = period * 1_800_000 + i * 1_000;
            records.push(SpatialPoint::new(
                (i * 6) as f64,
                (i * 5) as f64,
                ts,
                format!("p{}_{}", period, i),
            ));
        }
    }
    index.build(records, &extent).unwrap();

    // All period-1 records share bin 48 (i=1, zero span, N=48).
    let scanned = index
        .range_scan(
            composite_key(48, 0).as_bytes(),
            composite_key(48, u64::MAX).as_bytes(),
        )
        .unwrap();
    let records_in_bin: Vec<&SpatialPoint> =
        scanned.iter().flat_map(|(_, set)| set.iter()).collect();
    assert_eq!(records_in_bin.len(), 10);
    for record in records_in_bin {
        assert!(record.payload.starts_with(b"p1_"));
    }
}

#[test]
fn test_trajectory_build_keeps_points_in_one_bin() {
    let config = IndexConfig::default()
        .with_density_threshold(1.0)
        .with_max_depth(6)
        .with_period_ms(1_800_000)
        .with_max_span(48);
    let index = StIndex::new(config).unwrap();
    let extent = BoundingRect::new(0.0, 0.0, 64.0, 64.0).unwrap();

    // A two-hour delivery run: span covers periods 0..=4 of the day.
    let points: Vec<SpatialPoint> = (0..5)
        .map(|i| SpatialPoint::new(10.0 + i as f64 * 8.0, 20.0, i * 1_800_000, format!("stop{}", i)))
        .collect();
    let trajectory = Trajectory::new("route7", points).unwrap();
    let expected_bin = TimeBinEncoder::new(1_800_000, 48)
        .unwrap()
        .encode_trajectory(&trajectory);

    let stats = index.build_trajectories(vec![trajectory], &extent).unwrap();
    assert_eq!(stats.records_indexed, 5);
    assert_eq!(stats.buckets, 1);

    let scanned = index
        .range_scan(
            composite_key(expected_bin, 0).as_bytes(),
            composite_key(expected_bin, u64::MAX).as_bytes(),
        )
        .unwrap();
    let total: usize = scanned.iter().map(|(_, set)| set.len()).sum();
    assert_eq!(total, 5);
    for (_, set) in &scanned {
        for record in set {
            assert_eq!(record.trajectory_id.as_deref(), Some("route7"));
        }
    }
}

#[test]
fn test_config_loaded_from_json_drives_build() {
    let json = r#"{
        "density_threshold": 1.0,
        "max_depth": 3,
        "period_ms": 1800000,
        "max_span": 4,
        "boundary": "inclusive_max"
    }"#;
    let config = IndexConfig::from_json(json).unwrap();
    let index = StIndex::new(config).unwrap();
    let extent = BoundingRect::new(0.0, 0.0, 8.0, 8.0).unwrap();

    // The max corner is only indexable because the JSON selected the
    // inclusive boundary mode.
    let stats = index
        .build(vec![SpatialPoint::new(8.0, 8.0, 0, "corner")], &extent)
        .unwrap();
    assert_eq!(stats.records_indexed, 1);
    assert_eq!(stats.records_dropped, 0);
}

#[test]
fn test_build_into_external_table_accumulates_batches() {
    let config = IndexConfig::default()
        .with_density_threshold(2.0)
        .with_max_depth(5);
    let index = StIndex::new(config).unwrap();
    let extent = BoundingRect::new(0.0, 0.0, 32.0, 32.0).unwrap();
    let mut table = MemoryTable::new();

    for batch in 0..3i64 {
        let records: Vec<SpatialPoint> = (0..20)
            .map(|i| {
                SpatialPoint::new(
                    (i as f64 * 1.618) % 32.0,
                    (i as f64 * 2.414) % 32.0,
                    batch * 1_800_000,
                    format!("b{}_{}", batch, i),
                )
            })
            .collect();
        index.build_into(records, &extent, &mut table).unwrap();
    }

    assert_eq!(table.record_count(), 60);
    // Internal table never touched.
    assert_eq!(index.record_count(), 0);
}

#[test]
fn test_concurrent_scans_during_builds() {
    let config = IndexConfig::default()
        .with_density_threshold(4.0)
        .with_max_depth(6);
    let index = Arc::new(StIndex::new(config).unwrap());
    let extent = BoundingRect::new(0.0, 0.0, 64.0, 64.0).unwrap();

    let mut handles = Vec::new();

    // Writers: four batches into the shared internal table.
    for batch in 0..4i64 {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || {
            let records: Vec<SpatialPoint> = (0..50i64)
                .map(|i| {
                    SpatialPoint::new(
                        ((i * 13 + batch) % 60) as f64 + 0.5,
                        ((i * 7 + batch) % 60) as f64 + 0.5,
                        batch * 1_800_000 + i,
                        format!("w{}_{}", batch, i),
                    )
                })
                .collect();
            index.build(records, &extent).unwrap();
        }));
    }

    // Readers: scans must always observe a consistent table.
    for _ in 0..4 {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                let all = index
                    .range_scan(b"", composite_key(i64::MAX, u64::MAX).as_bytes())
                    .unwrap();
                for pair in all.windows(2) {
                    assert!(pair[0].0 < pair[1].0);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(index.record_count(), 200);
}

#[test]
fn test_multi_scale_prefix_pairs_with_spatial_codes() {
    // Callers keying directly on calendar time can pair the lexicographic
    // prefix with a spatial code the same way the numeric bin is paired.
    let keys = MultiScaleTimeKey::new(1_800_000).unwrap();
    let base_ts = 1_640_995_200_000i64;

    let early = format!("{}{:020}", keys.key_prefix(base_ts).unwrap(), 5u64);
    let late = format!(
        "{}{:020}",
        keys.key_prefix(base_ts + 1_800_000).unwrap(),
        0u64
    );
    assert!(early < late, "calendar time must dominate the spatial code");
}
