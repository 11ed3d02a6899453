use obd_dash_core::chart::{
    build_charts, format_dual, format_single, format_speed_rpm, ChartKind, ChartPanel,
    ChartSeries, RPM_DISPLAY_SCALE,
};
use obd_dash_core::reading::{Reading, SensorField};
use obd_dash_core::stats::{compute_stats, has_field, FieldPresence, FieldStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random windows with sparse, occasionally missing fields
fn random_windows(seed: u64, count: usize) -> Vec<Vec<Reading>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(0..40);
            (0..len)
                .map(|i| {
                    let mut reading = Reading::new(format!("2025-10-21T10:{:02}:{:02}", i / 60, i % 60));
                    for field in SensorField::ALL {
                        if rng.gen_bool(0.6) {
                            reading.set(field, Some(rng.gen_range(-50.0..8000.0)));
                        }
                    }
                    reading
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_sentinel_pairs_with_presence() {
    for window in random_windows(1, 50) {
        for field in SensorField::ALL {
            if !has_field(&window, field) {
                assert_eq!(compute_stats(&window, field), FieldStats::default());
            }
        }
    }

    let empty: Vec<Reading> = Vec::new();
    assert_eq!(compute_stats(&empty, SensorField::Speed), FieldStats::default());
    assert!(!has_field(&empty, SensorField::Speed));
}

#[test]
fn test_min_avg_max_ordering() {
    for window in random_windows(2, 100) {
        for field in SensorField::ALL {
            if has_field(&window, field) {
                let stats = compute_stats(&window, field);
                assert!(
                    stats.min <= stats.avg && stats.avg <= stats.max,
                    "{:?}: {:?}",
                    field,
                    stats
                );
            }
        }
    }
}

#[test]
fn test_stats_do_not_assume_order() {
    let readings: Vec<Reading> = [5.0, -3.0, 12.0, 0.0]
        .iter()
        .map(|v| Reading::new("2025-10-21T10:00:00").with(SensorField::TimingAdvance, *v))
        .collect();
    let stats = compute_stats(&readings, SensorField::TimingAdvance);
    assert_eq!(stats.min, -3.0);
    assert_eq!(stats.max, 12.0);
    assert_eq!(stats.avg, 3.5);
}

#[test]
fn test_formatter_preserves_length() {
    for window in random_windows(3, 50) {
        assert_eq!(format_speed_rpm(&window).len(), window.len());
        assert_eq!(format_single(&window, SensorField::FuelLevel).len(), window.len());
        assert_eq!(
            format_dual(&window, SensorField::CoolantTemp, SensorField::IntakeAirTemp).len(),
            window.len()
        );

        let presence = FieldPresence::scan(&window);
        for chart in build_charts(&window, &presence) {
            if let ChartPanel::Plot { series, .. } = chart {
                assert_eq!(series.len(), window.len());
            }
        }
    }
}

#[test]
fn test_rpm_is_divided_by_ten() {
    for window in random_windows(4, 30) {
        for (reading, point) in window.iter().zip(format_speed_rpm(&window)) {
            match reading.get(SensorField::Rpm) {
                Some(raw) => assert_eq!(point.rpm, Some(raw / RPM_DISPLAY_SCALE)),
                None => assert_eq!(point.rpm, None),
            }
        }
    }
}

#[test]
fn test_unparsable_timestamp_keeps_point() {
    let readings = vec![
        Reading::new("not a time").with(SensorField::Speed, 12.0),
        Reading::new("2025-10-21T23:59:59").with(SensorField::Speed, 14.0),
    ];
    let points = format_speed_rpm(&readings);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].time, "");
    assert_eq!(points[0].speed, Some(12.0));
    assert_eq!(points[1].time, "23:59:59");
}

#[test]
fn test_speed_only_window() {
    let readings: Vec<Reading> = (0..3)
        .map(|i| Reading::new(format!("2025-10-21T10:00:0{}", i)).with(SensorField::Speed, 20.0 * i as f64))
        .collect();
    let charts = build_charts(&readings, &FieldPresence::scan(&readings));

    let speed_rpm = charts
        .iter()
        .find(|c| c.kind() == ChartKind::SpeedRpm)
        .unwrap();
    assert!(speed_rpm.line_present(SensorField::Speed));
    assert!(!speed_rpm.line_present(SensorField::Rpm));
    match speed_rpm {
        ChartPanel::Plot {
            series: ChartSeries::SpeedRpm(points),
            ..
        } => {
            assert_eq!(points.len(), 3);
            assert!(points.iter().all(|p| p.speed.is_some() && p.rpm.is_none()));
        }
        other => panic!("unexpected panel {:?}", other),
    }

    assert_eq!(charts.iter().filter(|c| c.has_data()).count(), 1);
}
