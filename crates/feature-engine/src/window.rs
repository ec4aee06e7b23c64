//! Fixed-Length Windowing

use crate::features::Reading;
use crate::WindowError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use data_validator::schema::FEATURE_DIMENSION;
use ndarray::{Array2, Array3};
use tracing::{debug, info};

/// Readings per window (model input length)
pub const SEQUENCE_LENGTH: usize = 10;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse an ISO-8601-like timestamp. Offsets are normalized to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// A contiguous, non-overlapping run of readings reduced to a `steps x features` matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// 0-based window position
    pub sequence_id: usize,
    /// Timestamp of the first reading
    pub timestamp_start: NaiveDateTime,
    /// Timestamp of the last reading
    pub timestamp_end: NaiveDateTime,
    /// Feature matrix, one row per reading
    pub matrix: Array2<f64>,
}

/// Partitions a reading stream into fixed-length windows
#[derive(Debug, Clone, Copy)]
pub struct Windower {
    sequence_length: usize,
}

impl Default for Windower {
    fn default() -> Self {
        Self {
            sequence_length: SEQUENCE_LENGTH,
        }
    }
}

impl Windower {
    /// Create a windower producing windows of `sequence_length` readings
    pub fn new(sequence_length: usize) -> Result<Self, WindowError> {
        if sequence_length == 0 {
            return Err(WindowError::ZeroSequenceLength);
        }
        Ok(Self { sequence_length })
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Sort readings by timestamp (stable) and cut them into windows.
    ///
    /// A trailing run shorter than the sequence length is dropped.
    pub fn build(&self, readings: Vec<Reading>) -> Result<Vec<Window>, WindowError> {
        let mut stamped = Vec::with_capacity(readings.len());
        for reading in readings {
            let instant = parse_timestamp(&reading.timestamp).ok_or_else(|| {
                WindowError::InvalidTimestamp {
                    row: reading.row,
                    value: reading.timestamp.clone(),
                }
            })?;
            stamped.push((instant, reading));
        }

        let n = self.sequence_length;
        if stamped.len() < n {
            return Err(WindowError::InsufficientData {
                rows: stamped.len(),
                required: n,
            });
        }

        stamped.sort_by_key(|(instant, _)| *instant);

        let windows: Vec<Window> = stamped
            .chunks_exact(n)
            .enumerate()
            .map(|(sequence_id, chunk)| Window {
                sequence_id,
                timestamp_start: chunk[0].0,
                timestamp_end: chunk[n - 1].0,
                matrix: Array2::from_shape_fn((n, FEATURE_DIMENSION), |(step, feature)| {
                    chunk[step].1.features.values[feature]
                }),
            })
            .collect();

        let discarded = stamped.len() % n;
        if discarded > 0 {
            debug!("Discarding {} trailing rows that do not fill a window", discarded);
        }
        info!("Built {} windows of {} readings from {} rows", windows.len(), n, stamped.len());

        Ok(windows)
    }
}

/// Stack windows into a `(windows, steps, features)` batch
pub fn stack_windows(windows: &[Window]) -> Array3<f64> {
    let steps = windows.first().map(|w| w.matrix.nrows()).unwrap_or(0);
    Array3::from_shape_fn((windows.len(), steps, FEATURE_DIMENSION), |(w, s, f)| {
        windows[w].matrix[[s, f]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use chrono::Timelike;
    use proptest::prelude::*;

    fn reading(row: usize, timestamp: String) -> Reading {
        let mut values = [0.0; FEATURE_DIMENSION];
        values[0] = row as f64;
        Reading {
            row,
            device_id: "fridge-1".to_string(),
            timestamp,
            features: FeatureVector { values },
        }
    }

    fn minute_readings(count: usize) -> Vec<Reading> {
        (0..count)
            .map(|i| reading(i, format!("2024-01-01 {:02}:{:02}:00", i / 60, i % 60)))
            .collect()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();

        assert_eq!(parse_timestamp("2024-05-06 07:08:09"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T07:08:09"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T07:08:09Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T09:08:09+02:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-05-06 07:08:09 "), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-06 07:08:09.250").map(|t| t.nanosecond()),
            Some(250_000_000)
        );
        assert_eq!(
            parse_timestamp("2024-05-06"),
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_twenty_three_rows_make_two_windows() {
        let windows = Windower::default().build(minute_readings(23)).unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].sequence_id, 0);
        assert_eq!(windows[1].sequence_id, 1);
        assert_eq!(windows[0].matrix.dim(), (SEQUENCE_LENGTH, FEATURE_DIMENSION));
        assert_eq!(windows[1].matrix[[0, 0]], 10.0);
        assert_eq!(windows[1].matrix[[9, 0]], 19.0);
        assert_eq!(windows[1].timestamp_start, parse_timestamp("2024-01-01 00:10:00").unwrap());
        assert_eq!(windows[1].timestamp_end, parse_timestamp("2024-01-01 00:19:00").unwrap());
    }

    #[test]
    fn test_insufficient_data() {
        match Windower::default().build(minute_readings(5)) {
            Err(WindowError::InsufficientData { rows, required }) => {
                assert_eq!(rows, 5);
                assert_eq!(required, 10);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let mut readings = minute_readings(10);
        readings.reverse();

        let windows = Windower::default().build(readings).unwrap();
        let column: Vec<f64> = windows[0].matrix.column(0).to_vec();
        assert_eq!(column, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let readings: Vec<Reading> = (0..4)
            .map(|i| reading(i, "2024-01-01 00:00:00".to_string()))
            .chain((4..6).map(|i| reading(i, "2023-12-31 23:59:00".to_string())))
            .collect();

        let windows = Windower::new(6).unwrap().build(readings).unwrap();
        let order: Vec<f64> = windows[0].matrix.column(0).to_vec();
        assert_eq!(order, vec![4.0, 5.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        assert!(matches!(
            Windower::new(0),
            Err(WindowError::ZeroSequenceLength)
        ));
        assert_eq!(Windower::new(1).unwrap().sequence_length(), 1);
    }

    #[test]
    fn test_invalid_timestamp() {
        let mut readings = minute_readings(12);
        readings[3].timestamp = "not a time".to_string();

        match Windower::default().build(readings) {
            Err(WindowError::InvalidTimestamp { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "not a time");
            }
            other => panic!("expected InvalidTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_windows() {
        let windows = Windower::default().build(minute_readings(30)).unwrap();
        let batch = stack_windows(&windows);

        assert_eq!(batch.dim(), (3, SEQUENCE_LENGTH, FEATURE_DIMENSION));
        assert_eq!(batch[[2, 4, 0]], 24.0);
        assert_eq!(stack_windows(&[]).dim(), (0, 0, FEATURE_DIMENSION));
    }

    fn shuffled_rows() -> impl Strategy<Value = Vec<usize>> {
        (10usize..200).prop_flat_map(|rows| Just((0..rows).collect::<Vec<_>>()).prop_shuffle())
    }

    proptest! {
        #[test]
        fn prop_windows_cover_floor_division(order in shuffled_rows()) {
            let rows = order.len();
            let timestamps: Vec<String> = minute_readings(rows)
                .into_iter()
                .map(|r| r.timestamp)
                .collect();
            let readings: Vec<Reading> = order
                .iter()
                .map(|&i| reading(i, timestamps[i].clone()))
                .collect();

            let windows = Windower::default().build(readings).unwrap();

            prop_assert_eq!(windows.len(), rows / SEQUENCE_LENGTH);
            for (i, window) in windows.iter().enumerate() {
                prop_assert_eq!(window.sequence_id, i);
                let expected: Vec<f64> = (i * SEQUENCE_LENGTH..(i + 1) * SEQUENCE_LENGTH)
                    .map(|row| row as f64)
                    .collect();
                prop_assert_eq!(window.matrix.column(0).to_vec(), expected);
                prop_assert_eq!(
                    &window.timestamp_start,
                    &parse_timestamp(&timestamps[i * SEQUENCE_LENGTH]).unwrap()
                );
                prop_assert_eq!(
                    &window.timestamp_end,
                    &parse_timestamp(&timestamps[(i + 1) * SEQUENCE_LENGTH - 1]).unwrap()
                );
            }
        }
    }
}
