//! Time and datetime vectors for recorded series

use chrono::{DateTime, Duration, Utc};
use oa_common::lin_space;

/// Sample times `0, 1/fs, ..., (n-1)/fs` [s]
pub fn create_time_vector(num_samples: usize, fs: f64) -> Vec<f64> {
    if num_samples == 0 {
        return Vec::new();
    }
    lin_space(0.0, (num_samples - 1) as f64 / fs, num_samples)
}

/// Absolute timestamps of a time vector starting at `start`
pub fn create_datetime_vector(time_vector: &[f64], start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    time_vector
        .iter()
        .map(|&t| start + Duration::nanoseconds((t * 1e9).round() as i64))
        .collect()
}

/// Mask of timestamps in `[start, end)`; bounds default to the first and last stamp
pub fn get_time_index(
    dt: &[DateTime<Utc>],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<bool> {
    let (Some(first), Some(last)) = (dt.first(), dt.last()) else {
        return Vec::new();
    };
    let start = start.unwrap_or(*first);
    let end = end.unwrap_or(*last);
    dt.iter().map(|t| *t >= start && *t < end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_time_vector() {
        let t = create_time_vector(5, 2.0);
        assert_eq!(t.len(), 5);
        assert_relative_eq!(t[4], 2.0, epsilon = 1e-12);
        assert!(create_time_vector(0, 1.0).is_empty());
    }

    #[test]
    fn test_datetime_vector_and_mask() {
        let start = Utc.with_ymd_and_hms(2021, 5, 16, 12, 0, 0).unwrap();
        let dt = create_datetime_vector(&create_time_vector(4, 1.0), start);
        assert_eq!(dt[3], start + Duration::seconds(3));

        // The last stamp is excluded by the half-open default
        assert_eq!(get_time_index(&dt, None, None), vec![true, true, true, false]);
        let mask = get_time_index(&dt, Some(start + Duration::seconds(1)), None);
        assert_eq!(mask, vec![false, true, true, false]);
        assert!(get_time_index(&[], None, None).is_empty());
    }
}
