/// sum_laps returns the committed distance of a sequence of lap counts.
pub fn sum_laps<I: IntoIterator<Item = u32>>(laps: I) -> u32 {
    laps.into_iter().fold(0, |acc, l| acc.saturating_add(l))
}

/// clamp_pct limits a percentage value (e.g. tire wear) to the range [0, 100]. NaN is mapped to 0.
pub fn clamp_pct(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.max(0.0).min(100.0)
}

/// format_racetime formats a race time in seconds as h:mm:ss.sss (or m:ss.sss below one hour).
pub fn format_racetime(t: f64) -> String {
    if !t.is_finite() || t < 0.0 {
        return String::from("-");
    }

    let millis_tot = (t * 1000.0).round() as u64;
    let hours = millis_tot / 3_600_000;
    let mins = (millis_tot / 60_000) % 60;
    let secs = (millis_tot / 1000) % 60;
    let millis = millis_tot % 1000;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
    } else {
        format!("{}:{:02}.{:03}", mins, secs, millis)
    }
}

/// format_gap formats a gap to the leader in seconds, e.g. +1.500s.
pub fn format_gap(gap: f64) -> String {
    if !gap.is_finite() {
        return String::from("-");
    }
    format!("+{:.3}s", gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_laps_folds_all_entries() {
        assert_eq!(sum_laps(vec![20, 20, 10]), 50);
        assert_eq!(sum_laps(Vec::new()), 0);
        assert_eq!(sum_laps(vec![u32::MAX, 1]), u32::MAX);
    }

    #[test]
    fn clamp_pct_limits_range() {
        assert_eq!(clamp_pct(-3.0), 0.0);
        assert_eq!(clamp_pct(42.5), 42.5);
        assert_eq!(clamp_pct(118.0), 100.0);
        assert_eq!(clamp_pct(f64::NAN), 0.0);
    }

    #[test]
    fn racetime_formatting() {
        assert_eq!(format_racetime(91.5), "1:31.500");
        assert_eq!(format_racetime(5400.25), "1:30:00.250");
        assert_eq!(format_racetime(-1.0), "-");
    }

    #[test]
    fn gap_formatting() {
        assert_eq!(format_gap(1.5), "+1.500s");
        assert_eq!(format_gap(f64::INFINITY), "-");
    }
}
