pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Moving average over every full `window` of `data`
pub fn dampen(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || data.len() < window {
        return Vec::new();
    }
    let mut total: f64 = data[..window].iter().sum();
    let mut out = Vec::with_capacity(data.len() - window + 1);
    out.push(total / window as f64);
    for i in window..data.len() {
        total += data[i] - data[i - window];
        out.push(total / window as f64);
    }
    out
}

/// Compact age such as `42.0s`, `3.5h` or `1.2w`
pub fn format_when(age_secs: f64) -> String {
    let mut delta = age_secs;
    for (limit, unit, next) in [
        (60.0, "s", 60.0),
        (60.0, "m", 60.0),
        (24.0, "h", 24.0),
        (7.0, "d", 7.0),
        (52.0, "w", 52.0),
    ] {
        if delta < limit {
            return format!("{delta:.1}{unit}");
        }
        delta /= next;
    }
    format!("{delta:.1}y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dampen() {
        assert_eq!(dampen(&[1., 2., 3., 4.], 2), vec![1.5, 2.5, 3.5]);
        assert_eq!(dampen(&[1., 2.], 3), Vec::<f64>::new());
        assert_eq!(dampen(&[5.], 0), Vec::<f64>::new());
    }

    #[test]
    fn test_format_when() {
        assert_eq!(format_when(42.0), "42.0s");
        assert_eq!(format_when(90.0), "1.5m");
        assert_eq!(format_when(3.5 * 3600.0), "3.5h");
        assert_eq!(format_when(2.0 * 86400.0), "2.0d");
        assert_eq!(format_when(14.0 * 86400.0), "2.0w");
        assert_eq!(format_when(2.0 * 364.0 * 86400.0), "2.0y");
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_negative_values() {
        assert_eq!(mean(&[-5.0, -10.0, -15.0]), Some(-10.0));
    }

    #[test]
    fn test_mean_mixed_values() {
        assert_eq!(mean(&[-10.0, 0.0, 10.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(
            std_dev(&[100., 120., 90., 102., 94.]),
            Some(10.322790320451151)
        );
        assert_eq!(std_dev(&[15., 7., 55.]), Some(20.997354330698162));
    }

    #[test]
    fn test_std_dev_single_value() {
        assert_eq!(std_dev(&[42.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev_empty_slice() {
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_std_dev_identical_values() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev_negative_values() {
        let result = std_dev(&[-10.0, -5.0, -15.0]);
        assert!(result.is_some());
        assert!((result.unwrap() - 4.08248290463863).abs() < 1e-10);
    }
}
