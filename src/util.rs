pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `x / y`, or `x` unchanged when `y` is zero
pub fn guarded_division(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        x
    } else {
        x / y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_guarded_division() {
        assert_eq!(guarded_division(3.0, 2.0), 1.5);
        assert_eq!(guarded_division(0.0, 4.0), 0.0);
    }

    #[test]
    fn test_guarded_division_by_zero_returns_numerator() {
        assert_eq!(guarded_division(7.5, 0.0), 7.5);
        assert_eq!(guarded_division(0.0, 0.0), 0.0);
    }
}
