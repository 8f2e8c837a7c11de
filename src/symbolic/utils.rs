// the collection of numeric utility functions used for sampling and checking solutions

/// `num_values` evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    match num_values {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num_values as f64 - 1.0);
            (0..num_values).map(|i| start + (i as f64 * step)).collect()
        }
    }
}

/// central finite difference of `f` at every point of `x_values`
pub fn numerical_derivative<F>(f: F, x_values: &[f64], h: f64) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    x_values
        .iter()
        .map(|&x| (f(x + h) - f(x - h)) / (2.0 * h))
        .collect()
}

/// maximum absolute difference of two equally long vectors
pub fn max_abs_difference(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linspace() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[4], 1.0);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }

    #[test]
    fn test_numerical_derivative() {
        let xs = linspace(0.0, 1.0, 4);
        let d = numerical_derivative(|x| x * x, &xs, 1e-5);
        let exact: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
        assert!(max_abs_difference(&d, &exact) < 1e-8);
    }
}
