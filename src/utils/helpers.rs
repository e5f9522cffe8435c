use crate::error::{Error, Result};

pub fn arg_min<T: PartialOrd + Copy>(values: &[T]) -> (usize, T) {
    values.iter().enumerate().fold(
        (0, values[0]),
        |(i_min, v_min), (i, &v)| {
            if v < v_min {
                (i, v)
            } else {
                (i_min, v_min)
            }
        },
    )
}

pub fn arg_max<T: PartialOrd + Copy>(values: &[T]) -> (usize, T) {
    values.iter().enumerate().fold(
        (0, values[0]),
        |(i_max, v_max), (i, &v)| {
            if v > v_max {
                (i, v)
            } else {
                (i_max, v_max)
            }
        },
    )
}

/// Number of ladder levels needed to cover `[d_min, d_max]` with radii spaced
/// by a factor of `1 + eps`, including the degenerate zero-radius level.
pub fn ladder_len(eps: f64, d_min: f64, d_max: f64) -> usize {
    1 + ((d_max / d_min).ln() / (1. + eps).ln()).ceil() as usize
}

/// The radius guesses of the ladder: `0, d_min, d_min * (1 + eps), ...`
///
/// Level 0 runs at radius zero so that exact duplicates coalesce into a
/// single cluster.
pub fn ladder_radii(eps: f64, d_min: f64, d_max: f64) -> Vec<f64> {
    let len = ladder_len(eps, d_min, d_max);
    let mut radii = Vec::with_capacity(len);
    radii.push(0.);
    let mut r = d_min;
    while radii.len() < len {
        radii.push(r);
        r *= 1. + eps;
    }
    radii
}

/// Validates the `(eps, d_min, d_max)` ladder parameters shared by every mode.
pub fn check_bounds(eps: f64, d_min: f64, d_max: f64) -> Result<()> {
    if !(eps > 0.) {
        return Err(Error::InvalidArgument("positive eps required".to_string()));
    }
    if !(d_min > 0.) {
        return Err(Error::InvalidArgument("positive d_min required".to_string()));
    }
    if d_max < d_min {
        return Err(Error::InvalidArgument(
            "d_max should be greater than d_min".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_arg_helpers() {
        let values = [3., 1., 4., 1.5, 9.];
        assert_eq!(arg_min(&values), (1, 1.));
        assert_eq!(arg_max(&values), (4, 9.));
    }

    #[test]
    fn test_ladder_radii() {
        // eps = 1 doubles the radius at each level.
        let radii = ladder_radii(1., 1., 4.);
        assert_eq!(radii.len(), 3);
        assert!(approx_eq!(f64, radii[0], 0.));
        assert!(approx_eq!(f64, radii[1], 1.));
        assert!(approx_eq!(f64, radii[2], 2.));

        let radii = ladder_radii(1., 1., 8.);
        assert_eq!(radii.len(), 4);
        assert!(approx_eq!(f64, radii[3], 4.));
    }

    #[test]
    fn test_ladder_is_monotone() {
        let radii = ladder_radii(0.3, 0.5, 100.);
        assert!(radii.windows(2).all(|w| w[0] < w[1]));
        assert!(*radii.last().unwrap() >= 100. / 1.3);
    }

    #[test]
    fn test_check_bounds() {
        assert!(check_bounds(1., 1., 4.).is_ok());
        assert!(check_bounds(0., 1., 4.).is_err());
        assert!(check_bounds(1., 0., 4.).is_err());
        assert!(check_bounds(1., 4., 1.).is_err());
    }
}
