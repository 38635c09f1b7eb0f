//! Derivative-free minimisation for likelihood fitting.

use crate::error::FinError;
use crate::stats::from_f64;
use crate::FinResult;

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Clone)]
pub(crate) struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: u32,
}

fn evaluate<F: Fn(&[f64]) -> f64>(f: &F, x: &[f64]) -> f64 {
    let v = f(x);
    if v.is_nan() {
        f64::INFINITY
    } else {
        v
    }
}

fn towards(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect()
}

/// Nelder-Mead simplex search. Stops once the spread of objective values
/// across the simplex falls below `tol * (|best| + 1)`.
/// Non-finite objective values are treated as +∞, so constraints can be
/// imposed by returning `f64::INFINITY`.
pub(crate) fn nelder_mead<F: Fn(&[f64]) -> f64>(
    function: &str,
    f: F,
    start: &[f64],
    step: f64,
    max_iter: u32,
    tol: f64,
) -> FinResult<Minimum> {
    let n = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.to_vec(), evaluate(&f, start)));
    for i in 0..n {
        let mut x = start.to_vec();
        x[i] += if x[i].abs() > 1e-8 { step * x[i].abs().max(1.0) } else { step };
        let v = evaluate(&f, &x);
        simplex.push((x, v));
    }

    let mut spread = f64::INFINITY;
    for iteration in 0..max_iter {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        spread = (worst - best).abs();
        if best.is_finite() && spread <= tol * (best.abs() + 1.0) {
            let (point, value) = simplex.swap_remove(0);
            return Ok(Minimum {
                point,
                value,
                iterations: iteration,
            });
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
            .collect();
        let worst_point = simplex[n].0.clone();

        let reflected = towards(&centroid, &worst_point, -REFLECT);
        let fr = evaluate(&f, &reflected);

        if fr < simplex[0].1 {
            let expanded = towards(&centroid, &worst_point, -EXPAND);
            let fe = evaluate(&f, &expanded);
            simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
        } else if fr < simplex[n - 1].1 {
            simplex[n] = (reflected, fr);
        } else {
            let contracted = if fr < worst {
                towards(&centroid, &reflected, CONTRACT)
            } else {
                towards(&centroid, &worst_point, CONTRACT)
            };
            let fc = evaluate(&f, &contracted);
            if fc < worst.min(fr) {
                simplex[n] = (contracted, fc);
            } else {
                let anchor = simplex[0].0.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let shrunk = towards(&anchor, &vertex.0, SHRINK);
                    let v = evaluate(&f, &shrunk);
                    *vertex = (shrunk, v);
                }
            }
        }
    }

    Err(FinError::ConvergenceFailure {
        function: function.to_string(),
        iterations: max_iter,
        last_delta: from_f64(spread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadratic_bowl() {
        let m = nelder_mead(
            "bowl",
            |x| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2),
            &[0.0, 0.0],
            0.5,
            1000,
            1e-12,
        )
        .unwrap();
        assert_abs_diff_eq!(m.point[0], 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(m.point[1], -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rosenbrock() {
        let rosen = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let m = nelder_mead("rosenbrock", rosen, &[-1.2, 1.0], 0.5, 5000, 1e-14).unwrap();
        assert_abs_diff_eq!(m.point[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(m.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_iteration_cap_reports_failure() {
        let err = nelder_mead("slow", |x| x[0] * x[0], &[100.0], 1.0, 2, 1e-30).unwrap_err();
        match err {
            FinError::ConvergenceFailure { function, iterations, .. } => {
                assert_eq!(function, "slow");
                assert_eq!(iterations, 2);
            }
            e => panic!("Expected ConvergenceFailure, got {e:?}"),
        }
    }
}
