//! Principal component analysis via power iteration with deflation.
//!
//! The embedding dimensionalities seen here (a few hundred to a few
//! thousand) keep the covariance matrix small enough that power iteration
//! is fast and avoids a LAPACK dependency.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::utils::create_rng;

const MAX_POWER_ITERATIONS: usize = 200;
const CONVERGENCE_TOL: f32 = 1e-7;

/// Projects the rows of `x` onto the `n_components` leading principal
/// components. Output is `n x n_components`, rows aligned with `x`.
pub fn fit_transform(
    x: ArrayView2<f32>,
    n_components: usize,
    seed: Option<u64>,
) -> EmbedCloudResult<Array2<f32>> {
    let n = x.nrows();
    let d = x.ncols();
    if n == 0 {
        return Err(EmbedCloudError::EmptyDataset);
    }
    if n_components == 0 || n_components > d {
        return Err(EmbedCloudError::Configuration(format!(
            "n_components must be in 1..={}, got {}",
            d, n_components
        )));
    }

    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| EmbedCloudError::Internal("mean of empty axis".to_string()))?;
    let centered = &x - &mean;

    // Covariance of the centered data. With a single sample this is the
    // zero matrix and every projection collapses to the origin.
    let denom = (n.saturating_sub(1)).max(1) as f32;
    let mut cov = centered.t().dot(&centered) / denom;

    let mut rng = create_rng(seed);
    let mut components = Array2::<f32>::zeros((n_components, d));
    for c in 0..n_components {
        let v = dominant_eigenvector(&cov, &mut rng);
        let lambda = v.dot(&cov.dot(&v));
        // Deflate so the next iteration converges to the next component.
        let outer = outer_product(&v, &v);
        cov = cov - outer.mapv(|w| w * lambda);
        components.row_mut(c).assign(&v);
    }

    Ok(centered.dot(&components.t()))
}

fn dominant_eigenvector(m: &Array2<f32>, rng: &mut impl Rng) -> Array1<f32> {
    let d = m.nrows();
    let mut v = Array1::from_shape_fn(d, |_| rng.gen_range(-1.0f32..1.0));
    normalize(&mut v);

    for _ in 0..MAX_POWER_ITERATIONS {
        let mut next = m.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm <= f32::EPSILON {
            // Zero (or fully deflated) matrix: any unit vector is valid.
            return v;
        }
        next /= norm;
        let drift = 1.0 - next.dot(&v).abs();
        v = next;
        if drift < CONVERGENCE_TOL {
            break;
        }
    }
    v
}

fn outer_product(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    let col = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    col.dot(&row)
}

fn normalize(v: &mut Array1<f32>) {
    let norm = v.dot(v).sqrt();
    if norm > f32::EPSILON {
        *v /= norm;
    }
}
