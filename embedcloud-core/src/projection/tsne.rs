//! Exact t-SNE with per-point precision search and an early-exaggeration
//! phase. The gradient is the O(n^2) exact form; rows are computed in
//! parallel with rayon. Dataset sizes here are chart-sized, so Barnes-Hut
//! is not needed.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::distance::pairwise_distances;
use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::projection::ProjectionParams;
use crate::utils::{create_rng, sample_standard_normal};

/// Upper bound on the perplexity; small datasets use their own size.
pub const PERPLEXITY_CAP: f32 = 30.0;

const N_ITERATIONS: usize = 1000;
const EARLY_EXAGGERATION: f32 = 12.0;
const EARLY_EXAGGERATION_ITERATIONS: usize = 250;
const LEARNING_RATE: f32 = 200.0;
const INITIAL_MOMENTUM: f32 = 0.5;
const FINAL_MOMENTUM: f32 = 0.8;
const MIN_PROBABILITY: f32 = 1e-12;
const PRECISION_SEARCH_STEPS: usize = 50;

/// The perplexity actually used for `n` points: `min(30, n)`.
pub fn effective_perplexity(n: usize) -> f32 {
    PERPLEXITY_CAP.min(n as f32)
}

/// Embeds the rows of `x` into 2D. Output rows are aligned with input rows.
pub fn fit_transform(x: ArrayView2<f32>, params: &ProjectionParams) -> EmbedCloudResult<Array2<f32>> {
    let n = x.nrows();
    if n == 0 {
        return Err(EmbedCloudError::EmptyDataset);
    }
    if n == 1 {
        return Ok(Array2::zeros((1, 2)));
    }

    let distances = pairwise_distances(params.metric, x);
    let squared = distances.mapv(|d| d * d);
    let p = joint_probabilities(&squared, effective_perplexity(n));

    let mut rng = create_rng(params.seed);
    let mut y = Array2::from_shape_fn((n, 2), |_| 1e-4 * sample_standard_normal(&mut rng));
    let mut velocity = Array2::<f32>::zeros((n, 2));
    let mut gains = Array2::<f32>::ones((n, 2));

    for iteration in 0..N_ITERATIONS {
        let exaggeration = if iteration < EARLY_EXAGGERATION_ITERATIONS {
            EARLY_EXAGGERATION
        } else {
            1.0
        };
        let momentum = if iteration < EARLY_EXAGGERATION_ITERATIONS {
            INITIAL_MOMENTUM
        } else {
            FINAL_MOMENTUM
        };

        // Student-t kernel over the current embedding.
        let mut num = Array2::<f32>::zeros((n, n));
        let mut q_sum = 0.0f32;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = y[[i, 0]] - y[[j, 0]];
                let dy = y[[i, 1]] - y[[j, 1]];
                let k = 1.0 / (1.0 + dx * dx + dy * dy);
                num[[i, j]] = k;
                num[[j, i]] = k;
                q_sum += 2.0 * k;
            }
        }
        let q_sum = q_sum.max(MIN_PROBABILITY);

        let grad_rows: Vec<[f32; 2]> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut gx = 0.0f32;
                let mut gy = 0.0f32;
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let k = num[[i, j]];
                    let q = (k / q_sum).max(MIN_PROBABILITY);
                    let coeff = (p[[i, j]] * exaggeration - q) * k;
                    gx += coeff * (y[[i, 0]] - y[[j, 0]]);
                    gy += coeff * (y[[i, 1]] - y[[j, 1]]);
                }
                [4.0 * gx, 4.0 * gy]
            })
            .collect();

        for i in 0..n {
            for c in 0..2 {
                let grad = grad_rows[i][c];
                // Adaptive per-coordinate gains, standard t-SNE schedule.
                gains[[i, c]] = if grad.signum() != velocity[[i, c]].signum() {
                    (gains[[i, c]] + 0.2).min(50.0)
                } else {
                    (gains[[i, c]] * 0.8).max(0.01)
                };
                velocity[[i, c]] =
                    momentum * velocity[[i, c]] - LEARNING_RATE * gains[[i, c]] * grad;
                y[[i, c]] += velocity[[i, c]];
            }
        }
    }

    Ok(y)
}

/// Symmetrized, normalized input affinities for the given squared distances.
fn joint_probabilities(squared_distances: &Array2<f32>, perplexity: f32) -> Array2<f32> {
    let n = squared_distances.nrows();
    let target_entropy = perplexity.max(1.0).ln();

    let mut p = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        let row = conditional_probabilities(squared_distances, i, target_entropy);
        for j in 0..n {
            p[[i, j]] = row[j];
        }
    }

    // Symmetrize and normalize to a joint distribution.
    let mut joint = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            joint[[i, j]] = ((p[[i, j]] + p[[j, i]]) / (2.0 * n as f32)).max(MIN_PROBABILITY);
        }
    }
    joint
}

/// Binary search for the precision (beta) whose conditional distribution
/// over neighbors of `i` has entropy `target_entropy`.
fn conditional_probabilities(
    squared_distances: &Array2<f32>,
    i: usize,
    target_entropy: f32,
) -> Vec<f32> {
    let n = squared_distances.nrows();
    let mut beta = 1.0f32;
    let mut beta_min = f32::NEG_INFINITY;
    let mut beta_max = f32::INFINITY;
    let mut row = vec![0.0f32; n];

    for _ in 0..PRECISION_SEARCH_STEPS {
        let mut sum = 0.0f32;
        for j in 0..n {
            row[j] = if j == i {
                0.0
            } else {
                (-beta * squared_distances[[i, j]]).exp()
            };
            sum += row[j];
        }
        let sum = sum.max(MIN_PROBABILITY);

        // Shannon entropy of the candidate distribution.
        let mut entropy = 0.0f32;
        for j in 0..n {
            row[j] /= sum;
            if row[j] > MIN_PROBABILITY {
                entropy -= row[j] * row[j].ln();
            }
        }

        let diff = entropy - target_entropy;
        if diff.abs() < 1e-5 {
            break;
        }
        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
        }
    }
    row
}
