//! UMAP: fuzzy k-NN graph construction followed by a per-edge SGD layout
//! with negative sampling. Brute-force neighbor search is used since the
//! datasets are chart-sized.

use ndarray::{Array2, ArrayView2};
use rand::Rng;
use std::collections::HashMap;

use crate::distance::pairwise_distances;
use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::projection::{pca, ProjectionParams};
use crate::utils::create_rng;

/// Neighborhood size of the fuzzy graph.
pub const N_NEIGHBORS: usize = 15;

const N_EPOCHS: usize = 500;
const NEGATIVE_SAMPLE_RATE: usize = 5;
const INITIAL_ALPHA: f32 = 1.0;
const MOVE_CLIP: f32 = 4.0;
const SIGMA_SEARCH_STEPS: usize = 64;
const INIT_SCALE: f32 = 10.0;

struct Edge {
    i: usize,
    j: usize,
    weight: f32,
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

    let edges = fuzzy_graph(x, params);
    let (a, b) = find_ab_params(1.0, params.umap_min_dist);

    let mut rng = create_rng(params.seed);
    let mut y = initial_embedding(x, params.seed, &mut rng);

    // Per-edge sampling schedule: stronger edges are sampled more often.
    let max_weight = edges.iter().map(|e| e.weight).fold(f32::MIN, f32::max).max(1e-8);
    let epochs_per_sample: Vec<f32> = edges.iter().map(|e| max_weight / e.weight).collect();
    let mut epoch_of_next_sample = epochs_per_sample.clone();

    for epoch in 0..N_EPOCHS {
        let alpha = INITIAL_ALPHA * (1.0 - epoch as f32 / N_EPOCHS as f32);
        for (e, edge) in edges.iter().enumerate() {
            if epoch_of_next_sample[e] > epoch as f32 {
                continue;
            }
            epoch_of_next_sample[e] += epochs_per_sample[e];

            apply_attraction(&mut y, edge.i, edge.j, a, b, alpha);
            for _ in 0..NEGATIVE_SAMPLE_RATE {
                let k = rng.gen_range(0..n);
                if k != edge.i {
                    apply_repulsion(&mut y, edge.i, k, a, b, alpha);
                }
            }
        }
    }

    Ok(y)
}

/// Builds the symmetrized fuzzy simplicial set as a flat edge list.
fn fuzzy_graph(x: ArrayView2<f32>, params: &ProjectionParams) -> Vec<Edge> {
    let n = x.nrows();
    let k = N_NEIGHBORS.min(n - 1);
    let distances = pairwise_distances(params.metric, x);
    let target = (k as f32).max(2.0).log2();

    let mut directed: HashMap<(usize, usize), f32> = HashMap::new();
    for i in 0..n {
        let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        order.sort_by(|&p, &q| {
            distances[[i, p]].partial_cmp(&distances[[i, q]]).unwrap_or(std::cmp::Ordering::Equal)
        });
        let neighbors = &order[..k];
        let dists: Vec<f32> = neighbors.iter().map(|&j| distances[[i, j]]).collect();

        let rho = dists.iter().copied().filter(|&d| d > 0.0).fold(f32::INFINITY, f32::min);
        let rho = if rho.is_finite() { rho } else { 0.0 };
        let sigma = smooth_knn_sigma(&dists, rho, target);

        for (&j, &d) in neighbors.iter().zip(dists.iter()) {
            let w = (-((d - rho).max(0.0)) / sigma).exp();
            directed.insert((i, j), w);
        }
    }

    // Fuzzy set union: w = w_ij + w_ji - w_ij * w_ji.
    let mut edges = Vec::new();
    for (&(i, j), &w_ij) in &directed {
        if i > j {
            continue;
        }
        let w_ji = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let weight = w_ij + w_ji - w_ij * w_ji;
        if weight > 0.0 {
            edges.push(Edge { i, j, weight });
        }
    }
    // One-sided edges where only (j, i) with j > i exists.
    for (&(j, i), &w_ji) in &directed {
        if j > i && !directed.contains_key(&(i, j)) {
            edges.push(Edge { i, j, weight: w_ji });
        }
    }
    edges.sort_by(|a, b| (a.i, a.j).cmp(&(b.i, b.j)));
    edges
}

/// Binary search for the kernel width whose smoothed neighbor weights sum to
/// `target` (log2 of the neighborhood size).
fn smooth_knn_sigma(dists: &[f32], rho: f32, target: f32) -> f32 {
    let weight_sum = |sigma: f32| -> f32 {
        dists.iter().map(|&d| (-((d - rho).max(0.0)) / sigma).exp()).sum()
    };

    let mean_dist: f32 = dists.iter().sum::<f32>() / dists.len().max(1) as f32;
    let floor = (1e-3 * mean_dist).max(1e-8);

    let mut lo = 0.0f32;
    let mut hi = mean_dist.max(1.0);
    let mut expansions = 0;
    while weight_sum(hi) < target && expansions < 64 {
        hi *= 2.0;
        expansions += 1;
    }

    for _ in 0..SIGMA_SEARCH_STEPS {
        let mid = (lo + hi) / 2.0;
        if weight_sum(mid) > target {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi.max(floor)
}

/// Fits the `(a, b)` parameters of the low-dimensional similarity curve
/// `1 / (1 + a * d^(2b))` to the desired min-dist/spread falloff.
pub(crate) fn find_ab_params(spread: f32, min_dist: f32) -> (f32, f32) {
    let xs: Vec<f32> = (0..300).map(|i| i as f32 * (3.0 * spread) / 299.0).collect();
    let target: Vec<f32> = xs
        .iter()
        .map(|&x| if x <= min_dist { 1.0 } else { (-(x - min_dist) / spread).exp() })
        .collect();

    let sse = |a: f32, b: f32| -> f32 {
        xs.iter()
            .zip(target.iter())
            .map(|(&x, &t)| {
                let v = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (v - t) * (v - t)
            })
            .sum()
    };

    // Coarse grid, then two refinement passes around the best cell.
    let mut best = (1.0f32, 1.0f32);
    let mut best_err = f32::INFINITY;
    for ai in 0..60 {
        let a = 0.05 * 1.095f32.powi(ai); // log-spaced 0.05..~11
        for bi in 0..45 {
            let b = 0.3 + 0.05 * bi as f32;
            let err = sse(a, b);
            if err < best_err {
                best_err = err;
                best = (a, b);
            }
        }
    }
    for _ in 0..2 {
        let (ca, cb) = best;
        for ai in -10..=10 {
            let a = (ca * (1.0 + 0.02 * ai as f32)).max(1e-3);
            for bi in -10..=10 {
                let b = (cb + 0.005 * bi as f32).max(0.05);
                let err = sse(a, b);
                if err < best_err {
                    best_err = err;
                    best = (a, b);
                }
            }
        }
    }
    best
}

fn initial_embedding(x: ArrayView2<f32>, seed: Option<u64>, rng: &mut impl Rng) -> Array2<f32> {
    let n = x.nrows();
    let init = if x.ncols() >= 2 {
        pca::fit_transform(x, 2, seed).ok()
    } else {
        None
    };
    match init {
        Some(p) => {
            let max_abs = p.iter().fold(0.0f32, |m, &v| m.max(v.abs())).max(1e-8);
            p.mapv(|v| v / max_abs * INIT_SCALE)
        }
        None => Array2::from_shape_fn((n, 2), |_| rng.gen_range(-INIT_SCALE..INIT_SCALE)),
    }
}

fn apply_attraction(y: &mut Array2<f32>, i: usize, j: usize, a: f32, b: f32, alpha: f32) {
    let dx = y[[i, 0]] - y[[j, 0]];
    let dy = y[[i, 1]] - y[[j, 1]];
    let d2 = dx * dx + dy * dy;
    if d2 <= 0.0 {
        return;
    }
    let coeff = (-2.0 * a * b * d2.powf(b - 1.0)) / (1.0 + a * d2.powf(b));
    let gx = (coeff * dx).clamp(-MOVE_CLIP, MOVE_CLIP) * alpha;
    let gy = (coeff * dy).clamp(-MOVE_CLIP, MOVE_CLIP) * alpha;
    y[[i, 0]] += gx;
    y[[i, 1]] += gy;
    y[[j, 0]] -= gx;
    y[[j, 1]] -= gy;
}

fn apply_repulsion(y: &mut Array2<f32>, i: usize, k: usize, a: f32, b: f32, alpha: f32) {
    let dx = y[[i, 0]] - y[[k, 0]];
    let dy = y[[i, 1]] - y[[k, 1]];
    let d2 = dx * dx + dy * dy;
    let coeff = (2.0 * b) / ((0.001 + d2) * (1.0 + a * d2.powf(b)));
    let gx = (coeff * dx).clamp(-MOVE_CLIP, MOVE_CLIP) * alpha;
    let gy = (coeff * dy).clamp(-MOVE_CLIP, MOVE_CLIP) * alpha;
    y[[i, 0]] += gx;
    y[[i, 1]] += gy;
}
