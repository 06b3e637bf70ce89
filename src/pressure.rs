use crate::grid::{Grid, GridView};

/// Outcome of one Gauss-Seidel pressure solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionReport {
    /// Sweeps performed, including the one that converged.
    pub iterations: usize,
    /// Largest per-cell pressure change during the final sweep.
    pub max_delta: f64,
    pub converged: bool,
}

/// Negative divergence of the face velocities, one value per cell.
pub fn build_rhs(
    rhs: &mut [f64],
    velocity_x: &GridView<'_>,
    velocity_y: &GridView<'_>,
    cell_size: f64,
) {
    let width = velocity_y.width();
    let height = velocity_x.height();
    assert_eq!(rhs.len(), width * height, "rhs size mismatch");
    let scale = 1.0 / cell_size;
    for y in 0..height {
        for x in 0..width {
            rhs[y * width + x] = -scale * face_flux(velocity_x, velocity_y, x, y);
        }
    }
}

pub fn max_divergence(
    velocity_x: &GridView<'_>,
    velocity_y: &GridView<'_>,
    cell_size: f64,
) -> f64 {
    let width = velocity_y.width();
    let height = velocity_x.height();
    let mut max_div = 0.0_f64;
    for y in 0..height {
        for x in 0..width {
            let div = face_flux(velocity_x, velocity_y, x, y) / cell_size;
            max_div = max_div.max(div.abs());
        }
    }
    max_div
}

fn face_flux(velocity_x: &GridView<'_>, velocity_y: &GridView<'_>, x: usize, y: usize) -> f64 {
    let du = velocity_x.get(x + 1, y) - velocity_x.get(x, y);
    let dv = velocity_y.get(x, y + 1) - velocity_y.get(x, y);
    du + dv
}

/// Gauss-Seidel relaxation of `A p = rhs` where `A` is the five-point
/// Laplacian scaled by `scale`. Cells outside the domain are solid: their
/// terms drop out of both the diagonal and the neighbor sum.
///
/// Stops once a full sweep changes no cell by `tol` or more, or after `limit`
/// sweeps; either way `pressure` holds the latest estimate.
pub fn solve_pressure(
    pressure: &mut [f64],
    rhs: &[f64],
    width: usize,
    height: usize,
    scale: f64,
    limit: usize,
    tol: f64,
) -> ProjectionReport {
    assert_eq!(pressure.len(), width * height, "pressure size mismatch");
    assert_eq!(rhs.len(), width * height, "rhs size mismatch");
    let mut max_delta = 0.0;
    for iter in 0..limit {
        max_delta = 0.0_f64;
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let mut diag = 0.0;
                let mut off_diag = 0.0;
                if x > 0 {
                    diag += scale;
                    off_diag -= scale * pressure[idx - 1];
                }
                if y > 0 {
                    diag += scale;
                    off_diag -= scale * pressure[idx - width];
                }
                if x + 1 < width {
                    diag += scale;
                    off_diag -= scale * pressure[idx + 1];
                }
                if y + 1 < height {
                    diag += scale;
                    off_diag -= scale * pressure[idx + width];
                }
                // A lone cell has no faces to push through.
                let new_p = if diag == 0.0 {
                    0.0
                } else {
                    (rhs[idx] - off_diag) / diag
                };
                max_delta = max_delta.max((pressure[idx] - new_p).abs());
                pressure[idx] = new_p;
            }
        }
        if max_delta < tol {
            return ProjectionReport {
                iterations: iter + 1,
                max_delta,
                converged: true,
            };
        }
    }
    ProjectionReport {
        iterations: limit,
        max_delta,
        converged: false,
    }
}

/// Subtracts the pressure gradient from every face, then closes the domain:
/// faces on the outer boundary carry no flow.
pub fn apply_pressure(
    velocity_x: &mut Grid,
    velocity_y: &mut Grid,
    pressure: &[f64],
    scale: f64,
) {
    let width = velocity_y.width();
    let height = velocity_x.height();
    assert_eq!(pressure.len(), width * height, "pressure size mismatch");
    for y in 0..height {
        for x in 0..width {
            let p = scale * pressure[y * width + x];
            velocity_x.set(x, y, velocity_x.get(x, y) - p);
            velocity_x.set(x + 1, y, velocity_x.get(x + 1, y) + p);
            velocity_y.set(x, y, velocity_y.get(x, y) - p);
            velocity_y.set(x, y + 1, velocity_y.get(x, y + 1) + p);
        }
    }
    for y in 0..height {
        velocity_x.set(0, y, 0.0);
        velocity_x.set(width, y, 0.0);
    }
    for x in 0..width {
        velocity_y.set(x, 0, 0.0);
        velocity_y.set(x, height, 0.0);
    }
}
