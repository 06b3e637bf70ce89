use crate::grid::{Grid, GridView};
use crate::mac::MacGrid;
use crate::params::{Inflow, SolverParams};
use crate::pressure::{
    apply_pressure, build_rhs, max_divergence, solve_pressure, ProjectionReport,
};

/// Incompressible 2D flow on a MAC grid.
///
/// Owns the density and face-velocity grids plus the pressure scratch space.
/// Callers inject sources with [`Solver::add_inflow`], advance with
/// [`Solver::update`] and read intensities with [`Solver::sample`] between
/// steps.
#[derive(Clone, Debug)]
pub struct Solver {
    mac: MacGrid,
    params: SolverParams,
    density: Grid,
    velocity_x: Grid,
    velocity_y: Grid,
    rhs: Vec<f64>,
    pressure: Vec<f64>,
    last_projection: Option<ProjectionReport>,
}

impl Solver {
    pub fn new(width: usize, height: usize, density: f64) -> Self {
        Self::with_params(width, height, SolverParams::with_density(density))
    }

    pub fn with_params(width: usize, height: usize, params: SolverParams) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        params
            .validate()
            .unwrap_or_else(|err| panic!("invalid solver params: {err}"));
        let mac = MacGrid::unit(width, height);
        Self {
            mac,
            params,
            density: mac.scalar_grid(),
            velocity_x: mac.u_grid(),
            velocity_y: mac.v_grid(),
            rhs: vec![0.0; mac.cell_count()],
            pressure: vec![0.0; mac.cell_count()],
            last_projection: None,
        }
    }

    pub fn width(&self) -> usize {
        self.mac.width()
    }

    pub fn height(&self) -> usize {
        self.mac.height()
    }

    pub fn cell_size(&self) -> f64 {
        self.mac.cell_size()
    }

    pub fn params(&self) -> SolverParams {
        self.params
    }

    pub fn density(&self) -> GridView<'_> {
        self.density.view()
    }

    pub fn velocity_x(&self) -> GridView<'_> {
        self.velocity_x.view()
    }

    pub fn velocity_y(&self) -> GridView<'_> {
        self.velocity_y.view()
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn last_projection(&self) -> Option<ProjectionReport> {
        self.last_projection
    }

    /// Advances the simulation by `dt`: make the velocity divergence free,
    /// then carry density and velocity along the projected flow.
    pub fn update(&mut self, dt: f64) {
        debug_assert!(dt > 0.0, "timestep must be > 0");
        log::trace!("update dt={dt}");
        self.project(dt);
        self.advect(dt);
    }

    /// Pressure projection alone; returns the solve report.
    pub fn project(&mut self, dt: f64) -> ProjectionReport {
        let (width, height) = (self.width(), self.height());
        let h = self.cell_size();
        let rho = self.params.density;
        build_rhs(
            &mut self.rhs,
            &self.velocity_x.view(),
            &self.velocity_y.view(),
            h,
        );
        if !self.params.warm_start {
            self.pressure.fill(0.0);
        }
        let report = solve_pressure(
            &mut self.pressure,
            &self.rhs,
            width,
            height,
            dt / (rho * h * h),
            self.params.pressure_iters,
            self.params.pressure_tol,
        );
        if report.converged {
            log::debug!(
                "pressure solve converged after {} iterations, max change {:e}",
                report.iterations,
                report.max_delta
            );
        } else {
            log::warn!(
                "pressure solve exceeded budget of {} iterations, max change {:e}",
                report.iterations,
                report.max_delta
            );
        }
        apply_pressure(
            &mut self.velocity_x,
            &mut self.velocity_y,
            &self.pressure,
            dt / (rho * h),
        );
        self.last_projection = Some(report);
        report
    }

    fn advect(&mut self, dt: f64) {
        let h = self.cell_size();
        self.density.advect(dt, &self.velocity_x, &self.velocity_y);
        let (u, u_next) = self.velocity_x.split_mut();
        let (v, v_next) = self.velocity_y.split_mut();
        u.advect_into(u_next, dt, &u, &v, h);
        v.advect_into(v_next, dt, &u, &v, h);
        self.density.flip();
        self.velocity_x.flip();
        self.velocity_y.flip();
    }

    /// Injects density `d` and velocity `(u, v)` over `[x, x+w) × [y, y+h)`,
    /// in physical units.
    #[allow(clippy::too_many_arguments)]
    pub fn add_inflow(&mut self, x: f64, y: f64, w: f64, h: f64, d: f64, u: f64, v: f64) {
        self.density.add_inflow(x, y, x + w, y + h, d);
        self.velocity_x.add_inflow(x, y, x + w, y + h, u);
        self.velocity_y.add_inflow(x, y, x + w, y + h, v);
    }

    pub fn apply_inflow(&mut self, inflow: &Inflow) {
        self.add_inflow(
            inflow.x,
            inflow.y,
            inflow.width,
            inflow.height,
            inflow.density,
            inflow.u,
            inflow.v,
        );
    }

    /// Largest timestep that keeps the fluid within `cfl` cells per step,
    /// capped at `max_dt`. Advisory: `update` does not clamp. A field that has
    /// blown up (infinite or NaN velocity) gets 0.
    pub fn max_timestep(&self) -> f64 {
        let u = self.velocity_x.view();
        let v = self.velocity_y.view();
        let mut max_velocity = 0.0_f64;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let (cx, cy) = self.mac.cell_center(x, y);
                let speed = u.sample_at(cx, cy).hypot(v.sample_at(cx, cy));
                // `f64::max` drops NaN.
                max_velocity = max_velocity.max(if speed.is_nan() {
                    f64::INFINITY
                } else {
                    speed
                });
            }
        }
        if max_velocity == 0.0 {
            return self.params.max_dt;
        }
        let limit = self.params.cfl * self.cell_size() / max_velocity;
        limit.min(self.params.max_dt)
    }

    /// Display intensity of one density cell: 0 for empty, 128 for a density
    /// of one, saturating beyond.
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        let d = self.density.get(x, y);
        let shade = ((1.0 - d) * 128.0).trunc();
        (128.0 - shade).clamp(0.0, 255.0) as u8
    }

    pub fn total_density(&self) -> f64 {
        self.density.sum()
    }

    pub fn max_divergence(&self) -> f64 {
        max_divergence(
            &self.velocity_x.view(),
            &self.velocity_y.view(),
            self.cell_size(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    /// Physical rectangle covering exactly cell `(x, y)` of the density grid.
    fn cell_rect(solver: &Solver, x: usize, y: usize) -> (f64, f64, f64, f64) {
        let h = solver.cell_size();
        ((x as f64 + 0.6) * h, (y as f64 + 0.6) * h, h, h)
    }

    #[test]
    fn new_lays_out_staggered_grids() {
        let solver = Solver::new(6, 4, 0.5);
        assert_eq!(solver.cell_size(), 0.25);
        assert_eq!(solver.velocity_x().width(), 7);
        assert_eq!(solver.velocity_x().height(), 4);
        assert_eq!(solver.velocity_y().width(), 6);
        assert_eq!(solver.velocity_y().height(), 5);
        assert_eq!(solver.pressure().len(), 24);
        assert!(solver.last_projection().is_none());
    }

    #[test]
    #[should_panic(expected = "invalid solver params")]
    fn new_rejects_non_positive_density() {
        Solver::new(4, 4, 0.0);
    }

    #[test]
    fn add_inflow_targets_single_cell() {
        let mut solver = Solver::new(10, 10, 1.0);
        let (x, y, w, h) = cell_rect(&solver, 5, 5);
        solver.add_inflow(x, y, w, h, 1.0, 2.0, -3.0);
        assert_eq!(solver.density().get(5, 5), 1.0);
        assert_close(solver.total_density(), 1.0, 1e-12);
        assert_eq!(solver.velocity_x().get(5, 5), 2.0);
        assert_eq!(solver.velocity_y().get(5, 5), -3.0);
    }

    #[test]
    fn apply_inflow_matches_add_inflow() {
        let inflow = Inflow {
            x: 0.45,
            y: 0.2,
            width: 0.1,
            height: 0.01,
            density: 1.0,
            u: 0.0,
            v: 3.0,
        };
        let mut a = Solver::new(32, 32, 0.1);
        let mut b = a.clone();
        a.apply_inflow(&inflow);
        b.add_inflow(0.45, 0.2, 0.1, 0.01, 1.0, 0.0, 3.0);
        assert_eq!(a.density().as_slice(), b.density().as_slice());
        assert_eq!(a.velocity_y().as_slice(), b.velocity_y().as_slice());
        assert!(a.total_density() > 0.0);
    }

    #[test]
    fn project_leaves_boundary_faces_closed() {
        let mut solver = Solver::new(8, 8, 1.0);
        solver.add_inflow(0.0, 0.0, 1.0, 1.0, 0.5, 1.0, 1.0);
        solver.project(0.01);
        for y in 0..8 {
            assert_eq!(solver.velocity_x().get(0, y), 0.0);
            assert_eq!(solver.velocity_x().get(8, y), 0.0);
        }
        for x in 0..8 {
            assert_eq!(solver.velocity_y().get(x, 0), 0.0);
            assert_eq!(solver.velocity_y().get(x, 8), 0.0);
        }
    }

    #[test]
    fn project_reduces_divergence() {
        let mut solver = Solver::new(8, 8, 1.0);
        let (x, y, w, h) = cell_rect(&solver, 3, 4);
        solver.add_inflow(x, y, w, h, 0.0, 1.0, -0.5);
        let before = solver.max_divergence();
        let report = solver.project(0.01);
        assert!(report.converged);
        assert!(solver.max_divergence() < before * 0.01);
    }

    fn seeded_pair(warm_start: bool) -> (Solver, Solver) {
        let params = SolverParams {
            warm_start,
            pressure_iters: 1,
            ..SolverParams::default()
        };
        let mut solver = Solver::with_params(8, 8, params);
        let (x, y, w, h) = cell_rect(&solver, 3, 3);
        solver.add_inflow(x, y, w, h, 1.0, 1.0, 0.0);
        let reference = solver.clone();
        solver.pressure.fill(7.0);
        (solver, reference)
    }

    #[test]
    fn cold_start_discards_previous_pressure() {
        let (mut seeded, mut reference) = seeded_pair(false);
        seeded.project(0.01);
        reference.project(0.01);
        assert_eq!(seeded.pressure(), reference.pressure());
    }

    #[test]
    fn warm_start_seeds_solve_with_previous_pressure() {
        let (mut seeded, mut reference) = seeded_pair(true);
        seeded.project(0.01);
        reference.project(0.01);
        assert_ne!(seeded.pressure(), reference.pressure());
    }

    #[test]
    fn zero_velocity_keeps_density_in_place() {
        let mut solver = Solver::new(10, 10, 1.0);
        let (x, y, w, h) = cell_rect(&solver, 5, 5);
        solver.add_inflow(x, y, w, h, 1.0, 0.0, 0.0);
        for _ in 0..5 {
            solver.update(0.01);
        }
        assert_eq!(solver.density().get(5, 5), 1.0);
        assert_eq!(solver.density().get(4, 5), 0.0);
        assert_eq!(solver.last_projection().map(|r| r.iterations), Some(1));
    }

    #[test]
    fn max_timestep_without_flow_is_ceiling() {
        let solver = Solver::new(16, 16, 1.0);
        assert_eq!(solver.max_timestep(), 1.0);
    }

    #[test]
    fn max_timestep_bounds_travel_to_two_cells() {
        let mut solver = Solver::new(10, 10, 1.0);
        solver.add_inflow(-1.0, -1.0, 3.0, 3.0, 0.0, 4.0, 0.0);
        let dt = solver.max_timestep();
        assert_close(dt, 2.0 * 0.1 / 4.0, 1e-12);
    }

    #[test]
    fn max_timestep_of_blown_up_flow_is_zero() {
        let mut solver = Solver::new(10, 10, 1.0);
        let (x, y, w, h) = cell_rect(&solver, 5, 5);
        solver.add_inflow(x, y, w, h, 0.0, f64::INFINITY, 0.0);
        assert_eq!(solver.max_timestep(), 0.0);

        let mut solver = Solver::new(10, 10, 1.0);
        solver.add_inflow(-1.0, -1.0, 3.0, 3.0, 0.0, 0.0, f64::INFINITY);
        assert_eq!(solver.max_timestep(), 0.0);

        let mut solver = Solver::new(10, 10, 1.0);
        solver.velocity_x.set(5, 5, f64::NAN);
        assert_eq!(solver.max_timestep(), 0.0);
    }

    #[test]
    fn sample_maps_density_to_intensity() {
        let mut solver = Solver::new(4, 4, 1.0);
        assert_eq!(solver.sample(0, 0), 0);
        solver.add_inflow(-1.0, -1.0, 3.0, 3.0, 0.5, 0.0, 0.0);
        assert_eq!(solver.sample(1, 1), 64);
        solver.add_inflow(-1.0, -1.0, 3.0, 3.0, 1.0, 0.0, 0.0);
        assert_eq!(solver.sample(2, 3), 128);
        solver.add_inflow(-1.0, -1.0, 3.0, 3.0, 10.0, 0.0, 0.0);
        assert_eq!(solver.sample(3, 3), 255);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn sample_out_of_range_panics() {
        let solver = Solver::new(4, 4, 1.0);
        solver.sample(4, 0);
    }
}
