mod display;
mod grid;
mod mac;
mod params;
mod pressure;
mod solver;

pub use display::{render_luma, IntensityGrid};
pub use grid::{Grid, GridView, Offset};
pub use mac::MacGrid;
pub use params::{Inflow, ParamsError, SolverParams};
pub use pressure::{
    apply_pressure, build_rhs, max_divergence, solve_pressure, ProjectionReport,
};
pub use solver::Solver;
