use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverParams {
    /// Fluid density; scales the pressure needed to cancel divergence.
    pub density: f64,
    pub pressure_iters: usize,
    pub pressure_tol: f64,
    /// Cells the fluid may cross per step before `max_timestep` bites.
    pub cfl: f64,
    pub max_dt: f64,
    /// Start each pressure solve from the previous solution instead of zero.
    pub warm_start: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            density: 1.0,
            pressure_iters: 600,
            pressure_tol: 1e-5,
            cfl: 2.0,
            max_dt: 1.0,
            warm_start: true,
        }
    }
}

impl SolverParams {
    pub fn with_density(density: f64) -> Self {
        Self {
            density,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        positive("density", self.density)?;
        if self.pressure_iters == 0 {
            return Err(ParamsError::NoIterations);
        }
        positive("pressure_tol", self.pressure_tol)?;
        positive("cfl", self.cfl)?;
        positive("max_dt", self.max_dt)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be finite and > 0, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("pressure_iters must be at least 1")]
    NoIterations,
}

/// A rectangular source of density and velocity, in physical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Inflow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub density: f64,
    pub u: f64,
    pub v: f64,
}
