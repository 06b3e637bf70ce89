use anyhow::{ensure, Context, Result};
use euler_fluid::{render_luma, Inflow, Solver, SolverParams};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const EMITTER: Inflow = Inflow {
    x: 0.45,
    y: 0.2,
    width: 0.1,
    height: 0.01,
    density: 1.0,
    u: 0.0,
    v: 3.0,
};

#[derive(Clone, Debug)]
struct DemoConfig {
    grid: usize,
    density: f64,
    dt: f64,
    frames: usize,
    substeps: usize,
    every: usize,
    out_dir: PathBuf,
}

impl DemoConfig {
    fn from_env() -> Result<Self> {
        let config = Self {
            grid: env_or("SIM_GRID", 128)?,
            density: env_or("SIM_DENSITY", 0.1)?,
            dt: env_or("SIM_DT", 0.005)?,
            frames: env_or("SIM_FRAMES", 60)?,
            substeps: env_or("SIM_SUBSTEPS", 4)?,
            every: env_or("SIM_EVERY", 10)?,
            out_dir: env_or("SIM_OUT", PathBuf::from("frames"))?,
        };
        ensure!(config.grid > 0, "SIM_GRID must be > 0");
        ensure!(config.dt > 0.0, "SIM_DT must be > 0");
        ensure!(config.every > 0, "SIM_EVERY must be > 0");
        Ok(config)
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid {name}={value:?}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {name}")),
    }
}

fn write_pgm(path: &Path, width: usize, height: usize, pixels: &[u8]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write!(out, "P5\n{width} {height}\n255\n")?;
    out.write_all(pixels)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let config = DemoConfig::from_env()?;
    let params = SolverParams::with_density(config.density);
    params.validate().context("SIM_DENSITY")?;
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("creating {}", config.out_dir.display()))?;

    let mut solver = Solver::with_params(config.grid, config.grid, params);
    let mut pixels = Vec::new();
    for frame in 0..config.frames {
        for _ in 0..config.substeps {
            solver.apply_inflow(&EMITTER);
            solver.update(config.dt.min(solver.max_timestep()));
        }
        if frame % config.every == 0 {
            render_luma(&solver, &mut pixels);
            let path = config.out_dir.join(format!("frame_{frame:04}.pgm"));
            write_pgm(&path, solver.width(), solver.height(), &pixels)?;
            log::info!(
                "frame {frame}: mass {:.4}, max divergence {:.3e}, wrote {}",
                solver.total_density(),
                solver.max_divergence(),
                path.display()
            );
        }
    }
    Ok(())
}
