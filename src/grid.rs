/// Position of a sample inside its cell, in cell units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const CENTER: Self = Self::new(0.5, 0.5);
    pub const X_FACE: Self = Self::new(0.0, 0.5);
    pub const Y_FACE: Self = Self::new(0.5, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Read-only view of the active buffer of a [`Grid`].
///
/// Coordinates passed to [`GridView::sample_at`] are in cell units, the same
/// frame every grid of a simulation shares; the view subtracts its own offset.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    width: usize,
    height: usize,
    offset: Offset,
    data: &'a [f64],
}

impl<'a> GridView<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[idx(self.width, self.height, x, y)]
    }

    pub fn sample_at(&self, x: f64, y: f64) -> f64 {
        let (x0, x1, sx) = stencil(x - self.offset.x, self.width);
        let (y0, y1, sy) = stencil(y - self.offset.y, self.height);
        let v00 = self.get(x0, y0);
        let v10 = self.get(x1, y0);
        let v01 = self.get(x0, y1);
        let v11 = self.get(x1, y1);
        let vx0 = lerp(v00, v10, sx);
        let vx1 = lerp(v01, v11, sx);
        lerp(vx0, vx1, sy)
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    /// Semi-Lagrangian step: every sample of `out` receives this field traced
    /// back through the velocity grids by `dt`.
    pub fn advect_into(
        &self,
        out: &mut [f64],
        dt: f64,
        velocity_x: &GridView<'_>,
        velocity_y: &GridView<'_>,
        cell_size: f64,
    ) {
        assert_eq!(out.len(), self.data.len(), "advection buffer mismatch");
        let inv_h = 1.0 / cell_size;
        for iy in 0..self.height {
            for ix in 0..self.width {
                let x = ix as f64 + self.offset.x;
                let y = iy as f64 + self.offset.y;
                let u = velocity_x.sample_at(x, y) * inv_h;
                let v = velocity_y.sample_at(x, y) * inv_h;
                out[iy * self.width + ix] = self.sample_at(x - u * dt, y - v * dt);
            }
        }
    }
}

/// A scalar field on a (possibly staggered) grid with a front and back buffer.
///
/// Reads and writes through `get`/`set`/`add_inflow` hit the source buffer;
/// `advect` writes the destination, which `flip` promotes.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    offset: Offset,
    cell_size: f64,
    source: Vec<f64>,
    destination: Vec<f64>,
}

impl Grid {
    pub fn new(width: usize, height: usize, offset: Offset, cell_size: f64) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        assert!(cell_size > 0.0, "cell size must be > 0");
        Self {
            width,
            height,
            offset,
            cell_size,
            source: vec![0.0; width * height],
            destination: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn view(&self) -> GridView<'_> {
        GridView {
            width: self.width,
            height: self.height,
            offset: self.offset,
            data: &self.source,
        }
    }

    /// Source view plus the destination buffer, so a field can be advected
    /// by a velocity that includes itself.
    pub fn split_mut(&mut self) -> (GridView<'_>, &mut [f64]) {
        let view = GridView {
            width: self.width,
            height: self.height,
            offset: self.offset,
            data: &self.source,
        };
        (view, self.destination.as_mut_slice())
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.view().get(x, y)
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        let i = idx(self.width, self.height, x, y);
        self.source[i] = value;
    }

    pub fn sample_at(&self, x: f64, y: f64) -> f64 {
        self.view().sample_at(x, y)
    }

    pub fn advect(&mut self, dt: f64, velocity_x: &Grid, velocity_y: &Grid) {
        let cell_size = self.cell_size;
        let (source, destination) = self.split_mut();
        source.advect_into(
            destination,
            dt,
            &velocity_x.view(),
            &velocity_y.view(),
            cell_size,
        );
    }

    /// Raises samples inside the physical rectangle `[x0,x1) × [y0,y1)` to
    /// `value`; samples already larger in magnitude are left alone.
    pub fn add_inflow(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, value: f64) {
        let (ix0, ix1) = self.index_range(x0, x1, self.offset.x, self.width);
        let (iy0, iy1) = self.index_range(y0, y1, self.offset.y, self.height);
        for y in iy0..iy1 {
            for x in ix0..ix1 {
                let sample = &mut self.source[y * self.width + x];
                if sample.abs() < value.abs() {
                    *sample = value;
                }
            }
        }
    }

    pub fn flip(&mut self) {
        std::mem::swap(&mut self.source, &mut self.destination);
    }

    pub fn sum(&self) -> f64 {
        self.source.iter().sum()
    }

    fn index_range(&self, lo: f64, hi: f64, offset: f64, len: usize) -> (usize, usize) {
        let to_index = |p: f64| {
            let i = (p / self.cell_size - offset).floor();
            i.clamp(0.0, len as f64) as usize
        };
        (to_index(lo), to_index(hi))
    }
}

fn idx(width: usize, height: usize, x: usize, y: usize) -> usize {
    assert!(
        x < width && y < height,
        "grid index ({x}, {y}) out of bounds for {width}x{height}"
    );
    y * width + x
}

/// Lower and upper stencil index along one axis plus the blend weight.
/// The coordinate is clamped into the sampled range; the lower index stops at
/// `len - 2` so the upper one is always in bounds.
fn stencil(coord: f64, len: usize) -> (usize, usize, f64) {
    if len == 1 {
        return (0, 0, 0.0);
    }
    let c = coord.clamp(0.0, (len - 1) as f64);
    let i0 = (c.floor() as usize).min(len - 2);
    (i0, i0 + 1, c - i0 as f64)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
