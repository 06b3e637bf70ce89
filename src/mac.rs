use crate::grid::{Grid, Offset};

/// Marker-and-cell layout: scalars at cell centers, x velocity on vertical
/// faces (one extra column), y velocity on horizontal faces (one extra row).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacGrid {
    width: usize,
    height: usize,
    cell_size: f64,
}

impl MacGrid {
    pub fn new(width: usize, height: usize, cell_size: f64) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        assert!(cell_size > 0.0, "cell size must be > 0");
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Unit-square domain along the shorter axis.
    pub fn unit(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be > 0");
        Self::new(width, height, 1.0 / width.min(height) as f64)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn scalar_grid(&self) -> Grid {
        Grid::new(self.width, self.height, Offset::CENTER, self.cell_size)
    }

    pub fn u_grid(&self) -> Grid {
        Grid::new(self.width + 1, self.height, Offset::X_FACE, self.cell_size)
    }

    pub fn v_grid(&self) -> Grid {
        Grid::new(self.width, self.height + 1, Offset::Y_FACE, self.cell_size)
    }

    /// Cell center in the shared cell-unit frame.
    pub fn cell_center(&self, x: usize, y: usize) -> (f64, f64) {
        (x as f64 + 0.5, y as f64 + 0.5)
    }
}
