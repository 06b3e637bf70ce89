use crate::Solver;

/// A rectangle of display intensities, one byte per cell.
pub trait IntensityGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn intensity(&self, x: usize, y: usize) -> u8;
}

impl IntensityGrid for Solver {
    fn width(&self) -> usize {
        Solver::width(self)
    }

    fn height(&self) -> usize {
        Solver::height(self)
    }

    fn intensity(&self, x: usize, y: usize) -> u8 {
        self.sample(x, y)
    }
}

/// Fills `out` with a row-major grayscale image of `source`.
pub fn render_luma(source: &impl IntensityGrid, out: &mut Vec<u8>) {
    let width = source.width();
    let height = source.height();
    out.resize(width * height, 0);
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = source.intensity(x, y);
        }
    }
}
