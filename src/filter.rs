//! Reconstruction Filters
//!
//! Filter weights depend only on which sub-cell of a pixel a sample falls
//! in and on the pixel offset between the sample and the output pixel, so
//! they are computed once per render into lookup tables.

use std::f32::consts::PI;

/// Reconstruction filter kernel
#[derive(Debug,PartialEq,Eq,Copy,Clone)]
pub enum FilterKind {
    Box,
    Triangle,
    Gaussian,
    CatmullRom,
    Sinc,
    Mitchell,
    Disk,
}
impl Default for FilterKind {
    fn default() -> FilterKind {
        FilterKind::Gaussian
    }
}

impl FilterKind {
    /// Filters that are the product of an x and a y kernel
    pub fn is_separable(&self) -> bool {
        *self != FilterKind::Disk
    }
    /// One dimensional kernel at distance `x` for a filter `width` wide
    ///
    /// Only meaningful for separable filters
    pub fn eval_1d(&self, x: f32, width: f32) -> f32 {
        let half = width * 0.5;
        match *self {
            FilterKind::Box => 1.0,
            FilterKind::Triangle => (1.0 - x.abs() / half).max(0.0),
            FilterKind::Gaussian => {
                let u = x / half;
                (-2.0 * u * u).exp()
            },
            FilterKind::CatmullRom => catmull_rom(x.abs()),
            FilterKind::Sinc => {
                if x.abs() < 1e-6 {
                    1.0
                } else {
                    (PI * x).sin() / (PI * x)
                }
            },
            FilterKind::Mitchell => mitchell(2.0 * x.abs() / half),
            FilterKind::Disk => if x.abs() <= half { 1.0 } else { 0.0 },
        }
    }
    /// Two dimensional kernel at offset (`x`,`y`) from the pixel center
    pub fn eval(&self, x: f32, y: f32, xwidth: f32, ywidth: f32) -> f32 {
        match *self {
            FilterKind::Disk => {
                let u = 2.0 * x / xwidth;
                let v = 2.0 * y / ywidth;
                if u * u + v * v <= 1.0 { 1.0 } else { 0.0 }
            },
            _ => self.eval_1d(x, xwidth) * self.eval_1d(y, ywidth),
        }
    }
}

fn catmull_rom(r: f32) -> f32 {
    if r < 1.0 {
        1.5 * r * r * r - 2.5 * r * r + 1.0
    } else if r < 2.0 {
        -0.5 * r * r * r + 2.5 * r * r - 4.0 * r + 2.0
    } else {
        0.0
    }
}

fn mitchell(r: f32) -> f32 {
    let (b, c) = (1.0 / 3.0, 1.0 / 3.0);
    let v = if r < 1.0 {
        (12.0 - 9.0 * b - 6.0 * c) * r * r * r
            + (-18.0 + 12.0 * b + 6.0 * c) * r * r
            + (6.0 - 2.0 * b)
    } else if r < 2.0 {
        (-b - 6.0 * c) * r * r * r
            + (6.0 * b + 30.0 * c) * r * r
            + (-12.0 * b - 48.0 * c) * r
            + (8.0 * b + 24.0 * c)
    } else {
        0.0
    };
    v / 6.0
}

/// Precomputed filter weights
///
/// Indexed by the pixel offset (`dx`,`dy`) from the output pixel to the
/// pixel holding the sample, within `[-margin, margin]`, and by the
/// sample's sub-cell. Weights are evaluated at sub-cell centers and are zero
/// outside the support rectangle.
#[derive(Debug,Clone)]
pub struct FilterWeights {
    pub kind: FilterKind,
    pub width: (f32, f32),
    /// Pixels of support on each side of the output pixel
    pub margin: (i32, i32),
    /// Sub-cells across and down a pixel
    pub cells: (usize, usize),
    /// Use the two pass filter
    pub separable: bool,
    weights: Vec<f32>,
    support: Vec<bool>,
    weights_x: Vec<f32>,
    weights_y: Vec<f32>,
    support_x: Vec<bool>,
    support_y: Vec<bool>,
}

impl FilterWeights {
    /// Build the weight tables for `kind` over a grid of `xs` x `ys` sub-cells
    pub fn new(kind: FilterKind, width: (f32, f32), xs: usize, ys: usize, separable_threshold: f32) -> Self {
        let margin = (crate::region::filter_margin(width.0), crate::region::filter_margin(width.1));
        let span_x = (2 * margin.0 + 1) as usize;
        let span_y = (2 * margin.1 + 1) as usize;
        let spp = xs * ys;

        let offset = |d: i32, cell: usize, n: usize| d as f32 + (cell as f32 + 0.5) / n as f32 - 0.5;

        let mut support_x = Vec::with_capacity(span_x * xs);
        let mut weights_x = Vec::with_capacity(span_x * xs);
        for dx in -margin.0 ..= margin.0 {
            for sx in 0 .. xs {
                let d = offset(dx, sx, xs);
                let inside = d.abs() <= width.0 * 0.5;
                support_x.push(inside);
                weights_x.push(if inside { kind.eval_1d(d, width.0) } else { 0.0 });
            }
        }
        let mut support_y = Vec::with_capacity(span_y * ys);
        let mut weights_y = Vec::with_capacity(span_y * ys);
        for dy in -margin.1 ..= margin.1 {
            for sy in 0 .. ys {
                let d = offset(dy, sy, ys);
                let inside = d.abs() <= width.1 * 0.5;
                support_y.push(inside);
                weights_y.push(if inside { kind.eval_1d(d, width.1) } else { 0.0 });
            }
        }

        let mut weights = vec![0.0; span_x * span_y * spp];
        let mut support = vec![false; span_x * span_y * spp];
        for (iy, dy) in (-margin.1 ..= margin.1).enumerate() {
            for (ix, dx) in (-margin.0 ..= margin.0).enumerate() {
                for sy in 0 .. ys {
                    for sx in 0 .. xs {
                        let i = (iy * span_x + ix) * spp + sy * xs + sx;
                        let inside = support_x[ix * xs + sx] && support_y[iy * ys + sy];
                        support[i] = inside;
                        if inside {
                            weights[i] = kind.eval(offset(dx, sx, xs), offset(dy, sy, ys), width.0, width.1);
                        }
                    }
                }
            }
        }
        let separable = kind.is_separable() && width.0.max(width.1) > separable_threshold;
        log::debug!("filter {:?} {}x{} margin {:?} separable {}", kind, width.0, width.1, margin, separable);
        Self { kind, width, margin, cells: (xs, ys), separable,
               weights, support, weights_x, weights_y, support_x, support_y }
    }
    fn index(&self, dx: i32, dy: i32, sub: usize) -> usize {
        let span_x = (2 * self.margin.0 + 1) as usize;
        let ix = (dx + self.margin.0) as usize;
        let iy = (dy + self.margin.1) as usize;
        (iy * span_x + ix) * self.cells.0 * self.cells.1 + sub
    }
    /// Weight of sub-cell `sub` in a pixel offset by (`dx`,`dy`)
    pub fn weight(&self, dx: i32, dy: i32, sub: usize) -> f32 {
        self.weights[self.index(dx, dy, sub)]
    }
    /// Is sub-cell `sub` in a pixel offset by (`dx`,`dy`) within the support
    pub fn in_support(&self, dx: i32, dy: i32, sub: usize) -> bool {
        self.support[self.index(dx, dy, sub)]
    }
    /// Horizontal weight of sub-cell column `sx` offset by `dx` pixels
    pub fn weight_x(&self, dx: i32, sx: usize) -> f32 {
        self.weights_x[(dx + self.margin.0) as usize * self.cells.0 + sx]
    }
    /// Vertical weight of sub-cell row `sy` offset by `dy` pixels
    pub fn weight_y(&self, dy: i32, sy: usize) -> f32 {
        self.weights_y[(dy + self.margin.1) as usize * self.cells.1 + sy]
    }
    pub fn in_support_x(&self, dx: i32, sx: usize) -> bool {
        self.support_x[(dx + self.margin.0) as usize * self.cells.0 + sx]
    }
    pub fn in_support_y(&self, dy: i32, sy: usize) -> bool {
        self.support_y[(dy + self.margin.1) as usize * self.cells.1 + sy]
    }
}
