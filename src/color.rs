//! Colors

use std::ops::{Add, AddAssign, Mul, Sub};

/// Convert an f32 [0,1] component to a u8 [0,255] component
///
/// Values outside of [0,1] are clamped
pub fn cu8(v: f32) -> u8 {
    let v = if v.is_nan() { 0.0 } else { v };
    (v.max(0.0).min(1.0) * 255.0).round() as u8
}

/// Color as Red, Green, Blue
///
/// Used for both color and opacity, components are linear floats
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// Black Color (0,0,0), also fully transparent opacity
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    /// White Color (1,1,1), also fully opaque opacity
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// Create new color
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }
    /// Gray scale color
    pub fn gray(g: f32) -> Self {
        Self::new(g, g, g)
    }
    /// Average of the three components
    pub fn mean(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }
    /// True when any component is greater than or equal to `threshold`'s
    pub fn any_ge(&self, threshold: &Color) -> bool {
        self.r >= threshold.r || self.g >= threshold.g || self.b >= threshold.b
    }
    /// True when every component is at least 1.0
    pub fn is_opaque(&self) -> bool {
        self.r >= 1.0 && self.g >= 1.0 && self.b >= 1.0
    }
    /// Component-wise product
    pub fn mul_elem(&self, o: Color) -> Color {
        Color::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
    /// `1 - c` for each component
    pub fn inverse(&self) -> Color {
        Color::new(1.0 - self.r, 1.0 - self.g, 1.0 - self.b)
    }
    /// Component access by index, 0 = red, 1 = green, 2 = blue
    pub fn get(&self, i: usize) -> f32 {
        match i {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, o: Color) -> Color { Color::new(self.r + o.r, self.g + o.g, self.b + o.b) }
}
impl AddAssign for Color {
    fn add_assign(&mut self, o: Color) {
        self.r += o.r;
        self.g += o.g;
        self.b += o.b;
    }
}
impl Sub for Color {
    type Output = Color;
    fn sub(self, o: Color) -> Color { Color::new(self.r - o.r, self.g - o.g, self.b - o.b) }
}
impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color { Color::new(self.r * s, self.g * s, self.b * s) }
}

/// Composite `fg` with opacity `os` over `behind` with opacity `ob`
///
/// Colors are straight (not premultiplied):
///
/// ```text
/// C = Os * Cs + (1 - Os) * Cb
/// O = Os + (1 - Os) * Ob
/// ```
///
///     use hider::{Color,over};
///     let red = Color::new(1.0, 0.0, 0.0);
///     let half = Color::gray(0.5);
///     let (c, o) = over(Color::new(0.0, 0.0, 1.0), half, red, Color::WHITE);
///     assert_eq!(c, Color::new(0.5, 0.0, 0.5));
///     assert_eq!(o, Color::WHITE);
///
pub fn over(fg: Color, os: Color, behind: Color, ob: Color) -> (Color, Color) {
    let t = os.inverse();
    (fg.mul_elem(os) + behind.mul_elem(t), os + ob.mul_elem(t))
}

/// Color as Red, Green, Blue, and Alpha, 8 bits per component
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Rgba8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba8 {
    /// Create new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba8 { r, g, b, a }
    }
    /// Quantize a linear float color and alpha
    pub fn from_color(c: &Color, alpha: f32) -> Self {
        Self::new(cu8(c.r), cu8(c.g), cu8(c.b), cu8(alpha))
    }
}
