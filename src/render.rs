//! Interfaces to the drawing and terrain lookup layers.

use crate::zone::Colour;

/// A vehicle to be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarSprite<'a> {
    pub sprite: &'a str,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// Draws the simulation.
pub trait Renderer {
    /// Redraws the view, centred on the agent if it scrolls.
    ///
    /// # Parameters
    /// * `agent_x` - The agent's x coordinate
    /// * `agent_y` - The agent's y coordinate
    /// * `cars` - Every vehicle, agent first
    fn update(&mut self, agent_x: f64, agent_y: f64, cars: &[CarSprite]);

    /// The pixels of the last drawn frame, used as the observation in vision mode.
    fn frame(&self) -> Vec<f64>;
}

/// Looks up the colour of the ground.
pub trait Terrain {
    /// The normalized colour of the terrain at a map position.
    fn colour(&self, x: f64, y: f64) -> Colour;
}

/// A terrain backed by a row-major RGB image with one pixel per map unit.
#[derive(Clone, Debug)]
pub struct TerrainImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl TerrainImage {
    /// Creates a terrain image, or `None` if the pixel count doesn't match the size.
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 3]>) -> Option<Self> {
        (pixels.len() == width * height).then(|| Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates an image of a single colour.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; width * height],
        }
    }

    /// Sets the colour of every pixel within a rectangle, clipped to the image.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, rgb: [u8; 3]) {
        for row in y..usize::min(y.saturating_add(height), self.height) {
            for col in x..usize::min(x.saturating_add(width), self.width) {
                self.pixels[row * self.width + col] = rgb;
            }
        }
    }

    fn pixel(&self, x: f64, y: f64) -> Option<[u8; 3]> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (x as usize, y as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.pixels[row * self.width + col])
    }
}

impl Terrain for TerrainImage {
    fn colour(&self, x: f64, y: f64) -> Colour {
        let [r, g, b] = self.pixel(x, y).unwrap_or([0, 0, 0]);
        Colour::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }
}
