pub mod input;
pub mod renderer;
pub mod sound;

/// World-unit footprint of one terminal cell. Cells are roughly twice
/// as tall as wide, so the vertical scale doubles the horizontal one;
/// a 1000×600 world view fits a 100×30 terminal.
pub const CELL_W: f64 = 10.0;
pub const CELL_H: f64 = 20.0;
