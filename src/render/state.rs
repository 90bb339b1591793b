use crate::canvas::Affine;
use crate::hpgl::types::{Coord, DEFAULT_CHAR_SIZE, ScalingMode, Sheet};

/// Live plotter state for one replay pass
#[derive(Debug, Clone, PartialEq)]
pub struct PlotterState {
    pub plotter_p1: Coord,
    pub plotter_p2: Coord,
    pub input_p1: Coord,
    pub input_p2: Coord,
    pub scaled_p1: Coord,
    pub scaled_p2: Coord,
    pub scaling: ScalingMode,
    /// Left / bottom percentages for `ScalingMode::IsotropicWithOffset`
    pub isotropic_offset: Coord,
    /// Degrees, one of 0, 90, 180, 270
    pub rotation: i32,
    pub width_transformed: i32,
    pub height_transformed: i32,
    pub char_size: (f32, f32),
    pub pen: u8,
    pub pen_down: bool,
    /// Canvas transform when the pass started (page fitting of the caller)
    pub initial_transform: Affine,
    /// Transform after flip, rotation and margin
    pub surface_transform: Affine,
    /// Drawable size after rotation and margin, in canvas units
    pub area_width: f64,
    pub area_height: f64,
}

impl PlotterState {
    pub fn new(sheet: &Sheet, initial_transform: Affine) -> Self {
        Self {
            plotter_p1: sheet.p1,
            plotter_p2: sheet.p2,
            input_p1: sheet.p1,
            input_p2: sheet.p2,
            scaled_p1: Coord::default(),
            scaled_p2: Coord::default(),
            scaling: ScalingMode::None,
            isotropic_offset: Coord::default(),
            rotation: 0,
            width_transformed: sheet.p2.x - sheet.p1.x,
            height_transformed: sheet.p2.y - sheet.p1.y,
            char_size: DEFAULT_CHAR_SIZE,
            pen: 1,
            pen_down: false,
            initial_transform,
            surface_transform: initial_transform,
            area_width: 0.0,
            area_height: 0.0,
        }
    }

    /// New output points cancel scaling and rotation
    pub fn set_output_points(&mut self, p1: Coord, p2: Coord) {
        self.plotter_p1 = p1;
        self.plotter_p2 = p2;
        self.input_p1 = p1;
        self.input_p2 = p2;
        self.rotation = 0;
        self.scaling = ScalingMode::None;
    }
}
