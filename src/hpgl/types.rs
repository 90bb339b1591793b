/// A point in plotter units (0.025 mm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Floating point pair used by user-defined character strokes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordFloat {
    pub x: f32,
    pub y: f32,
}

impl CoordFloat {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pen-down marker added to the x delta of a user-character stroke point
pub const UC_PEN_DOWN_OFFSET: f32 = 10000.0;

/// Addressable sheet of the emulated plotter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sheet {
    pub p1: Coord,
    pub p2: Coord,
    /// Width / height of the physical page
    pub aspect_ratio: f64,
}

impl Sheet {
    /// A3 sheet of the HP 7475A, in landscape or portrait
    pub fn a3(portrait: bool) -> Self {
        if portrait {
            Self {
                p1: Coord::new(0, 0),
                p2: Coord::new(11880, 16800),
                aspect_ratio: 1.0 / std::f64::consts::SQRT_2,
            }
        } else {
            Self {
                p1: Coord::new(0, 0),
                p2: Coord::new(16800, 11880),
                aspect_ratio: std::f64::consts::SQRT_2,
            }
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.aspect_ratio < 1.0
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::a3(false)
    }
}

/// How user units given by `SC` map onto the input rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ScalingMode {
    #[default]
    None = 0,
    Anisotropic = 1,
    Isotropic = 2,
    Point = 3,
    IsotropicWithOffset = 4,
}

impl ScalingMode {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Anisotropic),
            2 => Some(Self::Isotropic),
            3 => Some(Self::Point),
            4 => Some(Self::IsotropicWithOffset),
            _ => None,
        }
    }

    /// Number of coordinate pairs following the mode tag in a scaling record
    pub fn pair_count(self) -> usize {
        match self {
            Self::None => 0,
            Self::Anisotropic | Self::Isotropic | Self::Point => 2,
            Self::IsotropicWithOffset => 3,
        }
    }
}

/// Default label terminator (ETX)
pub const DEFAULT_LABEL_TERMINATOR: char = '\u{3}';

/// Default relative character size in percent of P2 - P1 (width, height)
pub const DEFAULT_CHAR_SIZE: (f32, f32) = (0.75, 1.5);

/// Modal state carried between commands and chunk deliveries
#[derive(Debug, Clone, PartialEq)]
pub struct ParserState {
    /// Bare coordinates after PU/PD are absolute (PA) or relative (PR)
    pub absolute: bool,
    pub label_terminator: char,
    pub character_set: usize,
    pub pen: u8,
    pub line_type: u8,
    pub char_size: (f32, f32),
    /// Pen 0 selected, usually the end of a plot
    pub pen_parked: bool,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            absolute: true,
            label_terminator: DEFAULT_LABEL_TERMINATOR,
            character_set: 0,
            pen: 0,
            line_type: 0,
            char_size: DEFAULT_CHAR_SIZE,
            pen_parked: false,
        }
    }
}
