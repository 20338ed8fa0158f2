#[repr(C)]
pub struct FfiBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl From<glyph_points::Bounds> for FfiBounds {
    fn from(bounds: glyph_points::Bounds) -> Self {
        FfiBounds {
            x_min: bounds.x_min,
            y_min: bounds.y_min,
            x_max: bounds.x_max,
            y_max: bounds.y_max,
        }
    }
}

#[repr(C)]
pub struct FfiPoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: u8,
}

impl From<glyph_points::Point> for FfiPoint {
    fn from(point: glyph_points::Point) -> Self {
        FfiPoint {
            x: point.x,
            y: point.y,
            on_curve: point.on_curve as u8,
        }
    }
}
