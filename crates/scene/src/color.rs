/// An RGB color with normalized sRGB components in `[0, 1]`.
///
/// Stored as fractions of the 8-bit channel range so that converting to and
/// from `u8` channels round-trips exactly. This is the native representation
/// for materials and lights; panel-facing representations (hex strings,
/// byte triples) convert through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value, e.g. `Color::from_hex_rgb(0x44aa88)`.
    pub fn from_hex_rgb(hex: u32) -> Self {
        Self::from_srgb_u8(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }

    /// Build from 8-bit sRGB channels.
    pub fn from_srgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Convert to 8-bit sRGB channels, rounding to the nearest step.
    /// Out-of-range components are clamped rather than wrapped.
    pub fn to_srgb_u8(self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// RGBA array with full alpha, the layout instance buffers expect.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}
