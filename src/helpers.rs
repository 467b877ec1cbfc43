use crate::common::Color;

/// Expand a 3-bit console channel (stored as the even values 0-14) to 0-255.
pub fn scale_color(c: u8) -> u8 {
    ((c as u16 & 0xE) * 255 / 14) as u8
}

/// Nearest 3-bit channel for an 8-bit value, returned in the even 0-14 form.
/// Distance is measured to the levels `scale_color` actually decodes to.
pub fn quantize_color(c: u8) -> u8 {
    (0..8u8)
        .map(|k| k * 2)
        .min_by_key(|&v| (scale_color(v) as i16 - c as i16).abs())
        .unwrap_or(0)
}

pub fn pack_argb(alpha: u8, color: Color) -> u32 {
    (alpha as u32) << 24 | (color.red as u32) << 16 | (color.green as u32) << 8 | color.blue as u32
}

pub fn argb_to_rgba(argb: u32) -> [u8; 4] {
    [
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
        (argb >> 24) as u8,
    ]
}
