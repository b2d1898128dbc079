//! Single-pass unrotate + nibble expansion + palette lookup.

use super::frame::{INPUT_WIDTH, PITCH, ROWS_PER_LINE, RawFrame, Raster};
use super::palette::Palette;

/// Decode a screen dump into `out`.
///
/// The scope sends its display as 320 vertical scan-lines of `PITCH` bytes,
/// last column first. Within a scan-line, byte `r` holds two vertically
/// adjacent pixels: the high nibble at output row `2r`, the low nibble at
/// `2r + 1`. Bytes `r >= ROWS_PER_LINE` are padding and write nothing.
pub fn decode(raw: &RawFrame, palette: &Palette, out: &mut Raster) {
    for (line, scan) in raw.as_bytes().chunks_exact(PITCH).enumerate() {
        let col = (INPUT_WIDTH - 1) - line;
        for (r, &byte) in scan[..ROWS_PER_LINE].iter().enumerate() {
            out.set_pixel(col, r * 2, palette.color(byte >> 4));
            out.set_pixel(col, r * 2 + 1, palette.color(byte & 0x0F));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{OUT_H, OUT_W, Rgb, Theme};
    use crate::scope::FRAME_SIZE;
    use proptest::prelude::*;

    const SENTINEL: Rgb = Rgb::new(1, 2, 3);

    fn frame_of(bytes: Vec<u8>) -> RawFrame {
        RawFrame::try_from(bytes).unwrap()
    }

    fn decoded(raw: &RawFrame, palette: &Palette) -> Raster {
        let mut out = Raster::filled(SENTINEL);
        decode(raw, palette, &mut out);
        out
    }

    /// Output position of the high-nibble pixel for raw offset `i`.
    fn position(i: usize) -> (usize, usize) {
        let r = i % PITCH;
        let c = (INPUT_WIDTH - 1) - i / PITCH;
        (c, 2 * r)
    }

    #[test]
    fn test_all_0x12_with_mono_palette() {
        let palette = Theme::Mono.palette();
        let out = decoded(&frame_of(vec![0x12; FRAME_SIZE]), palette);

        let white = Rgb::new(0xff, 0xff, 0xff);
        for y in (0..OUT_H).step_by(2) {
            for x in 0..OUT_W {
                assert_eq!(out.pixel(x, y), white, "high nibble at ({x}, {y})");
                assert_eq!(out.pixel(x, y + 1), palette.color(2), "low nibble at ({x}, {})", y + 1);
            }
        }
    }

    #[test]
    fn test_first_byte_lands_in_last_column() {
        let mut bytes = vec![0u8; FRAME_SIZE];
        bytes[0] = 0x2E;
        let palette = Theme::Native.palette();
        let out = decoded(&frame_of(bytes), palette);

        assert_eq!(out.pixel(OUT_W - 1, 0), palette.color(0x2));
        assert_eq!(out.pixel(OUT_W - 1, 1), palette.color(0xE));
    }

    #[test]
    fn test_rotation_coordinates() {
        let i = PITCH * 5 + 7;
        let mut bytes = vec![0u8; FRAME_SIZE];
        bytes[i] = 0x4A;
        let palette = Theme::Native.palette();
        let out = decoded(&frame_of(bytes), palette);

        let (x, y) = position(i);
        assert_eq!((x, y), (314, 14));
        assert_eq!(out.pixel(x, y), palette.color(0x4));
        assert_eq!(out.pixel(x, y + 1), palette.color(0xA));
        assert_eq!(out.pixel(x, y + 2), palette.color(0x0));
    }

    #[test]
    fn test_padding_bytes_are_ignored() {
        let mut padded = vec![0u8; FRAME_SIZE];
        for (i, byte) in padded.iter_mut().enumerate() {
            if i % PITCH >= ROWS_PER_LINE {
                *byte = 0xFF;
            }
        }
        let palette = Theme::Dark.palette();
        let plain = decoded(&frame_of(vec![0u8; FRAME_SIZE]), palette);
        let with_padding = decoded(&frame_of(padded), palette);
        assert_eq!(plain, with_padding);
    }

    #[test]
    fn test_every_output_pixel_written_once_per_decode() {
        let out = decoded(&frame_of(vec![0x00; FRAME_SIZE]), Theme::Native.palette());
        let untouched = (0..OUT_H)
            .flat_map(|y| (0..OUT_W).map(move |x| (x, y)))
            .filter(|&(x, y)| out.pixel(x, y) == SENTINEL)
            .count();
        assert_eq!(untouched, 0);

        let writes = 2 * FRAME_SIZE * ROWS_PER_LINE / PITCH;
        assert_eq!(writes, OUT_W * OUT_H);
    }

    #[test]
    fn test_palette_switch_affects_only_new_decode() {
        let raw = frame_of(vec![0x01; FRAME_SIZE]);
        let dark = decoded(&raw, Theme::Dark.palette());
        let light = decoded(&raw, Theme::Light.palette());
        assert_ne!(dark, light);
        assert_eq!(dark, decoded(&raw, Theme::Dark.palette()));
    }

    proptest! {
        #[test]
        fn prop_nibbles_map_through_palette(byte in any::<u8>(), line in 0..INPUT_WIDTH, r in 0..ROWS_PER_LINE) {
            let i = line * PITCH + r;
            let mut bytes = vec![0u8; FRAME_SIZE];
            bytes[i] = byte;
            let palette = Theme::Native.palette();
            let out = decoded(&frame_of(bytes), palette);

            let (x, y) = position(i);
            prop_assert_eq!(out.pixel(x, y), palette.0[usize::from((byte >> 4) & 0xF)]);
            prop_assert_eq!(out.pixel(x, y + 1), palette.0[usize::from(byte & 0xF)]);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_decode_is_idempotent(bytes in proptest::collection::vec(any::<u8>(), FRAME_SIZE)) {
            let raw = frame_of(bytes);
            let palette = Theme::Light.palette();
            let mut first = Raster::filled(SENTINEL);
            let mut second = Raster::default();
            decode(&raw, palette, &mut first);
            decode(&raw, palette, &mut second);
            prop_assert_eq!(first, second);
        }
    }
}
