//! Colour tables for the scope's 16 pixel indices.

use serde::{Deserialize, Serialize};

/// One 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Sixteen colours, one per 4-bit pixel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette(pub [Rgb; 16]);

impl Palette {
    /// Colour for a pixel index; only the low nibble is used.
    #[inline]
    pub fn color(&self, index: u8) -> Rgb {
        self.0[usize::from(index & 0x0F)]
    }
}

const fn rgb(hex: u32) -> Rgb {
    Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// Index meanings as observed on the GDS-820C:
//  0 menu text               8 trace reticle, menu shadow
//  1 trace background        9 unknown
//  2 channel 1 trace/info   10 GUI background
//  3 unknown                11 menu background
//  4 channel 2 trace/info   12 unknown
//  5 unknown                13 unknown
//  6 horiz./trigger markers 14 math trace/info, logo background
//  7 GUI text and borders   15 menu highlight

/// Colours as shown on the scope's own LCD.
pub const NATIVE: Palette = Palette([
    rgb(0x000000),
    rgb(0x000000),
    rgb(0xffff00),
    rgb(0x808080),
    rgb(0x00ffff),
    rgb(0x808080),
    rgb(0x66ff66),
    rgb(0xffffff),
    rgb(0x888888),
    rgb(0x808080),
    rgb(0x000055),
    rgb(0xbbbbbb),
    rgb(0x808080),
    rgb(0x808080),
    rgb(0xff2222),
    rgb(0xffffff),
]);

/// Bright colours on a white background.
pub const LIGHT: Palette = Palette([
    rgb(0x555650),
    rgb(0xf9f8f5),
    rgb(0xf92672),
    rgb(0x800080),
    rgb(0x46a9df),
    rgb(0x800080),
    rgb(0x86d21e),
    rgb(0x555650),
    rgb(0xa5a1ae),
    rgb(0x800080),
    rgb(0xf8f8f2),
    rgb(0xf8f8f2),
    rgb(0x800080),
    rgb(0x800080),
    rgb(0xf4bf35),
    rgb(0xf9f8f5),
]);

/// Muted colours on a dark background (gruvbox).
pub const DARK: Palette = Palette([
    rgb(0x1d1c1a),
    rgb(0x1d1c1a),
    rgb(0xd79921),
    rgb(0x800080),
    rgb(0x458588),
    rgb(0x800080),
    rgb(0xb8bb26),
    rgb(0xa89984),
    rgb(0x928374),
    rgb(0x800080),
    rgb(0x32302f),
    rgb(0xa89984),
    rgb(0x800080),
    rgb(0x800080),
    rgb(0xfb4934),
    rgb(0xebdbb2),
]);

/// Black on white, for printing.
pub const MONO: Palette = Palette([
    rgb(0x000000),
    rgb(0xffffff),
    rgb(0x000000),
    rgb(0xffffff),
    rgb(0x000000),
    rgb(0xffffff),
    rgb(0x000000),
    rgb(0x000000),
    rgb(0x000000),
    rgb(0xffffff),
    rgb(0xffffff),
    rgb(0xffffff),
    rgb(0xffffff),
    rgb(0xffffff),
    rgb(0x000000),
    rgb(0xffffff),
]);

/// Named palette selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Native,
    Light,
    #[default]
    Dark,
    Mono,
}

impl Theme {
    /// All themes in cycling order.
    pub const ALL: [Theme; 4] = [Theme::Dark, Theme::Light, Theme::Mono, Theme::Native];

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Native => &NATIVE,
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
            Theme::Mono => &MONO,
        }
    }

    /// The theme after this one, wrapping around.
    pub fn next(self) -> Theme {
        let pos = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Native => "native",
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Mono => "mono",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
