use image::Rgba;

/// Edge length of a block in pixels.
pub const TILE_SIZE: usize = 4;
/// Size of the colour half of a block.
pub const COLOR_BLOCK_SIZE: usize = 8;
/// Size of the 4bpp alpha half of an ETC1A4 block, stored before the colour half.
pub const ALPHA_BLOCK_SIZE: usize = 8;

/// Intensity modifiers, one row per table index.
///
/// The column order follows the selector layout used by the 3DS
/// (`lsb + 2 * msb`), not the one from the ETC1 paper.
pub static MODULATION_TABLE: [[i32; 4]; 8] = [
    [2, 8, -2, -8],
    [5, 17, -5, -17],
    [9, 29, -9, -29],
    [13, 42, -13, -42],
    [18, 60, -18, -60],
    [24, 80, -24, -80],
    [33, 106, -33, -106],
    [47, 183, -47, -183],
];

/// Byte size of one stored block.
pub const fn block_size(has_alpha: bool) -> usize {
    if has_alpha {
        ALPHA_BLOCK_SIZE + COLOR_BLOCK_SIZE
    } else {
        COLOR_BLOCK_SIZE
    }
}

/// A decoded 4x4 block, pixels in raster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile([Rgba<u8>; 16]);

impl Tile {
    pub fn get(&self, x: usize, y: usize) -> Rgba<u8> {
        self.0[y * TILE_SIZE + x]
    }

    pub fn pixels(&self) -> &[Rgba<u8>; 16] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct BaseColor {
    r: i32,
    g: i32,
    b: i32,
}

impl BaseColor {
    fn modulate(&self, delta: i32) -> [u8; 3] {
        [
            saturate(self.r + delta),
            saturate(self.g + delta),
            saturate(self.b + delta),
        ]
    }
}

fn saturate(value: i32) -> u8 {
    value.clamp(0, 0xff) as u8
}

/// Sign extend a 3 bit delta sitting in the low bits of `value`.
fn sign_extend_delta(value: u32) -> i32 {
    (((value & 0x07) << 5) as u8 as i8 >> 5) as i32
}

/// Expand a 4 bit alpha value to 8 bits.
pub const fn expand_alpha(nibble: u8) -> u8 {
    (nibble << 4) | (nibble & 0x0f)
}

/// Decode a single block.
///
/// `color` are the 8 colour bytes as stored, `alpha` the 8 bytes of 4bpp alpha
/// for ETC1A4. Without alpha every pixel is fully opaque.
pub fn decode_block(
    color: &[u8; COLOR_BLOCK_SIZE],
    alpha: Option<&[u8; ALPHA_BLOCK_SIZE]>,
) -> Tile {
    // the block is stored byte-reversed
    let top = u32::from_be_bytes([color[4], color[5], color[6], color[7]]);
    let bottom = u32::from_be_bytes([color[0], color[1], color[2], color[3]]);

    let flip = (top & 0x0100_0000) != 0;
    let differential = (top & 0x0200_0000) != 0;

    let (first, second) = if differential {
        base_colors_differential(top)
    } else {
        base_colors_individual(top)
    };

    let table1 = ((top >> 29) & 7) as usize;
    let table2 = ((top >> 26) & 7) as usize;

    let mut pixels = [Rgba([0, 0, 0, 0xff]); 16];
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let in_first = if flip { y < 2 } else { x < 2 };
            let (base, table) = if in_first {
                (first, table1)
            } else {
                (second, table2)
            };

            let delta = MODULATION_TABLE[table][selector(bottom, x, y)];
            let [r, g, b] = base.modulate(delta);
            pixels[y * TILE_SIZE + x] = Rgba([r, g, b, 0xff]);
        }
    }

    if let Some(alpha) = alpha {
        // alpha is packed column-major, low nibble first
        for x in 0..TILE_SIZE {
            for y in 0..TILE_SIZE {
                let index = x * TILE_SIZE + y;
                let byte = alpha[index / 2];
                let nibble = if index % 2 == 0 { byte & 0x0f } else { byte >> 4 };

                pixels[y * TILE_SIZE + x].0[3] = expand_alpha(nibble);
            }
        }
    }

    Tile(pixels)
}

fn base_colors_differential(top: u32) -> (BaseColor, BaseColor) {
    let r1 = (top & 0x0000f8) as i32;
    let g1 = ((top & 0x00f800) >> 8) as i32;
    let b1 = ((top & 0xf80000) >> 16) as i32;

    let r2 = (r1 >> 3) + sign_extend_delta(top);
    let g2 = (g1 >> 3) + sign_extend_delta(top >> 8);
    let b2 = (b1 >> 3) + sign_extend_delta(top >> 16);

    let expand5 = |v: i32| (v << 3) | (v >> 2);

    (
        BaseColor {
            r: r1 | (r1 >> 5),
            g: g1 | (g1 >> 5),
            b: b1 | (b1 >> 5),
        },
        BaseColor {
            r: expand5(r2),
            g: expand5(g2),
            b: expand5(b2),
        },
    )
}

fn base_colors_individual(top: u32) -> (BaseColor, BaseColor) {
    let r1 = (top & 0x0000f0) as i32;
    let g1 = ((top & 0x00f000) >> 8) as i32;
    let b1 = ((top & 0xf00000) >> 16) as i32;

    let r2 = ((top & 0x00000f) << 4) as i32;
    let g2 = ((top & 0x000f00) >> 4) as i32;
    let b2 = ((top & 0x0f0000) >> 12) as i32;

    let expand4 = |v: i32| v | (v >> 4);

    (
        BaseColor {
            r: expand4(r1),
            g: expand4(g1),
            b: expand4(b1),
        },
        BaseColor {
            r: expand4(r2),
            g: expand4(g2),
            b: expand4(b2),
        },
    )
}

/// 2 bit modulation selector of pixel (x, y). The least and most significant
/// bits live in two interleaved 16 bit planes of `bottom`.
fn selector(bottom: u32, x: usize, y: usize) -> usize {
    let index = x * TILE_SIZE + y;
    let msb = bottom << 1;

    let value = if index < 8 {
        ((bottom >> (index + 24)) & 1) + ((msb >> (index + 8)) & 2)
    } else {
        ((bottom >> (index + 8)) & 1) + ((msb >> (index - 8)) & 2)
    };

    value as usize
}
