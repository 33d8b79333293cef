use super::TextureError;
use crate::{
    etc1::{self, ALPHA_BLOCK_SIZE, COLOR_BLOCK_SIZE, TILE_SIZE},
    ScrambleTable,
};
use image::RgbaImage;

const BYTES_PER_PIXEL: usize = 4;

/// Decode raw ETC1 (or ETC1A4 with `has_alpha`) block data into an image.
///
/// Bytes past the last block of the top level are ignored.
pub fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    has_alpha: bool,
) -> Result<RgbaImage, TextureError> {
    if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    let tiles_x = width as usize / TILE_SIZE;
    let tiles_y = height as usize / TILE_SIZE;

    let table = ScrambleTable::cached(tiles_x, tiles_y);
    if !table.is_permutation() {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    let expected = table.len() * etc1::block_size(has_alpha);
    if data.len() < expected {
        return Err(TextureError::InsufficientData {
            expected,
            actual: data.len(),
        });
    }

    let stored = decode_tiles(data, width, height, has_alpha);

    let stride = width as usize * BYTES_PER_PIXEL;
    let row_len = TILE_SIZE * BYTES_PER_PIXEL;
    let mut output = RgbaImage::new(width, height);
    let src = stored.as_raw();
    let dst: &mut [u8] = &mut output;

    for (i, &source) in table.as_slice().iter().enumerate() {
        let (dst_x, dst_y) = (i % tiles_x, i / tiles_x);
        let (src_x, src_y) = (source % tiles_x, source / tiles_x);

        for row in 0..TILE_SIZE {
            let src_offset = (src_y * TILE_SIZE + row) * stride + src_x * row_len;
            let dst_offset = (dst_y * TILE_SIZE + row) * stride + dst_x * row_len;

            dst[dst_offset..dst_offset + row_len]
                .copy_from_slice(&src[src_offset..src_offset + row_len]);
        }
    }

    Ok(output)
}

/// Decode every block in storage order, placing block `n` at raster tile `n`.
fn decode_tiles(data: &[u8], width: u32, height: u32, has_alpha: bool) -> RgbaImage {
    let tiles_x = width / TILE_SIZE as u32;
    let mut image = RgbaImage::new(width, height);

    let blocks = data
        .chunks_exact(etc1::block_size(has_alpha))
        .take(((width / 4) * (height / 4)) as usize);

    for (index, block) in blocks.enumerate() {
        let tile = if has_alpha {
            let (alpha, color) = block.split_at(ALPHA_BLOCK_SIZE);
            decode_block_slices(color, Some(alpha))
        } else {
            decode_block_slices(block, None)
        };

        let x = (index as u32 % tiles_x) * TILE_SIZE as u32;
        let y = (index as u32 / tiles_x) * TILE_SIZE as u32;
        for (ty, row) in tile.pixels().chunks_exact(TILE_SIZE).enumerate() {
            for (tx, pixel) in row.iter().enumerate() {
                image.put_pixel(x + tx as u32, y + ty as u32, *pixel);
            }
        }
    }

    image
}

fn decode_block_slices(color: &[u8], alpha: Option<&[u8]>) -> etc1::Tile {
    let mut color_block = [0; COLOR_BLOCK_SIZE];
    color_block.copy_from_slice(color);

    match alpha {
        Some(alpha) => {
            let mut alpha_block = [0; ALPHA_BLOCK_SIZE];
            alpha_block.copy_from_slice(alpha);
            etc1::decode_block(&color_block, Some(&alpha_block))
        }
        None => etc1::decode_block(&color_block, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 8)]
    #[case(8, 0)]
    #[case(6, 8)]
    #[case(8, 10)]
    fn rejects_bad_dimensions(#[case] width: u32, #[case] height: u32) {
        assert!(matches!(
            decode_raw(&[0; 1024], width, height, false),
            Err(TextureError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rejects_odd_tile_grid() {
        // 1x2 tiles scramble outside the grid
        assert!(matches!(
            decode_raw(&[0; 16], 4, 8, false),
            Err(TextureError::InvalidDimensions {
                width: 4,
                height: 8
            })
        ));
    }

    #[test]
    fn rejects_short_data() {
        assert_eq!(
            decode_raw(&[0; 63], 8, 8, true).unwrap_err().to_string(),
            TextureError::InsufficientData {
                expected: 64,
                actual: 63
            }
            .to_string()
        );
    }

    #[test]
    fn single_block() {
        let color = [0, 0, 0, 0, 0x00, 0x32, 0x10, 0x54];
        let image = decode_raw(&color, 4, 4, false).unwrap();

        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.as_raw().len(), 4 * 4 * 4);
        assert_eq!(image.get_pixel(0, 0).0, [0x57, 0x13, 0x35, 0xff]);
        assert_eq!(image.get_pixel(3, 3).0, [0x46, 0x02, 0x24, 0xff]);
    }

    #[test]
    fn tiles_are_unscrambled() {
        // 16x16 texture, every block a flat colour whose red channel encodes its storage index
        let mut data = Vec::new();
        for index in 0..16u8 {
            data.extend_from_slice(&[0, 0, 0, 0, 0x00, 0x00, 0x00, index << 4]);
        }

        let image = decode_raw(&data, 16, 16, false).unwrap();
        let storage_index = |tx: u32, ty: u32| (image.get_pixel(tx * 4, ty * 4)[0] - 2) >> 4;

        let table = ScrambleTable::new(4, 4);
        for ty in 0..4 {
            for tx in 0..4 {
                let raster = (ty * 4 + tx) as usize;
                assert_eq!(storage_index(tx, ty) as usize, table.as_slice()[raster]);
            }
        }
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut data = vec![0; 8 * 4];
        let image = decode_raw(&data, 8, 8, false).unwrap();

        data.extend_from_slice(&[0xff; 24]);
        assert_eq!(decode_raw(&data, 8, 8, false).unwrap(), image);
    }
}
