use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

static SCRAMBLE_TABLES: LazyLock<RwLock<HashMap<(usize, usize), Arc<ScrambleTable>>>> =
    LazyLock::new(Default::default);

/// Order in which the 3DS stores the 4x4 blocks of an ETC1 texture.
///
/// Entry `i` is the storage position of the block that ends up at raster
/// position `i`. Blocks are grouped in 2x2 squares, squares are laid out row by
/// row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrambleTable {
    order: Vec<usize>,
}

impl ScrambleTable {
    pub fn new(tiles_x: usize, tiles_y: usize) -> Self {
        let len = tiles_x * tiles_y;
        let mut order = Vec::with_capacity(len);

        let mut base_number = 0usize;
        let mut row_number = 0usize;
        let mut base_toggle = false;
        let mut row_toggle = false;

        for tile in 0..len {
            if tile % tiles_x == 0 && tile > 0 {
                if !row_toggle {
                    row_toggle = true;
                    row_number += 2;
                    base_number = row_number;
                } else {
                    row_toggle = false;
                    base_number -= 2;
                    row_number = base_number;
                }
            }

            order.push(base_number);

            if !base_toggle {
                base_toggle = true;
                base_number += 1;
            } else {
                base_toggle = false;
                base_number += 3;
            }
        }

        Self { order }
    }

    /// Shared table for the given grid, built on first use.
    pub fn cached(tiles_x: usize, tiles_y: usize) -> Arc<Self> {
        let key = (tiles_x, tiles_y);

        if let Some(table) = SCRAMBLE_TABLES
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return table.clone();
        }

        let mut tables = SCRAMBLE_TABLES
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Building scramble table for {}x{} tiles", tiles_x, tiles_y);
                Arc::new(Self::new(tiles_x, tiles_y))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    /// Whether every tile of the grid appears exactly once. Only holds for grids with even
    /// side lengths (and the single tile grid).
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.order.len()];

        for &index in &self.order {
            match seen.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                _ => return false,
            }
        }

        true
    }
}
