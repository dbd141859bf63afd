//! Sparse first hidden layer.
//!
//! Rows are grouped in chunks of 16. Each chunk keeps one bitmask over the
//! input columns, the OR of every row's nonzero weights, and each row stores
//! only the weights at those columns in ascending column order. Columns
//! outside the mask are zero for every row in the chunk and are skipped.

use super::{L1, L2};

/// Rows per chunk sharing one column mask
pub const CHUNK_ROWS: usize = 16;

const MASK_WORDS: usize = L1 / 64;

#[derive(Clone, Debug)]
pub(crate) struct SparseLayer {
    /// One column mask per chunk of rows
    masks: Vec<[u64; MASK_WORDS]>,
    /// Packed nonzero weights per row
    values: Vec<Vec<i8>>,
}

impl SparseLayer {
    /// Repack a dense `[L2][L1]` weight matrix
    pub(crate) fn pack(dense: &[[i8; L1]]) -> Self {
        debug_assert_eq!(dense.len() % CHUNK_ROWS, 0);

        let mut masks = Vec::with_capacity(dense.len() / CHUNK_ROWS);
        let mut values = Vec::with_capacity(dense.len());

        for chunk in dense.chunks(CHUNK_ROWS) {
            let mut mask = [0u64; MASK_WORDS];
            for row in chunk {
                for (col, &w) in row.iter().enumerate() {
                    if w != 0 {
                        mask[col / 64] |= 1u64 << (col % 64);
                    }
                }
            }

            for row in chunk {
                let packed = columns(&mask).map(|col| row[col]).collect();
                values.push(packed);
            }
            masks.push(mask);
        }

        SparseLayer { masks, values }
    }

    /// Number of stored weights, zeros inside a chunk's mask included
    #[cfg(test)]
    pub(crate) fn stored(&self) -> usize {
        self.values.iter().map(Vec::len).sum()
    }

    pub(crate) fn forward(&self, input: &[u8; L1], out: &mut [i32; L2]) {
        for (chunk, mask) in self.masks.iter().enumerate() {
            let rows = &self.values[chunk * CHUNK_ROWS..(chunk + 1) * CHUNK_ROWS];
            let outs = &mut out[chunk * CHUNK_ROWS..(chunk + 1) * CHUNK_ROWS];

            for (k, col) in columns(mask).enumerate() {
                let x = i32::from(input[col]);
                if x == 0 {
                    continue;
                }
                for (sum, row) in outs.iter_mut().zip(rows) {
                    *sum += x * i32::from(row[k]);
                }
            }
        }
    }
}

/// Set columns of a mask in ascending order
fn columns(mask: &[u64; MASK_WORDS]) -> impl Iterator<Item = usize> + '_ {
    mask.iter().enumerate().flat_map(|(word, &bits)| {
        let mut bits = bits;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let bit = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(word * 64 + bit)
        })
    })
}
