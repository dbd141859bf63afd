//! Search tunables.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immutable search configuration. `Default` holds the tuned values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
    // Reverse futility pruning
    pub rfp_max_depth: i32,
    pub rfp_margin: i32,

    // Null move pruning
    pub nmp_min_depth: i32,
    pub nmp_base_reduction: i32,

    // Per-move pruning
    pub lmp_base: i32,
    pub fp_margin: i32,
    pub see_quiet_margin: i32,
    pub see_noisy_margin: i32,
    pub hist_prune_mult: i32,
    pub hist_prune_base: i32,

    // Singular extensions
    pub singular_min_depth: i32,
    pub singular_tt_depth_margin: i32,
    pub singular_beta_mult: i32,
    pub double_ext_margin: i32,

    // Late move reductions
    pub lmr_base: f64,
    pub lmr_div: f64,
    pub lmr_min_depth: i32,
    pub lmr_min_moves: i32,
    pub lmr_hist_div: i32,

    // Correction history weights, applied over 2048
    pub pawn_corr_weight: i32,
    pub minor_corr_weight: i32,
    pub major_corr_weight: i32,
    pub non_pawn_stm_corr_weight: i32,
    pub non_pawn_ntm_corr_weight: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            rfp_max_depth: 5,
            rfp_margin: 100,

            nmp_min_depth: 3,
            nmp_base_reduction: 3,

            lmp_base: 3,
            fp_margin: 250,
            see_quiet_margin: -60,
            see_noisy_margin: -30,
            hist_prune_mult: -2600,
            hist_prune_base: 600,

            singular_min_depth: 8,
            singular_tt_depth_margin: 3,
            singular_beta_mult: 2,
            double_ext_margin: 50,

            lmr_base: 0.5,
            lmr_div: 3.0,
            lmr_min_depth: 3,
            lmr_min_moves: 4,
            lmr_hist_div: 8192,

            pawn_corr_weight: 250,
            minor_corr_weight: 220,
            major_corr_weight: 130,
            non_pawn_stm_corr_weight: 240,
            non_pawn_ntm_corr_weight: 240,
        }
    }
}

impl SearchConfig {
    /// Log-log reduction table indexed by `[depth][move number]`
    #[must_use]
    pub fn lmr_table(&self) -> Box<[[i32; 64]; 64]> {
        let mut table = Box::new([[0i32; 64]; 64]);
        for (depth, row) in table.iter_mut().enumerate().skip(1) {
            for (moves, cell) in row.iter_mut().enumerate().skip(1) {
                let r = self.lmr_base + (depth as f64).ln() * (moves as f64).ln() / self.lmr_div;
                *cell = r.max(0.0) as i32;
            }
        }
        table
    }
}
