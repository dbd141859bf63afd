//! SIMD-optimized operations for NNUE evaluation.
//!
//! Provides vectorized implementations for:
//! - Accumulator updates (wrapping add/subtract of i16 rows)
//! - Pairwise clipped products narrowed to u8
//! - u8 x i8 dot products for the first hidden layer
//!
//! Supports:
//! - `x86_64`: `AVX2` (compile-time or runtime detected)
//! - aarch64: NEON
//! - Fallback: the scalar reference in [`scalar`]
//!
//! Every path is bit-exact with the scalar reference.

use super::{L1, QA};

const HALF: usize = L1 / 2;

/// Portable reference kernels
pub(crate) mod scalar {
    use super::super::{L1, PAIRWISE_SHIFT, QA};
    use super::HALF;

    #[inline]
    pub(crate) fn add_assign(acc: &mut [i16; L1], row: &[i16; L1]) {
        for (a, &w) in acc.iter_mut().zip(row) {
            *a = a.wrapping_add(w);
        }
    }

    #[inline]
    pub(crate) fn sub_assign(acc: &mut [i16; L1], row: &[i16; L1]) {
        for (a, &w) in acc.iter_mut().zip(row) {
            *a = a.wrapping_sub(w);
        }
    }

    /// `out[i] = clamp(acc[i]) * clamp(acc[i + HALF]) >> 9`
    #[inline]
    pub(crate) fn pairwise(acc: &[i16; L1], out: &mut [u8]) {
        let (lo, hi) = acc.split_at(HALF);
        for ((o, &a), &b) in out.iter_mut().zip(lo).zip(hi) {
            let a = i32::from(a).clamp(0, QA);
            let b = i32::from(b).clamp(0, QA);
            *o = ((a * b) >> PAIRWISE_SHIFT) as u8;
        }
    }

    #[inline]
    pub(crate) fn dot(input: &[u8; L1], weights: &[i8; L1]) -> i32 {
        input
            .iter()
            .zip(weights)
            .map(|(&x, &w)| i32::from(x) * i32::from(w))
            .sum()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Add an embedding row to an accumulator
#[inline]
pub(crate) fn add_assign(acc: &mut [i16; L1], row: &[i16; L1]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { add_assign_neon(acc, row) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { add_assign_avx2(acc, row) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { add_assign_avx2(acc, row) }
        } else {
            scalar::add_assign(acc, row)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        scalar::add_assign(acc, row)
    }
}

/// Subtract an embedding row from an accumulator
#[inline]
pub(crate) fn sub_assign(acc: &mut [i16; L1], row: &[i16; L1]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { sub_assign_neon(acc, row) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { sub_assign_avx2(acc, row) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { sub_assign_avx2(acc, row) }
        } else {
            scalar::sub_assign(acc, row)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        scalar::sub_assign(acc, row)
    }
}

/// Pairwise activation of one perspective into `out` (length `L1 / 2`)
#[inline]
pub(crate) fn pairwise(acc: &[i16; L1], out: &mut [u8]) {
    assert_eq!(out.len(), HALF);

    #[cfg(target_arch = "aarch64")]
    {
        unsafe { pairwise_neon(acc, out) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { pairwise_avx2(acc, out) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { pairwise_avx2(acc, out) }
        } else {
            scalar::pairwise(acc, out)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        scalar::pairwise(acc, out)
    }
}

/// Exact dot product of activations and one weight row
#[inline]
#[must_use]
pub(crate) fn dot(input: &[u8; L1], weights: &[i8; L1]) -> i32 {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { dot_neon(input, weights) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { dot_avx2(input, weights) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { dot_avx2(input, weights) }
        } else {
            scalar::dot(input, weights)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        scalar::dot(input, weights)
    }
}

// ============================================================================
// NEON implementations (aarch64)
// ============================================================================

#[cfg(target_arch = "aarch64")]
unsafe fn add_assign_neon(acc: &mut [i16; L1], row: &[i16; L1]) {
    use std::arch::aarch64::{vaddq_s16, vld1q_s16, vst1q_s16};

    let acc_ptr = acc.as_mut_ptr();
    let row_ptr = row.as_ptr();

    for i in (0..L1).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(row_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vaddq_s16(a, w));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn sub_assign_neon(acc: &mut [i16; L1], row: &[i16; L1]) {
    use std::arch::aarch64::{vld1q_s16, vst1q_s16, vsubq_s16};

    let acc_ptr = acc.as_mut_ptr();
    let row_ptr = row.as_ptr();

    for i in (0..L1).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(row_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vsubq_s16(a, w));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn pairwise_neon(acc: &[i16; L1], out: &mut [u8]) {
    use std::arch::aarch64::{
        vcombine_u16, vdupq_n_s16, vget_low_u16, vld1q_s16, vmaxq_s16, vminq_s16, vmovn_u16,
        vmovn_u32, vmull_high_u16, vmull_u16, vreinterpretq_u16_s16, vshrq_n_u32, vst1_u8,
    };

    let acc_ptr = acc.as_ptr();
    let out_ptr = out.as_mut_ptr();
    let zero = vdupq_n_s16(0);
    let qa = vdupq_n_s16(QA as i16);

    for i in (0..HALF).step_by(8) {
        let a = vminq_s16(vmaxq_s16(vld1q_s16(acc_ptr.add(i)), zero), qa);
        let b = vminq_s16(vmaxq_s16(vld1q_s16(acc_ptr.add(HALF + i)), zero), qa);
        let a = vreinterpretq_u16_s16(a);
        let b = vreinterpretq_u16_s16(b);

        let lo = vshrq_n_u32::<9>(vmull_u16(vget_low_u16(a), vget_low_u16(b)));
        let hi = vshrq_n_u32::<9>(vmull_high_u16(a, b));
        let narrowed = vcombine_u16(vmovn_u32(lo), vmovn_u32(hi));
        vst1_u8(out_ptr.add(i), vmovn_u16(narrowed));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn dot_neon(input: &[u8; L1], weights: &[i8; L1]) -> i32 {
    use std::arch::aarch64::{
        vaddvq_s32, vdupq_n_s32, vget_low_s8, vld1q_s8, vld1q_u8, vmull_high_s8, vmull_s8,
        vpadalq_s16, vreinterpretq_s8_u8,
    };

    let in_ptr = input.as_ptr();
    let w_ptr = weights.as_ptr();
    let mut sum = vdupq_n_s32(0);

    // Activations never exceed 127, so reading them as i8 is lossless.
    for i in (0..L1).step_by(16) {
        let x = vreinterpretq_s8_u8(vld1q_u8(in_ptr.add(i)));
        let w = vld1q_s8(w_ptr.add(i));
        sum = vpadalq_s16(sum, vmull_s8(vget_low_s8(x), vget_low_s8(w)));
        sum = vpadalq_s16(sum, vmull_high_s8(x, w));
    }

    vaddvq_s32(sum)
}

// ============================================================================
// AVX2 implementations (x86_64 only)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn add_assign_avx2(acc: &mut [i16; L1], row: &[i16; L1]) {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_mut_ptr();
    let row_ptr = row.as_ptr();

    for i in (0..L1).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(row_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_add_epi16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sub_assign_avx2(acc: &mut [i16; L1], row: &[i16; L1]) {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_mut_ptr();
    let row_ptr = row.as_ptr();

    for i in (0..L1).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(row_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_sub_epi16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn pairwise_avx2(acc: &[i16; L1], out: &mut [u8]) {
    use std::arch::x86_64::*;

    let acc_ptr = acc.as_ptr();
    let out_ptr = out.as_mut_ptr();
    let zero = _mm256_setzero_si256();
    let qa = _mm256_set1_epi16(QA as i16);

    for i in (0..HALF).step_by(32) {
        let a0 = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let a1 = _mm256_loadu_si256(acc_ptr.add(i + 16) as *const __m256i);
        let b0 = _mm256_loadu_si256(acc_ptr.add(HALF + i) as *const __m256i);
        let b1 = _mm256_loadu_si256(acc_ptr.add(HALF + i + 16) as *const __m256i);

        let a0 = _mm256_min_epi16(_mm256_max_epi16(a0, zero), qa);
        let a1 = _mm256_min_epi16(_mm256_max_epi16(a1, zero), qa);
        let b0 = _mm256_min_epi16(_mm256_max_epi16(b0, zero), qa);
        let b1 = _mm256_min_epi16(_mm256_max_epi16(b1, zero), qa);

        // (a << 7) * b >> 16 == a * b >> 9 for a, b in [0, 255]
        let p0 = _mm256_mulhi_epu16(_mm256_slli_epi16::<7>(a0), b0);
        let p1 = _mm256_mulhi_epu16(_mm256_slli_epi16::<7>(a1), b1);
        let packed = _mm256_packus_epi16(p0, p1);
        let ordered = _mm256_permute4x64_epi64::<0b11_01_10_00>(packed);
        _mm256_storeu_si256(out_ptr.add(i) as *mut __m256i, ordered);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_avx2(input: &[u8; L1], weights: &[i8; L1]) -> i32 {
    use std::arch::x86_64::*;

    let in_ptr = input.as_ptr();
    let w_ptr = weights.as_ptr();
    let ones = _mm256_set1_epi16(1);
    let mut sum = _mm256_setzero_si256();

    // maddubs cannot saturate: inputs are at most 127.
    for i in (0..L1).step_by(32) {
        let x = _mm256_loadu_si256(in_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(w_ptr.add(i) as *const __m256i);
        let pairs = _mm256_maddubs_epi16(x, w);
        sum = _mm256_add_epi32(sum, _mm256_madd_epi16(pairs, ones));
    }

    let lo = _mm256_castsi256_si128(sum);
    let hi = _mm256_extracti128_si256::<1>(sum);
    let mut total = _mm_add_epi32(lo, hi);
    total = _mm_add_epi32(total, _mm_shuffle_epi32::<0b01_00_11_10>(total));
    total = _mm_add_epi32(total, _mm_shuffle_epi32::<0b10_11_00_01>(total));
    _mm_cvtsi128_si32(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn random_acc(rng: &mut StdRng) -> [i16; L1] {
        std::array::from_fn(|_| rng.gen_range(-600..=600))
    }

    #[test]
    fn add_and_sub_wrap_like_scalar() {
        let mut simd_acc = [i16::MAX - 10; L1];
        let mut scalar_acc = simd_acc;
        let row = [20i16; L1];

        add_assign(&mut simd_acc, &row);
        scalar::add_assign(&mut scalar_acc, &row);
        assert_eq!(simd_acc, scalar_acc);
        assert_eq!(simd_acc[0], i16::MIN + 9);

        sub_assign(&mut simd_acc, &row);
        assert_eq!(simd_acc, [i16::MAX - 10; L1]);
    }

    #[test]
    fn pairwise_matches_scalar() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..8 {
            let acc = random_acc(&mut rng);
            let mut simd_out = [0u8; HALF];
            let mut scalar_out = [0u8; HALF];
            pairwise(&acc, &mut simd_out);
            scalar::pairwise(&acc, &mut scalar_out);
            assert_eq!(simd_out, scalar_out);
            assert!(simd_out.iter().all(|&v| v <= 127));
        }
    }

    #[test]
    fn pairwise_saturated_inputs() {
        let acc = [QA as i16 + 100; L1];
        let mut out = [0u8; HALF];
        pairwise(&acc, &mut out);
        assert!(out.iter().all(|&v| v == ((255 * 255) >> 9) as u8));
    }

    #[test]
    fn dot_matches_scalar() {
        let mut rng = StdRng::seed_from_u64(11);
        let input: [u8; L1] = std::array::from_fn(|_| rng.gen_range(0..=127));
        let weights: [i8; L1] = std::array::from_fn(|_| rng.gen());
        assert_eq!(dot(&input, &weights), scalar::dot(&input, &weights));

        let extreme_in = [127u8; L1];
        let extreme_w = [i8::MIN; L1];
        assert_eq!(dot(&extreme_in, &extreme_w), 127 * -128 * L1 as i32);
    }
}
