//! NNUE network weights and the forward pass.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::prelude::*;

use super::accumulator::Accumulator;
use super::simd::{self, scalar};
use super::sparse::SparseLayer;
use super::{Kernel, EVAL_SCALE, INPUTS, L1, L2, L3, QA, QB};
use crate::board::Color;

/// Dequantizes layer-1 integer sums: pairwise outputs carry a factor of
/// `QA * QA / 2^9`, weights a factor of `QB`.
const L1_DEQUANT: f32 = (1 << super::PAIRWISE_SHIFT) as f32 / (QA * QA * QB) as f32;

/// Process-wide network used when no weight file is loaded
pub static DEFAULT_NETWORK: Lazy<Arc<Network>> = Lazy::new(|| Arc::new(Network::random(42)));

/// Error type for network loading
#[derive(Debug)]
pub enum NetworkError {
    /// Reading or writing the weight blob failed (including a truncated file)
    Io(io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Io(err) => write!(f, "Failed to read network: {err}"),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for NetworkError {
    fn from(err: io::Error) -> Self {
        NetworkError::Io(err)
    }
}

/// NNUE network weights
#[derive(Clone)]
pub struct Network {
    /// Feature embedding `[INPUTS][L1]`
    pub(crate) embedding: Box<[[i16; L1]]>,
    pub(crate) embedding_bias: Box<[i16; L1]>,
    /// Dense first hidden layer `[L2][L1]`
    pub(crate) l1_weights: Box<[[i8; L1]]>,
    pub(crate) l1_bias: [f32; L2],
    /// Repacked copy of `l1_weights` for the sparse kernel
    pub(crate) l1_sparse: SparseLayer,
    /// Second hidden layer `[L3][L2]`
    pub(crate) l2_weights: [[f32; L2]; L3],
    pub(crate) l2_bias: [f32; L3],
    pub(crate) out_weights: [f32; L3],
    pub(crate) out_bias: f32,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("inputs", &INPUTS)
            .field("l1", &L1)
            .field("l2", &L2)
            .field("l3", &L3)
            .finish_non_exhaustive()
    }
}

impl Network {
    /// Deterministic network from a seeded RNG, for running without a weight file
    #[must_use]
    pub fn random(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let embedding = (0..INPUTS)
            .map(|_| std::array::from_fn(|_| rng.gen_range(-48..=48)))
            .collect::<Vec<[i16; L1]>>()
            .into_boxed_slice();
        let embedding_bias = Box::new(std::array::from_fn(|_| rng.gen_range(0..=96)));

        // About half of the first-layer weights are zero so the sparse path has work to skip.
        let l1_weights = (0..L2)
            .map(|_| {
                std::array::from_fn(|_| {
                    if rng.gen_bool(0.5) {
                        0
                    } else {
                        rng.gen_range(-24..=24)
                    }
                })
            })
            .collect::<Vec<[i8; L1]>>()
            .into_boxed_slice();
        let l1_bias = std::array::from_fn(|_| rng.gen_range(-0.1..0.1));
        let l2_weights = std::array::from_fn(|_| std::array::from_fn(|_| rng.gen_range(-0.5..0.5)));
        let l2_bias = std::array::from_fn(|_| rng.gen_range(-0.1..0.1));
        let out_weights = std::array::from_fn(|_| rng.gen_range(-0.5..0.5));
        let out_bias = rng.gen_range(-0.05..0.05);

        let l1_sparse = SparseLayer::pack(&l1_weights);
        Network {
            embedding,
            embedding_bias,
            l1_weights,
            l1_bias,
            l1_sparse,
            l2_weights,
            l2_bias,
            out_weights,
            out_bias,
        }
    }

    /// Load a weight blob from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let file = File::open(path)?;
        Self::from_reader(&mut BufReader::new(file))
    }

    /// Read little-endian weights in layer order. Trailing bytes are ignored.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, NetworkError> {
        let mut embedding = vec![[0i16; L1]; INPUTS].into_boxed_slice();
        for row in embedding.iter_mut() {
            read_i16s(reader, row)?;
        }
        let mut embedding_bias = Box::new([0i16; L1]);
        read_i16s(reader, &mut embedding_bias[..])?;

        let mut l1_weights = vec![[0i8; L1]; L2].into_boxed_slice();
        for row in l1_weights.iter_mut() {
            let mut buf = [0u8; L1];
            reader.read_exact(&mut buf)?;
            for (w, b) in row.iter_mut().zip(buf) {
                *w = i8::from_le_bytes([b]);
            }
        }

        let mut l1_bias = [0f32; L2];
        read_f32s(reader, &mut l1_bias)?;
        let mut l2_weights = [[0f32; L2]; L3];
        for row in &mut l2_weights {
            read_f32s(reader, row)?;
        }
        let mut l2_bias = [0f32; L3];
        read_f32s(reader, &mut l2_bias)?;
        let mut out_weights = [0f32; L3];
        read_f32s(reader, &mut out_weights)?;
        let mut out_bias = [0f32; 1];
        read_f32s(reader, &mut out_bias)?;

        let l1_sparse = SparseLayer::pack(&l1_weights);
        Ok(Network {
            embedding,
            embedding_bias,
            l1_weights,
            l1_bias,
            l1_sparse,
            l2_weights,
            l2_bias,
            out_weights,
            out_bias: out_bias[0],
        })
    }

    /// Write the same layout `from_reader` consumes
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), NetworkError> {
        let mut out = BufWriter::new(writer);
        for row in self.embedding.iter() {
            for v in row {
                out.write_all(&v.to_le_bytes())?;
            }
        }
        for v in self.embedding_bias.iter() {
            out.write_all(&v.to_le_bytes())?;
        }
        for row in self.l1_weights.iter() {
            for v in row {
                out.write_all(&v.to_le_bytes())?;
            }
        }
        let floats = self
            .l1_bias
            .iter()
            .chain(self.l2_weights.iter().flatten())
            .chain(&self.l2_bias)
            .chain(&self.out_weights)
            .chain(std::iter::once(&self.out_bias));
        for v in floats {
            out.write_all(&v.to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Embedding row for one feature
    #[inline]
    pub(crate) fn row(&self, feature: usize) -> &[i16; L1] {
        &self.embedding[feature]
    }

    #[inline]
    pub(crate) fn bias(&self) -> &[i16; L1] {
        &self.embedding_bias
    }

    /// Evaluate with the default kernel, centipawns from `stm`'s point of view
    #[inline]
    #[must_use]
    pub fn evaluate(&self, acc: &Accumulator, stm: Color) -> i32 {
        self.evaluate_with(acc, stm, Kernel::default())
    }

    /// Evaluate with an explicit kernel
    #[must_use]
    pub fn evaluate_with(&self, acc: &Accumulator, stm: Color, kernel: Kernel) -> i32 {
        let hidden = self.layer1(acc, stm, kernel);
        self.forward_tail(&hidden)
    }

    /// Integer first hidden layer
    pub(crate) fn layer1(&self, acc: &Accumulator, stm: Color, kernel: Kernel) -> [i32; L2] {
        let mut input = [0u8; L1];
        let (front, back) = input.split_at_mut(L1 / 2);
        let us = acc.perspective(stm);
        let them = acc.perspective(stm.opponent());

        let mut sums = [0i32; L2];
        match kernel {
            Kernel::Scalar => {
                scalar::pairwise(us, front);
                scalar::pairwise(them, back);
                for (sum, row) in sums.iter_mut().zip(self.l1_weights.iter()) {
                    *sum = scalar::dot(&input, row);
                }
            }
            Kernel::Simd => {
                simd::pairwise(us, front);
                simd::pairwise(them, back);
                for (sum, row) in sums.iter_mut().zip(self.l1_weights.iter()) {
                    *sum = simd::dot(&input, row);
                }
            }
            Kernel::Sparse => {
                simd::pairwise(us, front);
                simd::pairwise(them, back);
                self.l1_sparse.forward(&input, &mut sums);
            }
        }
        sums
    }

    /// Shared float layers after the integer first layer
    fn forward_tail(&self, sums: &[i32; L2]) -> i32 {
        let h1: [f32; L2] =
            std::array::from_fn(|i| screlu(sums[i] as f32 * L1_DEQUANT + self.l1_bias[i]));

        let h2: [f32; L3] = std::array::from_fn(|j| {
            let z = self.l2_weights[j]
                .iter()
                .zip(&h1)
                .fold(self.l2_bias[j], |acc, (w, x)| acc + w * x);
            screlu(z)
        });

        let out = self
            .out_weights
            .iter()
            .zip(&h2)
            .fold(self.out_bias, |acc, (w, x)| acc + w * x);

        (out * EVAL_SCALE) as i32
    }
}

/// Clipped square activation
#[inline]
fn screlu(x: f32) -> f32 {
    let c = x.clamp(0.0, 1.0);
    c * c
}

fn read_i16s<R: Read>(reader: &mut R, out: &mut [i16]) -> io::Result<()> {
    let mut buf = vec![0u8; out.len() * 2];
    reader.read_exact(&mut buf)?;
    for (v, bytes) in out.iter_mut().zip(buf.chunks_exact(2)) {
        *v = i16::from_le_bytes([bytes[0], bytes[1]]);
    }
    Ok(())
}

fn read_f32s<R: Read>(reader: &mut R, out: &mut [f32]) -> io::Result<()> {
    let mut buf = vec![0u8; out.len() * 4];
    reader.read_exact(&mut buf)?;
    for (v, bytes) in out.iter_mut().zip(buf.chunks_exact(4)) {
        *v = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    #[test]
    fn random_network_is_deterministic() {
        let a = Network::random(9);
        let b = Network::random(9);
        assert_eq!(a.embedding, b.embedding);
        assert_eq!(a.out_bias, b.out_bias);
        assert_ne!(Network::random(10).embedding, a.embedding);
    }

    #[test]
    fn blob_roundtrip_preserves_evaluation() {
        let net = Network::random(1);
        let mut blob = Vec::new();
        net.to_writer(&mut blob).unwrap();
        let expected = INPUTS * L1 * 2 + L1 * 2 + L2 * L1 + (L2 + L3 * L2 + L3 + L3 + 1) * 4;
        assert_eq!(blob.len(), expected);

        blob.extend_from_slice(&[0xAB; 7]);
        let loaded = Network::from_reader(&mut blob.as_slice()).unwrap();

        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        )
        .unwrap();
        let a = Accumulator::reset(&pos, &net);
        let b = Accumulator::reset(&pos, &loaded);
        assert_eq!(net.evaluate(&a, Color::White), loaded.evaluate(&b, Color::White));
    }

    #[test]
    fn truncated_blob_is_an_error() {
        let blob = vec![0u8; 1000];
        let err = Network::from_reader(&mut blob.as_slice()).unwrap_err();
        assert!(err.to_string().contains("network"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn kernels_agree_on_layer1() {
        let net = Network::random(2);
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let acc = Accumulator::reset(&pos, &net);
            for stm in Color::BOTH {
                let reference = net.layer1(&acc, stm, Kernel::Scalar);
                for kernel in Kernel::ALL {
                    assert_eq!(net.layer1(&acc, stm, kernel), reference, "{kernel:?} on {fen}");
                    assert_eq!(
                        net.evaluate_with(&acc, stm, kernel),
                        net.evaluate_with(&acc, stm, Kernel::Scalar)
                    );
                }
            }
        }
    }

    #[test]
    fn missing_file_reports_io_error() {
        assert!(matches!(
            Network::load("/nonexistent/net.bin"),
            Err(NetworkError::Io(_))
        ));
    }
}
