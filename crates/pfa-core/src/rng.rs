//! Deterministic pseudo-random generator.
//!
//! MT19937 seeded with `init_by_array` over the little-endian 32-bit words of
//! `|seed|`, with the draw algorithms of the reference scoring engine. Given
//! the same seed and the same sequence of draws, every output is
//! bit-for-bit reproducible.
//!
//! Bounded integer draws scale a 53-bit double when the range is narrower
//! than 2^53 and fall back to rejection sampling on raw bits otherwise, so a
//! draw consumes a fixed number of generator outputs except on the wide path.

use std::f64::consts::TAU;

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Ranges at least this wide use rejection sampling.
const FLOAT_RANGE_LIMIT: u128 = 1 << 53;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RngError {
    #[error("size must be positive")]
    NonPositiveSize,

    #[error("high must be greater than low")]
    EmptyRange,

    #[error("population must not be empty")]
    EmptyPopulation,

    #[error("sample size exceeds population")]
    SampleTooLarge,

    #[error("invalid code point {0:#x}")]
    InvalidCodePoint(u32),

    #[error("distribution {0}")]
    InvalidDistribution(&'static str),
}

pub type Result<T> = std::result::Result<T, RngError>;

/// Mersenne Twister state plus the cached second Box-Muller variate.
#[derive(Clone)]
pub struct Rng {
    state: Box<[u32; N]>,
    index: usize,
    gauss_next: Option<f64>,
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rng")
            .field("index", &self.index)
            .field("gauss_next", &self.gauss_next)
            .finish_non_exhaustive()
    }
}

impl Rng {
    pub fn from_seed(seed: i64) -> Self {
        let mut key = Vec::with_capacity(2);
        let mut rest = seed.unsigned_abs();
        while rest > 0 {
            key.push(rest as u32);
            rest >>= 32;
        }
        if key.is_empty() {
            key.push(0);
        }

        let mut rng = Self {
            state: Box::new([0; N]),
            index: N,
            gauss_next: None,
        };
        rng.init_by_array(&key);
        rng
    }

    /// Seed from operating system entropy, falling back to the clock.
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        let seed = match getrandom::fill(&mut buf) {
            Ok(()) => i64::from_le_bytes(buf),
            Err(_) => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as i64)
                .unwrap_or_default(),
        };
        Self::from_seed(seed)
    }

    fn init_genrand(&mut self, seed: u32) {
        let mt = &mut self.state;
        mt[0] = seed;
        for i in 1..N {
            mt[i] = 1_812_433_253u32
                .wrapping_mul(mt[i - 1] ^ (mt[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        self.index = N;
    }

    fn init_by_array(&mut self, key: &[u32]) {
        self.init_genrand(19_650_218);
        let mt = &mut self.state;
        let (mut i, mut j) = (1usize, 0usize);

        for _ in 0..N.max(key.len()) {
            let prev = mt[i - 1] ^ (mt[i - 1] >> 30);
            mt[i] = (mt[i] ^ prev.wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                mt[0] = mt[N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..N - 1 {
            let prev = mt[i - 1] ^ (mt[i - 1] >> 30);
            mt[i] = (mt[i] ^ prev.wrapping_mul(1_566_083_941)).wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                mt[0] = mt[N - 1];
                i = 1;
            }
        }
        mt[0] = UPPER_MASK;
    }

    fn twist(&mut self) {
        let mt = &mut self.state;
        for kk in 0..N {
            let y = (mt[kk] & UPPER_MASK) | (mt[(kk + 1) % N] & LOWER_MASK);
            let mag = if y & 1 == 1 { MATRIX_A } else { 0 };
            mt[kk] = mt[(kk + M) % N] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    /// Uniform double in `[0, 1)` with 53 bits of precision.
    pub fn random(&mut self) -> f64 {
        let a = f64::from(self.next_u32() >> 5);
        let b = f64::from(self.next_u32() >> 6);
        (a * 67_108_864.0 + b) * (1.0 / 9_007_199_254_740_992.0)
    }

    /// `k` random bits (`k <= 128`), assembled least significant word first.
    pub fn getrandbits(&mut self, k: u32) -> u128 {
        debug_assert!(k <= 128);
        if k == 0 {
            return 0;
        }
        if k <= 32 {
            return u128::from(self.next_u32() >> (32 - k));
        }

        let mut result = 0u128;
        let mut remaining = k;
        let mut shift = 0;
        while remaining > 0 {
            let mut word = self.next_u32();
            if remaining < 32 {
                word >>= 32 - remaining;
            }
            result |= u128::from(word) << shift;
            shift += 32;
            remaining = remaining.saturating_sub(32);
        }
        result
    }

    fn randbelow(&mut self, n: u128) -> u128 {
        let k = (1.00001 + ((n - 1) as f64).ln() / 2f64.ln()) as u32;
        loop {
            let r = self.getrandbits(k);
            if r < n {
                return r;
            }
        }
    }

    /// Uniform integer in `[lo, hi)`.
    pub fn randrange(&mut self, lo: i128, hi: i128) -> Result<i128> {
        if hi <= lo {
            return Err(RngError::EmptyRange);
        }
        let width = (hi - lo) as u128;
        if width >= FLOAT_RANGE_LIMIT {
            return Ok(lo + self.randbelow(width) as i128);
        }
        Ok(lo + (self.random() * width as f64) as i128)
    }

    fn index_below(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(RngError::EmptyPopulation);
        }
        Ok(self.randrange(0, len as i128)? as usize)
    }

    pub fn int(&mut self) -> i32 {
        let lo = i128::from(i32::MIN);
        let hi = i128::from(i32::MAX) + 1;
        self.randrange(lo, hi).map_or(0, |x| x as i32)
    }

    pub fn int_range(&mut self, lo: i32, hi: i32) -> Result<i32> {
        Ok(self.randrange(i128::from(lo), i128::from(hi))? as i32)
    }

    pub fn long(&mut self) -> i64 {
        let lo = i128::from(i64::MIN);
        let hi = i128::from(i64::MAX) + 1;
        self.randrange(lo, hi).map_or(0, |x| x as i64)
    }

    pub fn long_range(&mut self, lo: i64, hi: i64) -> Result<i64> {
        Ok(self.randrange(i128::from(lo), i128::from(hi))? as i64)
    }

    /// Uniform double in `[lo, hi)`.
    pub fn double(&mut self, lo: f64, hi: f64) -> Result<f64> {
        // NaN bounds fail this check too.
        if !(hi > lo) {
            return Err(RngError::EmptyRange);
        }
        let x = lo + (hi - lo) * self.random();
        // Rounding can land on `hi` when the range is a few ulps wide.
        Ok(if x < hi { x } else { hi.next_down() })
    }

    /// Uniform float in `[lo, hi)`, drawn in double precision.
    pub fn float(&mut self, lo: f32, hi: f32) -> Result<f32> {
        let x = self.double(f64::from(lo), f64::from(hi))? as f32;
        Ok(if x < hi { x } else { hi.next_down() })
    }

    /// Normal variate by Box-Muller; every other call uses the cached value.
    pub fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        let z = match self.gauss_next.take() {
            Some(z) => z,
            None => {
                let x2pi = self.random() * TAU;
                let g2rad = (-2.0 * (1.0 - self.random()).ln()).sqrt();
                self.gauss_next = Some(x2pi.sin() * g2rad);
                x2pi.cos() * g2rad
            }
        };
        mu + z * sigma
    }

    /// `size` code points drawn from `[1, 0xD800]`; a drawn `0xD800` becomes U+FFFD.
    pub fn string(&mut self, size: i32) -> Result<String> {
        let size = positive(size)?;
        let mut out = String::with_capacity(size * 3);
        for _ in 0..size {
            let cp = self.randrange(1, 0xD801)? as u32;
            out.push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        Ok(out)
    }

    /// `size` code points drawn uniformly from `alphabet`.
    pub fn string_from(&mut self, size: i32, alphabet: &str) -> Result<String> {
        let size = positive(size)?;
        let chars: Vec<char> = alphabet.chars().collect();
        let mut out = String::with_capacity(size);
        for _ in 0..size {
            out.push(chars[self.index_below(chars.len())?]);
        }
        Ok(out)
    }

    /// `size` code points drawn from `[lo, hi)`.
    pub fn string_between(&mut self, size: i32, lo: i32, hi: i32) -> Result<String> {
        let size = positive(size)?;
        if hi <= lo {
            return Err(RngError::EmptyRange);
        }
        let mut out = String::with_capacity(size);
        for _ in 0..size {
            let cp = self.int_range(lo, hi)? as u32;
            out.push(char::from_u32(cp).ok_or(RngError::InvalidCodePoint(cp))?);
        }
        Ok(out)
    }

    pub fn bytes(&mut self, size: i32) -> Result<Vec<u8>> {
        self.bytes_between(size, 0, 256)
    }

    pub fn bytes_from(&mut self, size: i32, population: &[u8]) -> Result<Vec<u8>> {
        let size = positive(size)?;
        (0..size)
            .map(|_| Ok(population[self.index_below(population.len())?]))
            .collect()
    }

    /// `size` bytes drawn from `[lo, hi)`, with `0 <= lo < hi <= 256`.
    pub fn bytes_between(&mut self, size: i32, lo: i32, hi: i32) -> Result<Vec<u8>> {
        let size = positive(size)?;
        if hi <= lo || lo < 0 || hi > 256 {
            return Err(RngError::EmptyRange);
        }
        (0..size).map(|_| Ok(self.int_range(lo, hi)? as u8)).collect()
    }

    /// Random RFC 4122 version 4 UUID.
    pub fn uuid4(&mut self) -> String {
        let time_low = self.getrandbits(32);
        let time_mid = self.getrandbits(16);
        let time_hi = self.getrandbits(12);
        let variant = 8 + self.getrandbits(2);
        let clock_seq = self.getrandbits(12);
        let node = self.getrandbits(48);
        format!("{time_low:08x}-{time_mid:04x}-4{time_hi:03x}-{variant:x}{clock_seq:03x}-{node:012x}")
    }

    /// Uniform index into a population of `len` items.
    pub fn choice(&mut self, len: usize) -> Result<usize> {
        self.index_below(len)
    }

    /// `k` distinct indexes into a population of `len` items, in draw order.
    ///
    /// Small populations are drawn by partial shuffle, large ones by
    /// rejecting repeated selections.
    pub fn sample(&mut self, len: usize, k: usize) -> Result<Vec<usize>> {
        if k > len {
            return Err(RngError::SampleTooLarge);
        }
        let mut set_size = 21usize;
        if k > 5 {
            let exp = ((k as f64 * 3.0).ln() / 4f64.ln()).ceil() as u32;
            set_size += 4usize.saturating_pow(exp);
        }

        let mut result = Vec::with_capacity(k);
        if len <= set_size {
            let mut pool: Vec<usize> = (0..len).collect();
            for i in 0..k {
                let j = (self.random() * (len - i) as f64) as usize;
                result.push(pool[j]);
                pool[j] = pool[len - i - 1];
            }
        } else {
            let mut selected = std::collections::HashSet::with_capacity(k);
            for _ in 0..k {
                let mut j = (self.random() * len as f64) as usize;
                while !selected.insert(j) {
                    j = (self.random() * len as f64) as usize;
                }
                result.push(j);
            }
        }
        Ok(result)
    }

    /// Index drawn with probability proportional to its weight.
    pub fn histogram(&mut self, weights: &[f64]) -> Result<usize> {
        let mut cumulative = Vec::with_capacity(weights.len() + 1);
        cumulative.push(0.0);
        let mut total = 0.0;
        for &w in weights {
            if w.is_nan() {
                return Err(RngError::InvalidDistribution("must not contain NaN"));
            }
            if w < 0.0 {
                return Err(RngError::InvalidDistribution("must be non-negative"));
            }
            total += w;
            cumulative.push(total);
        }
        if total == 0.0 {
            return Err(RngError::InvalidDistribution("must be non-empty"));
        }

        let position = total * self.random();
        let found = cumulative.iter().position(|&edge| position < edge);
        Ok(found.map_or(weights.len() - 1, |i| i - 1))
    }
}

fn positive(size: i32) -> Result<usize> {
    if size <= 0 {
        return Err(RngError::NonPositiveSize);
    }
    Ok(size as usize)
}

#[cfg(test)]
#[path = "rng_tests.rs"]
mod rng_tests;
