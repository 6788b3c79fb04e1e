//! SIMD-oriented Fast Mersenne Twister with Mersenne exponent 216091.
//!
//! The 128-bit state words are kept as groups of four `u32` lanes, lowest
//! lane first, and the recursion is written lane by lane.

use rand::{RngCore, SeedableRng};

const MEXP: usize = 216_091;
const N: usize = MEXP / 128 + 1;
const N32: usize = N * 4;
const POS1: usize = 627;
const SL1: u32 = 11;
const SL2: u32 = 3;
const SR1: u32 = 10;
const SR2: u32 = 1;
const MSK: [u32; 4] = [0xbff7_bff7, 0xbfff_ffff, 0xbfff_fa7f, 0xffdd_fbfb];
const PARITY: [u32; 4] = [0xf800_0001, 0x89e8_0709, 0x3bd2_b64b, 0x0c64_b1e4];

type W128 = [u32; 4];

fn split(w: &W128) -> (u64, u64) {
    let high = (u64::from(w[3]) << 32) | u64::from(w[2]);
    let low = (u64::from(w[1]) << 32) | u64::from(w[0]);
    (high, low)
}

fn join(high: u64, low: u64) -> W128 {
    [low as u32, (low >> 32) as u32, high as u32, (high >> 32) as u32]
}

/// 128-bit right shift by `bytes * 8` bits.
fn rshift128(w: &W128, bytes: u32) -> W128 {
    let (high, low) = split(w);
    let bits = bytes * 8;
    join(high >> bits, (low >> bits) | (high << (64 - bits)))
}

/// 128-bit left shift by `bytes * 8` bits.
fn lshift128(w: &W128, bytes: u32) -> W128 {
    let (high, low) = split(w);
    let bits = bytes * 8;
    join((high << bits) | (low >> (64 - bits)), low << bits)
}

fn recursion(a: &W128, b: &W128, c: &W128, d: &W128) -> W128 {
    let x = lshift128(a, SL2);
    let y = rshift128(c, SR2);
    let mut r = [0u32; 4];
    for lane in 0..4 {
        r[lane] = a[lane] ^ x[lane] ^ ((b[lane] >> SR1) & MSK[lane]) ^ y[lane] ^ (d[lane] << SL1);
    }
    r
}

fn func1(x: u32) -> u32 {
    (x ^ (x >> 27)).wrapping_mul(1_664_525)
}

fn func2(x: u32) -> u32 {
    (x ^ (x >> 27)).wrapping_mul(1_566_083_941)
}

#[derive(Clone)]
pub struct Sfmt216091 {
    state: Vec<u32>,
    index: usize,
}

impl std::fmt::Debug for Sfmt216091 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sfmt216091")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Sfmt216091 {
    pub fn new(seed: u32) -> Self {
        let mut state = vec![0u32; N32];
        state[0] = seed;
        for i in 1..N32 {
            let previous = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(previous ^ (previous >> 30))
                .wrapping_add(i as u32);
        }
        let mut rng = Self { state, index: N32 };
        rng.certify_period();
        rng
    }

    pub fn from_key(key: &[u32]) -> Self {
        let lag = 11;
        let mid = (N32 - lag) / 2;
        let mut s = vec![0x8b8b_8b8bu32; N32];
        let count = (key.len() + 1).max(N32);

        let mut r = func1(s[0] ^ s[mid] ^ s[N32 - 1]);
        s[mid] = s[mid].wrapping_add(r);
        r = r.wrapping_add(key.len() as u32);
        s[mid + lag] = s[mid + lag].wrapping_add(r);
        s[0] = r;

        let mut i = 1;
        for j in 0..count - 1 {
            let r = func1(s[i] ^ s[(i + mid) % N32] ^ s[(i + N32 - 1) % N32]);
            s[(i + mid) % N32] = s[(i + mid) % N32].wrapping_add(r);
            let extra = key.get(j).copied().unwrap_or(0);
            let r = r.wrapping_add(extra).wrapping_add(i as u32);
            s[(i + mid + lag) % N32] = s[(i + mid + lag) % N32].wrapping_add(r);
            s[i] = r;
            i = (i + 1) % N32;
        }
        for _ in 0..N32 {
            let r = func2(
                s[i].wrapping_add(s[(i + mid) % N32])
                    .wrapping_add(s[(i + N32 - 1) % N32]),
            );
            s[(i + mid) % N32] ^= r;
            let r = r.wrapping_sub(i as u32);
            s[(i + mid + lag) % N32] ^= r;
            s[i] = r;
            i = (i + 1) % N32;
        }

        let mut rng = Self {
            state: s,
            index: N32,
        };
        rng.certify_period();
        rng
    }

    /// Flips one bit if needed so the generator has the full period.
    fn certify_period(&mut self) {
        let mut inner = 0u32;
        for lane in 0..4 {
            inner ^= self.state[lane] & PARITY[lane];
        }
        for shift in [16, 8, 4, 2, 1] {
            inner ^= inner >> shift;
        }
        if inner & 1 == 1 {
            return;
        }
        for lane in 0..4 {
            let mut work = 1u32;
            for _ in 0..32 {
                if work & PARITY[lane] != 0 {
                    self.state[lane] ^= work;
                    return;
                }
                work <<= 1;
            }
        }
    }

    pub(crate) fn is_period_certified(&self) -> bool {
        let mut inner = 0u32;
        for lane in 0..4 {
            inner ^= self.state[lane] & PARITY[lane];
        }
        inner.count_ones() % 2 == 1
    }

    fn word(&self, i: usize) -> W128 {
        let base = i * 4;
        [
            self.state[base],
            self.state[base + 1],
            self.state[base + 2],
            self.state[base + 3],
        ]
    }

    fn generate_all(&mut self) {
        let mut r1 = self.word(N - 2);
        let mut r2 = self.word(N - 1);
        for i in 0..N {
            let b = self.word((i + POS1) % N);
            let next = recursion(&self.word(i), &b, &r1, &r2);
            self.state[i * 4..i * 4 + 4].copy_from_slice(&next);
            r1 = r2;
            r2 = next;
        }
        self.index = 0;
    }
}

impl RngCore for Sfmt216091 {
    fn next_u32(&mut self) -> u32 {
        if self.index >= N32 {
            self.generate_all();
        }
        let value = self.state[self.index];
        self.index += 1;
        value
    }

    fn next_u64(&mut self) -> u64 {
        if self.index % 2 == 1 {
            self.index += 1;
        }
        if self.index >= N32 {
            self.generate_all();
        }
        let low = u64::from(self.state[self.index]);
        let high = u64::from(self.state[self.index + 1]);
        self.index += 2;
        low | (high << 32)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        super::fill_bytes_from_u64(self, dest);
    }
}

impl SeedableRng for Sfmt216091 {
    type Seed = [u8; 32];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut key = [0u32; 8];
        for (word, chunk) in key.iter_mut().zip(seed.chunks_exact(4)) {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(chunk);
            *word = u32::from_le_bytes(bytes);
        }
        Self::from_key(&key)
    }
}
