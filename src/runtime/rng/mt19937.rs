use rand::{RngCore, SeedableRng};

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
const LOWER_MASK: u64 = 0x7FFF_FFFF;

/// 64-bit Mersenne Twister (MT19937-64).
#[derive(Clone)]
pub struct Mt19937_64 {
    state: [u64; NN],
    index: usize,
}

impl std::fmt::Debug for Mt19937_64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937_64")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Mt19937_64 {
    pub const DEFAULT_SEED: u64 = 5489;

    pub fn new(seed: u64) -> Self {
        let mut state = [0u64; NN];
        state[0] = seed;
        for i in 1..NN {
            let previous = state[i - 1];
            state[i] = 6_364_136_223_846_793_005u64
                .wrapping_mul(previous ^ (previous >> 62))
                .wrapping_add(i as u64);
        }
        Self { state, index: NN }
    }

    /// Array initialization. Keys shorter than the state wrap around.
    pub fn from_key(key: &[u64]) -> Self {
        let mut rng = Self::new(19_650_218);
        if key.is_empty() {
            return rng;
        }
        let mt = &mut rng.state;
        let mut i = 1;
        let mut j = 0;
        for _ in 0..NN.max(key.len()) {
            let previous = mt[i - 1];
            mt[i] = (mt[i]
                ^ (previous ^ (previous >> 62)).wrapping_mul(3_935_559_000_370_003_845))
            .wrapping_add(key[j])
            .wrapping_add(j as u64);
            i += 1;
            j += 1;
            if i >= NN {
                mt[0] = mt[NN - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..NN - 1 {
            let previous = mt[i - 1];
            mt[i] = (mt[i]
                ^ (previous ^ (previous >> 62)).wrapping_mul(2_862_933_555_777_941_757))
            .wrapping_sub(i as u64);
            i += 1;
            if i >= NN {
                mt[0] = mt[NN - 1];
                i = 1;
            }
        }
        mt[0] = 1 << 63;
        rng
    }

    fn twist(&mut self) {
        let mt = &mut self.state;
        let mix = |upper: u64, lower: u64| {
            let x = (upper & UPPER_MASK) | (lower & LOWER_MASK);
            (x >> 1) ^ if x & 1 == 1 { MATRIX_A } else { 0 }
        };
        for i in 0..NN - MM {
            mt[i] = mt[i + MM] ^ mix(mt[i], mt[i + 1]);
        }
        for i in NN - MM..NN - 1 {
            mt[i] = mt[i + MM - NN] ^ mix(mt[i], mt[i + 1]);
        }
        mt[NN - 1] = mt[MM - 1] ^ mix(mt[NN - 1], mt[0]);
        self.index = 0;
    }
}

impl Default for Mt19937_64 {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl RngCore for Mt19937_64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.index >= NN {
            self.twist();
        }
        let mut x = self.state[self.index];
        self.index += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^= x >> 43;
        x
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        super::fill_bytes_from_u64(self, dest);
    }
}

impl SeedableRng for Mt19937_64 {
    type Seed = [u8; 32];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut key = [0u64; 4];
        for (word, chunk) in key.iter_mut().zip(seed.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *word = u64::from_le_bytes(bytes);
        }
        Self::from_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_thousandth_output_of_default_seed() {
        let mut rng = Mt19937_64::default();
        let mut value = 0;
        for _ in 0..10_000 {
            value = rng.next_u64();
        }
        assert_eq!(value, 9_981_545_732_273_789_042);
    }

    #[test]
    fn reference_key_sequence() {
        let mut rng = Mt19937_64::from_key(&[0x12345, 0x23456, 0x34567, 0x45678]);
        assert_eq!(rng.next_u64(), 7_266_447_313_870_364_031);
        assert_eq!(rng.next_u64(), 4_946_485_549_665_804_864);
    }
}
