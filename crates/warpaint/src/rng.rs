//! Deterministic random streams for stage randomization.
//!
//! [UniformRandomStream] reimplements the legacy generator the paint-kit
//! pipeline was authored against (Numerical Recipes ran1 with Schrage
//! factorization and a 32-entry shuffle table). Draw sequences must match the
//! reference implementation bit for bit: paint seeds are shared identifiers,
//! and every consumer has to produce the same floats for the same seed.
//!
//! [split_seed] turns a 64-bit paint seed into the two 32-bit stream seeds by
//! de-interleaving even and odd bits.

const IA: i32 = 16807;
const IM: i32 = 2_147_483_647;
const IQ: i32 = 127_773;
const IR: i32 = 2836;
const NTAB: usize = 32;
const NDIV: i32 = 1 + (IM - 1) / NTAB as i32;
const AM: f64 = 1.0 / IM as f64;
const RNMX: f64 = 1.0 - 1.2e-7;

/// Largest value [UniformRandomStream::generate] can return.
pub const MAX_RANDOM_RANGE: i32 = 0x7FFF_FFFF;

/// Source of randomized stage parameters.
///
/// Stage randomization draws through this trait so tests can substitute a
/// scripted sequence. Both methods consume draws from the underlying stream;
/// the draw count per call is part of the contract (see [UniformRandomStream]).
pub trait RandomSource {
    /// Uniform f64 in `[low, high)`. Consumes exactly one raw draw, even for
    /// a degenerate range.
    fn random_float(&mut self, low: f64, high: f64) -> f64;

    /// Uniform i32 in `[low, high]` via rejection sampling. Consumes no draw
    /// when the range is degenerate or wider than [MAX_RANDOM_RANGE].
    fn random_int(&mut self, low: i32, high: i32) -> i32;
}

/// The legacy uniform random stream.
///
/// State is three pieces of i32 arithmetic: the recurrence value `idum`, the
/// last output `iy`, and the shuffle table `iv`. Seeding stores the negated
/// seed; the first draw then runs the 40-step warm-up that fills the table.
/// All arithmetic stays within i32 by construction, which is what makes the
/// stream portable.
#[derive(Debug, Clone)]
pub struct UniformRandomStream {
    idum: i32,
    iy: i32,
    iv: [i32; NTAB],
}

impl UniformRandomStream {
    pub fn new(seed: i32) -> Self {
        let mut stream = Self {
            idum: 0,
            iy: 0,
            iv: [0; NTAB],
        };
        stream.set_seed(seed);
        stream
    }

    /// Reseeds the stream. Negative and non-negative seeds of equal magnitude
    /// produce the same sequence; seed 0 is valid and warms up as 1, as does
    /// `i32::MIN`, which has no positive magnitude.
    pub fn set_seed(&mut self, seed: i32) {
        self.idum = if seed < 0 { seed } else { -seed };
        self.iy = 0;
    }

    /// Next raw draw in `[0, MAX_RANDOM_RANGE]`.
    pub fn generate(&mut self) -> i32 {
        if self.idum <= 0 || self.iy == 0 {
            // wrapping_neg: i32::MIN stays negative and the clamp seeds it as 1.
            self.idum = self.idum.wrapping_neg().max(1);
            for j in (0..NTAB + 8).rev() {
                self.schrage_step();
                if j < NTAB {
                    self.iv[j] = self.idum;
                }
            }
            self.iy = self.iv[0];
        }
        self.schrage_step();
        let j = (self.iy / NDIV) as usize;
        self.iy = self.iv[j];
        self.iv[j] = self.idum;
        self.iy
    }

    // k = idum / IQ; idum = IA * (idum - k * IQ) - IR * k, wrapped back into
    // [1, IM - 1]. Schrage keeps the product inside i32.
    fn schrage_step(&mut self) {
        let k = self.idum / IQ;
        self.idum = IA * (self.idum - k * IQ) - IR * k;
        if self.idum < 0 {
            self.idum += IM;
        }
    }
}

impl RandomSource for UniformRandomStream {
    fn random_float(&mut self, low: f64, high: f64) -> f64 {
        let mut fl = AM * f64::from(self.generate());
        if fl > RNMX {
            fl = RNMX;
        }
        fl * (high - low) + low
    }

    fn random_int(&mut self, low: i32, high: i32) -> i32 {
        let span = i64::from(high) - i64::from(low) + 1;
        if span <= 1 || i64::from(MAX_RANDOM_RANGE) < span - 1 {
            return low;
        }
        let span = span as u32;
        let max_acceptable = MAX_RANDOM_RANGE as u32 - (0x8000_0000u32 % span);
        loop {
            let n = self.generate() as u32;
            if n <= max_acceptable {
                return low + (n % span) as i32;
            }
        }
    }
}

/// Splits a 64-bit paint seed into the two stream seeds.
///
/// Even bits (0, 2, 4, ...) pack into the first value, odd bits into the
/// second, each truncated to i32 two's complement. The combiner seeds its
/// stream pair in that order. The mapping is a bijection from u64 onto
/// (u32, u32), so distinct paint seeds always yield distinct stream pairs.
pub fn split_seed(seed: u64) -> (i32, i32) {
    let mut hi: u64 = 0;
    let mut lo: u64 = 0;
    for i in 0..32 {
        let i2 = 2 * i;
        hi |= (seed & (1 << i2)) >> i;
        lo |= (seed & (1 << (i2 + 1))) >> (i + 1);
    }
    (hi as u32 as i32, lo as u32 as i32)
}
