// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It is used for vocabulary generation and optional cell noise, where
// reproducibility from a seed matters more than statistical quality.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        // Convert to [0,1).
        let x = self.next_u32() >> 8; // 24 bits fit the f32 mantissa exactly
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// Standard normal sample (Box-Muller, one value per call).
    pub fn next_gaussian(&mut self) -> f32 {
        let u1 = self.next_f32_01().max(1e-7);
        let u2 = self.next_f32_01();
        (-2.0 * u1.ln()).sqrt() * (2.0 * core::f32::consts::PI * u2).cos()
    }
}
