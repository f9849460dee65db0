const BASE: u32 = 65521;
// Largest n such that 255n(n+1)/2 + (n+1)(BASE-1) <= 2^32-1.
const NMAX: usize = 5552;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    pub(crate) fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        for run in data.chunks(NMAX) {
            for &b in run {
                self.s1 += b as u32;
                self.s2 += self.s1;
            }
            self.s1 %= BASE;
            self.s2 %= BASE;
        }
    }

    pub(crate) fn finish(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}
