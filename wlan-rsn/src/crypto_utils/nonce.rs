//! ANonce/SNonce generation. IEEE Std 802.11-2016, 12.7.5 only requires a
//! nonce be "a value that is selected once to prevent replay attacks";
//! a CSPRNG with a per-instance static counter is the usual approach.

use rand::{OsRng, Rng};
use std::sync::Mutex;

pub struct NonceReader {
    rng: Mutex<OsRng>,
}

impl NonceReader {
    pub fn new() -> Result<Self, std::io::Error> {
        Ok(NonceReader { rng: Mutex::new(OsRng::new()?) })
    }

    pub fn next(&self) -> [u8; 32] {
        let mut nonce = [0u8; 32];
        self.rng.lock().unwrap().fill_bytes(&mut nonce);
        nonce
    }
}
