//! Pairwise Transient Key derivation. IEEE Std 802.11-2016, 12.7.1.3.

use crate::akm::Akm;
use crate::cipher::Cipher;
use crate::crypto_utils::prf;
use crate::error::Error;

const KCK_BYTES: usize = 16;
const KEK_BYTES: usize = 16;

#[derive(Clone, PartialEq)]
pub struct Ptk {
    pub kck: Vec<u8>,
    pub kek: Vec<u8>,
    pub tk: Vec<u8>,
}

impl std::fmt::Debug for Ptk {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Key material never gets logged; see SPEC_FULL's logging section.
        f.debug_struct("Ptk").field("tk_len", &self.tk.len()).finish()
    }
}

fn min_max<'a>(a: &'a [u8], b: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Ptk {
    /// Derives a PTK from the PMK, the Authenticator/Supplicant MAC
    /// addresses and nonces exchanged in messages 1 and 2 of the 4-Way
    /// Handshake, and the negotiated pairwise cipher (which determines the
    /// TK's length).
    pub fn derive(
        akm: &Akm,
        pairwise: &Cipher,
        pmk: &[u8],
        aa: &[u8; 6],
        spa: &[u8; 6],
        anonce: &[u8; 32],
        snonce: &[u8; 32],
    ) -> Result<Ptk, Error> {
        let tk_bits = pairwise.tk_bits().ok_or(Error::UnsupportedCipherSuite)?;
        let tk_bytes = (tk_bits / 8) as usize;
        let total = KCK_BYTES + KEK_BYTES + tk_bytes;

        let (min_addr, max_addr) = min_max(aa, spa);
        let (min_nonce, max_nonce) = min_max(anonce, snonce);
        let mut data = Vec::with_capacity(min_addr.len() + max_addr.len() + min_nonce.len() + max_nonce.len());
        data.extend_from_slice(min_addr);
        data.extend_from_slice(max_addr);
        data.extend_from_slice(min_nonce);
        data.extend_from_slice(max_nonce);

        let mut out = vec![0u8; total];
        prf::derive(akm.uses_sha256_prf(), pmk, "Pairwise key expansion", &data, &mut out);

        Ok(Ptk {
            kck: out[..KCK_BYTES].to_vec(),
            kek: out[KCK_BYTES..KCK_BYTES + KEK_BYTES].to_vec(),
            tk: out[KCK_BYTES + KEK_BYTES..].to_vec(),
        })
    }
}
