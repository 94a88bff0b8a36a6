//! Key derivation functions used by the 4-Way and Group Key Handshakes.
//!
//! `prf` is the legacy SHA-1-based PRF (IEEE Std 802.11-2016, 12.7.1.2),
//! used by every AKM except the SHA-256 ones; `kdf_sha256` is the
//! counter-mode KDF (12.7.1.6.2) those use instead.

use byteorder::{ByteOrder, LittleEndian};
use crypto::hmac::Hmac;
use crypto::mac::Mac;
use crypto::sha1::Sha1;
use crypto::sha2::Sha256;

const SHA1_DIGEST_LEN: usize = 20;
const SHA256_DIGEST_LEN: usize = 32;

/// IEEE Std 802.11-2016, 12.7.1.2: `PRF(K, A, B, Len) = HMAC-SHA1(K, A ||
/// 0x00 || B || i)` concatenated over increasing `i` until `output` is
/// filled.
pub fn prf(key: &[u8], label: &str, data: &[u8], output: &mut [u8]) {
    let mut i = 0u8;
    for chunk in output.chunks_mut(SHA1_DIGEST_LEN) {
        let mut hmac = Hmac::new(Sha1::new(), key);
        hmac.input(label.as_bytes());
        hmac.input(&[0u8]);
        hmac.input(data);
        hmac.input(&[i]);
        let digest = hmac.result();
        chunk.copy_from_slice(&digest.code()[..chunk.len()]);
        i += 1;
    }
}

/// IEEE Std 802.11-2016, 12.7.1.6.2: counter-mode KDF built on HMAC-SHA256,
/// used by the SHA-256 AKMs (PSK-SHA256, SAE, the FT suites, ...).
/// `i` and the total output length are little-endian `u16`s per the spec
/// text.
pub fn kdf_sha256(key: &[u8], label: &str, context: &[u8], output: &mut [u8]) {
    let length_bits = (output.len() * 8) as u16;
    let mut length_le = [0u8; 2];
    LittleEndian::write_u16(&mut length_le, length_bits);

    let mut i: u16 = 1;
    for chunk in output.chunks_mut(SHA256_DIGEST_LEN) {
        let mut i_le = [0u8; 2];
        LittleEndian::write_u16(&mut i_le, i);

        let mut hmac = Hmac::new(Sha256::new(), key);
        hmac.input(&i_le);
        hmac.input(label.as_bytes());
        hmac.input(context);
        hmac.input(&length_le);
        let digest = hmac.result();
        chunk.copy_from_slice(&digest.code()[..chunk.len()]);
        i += 1;
    }
}

/// Runs either `prf` or `kdf_sha256` depending on whether the AKM in use
/// derives keys with the SHA-256 KDF.
pub fn derive(uses_sha256_kdf: bool, key: &[u8], label: &str, data: &[u8], output: &mut [u8]) {
    if uses_sha256_kdf {
        kdf_sha256(key, label, data, output);
    } else {
        prf(key, label, data, output);
    }
}
