//! Key Data field encryption/decryption.
//!
//! Descriptor version 1 (HMAC-MD5/RC4 AKMs) encrypts Key Data with RC4
//! under a key derived from the frame's own IV and the KEK; versions 2
//! and 3 use the NIST AES Key Wrap algorithm (RFC 3394), which this crate
//! also has to implement directly since it's outside rust-crypto's scope.

use crate::error::Error;
use crate::integrity::{DESCRIPTOR_VERSION_AES128_CMAC, DESCRIPTOR_VERSION_HMAC_SHA1_AES};
use crypto::aessafe::{AesSafe128Decryptor, AesSafe128Encryptor};
use crypto::rc4::Rc4;
use crypto::symmetriccipher::{BlockDecryptor, BlockEncryptor, SynchronousStreamCipher};
use std::convert::TryInto;

const AES_KEY_WRAP_IV: u64 = 0xa6a6a6a6a6a6a6a6;

/// Decrypts `encrypted` (the frame's Key Data field) in place, returning
/// the plaintext. For AES Key Wrap, `encrypted.len()` must be a multiple
/// of 8 and at least 16.
pub fn decrypt_key_data(
    descriptor_version: u16,
    kek: &[u8],
    key_iv: &[u8; 16],
    encrypted: &[u8],
) -> Result<Vec<u8>, Error> {
    match descriptor_version {
        1 => Ok(rc4_transform(key_iv, kek, encrypted)),
        DESCRIPTOR_VERSION_HMAC_SHA1_AES | DESCRIPTOR_VERSION_AES128_CMAC => {
            aes_key_unwrap(kek, encrypted)
        }
        v => Err(Error::UnsupportedKeyDescriptorVersion(v)),
    }
}

/// Encrypts `plaintext` for the frame's Key Data field.
pub fn encrypt_key_data(
    descriptor_version: u16,
    kek: &[u8],
    key_iv: &[u8; 16],
    plaintext: &[u8],
) -> Result<Vec<u8>, Error> {
    match descriptor_version {
        1 => Ok(rc4_transform(key_iv, kek, plaintext)),
        DESCRIPTOR_VERSION_HMAC_SHA1_AES | DESCRIPTOR_VERSION_AES128_CMAC => {
            aes_key_wrap(kek, plaintext)
        }
        v => Err(Error::UnsupportedKeyDescriptorVersion(v)),
    }
}

/// IEEE Std 802.11-2016, 12.7.2: descriptor version 1 keys RC4 with
/// `Key IV || KEK` and discards the first 256 bytes of keystream before
/// using it, a quirk inherited from WEP-era RC4 usage.
fn rc4_transform(key_iv: &[u8; 16], kek: &[u8], data: &[u8]) -> Vec<u8> {
    let mut rc4_key = Vec::with_capacity(16 + kek.len());
    rc4_key.extend_from_slice(key_iv);
    rc4_key.extend_from_slice(kek);

    let mut rc4 = Rc4::new(&rc4_key);
    let discard_in = vec![0u8; 256];
    let mut discard_out = vec![0u8; 256];
    rc4.process(&discard_in[..], &mut discard_out[..]);

    let mut out = vec![0u8; data.len()];
    rc4.process(data, &mut out);
    out
}

/// RFC 3394 AES Key Wrap, using a 128-bit KEK (the only size any
/// 802.11 AKM this crate supports produces).
fn aes_key_wrap(kek: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    if kek.len() != 16 {
        return Err(Error::InvalidMicSize);
    }
    if plaintext.len() % 8 != 0 || plaintext.is_empty() {
        return Err(Error::InvalidKeyLength(plaintext.len() as u16, 0));
    }
    let mut key = [0u8; 16];
    key.copy_from_slice(kek);
    let cipher = AesSafe128Encryptor::new(&key);

    let n = plaintext.len() / 8;
    let mut r = vec![[0u8; 8]; n];
    for i in 0..n {
        r[i].copy_from_slice(&plaintext[i * 8..i * 8 + 8]);
    }
    let mut a = AES_KEY_WRAP_IV.to_be_bytes();

    for j in 0..6u64 {
        for i in 0..n {
            let mut block = [0u8; 16];
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i]);
            let mut out = [0u8; 16];
            cipher.encrypt_block(&block, &mut out);

            let t = j * (n as u64) + (i as u64 + 1);
            let mut a_int = u64::from_be_bytes(out[..8].try_into().unwrap());
            a_int ^= t;
            a = a_int.to_be_bytes();
            r[i].copy_from_slice(&out[8..]);
        }
    }

    let mut out = Vec::with_capacity(8 + plaintext.len());
    out.extend_from_slice(&a);
    for block in &r {
        out.extend_from_slice(block);
    }
    Ok(out)
}

fn aes_key_unwrap(kek: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if kek.len() != 16 {
        return Err(Error::InvalidMicSize);
    }
    if ciphertext.len() % 8 != 0 || ciphertext.len() < 16 {
        return Err(Error::InvalidKeyLength(ciphertext.len() as u16, 0));
    }
    let mut key = [0u8; 16];
    key.copy_from_slice(kek);
    let cipher = AesSafe128Decryptor::new(&key);

    let n = ciphertext.len() / 8 - 1;
    let mut a: [u8; 8] = ciphertext[..8].try_into().unwrap();
    let mut r = vec![[0u8; 8]; n];
    for i in 0..n {
        r[i].copy_from_slice(&ciphertext[8 + i * 8..16 + i * 8]);
    }

    for j in (0..6u64).rev() {
        for i in (0..n).rev() {
            let t = j * (n as u64) + (i as u64 + 1);
            let mut a_int = u64::from_be_bytes(a);
            a_int ^= t;
            let a_xored = a_int.to_be_bytes();

            let mut block = [0u8; 16];
            block[..8].copy_from_slice(&a_xored);
            block[8..].copy_from_slice(&r[i]);
            let mut out = [0u8; 16];
            cipher.decrypt_block(&block, &mut out);

            a.copy_from_slice(&out[..8]);
            r[i].copy_from_slice(&out[8..]);
        }
    }

    if a != AES_KEY_WRAP_IV.to_be_bytes() {
        return Err(Error::InvalidMic);
    }

    let mut out = Vec::with_capacity(n * 8);
    for block in &r {
        out.extend_from_slice(block);
    }
    Ok(out)
}
