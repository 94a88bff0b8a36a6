//! RSN Element parser and builder. IEEE Std 802.11-2016, 9.4.2.25.

use crate::akm::Akm;
use crate::cipher::{self, Cipher};
use crate::error::Error;
use crate::suite_selector::OUI;
use bitfield::bitfield;
use byteorder::{ByteOrder, LittleEndian};

pub const ELEMENT_ID: u8 = 0x30;

// IEEE Std 802.11-2016, 9.4.2.25.3, Figure 9-271
bitfield! {
    #[derive(PartialEq, Clone)]
    pub struct Capabilities(u16);
    impl Debug;
    pub preauth, set_preauth: 0;
    pub no_pairwise, set_no_pairwise: 1;
    pub ptksa_replay_counter, set_ptksa_replay_counter: 3, 2;
    pub gtksa_replay_counter, set_gtksa_replay_counter: 5, 4;
    pub mfpr, set_mfpr: 6;
    pub mfpc, set_mfpc: 7;
    // Bit 8 reserved.
    pub peerkey_enabled, set_peerkey_enabled: 9;
    pub spp_a_msdu_capable, set_spp_a_msdu_capable: 10;
    pub spp_a_msdu_required, set_spp_a_msdu_required: 11;
    pub pbac, set_pbac: 12;
    pub extended_key_id, set_extended_key_id: 13;
    // Bits 14-15 reserved.
    pub value, _: 15, 0;
}

impl Default for Capabilities {
    fn default() -> Capabilities {
        Capabilities(0)
    }
}

/// A fully parsed/built RSN Element. Bitmasks (`pairwise_ciphers`,
/// `akm_suites`) use the same bit-per-suite-type convention as the C
/// reference this is grounded on; `1u32 << suite_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rsne {
    pub version: u16,
    pub group_cipher: Option<Cipher>,
    pub pairwise_ciphers: Vec<Cipher>,
    pub akm_suites: Vec<Akm>,
    pub caps: Capabilities,
    pub pmkids: Vec<[u8; 16]>,
    pub group_management_cipher: Option<Cipher>,
}

impl Default for Rsne {
    fn default() -> Rsne {
        Rsne {
            version: 1,
            group_cipher: None,
            pairwise_ciphers: vec![],
            akm_suites: vec![],
            caps: Capabilities::default(),
            pmkids: vec![],
            group_management_cipher: None,
        }
    }
}

fn parse_suite(data: &[u8]) -> ([u8; 3], u8) {
    ([data[0], data[1], data[2]], data[3])
}

impl Rsne {
    /// Parses the body of an RSN Element (everything after the 2-byte
    /// element header). Mirrors `ie_parse_rsne`'s incremental-advance
    /// structure: every optional field may be absent if the body ends
    /// exactly on a field boundary.
    pub fn parse(data: &[u8]) -> Result<Rsne, Error> {
        if data.len() < 2 {
            return Err(Error::RsneTruncated);
        }
        let mut rsne = Rsne::default();
        let mut pos = 0;

        rsne.version = LittleEndian::read_u16(&data[pos..pos + 2]);
        pos += 2;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 4 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let (oui, suite_type) = parse_suite(&data[pos..pos + 4]);
        let group_cipher = Cipher::new(oui, suite_type);
        if !group_cipher.is_valid_group_cipher() {
            return Err(Error::UnknownCipherSuite(oui, suite_type));
        }
        rsne.group_cipher = Some(group_cipher);
        pos += 4;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 2 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let pairwise_count = LittleEndian::read_u16(&data[pos..pos + 2]) as usize;
        pos += 2;
        if pairwise_count == 0 {
            return Err(Error::EmptySuiteList("pairwise cipher"));
        }
        if pos + pairwise_count * 4 > data.len() {
            return Err(Error::RsneTruncated);
        }
        for i in 0..pairwise_count {
            let (oui, suite_type) = parse_suite(&data[pos + i * 4..pos + i * 4 + 4]);
            let cipher = Cipher::new(oui, suite_type);
            if !cipher.is_valid_pairwise_cipher() {
                return Err(Error::UnknownCipherSuite(oui, suite_type));
            }
            rsne.pairwise_ciphers.push(cipher);
        }
        pos += pairwise_count * 4;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 2 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let akm_count = LittleEndian::read_u16(&data[pos..pos + 2]) as usize;
        pos += 2;
        if akm_count == 0 {
            return Err(Error::EmptySuiteList("AKM"));
        }
        if pos + akm_count * 4 > data.len() {
            return Err(Error::RsneTruncated);
        }
        for i in 0..akm_count {
            let (oui, suite_type) = parse_suite(&data[pos + i * 4..pos + i * 4 + 4]);
            let akm = Akm::new(oui, suite_type);
            if !akm.has_known_algorithm() {
                return Err(Error::UnknownAkmSuite(oui, suite_type));
            }
            rsne.akm_suites.push(akm);
        }
        pos += akm_count * 4;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 2 > data.len() {
            return Err(Error::RsneTruncated);
        }
        rsne.caps = Capabilities(LittleEndian::read_u16(&data[pos..pos + 2]));
        pos += 2;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 2 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let pmkid_count = LittleEndian::read_u16(&data[pos..pos + 2]) as usize;
        pos += 2;
        if pos + pmkid_count * 16 > data.len() {
            return Err(Error::RsneTruncated);
        }
        for i in 0..pmkid_count {
            let mut pmkid = [0u8; 16];
            pmkid.copy_from_slice(&data[pos + i * 16..pos + i * 16 + 16]);
            rsne.pmkids.push(pmkid);
        }
        pos += pmkid_count * 16;
        if pos == data.len() {
            return Ok(rsne);
        }

        if pos + 4 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let (oui, suite_type) = parse_suite(&data[pos..pos + 4]);
        rsne.group_management_cipher = Some(Cipher::new(oui, suite_type));
        pos += 4;
        if pos != data.len() {
            return Err(Error::RsneTrailingBytes);
        }
        Ok(rsne)
    }

    /// Writes the body of an RSN Element (everything after the 2-byte
    /// element header) onto `buf`, shorthanding trailing all-zero/default
    /// fields the way `ie_build_rsne` does. `buf` should be empty; this
    /// does not touch the element id/length header.
    pub fn write(&self, buf: &mut Vec<u8>) {
        let mut body = [0u8; 8]; // scratch for u16 little-endian writes
        let put16 = |v: u16, out: &mut [u8]| LittleEndian::write_u16(out, v);

        put16(self.version, &mut body[0..2]);
        buf.extend_from_slice(&body[0..2]);

        let group_cipher = self
            .group_cipher
            .clone()
            .unwrap_or_else(|| Cipher::new_dot11(cipher::CCMP));
        write_suite(buf, &group_cipher);

        let count_pos = buf.len();
        buf.extend_from_slice(&[0, 0]);
        let mut count = 0u16;
        for c in &self.pairwise_ciphers {
            if buf.len() + 4 > 242 {
                break;
            }
            write_suite(buf, c);
            count += 1;
        }
        put16(count, &mut buf[count_pos..count_pos + 2]);

        let count_pos = buf.len();
        buf.extend_from_slice(&[0, 0]);
        let mut count = 0u16;
        for a in &self.akm_suites {
            if buf.len() + 4 > 248 {
                break;
            }
            write_suite_akm(buf, a);
            count += 1;
        }
        put16(count, &mut buf[count_pos..count_pos + 2]);

        buf.extend_from_slice(&self.caps.value().to_le_bytes());

        // Shorthand: with no PMKIDs and a default (all zero) capabilities
        // tail, stop once mfpc/group management cipher don't require more.
        if self.pmkids.is_empty() {
            if !self.caps.mfpc() {
                return;
            }
            if self.group_management_cipher.is_none()
                || self.group_management_cipher.as_ref().map(|c| c.suite_type) == Some(cipher::BIP)
            {
                return;
            }
        }

        put16(self.pmkids.len() as u16, &mut body[0..2]);
        buf.extend_from_slice(&body[0..2]);
        for pmkid in &self.pmkids {
            buf.extend_from_slice(pmkid);
        }

        if !self.caps.mfpc() {
            return;
        }
        if self.group_management_cipher.as_ref().map(|c| c.suite_type) == Some(cipher::BIP) {
            return;
        }
        if let Some(ref c) = self.group_management_cipher {
            write_suite(buf, c);
        }
    }

    /// Builds the full IE (element id + length + body).
    pub fn into_bytes(&self) -> Vec<u8> {
        let mut body = vec![];
        self.write(&mut body);
        let mut out = Vec::with_capacity(2 + body.len());
        out.push(ELEMENT_ID);
        out.push(body.len() as u8);
        out.extend_from_slice(&body);
        out
    }
}

fn write_suite(buf: &mut Vec<u8>, c: &Cipher) {
    buf.extend_from_slice(&c.oui);
    buf.push(c.suite_type);
}

fn write_suite_akm(buf: &mut Vec<u8>, a: &Akm) {
    buf.extend_from_slice(&a.oui);
    buf.push(a.suite_type);
}
