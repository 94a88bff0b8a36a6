//! WPA1 vendor element parser and builder. WPA_80211_v3_1, Section 2.1.
//!
//! Structurally the same fields as an RSNE but carried inside a vendor
//! specific element (OUI 00:50:f2, type 1) instead of element id 0x30, and
//! with no capabilities/PMKID/group management cipher tail.

use crate::akm::{self, Akm};
use crate::cipher::{self, Cipher};
use crate::error::Error;
use crate::suite_selector::MICROSOFT_OUI;
use byteorder::{ByteOrder, LittleEndian};

pub const VENDOR_TYPE: u8 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct WpaIe {
    pub version: u16,
    pub group_cipher: Cipher,
    pub pairwise_ciphers: Vec<Cipher>,
    pub akm_suites: Vec<Akm>,
}

fn parse_suite(data: &[u8]) -> ([u8; 3], u8) {
    ([data[0], data[1], data[2]], data[3])
}

/// `data` is the vendor element body, starting at the 3-byte OUI (i.e. the
/// element id/length and nothing else has been stripped yet).
pub fn is_wpa_ie(data: &[u8]) -> bool {
    data.len() >= 6
        && data[0..3] == MICROSOFT_OUI
        && data[3] == VENDOR_TYPE
        && LittleEndian::read_u16(&data[4..6]) == 1
}

impl WpaIe {
    /// Parses a WPA1 vendor element body (OUI through the AKM suite list).
    pub fn parse(data: &[u8]) -> Result<WpaIe, Error> {
        if !is_wpa_ie(data) {
            return Err(Error::RsneTruncated);
        }
        let mut pos = 6;
        let version = 1u16;

        if pos + 4 > data.len() {
            return Err(Error::RsneTruncated);
        }
        let (oui, suite_type) = parse_suite(&data[pos..pos + 4]);
        if oui != MICROSOFT_OUI || !is_valid_wpa_cipher(suite_type) {
            return Err(Error::UnknownCipherSuite(oui, suite_type));
        }
        let group_cipher = Cipher::new(oui, suite_type);
        pos += 4;

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
        let mut pairwise_ciphers = vec![];
        for i in 0..pairwise_count {
            let (oui, suite_type) = parse_suite(&data[pos + i * 4..pos + i * 4 + 4]);
            if oui != MICROSOFT_OUI || !is_valid_wpa_cipher(suite_type) {
                return Err(Error::UnknownCipherSuite(oui, suite_type));
            }
            pairwise_ciphers.push(Cipher::new(oui, suite_type));
        }
        pos += pairwise_count * 4;

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
        let mut akm_suites = vec![];
        for i in 0..akm_count {
            let (oui, suite_type) = parse_suite(&data[pos + i * 4..pos + i * 4 + 4]);
            if oui != MICROSOFT_OUI || suite_type == 0 || suite_type > 2 {
                return Err(Error::UnknownAkmSuite(oui, suite_type));
            }
            akm_suites.push(Akm::new(oui, suite_type));
        }

        if group_cipher.suite_type == cipher::CCMP
            && pairwise_ciphers.iter().any(|c| c.suite_type == cipher::TKIP)
        {
            return Err(Error::CcmpGroupTkipPairwise);
        }

        Ok(WpaIe {
            version,
            group_cipher,
            pairwise_ciphers,
            akm_suites,
        })
    }

    /// Builds the full vendor element (id + length + OUI/type/version/...).
    pub fn into_bytes(&self) -> Result<Vec<u8>, Error> {
        if self.group_cipher.suite_type == cipher::CCMP
            && self.pairwise_ciphers.iter().any(|c| c.suite_type == cipher::TKIP)
        {
            return Err(Error::CcmpGroupTkipPairwise);
        }

        let mut body = vec![];
        body.extend_from_slice(&MICROSOFT_OUI);
        body.push(VENDOR_TYPE);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&MICROSOFT_OUI);
        body.push(self.group_cipher.suite_type);

        const VALID_PAIRWISE: [u8; 4] = [cipher::CCMP, cipher::TKIP, cipher::WEP104, cipher::WEP40];
        let count_pos = body.len();
        body.extend_from_slice(&[0, 0]);
        let mut count = 0u16;
        for suite in VALID_PAIRWISE.iter() {
            if self.pairwise_ciphers.iter().any(|c| c.suite_type == *suite) {
                body.extend_from_slice(&MICROSOFT_OUI);
                body.push(*suite);
                count += 1;
            }
        }
        LittleEndian::write_u16(&mut body[count_pos..count_pos + 2], count);

        const VALID_AKM: [u8; 2] = [akm::EAP, akm::PSK];
        let count_pos = body.len();
        body.extend_from_slice(&[0, 0]);
        let mut count = 0u16;
        for suite in VALID_AKM.iter() {
            if self.akm_suites.iter().any(|a| a.suite_type == *suite) {
                body.extend_from_slice(&MICROSOFT_OUI);
                body.push(*suite);
                count += 1;
            }
        }
        LittleEndian::write_u16(&mut body[count_pos..count_pos + 2], count);

        let mut out = Vec::with_capacity(2 + body.len());
        out.push(crate::ie::VENDOR_SPECIFIC_ELEMENT_ID);
        out.push(body.len() as u8);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn is_valid_wpa_cipher(suite_type: u8) -> bool {
    match suite_type {
        cipher::USE_GROUP_CIPHER | cipher::WEP40 | cipher::TKIP | cipher::CCMP | cipher::WEP104 => {
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal_wpa() -> WpaIe {
        WpaIe {
            version: 1,
            group_cipher: Cipher::new(MICROSOFT_OUI, cipher::TKIP),
            pairwise_ciphers: vec![Cipher::new(MICROSOFT_OUI, cipher::TKIP)],
            akm_suites: vec![Akm::new(MICROSOFT_OUI, akm::PSK)],
        }
    }

    #[test]
    fn round_trips_a_wpa_personal_element() {
        let wpa = personal_wpa();
        let bytes = wpa.into_bytes().expect("build");
        assert!(is_wpa_ie(&bytes[2..]));
        let parsed = WpaIe::parse(&bytes[2..]).expect("parse");
        assert_eq!(parsed, wpa);
    }

    #[test]
    fn rejects_ccmp_group_with_tkip_pairwise() {
        let mut wpa = personal_wpa();
        wpa.group_cipher = Cipher::new(MICROSOFT_OUI, cipher::CCMP);
        assert_eq!(wpa.into_bytes(), Err(Error::CcmpGroupTkipPairwise));
    }

    #[test]
    fn rejects_empty_pairwise_cipher_list() {
        let mut data = vec![];
        data.extend_from_slice(&MICROSOFT_OUI);
        data.push(VENDOR_TYPE);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&MICROSOFT_OUI);
        data.push(cipher::TKIP);
        data.extend_from_slice(&0u16.to_le_bytes()); // zero pairwise ciphers
        assert_eq!(
            WpaIe::parse(&data),
            Err(Error::EmptySuiteList("pairwise cipher"))
        );
    }
}
