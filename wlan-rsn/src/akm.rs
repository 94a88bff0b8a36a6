//! AKM suite selectors. IEEE Std 802.11-2016, 9.4.2.25.3, Table 9-133.

use crate::suite_selector::OUI;

pub const EAP: u8 = 1;
pub const PSK: u8 = 2;
pub const FT_EAP: u8 = 3;
pub const FT_PSK: u8 = 4;
pub const EAP_SHA256: u8 = 5;
pub const PSK_SHA256: u8 = 6;
pub const TDLS: u8 = 7;
pub const SAE: u8 = 8;
pub const FT_SAE: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Akm {
    pub oui: [u8; 3],
    pub suite_type: u8,
}

impl Akm {
    pub fn new(oui: [u8; 3], suite_type: u8) -> Self {
        Akm { oui, suite_type }
    }

    pub fn new_dot11(suite_type: u8) -> Self {
        Akm { oui: OUI, suite_type }
    }

    pub fn has_known_algorithm(&self) -> bool {
        self.oui == OUI
            && match self.suite_type {
                EAP | PSK | FT_EAP | FT_PSK | EAP_SHA256 | PSK_SHA256 | TDLS | SAE | FT_SAE => {
                    true
                }
                _ => false,
            }
    }

    /// Every AKM this crate supports uses a 16 byte MIC; AKMs that would
    /// require a 24 byte MIC (e.g. the 802.11ak/SHA384 suites) are out of
    /// scope and return `None`.
    pub fn mic_bytes(&self) -> Option<u16> {
        if self.has_known_algorithm() {
            Some(16)
        } else {
            None
        }
    }

    /// Whether the 802.11 PRF used to derive the PTK/GTK from this AKM is
    /// the SHA-256-based KDF (IEEE Std 802.11-2016, 12.7.1.3) rather than the
    /// legacy SHA-1-based PRF (12.7.1.2).
    pub fn uses_sha256_prf(&self) -> bool {
        match self.suite_type {
            EAP_SHA256 | PSK_SHA256 | SAE | FT_SAE => true,
            _ => false,
        }
    }

    /// PTK length in bits for the 4-Way Handshake, independent of the
    /// pairwise cipher's key length (the KCK/KEK halves are fixed size; the
    /// TK is cipher dependent, see `cipher::Cipher::tk_bits`).
    pub fn kck_kek_bits(&self) -> u16 {
        256
    }
}
