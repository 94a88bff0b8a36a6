//! Cipher suite selectors. IEEE Std 802.11-2016, 9.4.2.25.2, Table 9-131.

use crate::suite_selector::OUI;

pub const USE_GROUP_CIPHER: u8 = 0;
pub const WEP40: u8 = 1;
pub const TKIP: u8 = 2;
pub const CCMP: u8 = 4;
pub const WEP104: u8 = 5;
pub const BIP: u8 = 6;
pub const NO_GROUP_TRAFFIC: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cipher {
    pub oui: [u8; 3],
    pub suite_type: u8,
}

impl Cipher {
    pub fn new(oui: [u8; 3], suite_type: u8) -> Self {
        Cipher { oui, suite_type }
    }

    pub fn new_dot11(suite_type: u8) -> Self {
        Cipher { oui: OUI, suite_type }
    }

    pub fn has_known_usage(&self) -> bool {
        self.oui == OUI
            && match self.suite_type {
                USE_GROUP_CIPHER | WEP40 | TKIP | CCMP | WEP104 | BIP | NO_GROUP_TRAFFIC => true,
                _ => false,
            }
    }

    /// A cipher is "enhanced" if it's a post-WEP/TKIP RSNA cipher. Used to
    /// pick the EAPoL-Key descriptor version (IEEE Std 802.11-2016,
    /// 12.7.2 b.1)).
    pub fn is_enhanced(&self) -> bool {
        self.oui == OUI && (self.suite_type == CCMP || self.suite_type == BIP)
    }

    pub fn is_valid_group_cipher(&self) -> bool {
        self.oui == OUI
            && match self.suite_type {
                CCMP | TKIP | WEP104 | WEP40 | NO_GROUP_TRAFFIC => true,
                _ => false,
            }
    }

    pub fn is_valid_pairwise_cipher(&self) -> bool {
        self.oui == OUI
            && match self.suite_type {
                CCMP | TKIP | WEP104 | WEP40 | USE_GROUP_CIPHER => true,
                _ => false,
            }
    }

    pub fn is_valid_group_mgmt_cipher(&self) -> bool {
        self.oui == OUI && self.suite_type == BIP
    }

    /// Temporal key length, in bits, for ciphers that install a pairwise or
    /// group key. `None` for suites that carry no key material of their own.
    pub fn tk_bits(&self) -> Option<u16> {
        if self.oui != OUI {
            return None;
        }
        match self.suite_type {
            CCMP => Some(128),
            TKIP => Some(256),
            WEP40 => Some(40),
            WEP104 => Some(104),
            BIP => Some(128),
            _ => None,
        }
    }
}
