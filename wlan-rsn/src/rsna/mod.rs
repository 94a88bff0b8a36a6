//! Protection negotiation bookkeeping and EAPoL-Key frame validation
//! shared by the 4-Way and Group Key Handshakes. Adapted from the same
//! ideas as `eapol::KeyFrame`'s six message predicates, but at the level
//! of "is this frame a valid message N for this role, given what we
//! negotiated" rather than bare `KeyInformation` bit checks.

pub mod esssa;

use crate::akm::Akm;
use crate::cipher::Cipher;
use crate::error::Error;
use crate::rsne::{Capabilities, Rsne};
use crate::wpa::WpaIe;
use eapol::{KeyDescriptor, KeyFrame, Protection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionType {
    LegacyWpa1,
    Rsne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedProtection {
    pub group_data: Cipher,
    pub pairwise: Cipher,
    pub akm: Akm,
    pub mic_size: u16,
    pub caps: Capabilities,
    pub protection_type: ProtectionType,
}

impl NegotiatedProtection {
    pub fn from_rsne(rsne: &Rsne) -> Result<NegotiatedProtection, Error> {
        let group_data = rsne
            .group_cipher
            .clone()
            .ok_or(Error::UnsupportedCipherSuite)?;
        let pairwise = rsne
            .pairwise_ciphers
            .first()
            .cloned()
            .ok_or(Error::UnsupportedCipherSuite)?;
        let akm = rsne.akm_suites.first().cloned().ok_or(Error::UnsupportedAkmSuite)?;
        let mic_size = akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)?;
        Ok(NegotiatedProtection {
            group_data,
            pairwise,
            akm,
            mic_size,
            caps: rsne.caps.clone(),
            protection_type: ProtectionType::Rsne,
        })
    }

    pub fn from_legacy_wpa(wpa: &WpaIe) -> Result<NegotiatedProtection, Error> {
        let akm = wpa.akm_suites.first().cloned().ok_or(Error::UnsupportedAkmSuite)?;
        let mic_size = akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)?;
        let pairwise = wpa
            .pairwise_ciphers
            .first()
            .cloned()
            .ok_or(Error::UnsupportedCipherSuite)?;
        Ok(NegotiatedProtection {
            group_data: wpa.group_cipher.clone(),
            pairwise,
            akm,
            mic_size,
            caps: Capabilities::default(),
            protection_type: ProtectionType::LegacyWpa1,
        })
    }

    pub fn protection(&self) -> Protection {
        match self.protection_type {
            ProtectionType::Rsne => Protection::Rsna,
            ProtectionType::LegacyWpa1 => Protection::Wpa1,
        }
    }
}

/// IEEE Std 802.11-2016, 12.7.2, Table 12-8: which MIC/key-wrap algorithm
/// a frame uses is a function of the key descriptor type the peer chose
/// and whether the negotiated pairwise/group ciphers are "enhanced"
/// (CCMP/BIP) or legacy (TKIP/WEP).
pub fn derive_key_descriptor_version(
    descriptor_type: u8,
    protection: &NegotiatedProtection,
) -> Result<u16, Error> {
    match descriptor_type {
        t if t == KeyDescriptor::Rc4 as u8 => {
            if protection.protection_type == ProtectionType::LegacyWpa1 {
                Ok(1)
            } else {
                Err(Error::InvalidKeyDescriptor(t, KeyDescriptor::Ieee802dot11 as u8))
            }
        }
        t if t == KeyDescriptor::Ieee802dot11 as u8 => {
            if protection.pairwise.is_enhanced() && protection.group_data.is_enhanced() {
                Ok(3)
            } else {
                Ok(2)
            }
        }
        t => Err(Error::UnsupportedKeyDescriptor(t)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authenticator,
    Supplicant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecAssocStatus {
    WrongPassword,
    EssSaEstablished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecAssocUpdate {
    TxEapolKeyFrame(KeyFrame),
    Key(crate::key::Key),
    Status(SecAssocStatus),
}

pub type UpdateSink = Vec<SecAssocUpdate>;

/// A `KeyFrame` that has passed the structural checks every message in a
/// handshake must satisfy before the handshake-specific state machine
/// looks at it: descriptor type/version, key type, the ack/error/request
/// bits appropriate for the sender's role, and the replay counter's
/// direction. MIC verification happens separately once the PTK is known
/// (message 2 onward) since the two are independent failure modes worth
/// distinguishing in logs.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedKeyFrame<'a> {
    pub frame: &'a KeyFrame,
    pub key_descriptor_version: u16,
}

impl<'a> VerifiedKeyFrame<'a> {
    pub fn from_frame(
        frame: &'a KeyFrame,
        role: Role,
        protection: &NegotiatedProtection,
        last_key_replay_counter: u64,
    ) -> Result<VerifiedKeyFrame<'a>, Error> {
        let key_descriptor_version =
            derive_key_descriptor_version(frame.descriptor_type, protection)?;

        let ki = &frame.key_info;
        if ki.key_type() == eapol::KEY_TYPE_GROUP_SMK && ki.install() {
            return Err(Error::InvalidInstallBitGroupSmkHandshake);
        }
        if ki.smk_message() {
            return Err(Error::SmkHandshakeNotSupported);
        }

        // `role` is the sender's role. Only the Authenticator ever sets
        // key_ack (messages 1/3 of the 4-Way Handshake, message 1 of the
        // Group Key Handshake); only it is disallowed from setting
        // error/request (those report Supplicant-side failures back to
        // it).
        match role {
            Role::Supplicant => {
                if ki.key_ack() {
                    return Err(Error::InvalidKeyAckBitSupplicant);
                }
            }
            Role::Authenticator => {
                if ki.error() {
                    return Err(Error::InvalidErrorBitAuthenticator);
                }
                if ki.request() {
                    return Err(Error::InvalidRequestBitAuthenticator);
                }
            }
        }

        if ki.encrypted_key_data() && !ki.key_mic() {
            return Err(Error::InvalidMicBitForEncryptedKeyData);
        }

        // IEEE Std 802.11-2016, 12.7.2: the Authenticator's replay counter
        // must strictly increase on every message it sends; the
        // Supplicant only ever echoes the counter it was last given, so
        // receiving it unchanged is expected (not a replay).
        match role {
            Role::Authenticator => {
                if frame.key_replay_counter <= last_key_replay_counter {
                    return Err(Error::InvalidKeyReplayCounter(
                        frame.key_replay_counter,
                        last_key_replay_counter,
                    ));
                }
            }
            Role::Supplicant => {
                if frame.key_replay_counter < last_key_replay_counter {
                    return Err(Error::InvalidKeyReplayCounter(
                        frame.key_replay_counter,
                        last_key_replay_counter,
                    ));
                }
            }
        }

        Ok(VerifiedKeyFrame { frame, key_descriptor_version })
    }

    pub fn verify_mic(&self, kck: &[u8]) -> Result<(), Error> {
        crate::integrity::verify_mic(kck, self.key_descriptor_version, self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{akm, cipher};

    fn rsn_protection() -> NegotiatedProtection {
        NegotiatedProtection {
            group_data: Cipher::new_dot11(cipher::CCMP),
            pairwise: Cipher::new_dot11(cipher::CCMP),
            akm: Akm::new_dot11(akm::PSK),
            mic_size: 16,
            caps: Capabilities::default(),
            protection_type: ProtectionType::Rsne,
        }
    }

    #[test]
    fn ccmp_everywhere_selects_descriptor_version_3() {
        let version =
            derive_key_descriptor_version(KeyDescriptor::Ieee802dot11 as u8, &rsn_protection())
                .expect("known descriptor");
        assert_eq!(version, 3);
    }

    #[test]
    fn tkip_pairwise_selects_descriptor_version_2() {
        let mut protection = rsn_protection();
        protection.pairwise = Cipher::new_dot11(cipher::TKIP);
        let version =
            derive_key_descriptor_version(KeyDescriptor::Ieee802dot11 as u8, &protection)
                .expect("known descriptor");
        assert_eq!(version, 2);
    }

    #[test]
    fn authenticator_frame_with_non_increasing_replay_counter_is_rejected() {
        let mut frame = KeyFrame::default();
        frame.descriptor_type = KeyDescriptor::Ieee802dot11 as u8;
        frame.key_replay_counter = 5;
        let result = VerifiedKeyFrame::from_frame(&frame, Role::Authenticator, &rsn_protection(), 5);
        assert_eq!(result, Err(Error::InvalidKeyReplayCounter(5, 5)));
    }
}
