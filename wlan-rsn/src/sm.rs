//! Per-peer handshake driver and the capability hooks it needs from the
//! rest of the system. Mirrors the lifecycle of `eapol_sm_new`/
//! `eapol_sm_set_*`/`eapol_start`/`eapol_cancel`, but replaces the
//! process-wide `__eapol_set_*_func` function pointers with per-instance
//! closures: several peers (and tests) can run concurrently without
//! fighting over shared global state.

use crate::auth;
use crate::crypto_utils::nonce::NonceReader;
use crate::error::Error;
use crate::key::Key;
use crate::rsna::{EssSa, NegotiatedProtection, SecAssocStatus, SecAssocUpdate, UpdateSink};
use eapol::KeyFrame;
use log::{debug, warn};
use std::collections::HashMap;

/// The actions a handshake in progress needs from its caller: transmitting
/// a frame, obtaining a fresh nonce, installing derived keys into the data
/// path, and tearing the link down on failure.
pub struct Capabilities {
    pub tx: Box<dyn FnMut(&[u8; 6], &[u8; 6], &KeyFrame)>,
    pub get_nonce: Box<dyn FnMut() -> Result<[u8; 32], Error>>,
    pub install_tk: Box<dyn FnMut(&[u8; 6], &[u8], u8)>,
    pub install_gtk: Box<dyn FnMut(u8, &[u8], u8)>,
    pub deauthenticate: Box<dyn FnMut(&[u8; 6], u16)>,
}

impl Capabilities {
    /// Builds a `get_nonce` closure backed by a `NonceReader`, for callers
    /// that don't need to supply their own nonce source (tests, or callers
    /// content with the default CSPRNG).
    pub fn default_get_nonce() -> Result<Box<dyn FnMut() -> Result<[u8; 32], Error>>, Error> {
        let reader = NonceReader::new().map_err(|_| Error::NonceGenerationFailed)?;
        Ok(Box::new(move || Ok(reader.next())))
    }
}

/// Drives a single peer's EAPoL-Key exchange from association through
/// 4-Way Handshake and any number of subsequent Group Key Handshakes.
pub struct Sm {
    aa: [u8; 6],
    spa: [u8; 6],
    protection: NegotiatedProtection,
    essa: EssSa,
    caps: Capabilities,
    started: bool,
}

impl Sm {
    pub fn new(
        auth_config: &auth::Config,
        protection: NegotiatedProtection,
        aa: [u8; 6],
        spa: [u8; 6],
        assoc_rsne: Option<Vec<u8>>,
        caps: Capabilities,
    ) -> Sm {
        let pmk = auth_config.compute_pmk();
        let essa = EssSa::new(protection.clone(), pmk, aa, spa, assoc_rsne);
        Sm { aa, spa, protection, essa, caps, started: false }
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn cancel(&mut self) {
        self.started = false;
    }

    pub fn on_eapol_key_frame(&mut self, frame: &KeyFrame) -> Result<(), Error> {
        if !self.started {
            return Err(Error::UnexpectedHandshakeMessage);
        }
        let snonce = (self.caps.get_nonce)()?;
        let mut updates = UpdateSink::new();
        let result = self.essa.on_eapol_key_frame(&mut updates, frame, snonce);
        self.drain(updates);
        if let Err(e) = &result {
            if e.is_silently_dropped() {
                debug!("dropping eapol-key frame from {:?}: {}", self.aa, e);
            } else {
                warn!("eapol-key handling failed, deauthenticating peer: {}", e);
                (self.caps.deauthenticate)(&self.aa, e.deauth_reason_code());
            }
        }
        result
    }

    fn drain(&mut self, updates: UpdateSink) {
        for update in updates {
            match update {
                SecAssocUpdate::TxEapolKeyFrame(frame) => {
                    (self.caps.tx)(&self.aa, &self.spa, &frame);
                }
                SecAssocUpdate::Key(Key::Ptk(ptk)) => {
                    (self.caps.install_tk)(&self.aa, &ptk.tk, self.protection.pairwise.suite_type);
                }
                SecAssocUpdate::Key(Key::Gtk(gtk)) => {
                    (self.caps.install_gtk)(
                        gtk.key_id,
                        &gtk.tk,
                        self.protection.group_data.suite_type,
                    );
                }
                SecAssocUpdate::Status(SecAssocStatus::EssSaEstablished) => {
                    debug!("ESS-SA established with {:?}", self.aa);
                }
                SecAssocUpdate::Status(SecAssocStatus::WrongPassword) => {
                    warn!("ESS-SA failed, PSK is likely wrong");
                }
            }
        }
    }
}

/// Owns one `Sm` per interface index, mirroring `eapol_sm_new`/
/// `eapol_sm_free` and the `ifindex`-addressed dispatch `__eapol_rx_packet`
/// does internally in the grounding source. Unlike that source, nothing
/// here is a process-wide global: the registry is a value the caller owns
/// and passes around.
#[derive(Default)]
pub struct Registry {
    sms: HashMap<u32, Sm>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry { sms: HashMap::new() }
    }

    pub fn insert(&mut self, ifindex: u32, sm: Sm) {
        self.sms.insert(ifindex, sm);
    }

    pub fn remove(&mut self, ifindex: u32) -> Option<Sm> {
        self.sms.remove(&ifindex)
    }

    pub fn get_mut(&mut self, ifindex: u32) -> Option<&mut Sm> {
        self.sms.get_mut(&ifindex)
    }

    pub fn start(&mut self, ifindex: u32) {
        if let Some(sm) = self.sms.get_mut(&ifindex) {
            sm.start();
        }
    }

    pub fn cancel(&mut self, ifindex: u32) {
        self.sms.remove(&ifindex);
    }

    pub fn rx_eapol_key_frame(&mut self, ifindex: u32, frame: &KeyFrame) -> Result<(), Error> {
        match self.sms.get_mut(&ifindex) {
            Some(sm) => sm.on_eapol_key_frame(frame),
            None => Err(Error::UnexpectedHandshakeMessage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{akm, cipher, rsna::ProtectionType, rsne::Capabilities as RsneCapabilities};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn protection() -> NegotiatedProtection {
        NegotiatedProtection {
            group_data: cipher::Cipher::new_dot11(cipher::CCMP),
            pairwise: cipher::Cipher::new_dot11(cipher::CCMP),
            akm: akm::Akm::new_dot11(akm::PSK),
            mic_size: 16,
            caps: RsneCapabilities::default(),
            protection_type: ProtectionType::Rsne,
        }
    }

    fn recording_caps(snonce: [u8; 32]) -> (Capabilities, Rc<RefCell<Vec<KeyFrame>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let sent_clone = sent.clone();
        let caps = Capabilities {
            tx: Box::new(move |_aa, _spa, frame| sent_clone.borrow_mut().push(frame.clone())),
            get_nonce: Box::new(move || Ok(snonce)),
            install_tk: Box::new(|_aa, _tk, _cipher| {}),
            install_gtk: Box::new(|_key_id, _gtk, _cipher| {}),
            deauthenticate: Box::new(|_aa, _reason| {}),
        };
        (caps, sent)
    }

    #[test]
    fn ignores_frames_before_start_is_called() {
        let config = auth::Config::for_psk("ThisIsAPassword", "ssid").expect("valid");
        let (caps, _sent) = recording_caps([0x33u8; 32]);
        let mut sm = Sm::new(&config, protection(), [1; 6], [2; 6], None, caps);

        let mut msg1 = KeyFrame::default();
        msg1.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
        msg1.key_info.set_key_descriptor_version(3);
        msg1.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
        msg1.key_info.set_key_ack(true);
        msg1.key_replay_counter = 1;

        let result = sm.on_eapol_key_frame(&msg1);
        assert_eq!(result, Err(Error::UnexpectedHandshakeMessage));
    }

    #[test]
    fn message_1_after_start_produces_a_transmitted_message_2() {
        let config = auth::Config::for_psk("ThisIsAPassword", "ssid").expect("valid");
        let (caps, sent) = recording_caps([0x33u8; 32]);
        let mut sm = Sm::new(&config, protection(), [1; 6], [2; 6], None, caps);
        sm.start();

        let mut msg1 = KeyFrame::default();
        msg1.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
        msg1.key_info.set_key_descriptor_version(3);
        msg1.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
        msg1.key_info.set_key_ack(true);
        msg1.key_replay_counter = 1;
        msg1.key_nonce = [0x11u8; 32];

        sm.on_eapol_key_frame(&msg1).expect("msg1 handled");
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(sent.borrow()[0].key_nonce, [0x33u8; 32]);
    }

    #[test]
    fn stale_replay_counter_is_dropped_without_deauthenticating() {
        let config = auth::Config::for_psk("ThisIsAPassword", "ssid").expect("valid");
        let sent = Rc::new(RefCell::new(Vec::new()));
        let sent_clone = sent.clone();
        let deauthed = Rc::new(RefCell::new(false));
        let deauthed_clone = deauthed.clone();
        let caps = Capabilities {
            tx: Box::new(move |_aa, _spa, frame| sent_clone.borrow_mut().push(frame.clone())),
            get_nonce: Box::new(move || Ok([0x33u8; 32])),
            install_tk: Box::new(|_aa, _tk, _cipher| {}),
            install_gtk: Box::new(|_key_id, _gtk, _cipher| {}),
            deauthenticate: Box::new(move |_aa, _reason| *deauthed_clone.borrow_mut() = true),
        };
        let mut sm = Sm::new(&config, protection(), [1; 6], [2; 6], None, caps);
        sm.start();

        let mut msg1 = KeyFrame::default();
        msg1.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
        msg1.key_info.set_key_descriptor_version(3);
        msg1.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
        msg1.key_info.set_key_ack(true);
        msg1.key_replay_counter = 5;
        sm.on_eapol_key_frame(&msg1).expect("msg1 handled");

        // A forged message 3 reusing message 1's counter instead of
        // advancing it: stale, but not worth tearing the link down over.
        let mut bad_msg3 = KeyFrame::default();
        bad_msg3.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
        bad_msg3.key_info.set_key_descriptor_version(3);
        bad_msg3.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
        bad_msg3.key_info.set_key_ack(true);
        bad_msg3.key_info.set_install(true);
        bad_msg3.key_info.set_key_mic(true);
        bad_msg3.key_info.set_secure(true);
        bad_msg3.key_replay_counter = 5;

        let result = sm.on_eapol_key_frame(&bad_msg3);
        assert_eq!(result, Err(Error::InvalidKeyReplayCounter(5, 5)));
        assert!(!*deauthed.borrow(), "stale replay counter must not deauthenticate");
    }

    #[test]
    fn registry_dispatches_by_ifindex_and_rejects_unknown_ones() {
        let config = auth::Config::for_psk("ThisIsAPassword", "ssid").expect("valid");
        let (caps, _sent) = recording_caps([0x44u8; 32]);
        let sm = Sm::new(&config, protection(), [1; 6], [2; 6], None, caps);

        let mut registry = Registry::new();
        registry.insert(3, sm);
        registry.start(3);

        let mut msg1 = KeyFrame::default();
        msg1.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
        msg1.key_info.set_key_descriptor_version(3);
        msg1.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
        msg1.key_info.set_key_ack(true);
        msg1.key_replay_counter = 1;

        assert!(registry.rx_eapol_key_frame(3, &msg1).is_ok());
        assert_eq!(
            registry.rx_eapol_key_frame(7, &msg1),
            Err(Error::UnexpectedHandshakeMessage)
        );

        registry.cancel(3);
        assert!(registry.get_mut(3).is_none());
    }
}
