//! 4-Way Handshake, Supplicant side. IEEE Std 802.11-2016, 12.7.6.
//!
//! Only the Supplicant role is implemented: iwd (this crate's grounding
//! source) is a client-side daemon and never acts as an Authenticator.

use crate::error::Error;
use crate::key::exchange::handshake::responder_frame_skeleton;
use crate::key::ptk::Ptk;
use crate::key::Key;
use crate::key_data::{self, Kde};
use crate::rsna::{
    NegotiatedProtection, Role, SecAssocStatus, SecAssocUpdate, UpdateSink, VerifiedKeyFrame,
};
use eapol::KeyFrame;

#[derive(Debug, Clone, PartialEq)]
enum State {
    AwaitingMsg1,
    AwaitingMsg3 { ptk: Ptk, anonce: [u8; 32], snonce: [u8; 32] },
    Completed,
}

/// Which message class produced `last_tx`, so a retransmitted frame can be
/// told apart from an unrelated frame that merely reuses an old counter
/// value (e.g. a forged message 3 carrying message 1's counter).
#[derive(Debug, Clone, Copy, PartialEq)]
enum RxClass {
    Msg1,
    Msg3,
}

pub struct FourwayHandshake {
    protection: NegotiatedProtection,
    pmk: Vec<u8>,
    aa: [u8; 6],
    spa: [u8; 6],
    /// The RSNE body this side saw during association (its own IE, or the
    /// AP's, depending on who constructs the handshake). Message 3 must
    /// echo the same RSNE; a mismatch means someone tampered with the
    /// association-time IEs to force a weaker cipher/AKM onto the link.
    assoc_rsne: Option<Vec<u8>>,
    last_key_replay_counter: u64,
    /// The last frame sent in reply to `last_key_replay_counter`. A
    /// retransmitted Authenticator frame carrying that same counter gets
    /// this frame again instead of being re-derived and re-installed.
    last_tx: Option<KeyFrame>,
    /// The message class `last_tx` was a reply to.
    last_rx_class: Option<RxClass>,
    state: State,
}

impl FourwayHandshake {
    pub fn new(
        protection: NegotiatedProtection,
        pmk: Vec<u8>,
        aa: [u8; 6],
        spa: [u8; 6],
        assoc_rsne: Option<Vec<u8>>,
    ) -> Self {
        FourwayHandshake {
            protection,
            pmk,
            aa,
            spa,
            assoc_rsne,
            last_key_replay_counter: 0,
            last_tx: None,
            last_rx_class: None,
            state: State::AwaitingMsg1,
        }
    }

    pub fn on_eapol_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &KeyFrame,
        snonce: [u8; 32],
    ) -> Result<(), Error> {
        if let Some(cached) = self.retransmission_reply(frame) {
            update_sink.push(SecAssocUpdate::TxEapolKeyFrame(cached));
            return Ok(());
        }

        let verified = VerifiedKeyFrame::from_frame(
            frame,
            Role::Authenticator,
            &self.protection,
            self.last_key_replay_counter,
        )?;

        match std::mem::replace(&mut self.state, State::Completed) {
            State::AwaitingMsg1 => self.on_msg1(update_sink, &verified, snonce),
            State::AwaitingMsg3 { ptk, anonce, snonce } => {
                self.on_msg3(update_sink, &verified, ptk, anonce, snonce)
            }
            State::Completed => Err(Error::UnexpectedHandshakeMessage),
        }
    }

    /// IEEE Std 802.11-2016, 12.7.2: a retransmitted message carries the
    /// same replay counter as the one it's a retransmission of. Answering
    /// with the cached reply (rather than re-running `on_msg1`/`on_msg3`)
    /// keeps key installation one-shot under retransmission.
    ///
    /// Counter equality alone isn't enough: a forged message 3 can reuse
    /// message 1's counter instead of advancing it, and that must be
    /// rejected rather than answered with the cached message 2. Only a
    /// frame whose key information still matches the message class that
    /// produced `last_tx` counts as a genuine retransmission.
    fn retransmission_reply(&self, frame: &KeyFrame) -> Option<KeyFrame> {
        let last_tx = self.last_tx.as_ref()?;
        if frame.key_replay_counter != self.last_key_replay_counter {
            return None;
        }
        let same_class = match self.last_rx_class? {
            RxClass::Msg1 => eapol::verify_ptk_1_of_4(&frame.key_info),
            RxClass::Msg3 => {
                eapol::verify_ptk_3_of_4(&frame.key_info, self.protection.protection())
            }
        };
        if same_class {
            Some(last_tx.clone())
        } else {
            None
        }
    }

    fn on_msg1(
        &mut self,
        update_sink: &mut UpdateSink,
        verified: &VerifiedKeyFrame,
        snonce: [u8; 32],
    ) -> Result<(), Error> {
        if !eapol::verify_ptk_1_of_4(&verified.frame.key_info) {
            return Err(Error::UnexpectedKeyInformation);
        }

        let anonce = verified.frame.key_nonce;
        let ptk = Ptk::derive(
            &self.protection.akm,
            &self.protection.pairwise,
            &self.pmk,
            &self.aa,
            &self.spa,
            &anonce,
            &snonce,
        )?;

        self.last_key_replay_counter = verified.frame.key_replay_counter;
        let msg2 = self.build_msg2(&ptk, &snonce)?;
        self.last_tx = Some(msg2.clone());
        self.last_rx_class = Some(RxClass::Msg1);
        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg2));
        self.state = State::AwaitingMsg3 { ptk, anonce, snonce };
        Ok(())
    }

    fn build_msg2(&self, ptk: &Ptk, snonce: &[u8; 32]) -> Result<KeyFrame, Error> {
        let mut frame = responder_frame_skeleton(
            eapol::KeyDescriptor::Ieee802dot11 as u8,
            derive_descriptor_version(&self.protection)?,
            self.last_key_replay_counter,
            self.protection.mic_size,
        );
        frame.key_nonce = *snonce;
        frame.update_packet_body_len();
        sign(&mut frame, ptk, &self.protection)?;
        Ok(frame)
    }

    fn on_msg3(
        &mut self,
        update_sink: &mut UpdateSink,
        verified: &VerifiedKeyFrame,
        ptk: Ptk,
        anonce: [u8; 32],
        snonce: [u8; 32],
    ) -> Result<(), Error> {
        if !eapol::verify_ptk_3_of_4(&verified.frame.key_info, self.protection.protection()) {
            return Err(Error::UnexpectedKeyInformation);
        }
        if verified.frame.key_nonce != anonce {
            return Err(Error::AnonceMismatch);
        }
        verified.verify_mic(&ptk.kck)?;

        // Message 3/4 always carries its RSNE/GTK in encrypted Key Data;
        // unlike message 1/4 this bit isn't optional, and checking it here
        // (rather than only when it happens to be set) is what guarantees
        // the downgrade check below always runs.
        if !verified.frame.key_info.encrypted_key_data() {
            return Err(Error::InvalidMicBitForEncryptedKeyData);
        }
        let plaintext = crate::keywrap::decrypt_key_data(
            verified.key_descriptor_version,
            &ptk.kek,
            &verified.frame.key_iv,
            &verified.frame.key_data,
        )?;
        self.check_rsne_not_downgraded(&plaintext)?;
        let kdes = key_data::parse_kdes(&plaintext)?;
        let gtk = kdes.into_iter().find_map(|kde| match kde {
            Kde::Gtk(gtk) => Some(crate::key::gtk::Gtk::new(gtk.key_id, gtk.gtk)),
            _ => None,
        });

        self.last_key_replay_counter = verified.frame.key_replay_counter;
        let msg4 = self.build_msg4(&ptk)?;
        self.last_tx = Some(msg4.clone());
        self.last_rx_class = Some(RxClass::Msg3);
        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg4));
        update_sink.push(SecAssocUpdate::Key(Key::Ptk(ptk)));
        if let Some(gtk) = gtk {
            update_sink.push(SecAssocUpdate::Key(Key::Gtk(gtk)));
        }
        update_sink.push(SecAssocUpdate::Status(SecAssocStatus::EssSaEstablished));

        self.state = State::Completed;
        let _ = snonce;
        Ok(())
    }

    /// Compares the RSNE carried in message 3's key data against the one
    /// this side observed during association. Only checked when this side
    /// was told to expect one; legacy WPA1 networks and bare-PSK test
    /// setups that skip association-time IE capture pass `None` and are
    /// exempt.
    fn check_rsne_not_downgraded(&self, key_data: &[u8]) -> Result<(), Error> {
        let expected = match &self.assoc_rsne {
            Some(rsne) => rsne,
            None => return Ok(()),
        };
        let found = crate::ie::TlvIter::new(key_data)
            .find(|tlv| tlv.tag == crate::rsne::ELEMENT_ID)
            .map(|tlv| tlv.data.to_vec());
        match found {
            Some(body) if &body == expected => Ok(()),
            _ => Err(Error::SecurityIeMismatch),
        }
    }

    fn build_msg4(&self, ptk: &Ptk) -> Result<KeyFrame, Error> {
        let mut frame = responder_frame_skeleton(
            eapol::KeyDescriptor::Ieee802dot11 as u8,
            derive_descriptor_version(&self.protection)?,
            self.last_key_replay_counter,
            self.protection.mic_size,
        );
        frame.key_info.set_secure(true);
        frame.update_packet_body_len();
        sign(&mut frame, ptk, &self.protection)?;
        Ok(frame)
    }
}

fn derive_descriptor_version(protection: &NegotiatedProtection) -> Result<u16, Error> {
    crate::rsna::derive_key_descriptor_version(
        eapol::KeyDescriptor::Ieee802dot11 as u8,
        protection,
    )
}

fn sign(frame: &mut KeyFrame, ptk: &Ptk, protection: &NegotiatedProtection) -> Result<(), Error> {
    let version = derive_descriptor_version(protection)?;
    let mut mic = vec![0u8; protection.mic_size as usize];
    crate::integrity::compute_mic(&ptk.kck, version, frame, &mut mic)?;
    frame.key_mic = bytes::Bytes::from(mic);
    Ok(())
}
