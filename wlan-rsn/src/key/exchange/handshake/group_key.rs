//! Group Key Handshake, Supplicant side. IEEE Std 802.11-2016, 12.7.7.

use crate::error::Error;
use crate::key::exchange::handshake::responder_frame_skeleton;
use crate::key::ptk::Ptk;
use crate::key::Key;
use crate::key_data::{self, Kde};
use crate::rsna::{NegotiatedProtection, Role, SecAssocUpdate, UpdateSink, VerifiedKeyFrame};
use eapol::KeyFrame;

pub struct GroupKeyHandshake {
    protection: NegotiatedProtection,
    last_key_replay_counter: u64,
    /// Message 2 sent in reply to `last_key_replay_counter`. A retransmitted
    /// message 1 carrying that same counter gets this frame again instead
    /// of failing as an unexpected message.
    last_tx: Option<KeyFrame>,
    done: bool,
}

impl GroupKeyHandshake {
    pub fn new(protection: NegotiatedProtection, last_key_replay_counter: u64) -> Self {
        GroupKeyHandshake { protection, last_key_replay_counter, last_tx: None, done: false }
    }

    /// IEEE Std 802.11-2016, 12.7.2: the Authenticator resends message 1
    /// with the same replay counter if it never saw message 2. Answering
    /// with the cached reply keeps this idempotent under retransmission,
    /// the same way `FourwayHandshake::retransmission_reply` does.
    fn retransmission_reply(&self, frame: &KeyFrame) -> Option<KeyFrame> {
        let last_tx = self.last_tx.as_ref()?;
        if frame.key_replay_counter != self.last_key_replay_counter {
            return None;
        }
        if eapol::verify_gtk_1_of_2(&frame.key_info) {
            Some(last_tx.clone())
        } else {
            None
        }
    }

    /// `kck`/`kek` come from the already-established PTK; the Group Key
    /// Handshake only refreshes the GTK, it does not redo pairwise key
    /// derivation.
    pub fn on_eapol_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &KeyFrame,
        kck: &[u8],
        kek: &[u8],
    ) -> Result<(), Error> {
        if let Some(cached) = self.retransmission_reply(frame) {
            update_sink.push(SecAssocUpdate::TxEapolKeyFrame(cached));
            return Ok(());
        }
        if self.done {
            return Err(Error::UnexpectedHandshakeMessage);
        }
        let verified = VerifiedKeyFrame::from_frame(
            frame,
            Role::Authenticator,
            &self.protection,
            self.last_key_replay_counter,
        )?;
        if !eapol::verify_gtk_1_of_2(&verified.frame.key_info) {
            return Err(Error::UnexpectedKeyInformation);
        }
        verified.verify_mic(kck)?;

        if !verified.frame.key_info.encrypted_key_data() {
            return Err(Error::InvalidMicBitForEncryptedKeyData);
        }
        let plaintext = crate::keywrap::decrypt_key_data(
            verified.key_descriptor_version,
            kek,
            &verified.frame.key_iv,
            &verified.frame.key_data,
        )?;
        let gtk = key_data::parse_kdes(&plaintext)?
            .into_iter()
            .find_map(|kde| match kde {
                Kde::Gtk(gtk) => Some(crate::key::gtk::Gtk::new(gtk.key_id, gtk.gtk)),
                _ => None,
            })
            .ok_or(Error::MissingGtkKde)?;

        self.last_key_replay_counter = verified.frame.key_replay_counter;
        let mut msg2 = responder_frame_skeleton(
            frame.descriptor_type,
            verified.key_descriptor_version,
            self.last_key_replay_counter,
            self.protection.mic_size,
        );
        msg2.key_info.set_secure(true);
        msg2.update_packet_body_len();
        let mut mic = vec![0u8; self.protection.mic_size as usize];
        crate::integrity::compute_mic(kck, verified.key_descriptor_version, &msg2, &mut mic)?;
        msg2.key_mic = bytes::Bytes::from(mic);

        self.last_tx = Some(msg2.clone());
        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg2));
        update_sink.push(SecAssocUpdate::Key(Key::Gtk(gtk)));
        self.done = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{akm, cipher, rsna::ProtectionType, rsne::Capabilities};

    fn protection() -> NegotiatedProtection {
        NegotiatedProtection {
            group_data: cipher::Cipher::new_dot11(cipher::CCMP),
            pairwise: cipher::Cipher::new_dot11(cipher::CCMP),
            akm: crate::akm::Akm::new_dot11(akm::PSK),
            mic_size: 16,
            caps: Capabilities::default(),
            protection_type: ProtectionType::Rsne,
        }
    }

    #[test]
    fn rejects_a_second_message_after_completion() {
        let mut gkh = GroupKeyHandshake::new(protection(), 0);
        gkh.done = true;
        let frame = KeyFrame::default();
        let mut updates = UpdateSink::new();
        let result = gkh.on_eapol_key_frame(&mut updates, &frame, &[0u8; 16], &[0u8; 16]);
        assert_eq!(result, Err(Error::UnexpectedHandshakeMessage));
    }

    #[test]
    fn retransmitted_message_1_gets_cached_message_2() {
        let mut gkh = GroupKeyHandshake::new(protection(), 5);
        let cached = KeyFrame::default();
        gkh.last_tx = Some(cached.clone());
        gkh.done = true;

        let mut frame = KeyFrame::default();
        frame.key_info.set_key_ack(true);
        frame.key_info.set_key_mic(true);
        frame.key_info.set_secure(true);
        frame.key_replay_counter = 5;

        let mut updates = UpdateSink::new();
        gkh.on_eapol_key_frame(&mut updates, &frame, &[0u8; 16], &[0u8; 16])
            .expect("retransmission accepted");
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            SecAssocUpdate::TxEapolKeyFrame(f) => assert_eq!(f, &cached),
            other => panic!("expected cached msg2, got {:?}", other),
        }
    }
}
