//! End-to-end scenarios driving the public `sm`/`rsna`/`rsne`/`wpa` API the
//! way a caller actually would, rather than exercising one module's
//! internals in isolation. Each test plays the role of the Authenticator
//! by hand (deriving the same PTK independently and signing/encrypting
//! frames itself) so the Supplicant-side state machine under test is the
//! only thing whose behavior is actually asserted on.

use wlan_rsn::akm::{self, Akm};
use wlan_rsn::auth;
use wlan_rsn::cipher::{self, Cipher};
use wlan_rsn::key::exchange::handshake::fourway::FourwayHandshake;
use wlan_rsn::key::gtk::Gtk;
use wlan_rsn::key::ptk::Ptk;
use wlan_rsn::key::Key;
use wlan_rsn::key_data;
use wlan_rsn::rsna::{
    NegotiatedProtection, ProtectionType, Role, SecAssocStatus, SecAssocUpdate, UpdateSink,
    VerifiedKeyFrame,
};
use wlan_rsn::rsne::{Capabilities, Rsne};
use wlan_rsn::wpa::WpaIe;
use wlan_rsn::Error;

const AA: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
const SPA: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];
const ANONCE: [u8; 32] = [0xaa; 32];
const SNONCE: [u8; 32] = [0xbb; 32];
const GTK_BYTES: [u8; 16] = [0x77; 16];

fn ccmp_psk_rsne() -> Rsne {
    let mut rsne = Rsne::default();
    rsne.group_cipher = Some(Cipher::new_dot11(cipher::CCMP));
    rsne.pairwise_ciphers = vec![Cipher::new_dot11(cipher::CCMP)];
    rsne.akm_suites = vec![Akm::new_dot11(akm::PSK)];
    rsne.caps = Capabilities::default();
    rsne
}

fn ccmp_psk_protection() -> NegotiatedProtection {
    NegotiatedProtection::from_rsne(&ccmp_psk_rsne()).expect("valid RSNE")
}

/// Pads `body` with the vendor-specific padding element IEEE Std
/// 802.11-2016, 12.7.2 describes for Key Data whose KDEs don't already
/// land on an 8 octet boundary (AES Key Wrap operates in 8 octet blocks).
fn pad_key_data(body: &mut Vec<u8>) {
    let short = (8 - body.len() % 8) % 8;
    if short == 0 {
        return;
    }
    if short == 1 {
        body.push(0xdd);
    } else {
        wlan_rsn::ie::tlv_append(body, 0xdd, &vec![0u8; short - 2]);
    }
}

fn build_msg1(protection: &NegotiatedProtection, replay_counter: u64) -> eapol::KeyFrame {
    let mut frame = eapol::KeyFrame::default();
    frame.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
    frame.key_info.set_key_descriptor_version(3);
    frame.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
    frame.key_info.set_key_ack(true);
    frame.key_replay_counter = replay_counter;
    frame.key_nonce = ANONCE;
    frame.key_mic = bytes::Bytes::from(vec![0u8; protection.mic_size as usize]);
    frame.update_packet_body_len();
    frame
}

/// Builds a signed, key-data-encrypted message 3, playing the
/// Authenticator's part of the handshake.
fn build_msg3(
    protection: &NegotiatedProtection,
    ptk: &Ptk,
    replay_counter: u64,
    rsne_in_key_data: Option<&Rsne>,
) -> eapol::KeyFrame {
    let mut plaintext = vec![];
    if let Some(rsne) = rsne_in_key_data {
        plaintext.extend_from_slice(&rsne.into_bytes());
    }
    key_data::write_gtk_kde(&mut plaintext, 1, true, &GTK_BYTES);
    pad_key_data(&mut plaintext);

    let key_iv = [0u8; 16];
    let ciphertext =
        wlan_rsn::keywrap::encrypt_key_data(3, &ptk.kek, &key_iv, &plaintext).expect("wrap");

    let mut frame = eapol::KeyFrame::default();
    frame.descriptor_type = eapol::KeyDescriptor::Ieee802dot11 as u8;
    frame.key_info.set_key_descriptor_version(3);
    frame.key_info.set_key_type(eapol::KEY_TYPE_PAIRWISE);
    frame.key_info.set_key_ack(true);
    frame.key_info.set_install(true);
    frame.key_info.set_key_mic(true);
    frame.key_info.set_secure(true);
    frame.key_info.set_encrypted_key_data(true);
    frame.key_replay_counter = replay_counter;
    frame.key_nonce = ANONCE;
    frame.key_iv = key_iv;
    frame.key_data_len = ciphertext.len() as u16;
    frame.key_data = bytes::Bytes::from(ciphertext);
    frame.key_mic = bytes::Bytes::from(vec![0u8; protection.mic_size as usize]);
    frame.update_packet_body_len();

    let mut mic = vec![0u8; protection.mic_size as usize];
    wlan_rsn::integrity::compute_mic(&ptk.kck, 3, &frame, &mut mic).expect("mic");
    frame.key_mic = bytes::Bytes::from(mic);
    frame
}

fn authenticator_ptk(protection: &NegotiatedProtection, pmk: &[u8]) -> Ptk {
    Ptk::derive(&protection.akm, &protection.pairwise, pmk, &AA, &SPA, &ANONCE, &SNONCE)
        .expect("derive")
}

/// S1: 4-Way Handshake happy path, CCMP/PSK.
#[test]
fn s1_four_way_handshake_happy_path_ccmp_psk() {
    let protection = ccmp_psk_protection();
    let pmk = auth::Config::for_psk("correct horse battery staple", "network").unwrap().compute_pmk();
    let mut hs = FourwayHandshake::new(protection.clone(), pmk.clone(), AA, SPA, None);

    let msg1 = build_msg1(&protection, 1);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg1, SNONCE).expect("msg1 accepted");
    assert_eq!(updates.len(), 1);
    let msg2 = match &updates[0] {
        SecAssocUpdate::TxEapolKeyFrame(f) => f.clone(),
        other => panic!("expected msg2, got {:?}", other),
    };
    assert_eq!(msg2.key_nonce, SNONCE);

    let ptk = authenticator_ptk(&protection, &pmk);
    let msg3 = build_msg3(&protection, &ptk, 2, None);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg3, SNONCE).expect("msg3 accepted");

    assert!(updates.iter().any(|u| matches_tx_frame(u)));
    assert!(updates.iter().any(|u| match u {
        SecAssocUpdate::Key(Key::Ptk(p)) => p.tk.len() == 16,
        _ => false,
    }));
    assert!(updates.iter().any(|u| match u {
        SecAssocUpdate::Key(Key::Gtk(Gtk { tk, .. })) => tk == &GTK_BYTES.to_vec(),
        _ => false,
    }));
    assert!(updates
        .iter()
        .any(|u| u == &SecAssocUpdate::Status(SecAssocStatus::EssSaEstablished)));
}

fn matches_tx_frame(u: &SecAssocUpdate) -> bool {
    match u {
        SecAssocUpdate::TxEapolKeyFrame(_) => true,
        _ => false,
    }
}

/// S2: downgrade detection. The Supplicant remembers the RSNE it saw
/// during association; a message 3 carrying a different RSNE (e.g. an
/// attacker stripping MFP or swapping AKMs) must be rejected.
#[test]
fn s2_rsn_downgrade_in_message_3_is_rejected() {
    let protection = ccmp_psk_protection();
    let pmk = auth::Config::for_psk("correct horse battery staple", "network").unwrap().compute_pmk();
    let assoc_rsne = ccmp_psk_rsne();
    let mut hs =
        FourwayHandshake::new(protection.clone(), pmk.clone(), AA, SPA, Some(assoc_rsne.into_bytes()[2..].to_vec()));

    let msg1 = build_msg1(&protection, 1);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg1, SNONCE).expect("msg1 accepted");

    let ptk = authenticator_ptk(&protection, &pmk);
    let mut downgraded_rsne = ccmp_psk_rsne();
    downgraded_rsne.pairwise_ciphers = vec![Cipher::new_dot11(cipher::TKIP)];
    let msg3 = build_msg3(&protection, &ptk, 2, Some(&downgraded_rsne));

    let mut updates = UpdateSink::new();
    let result = hs.on_eapol_key_frame(&mut updates, &msg3, SNONCE);
    assert_eq!(result, Err(Error::SecurityIeMismatch));
}

/// S3: replay attack. A repeated/stale message 3 (same or lower replay
/// counter than the one already accepted) must be rejected rather than
/// re-processed.
#[test]
fn s3_replayed_message_3_is_rejected() {
    let protection = ccmp_psk_protection();
    let pmk = auth::Config::for_psk("correct horse battery staple", "network").unwrap().compute_pmk();
    let mut hs = FourwayHandshake::new(protection.clone(), pmk.clone(), AA, SPA, None);

    let msg1 = build_msg1(&protection, 5);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg1, SNONCE).expect("msg1 accepted");

    let ptk = authenticator_ptk(&protection, &pmk);
    // Replay counter must strictly increase past msg1's 5; 5 or lower is a replay.
    let replayed_msg3 = build_msg3(&protection, &ptk, 5, None);
    let mut updates = UpdateSink::new();
    let result = hs.on_eapol_key_frame(&mut updates, &replayed_msg3, SNONCE);
    assert_eq!(result, Err(Error::InvalidKeyReplayCounter(5, 5)));
}

/// S3 continued: once message 3 has been accepted and message 4 sent, a
/// retransmitted message 3 carrying the same replay counter must get the
/// cached message 4 again rather than re-deriving the PTK/GTK a second
/// time and re-invoking key installation.
#[test]
fn s3_retransmitted_message_3_gets_cached_message_4_without_reinstalling() {
    let protection = ccmp_psk_protection();
    let pmk = auth::Config::for_psk("correct horse battery staple", "network").unwrap().compute_pmk();
    let mut hs = FourwayHandshake::new(protection.clone(), pmk.clone(), AA, SPA, None);

    let msg1 = build_msg1(&protection, 1);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg1, SNONCE).expect("msg1 accepted");

    let ptk = authenticator_ptk(&protection, &pmk);
    let msg3 = build_msg3(&protection, &ptk, 2, None);
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg3, SNONCE).expect("msg3 accepted");
    let msg4 = match updates.iter().find(|u| matches_tx_frame(u)) {
        Some(SecAssocUpdate::TxEapolKeyFrame(f)) => f.clone(),
        _ => panic!("expected msg4 in updates"),
    };

    // The peer didn't see our message 4 and retransmits message 3 verbatim.
    let mut updates = UpdateSink::new();
    hs.on_eapol_key_frame(&mut updates, &msg3, SNONCE).expect("retransmitted msg3 accepted");
    assert_eq!(updates.len(), 1);
    match &updates[0] {
        SecAssocUpdate::TxEapolKeyFrame(f) => assert_eq!(f, &msg4),
        other => panic!("expected cached msg4, got {:?}", other),
    }
    assert!(
        !updates.iter().any(|u| matches!(u, SecAssocUpdate::Key(_))),
        "retransmission must not re-invoke key installation"
    );
}

/// S4: WPA1 (legacy) vendor IE round trip, independent of the RSNE path.
#[test]
fn s4_wpa_ie_round_trips_through_negotiated_protection() {
    let wpa = WpaIe {
        version: 1,
        group_cipher: Cipher::new(wlan_rsn::suite_selector::MICROSOFT_OUI, cipher::TKIP),
        pairwise_ciphers: vec![Cipher::new(wlan_rsn::suite_selector::MICROSOFT_OUI, cipher::TKIP)],
        akm_suites: vec![Akm::new(wlan_rsn::suite_selector::MICROSOFT_OUI, akm::PSK)],
    };

    let bytes = wpa.into_bytes().expect("build");
    let parsed = WpaIe::parse(&bytes[2..]).expect("parse");
    assert_eq!(parsed, wpa);

    let protection = NegotiatedProtection::from_legacy_wpa(&parsed).expect("negotiate");
    assert_eq!(protection.protection_type, ProtectionType::LegacyWpa1);
}

/// S5: AES-CMAC MIC verification, exercised through `VerifiedKeyFrame`
/// rather than `integrity` directly (that module's own unit tests already
/// cover the NIST vectors; this checks the layer callers actually use).
#[test]
fn s5_aes_cmac_mic_is_verified_through_verified_key_frame() {
    let protection = ccmp_psk_protection();
    let pmk = auth::Config::for_pmk(vec![0x5au8; 32]).unwrap().compute_pmk();
    let ptk = authenticator_ptk(&protection, &pmk);
    let msg3 = build_msg3(&protection, &ptk, 9, None);

    let verified =
        VerifiedKeyFrame::from_frame(&msg3, Role::Authenticator, &protection, 0).expect("structurally valid");
    verified.verify_mic(&ptk.kck).expect("mic matches");

    let mut tampered = msg3.clone();
    tampered.key_replay_counter = 10; // still a fresh frame structurally...
    let verified_tampered =
        VerifiedKeyFrame::from_frame(&tampered, Role::Authenticator, &protection, 0).expect("structurally valid");
    // ...but the MIC was computed over the untampered replay counter.
    assert_eq!(verified_tampered.verify_mic(&ptk.kck), Err(Error::InvalidMic));
}

/// S6: a truncated RSNE is rejected by the parser rather than panicking
/// or silently accepting a partial suite list.
#[test]
fn s6_truncated_rsne_is_rejected() {
    let mut data = vec![1, 0]; // version only
    data.extend_from_slice(&[0x00, 0x0f, 0xac, cipher::CCMP]); // group cipher
    data.extend_from_slice(&[1, 0]); // claims 1 pairwise cipher
                                      // ...but no pairwise cipher bytes follow.
    assert_eq!(Rsne::parse(&data), Err(Error::RsneTruncated));

    let essa_protection = ccmp_psk_protection();
    // A truncated RSNE never reaches key negotiation at all; confirm the
    // happy-path protection this suite uses elsewhere is unaffected.
    assert_eq!(essa_protection.protection_type, ProtectionType::Rsne);
}
