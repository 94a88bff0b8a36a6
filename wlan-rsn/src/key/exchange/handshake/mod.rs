pub mod fourway;
pub mod group_key;

use eapol::{KeyFrame, KeyInformation, ProtocolVersion};

/// Builds the skeleton of a Supplicant-originated EAPoL-Key frame (2/4,
/// 4/4, or group message 2/2): no key data, MIC zeroed pending
/// `integrity::compute_mic`, replay counter echoed from the triggering
/// frame. Mirrors `eapol_create_ptk_2_of_4`/`eapol_create_ptk_4_of_4`/
/// `eapol_create_gtk_2_of_2`.
pub fn responder_frame_skeleton(
    key_descriptor_type: u8,
    key_descriptor_version: u16,
    key_replay_counter: u64,
    mic_size: u16,
) -> KeyFrame {
    let mut key_info = KeyInformation::default();
    key_info.set_key_descriptor_version(key_descriptor_version);
    key_info.set_key_mic(true);
    key_info.set_secure(false);

    let mut frame = KeyFrame::default();
    frame.version = ProtocolVersion::Ieee802dot1x2001 as u8;
    frame.packet_type = eapol::PacketType::Key as u8;
    frame.descriptor_type = key_descriptor_type;
    frame.key_info = key_info;
    frame.key_replay_counter = key_replay_counter;
    frame.key_mic = bytes::Bytes::from(vec![0u8; mic_size as usize]);
    frame.key_data = bytes::Bytes::from(vec![]);
    frame.update_packet_body_len();
    frame
}
