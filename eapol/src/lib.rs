//! EAPoL-Key frame codec.
//!
//! This crate only knows about the wire format of EAPoL-Key frames
//! (IEEE Std 802.1X-2010, 11.9 and IEEE Std 802.11-2016, 12.7.2): parsing,
//! serializing, and checking which of the six well-known frames in a 4-Way
//! or Group Key Handshake a given `KeyInformation` pattern matches. It does
//! not know about PMKs, PTKs, MICs, or key-data encryption; those live in
//! `wlan_rsn`, which depends on this crate for the frame shape and adds the
//! crypto on top.

use bitfield::bitfield;
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes};
use failure::Fail;
use nom::{be_u16, be_u64, be_u8, call, do_parse, eof, error_position, map, named_args, take, verify};
use std::convert::AsMut;

#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    #[fail(display = "frame too short: got {} bytes, need at least {}", got, want)]
    MsgSize { got: usize, want: usize },
    #[fail(display = "unsupported EAPoL protocol version: {}", _0)]
    BadProtocolVersion(u8),
    #[fail(display = "expected packet type {} (Key), got {}", want, got)]
    BadPacketType { want: u8, got: u8 },
    #[fail(display = "malformed EAPoL-Key frame")]
    BadMessage,
}

// IEEE Std 802.1X-2010, 11.9, Table 11-5
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyDescriptor {
    Rc4 = 1,
    Ieee802dot11 = 2,
}

impl KeyDescriptor {
    pub fn from_u8(n: u8) -> Option<KeyDescriptor> {
        match n {
            1 => Some(KeyDescriptor::Rc4),
            2 => Some(KeyDescriptor::Ieee802dot11),
            _ => None,
        }
    }
}

// IEEE Std 802.11-2016, 12.7.2 b.2)
pub const KEY_TYPE_GROUP_SMK: u16 = 0;
pub const KEY_TYPE_PAIRWISE: u16 = 1;

// IEEE Std 802.1X-2010, 11.3.1
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtocolVersion {
    Ieee802dot1x2001 = 1,
    Ieee802dot1x2004 = 2,
    Ieee802dot1x2010 = 3,
}

impl ProtocolVersion {
    pub fn from_u8(n: u8) -> Option<ProtocolVersion> {
        match n {
            1 => Some(ProtocolVersion::Ieee802dot1x2001),
            2 => Some(ProtocolVersion::Ieee802dot1x2004),
            3 => Some(ProtocolVersion::Ieee802dot1x2010),
            _ => None,
        }
    }
}

// IEEE Std 802.1X-2010, 11.3.2, Table 11-3
pub enum PacketType {
    Eap = 0,
    Start = 1,
    Logoff = 2,
    Key = 3,
    AsfAlert = 4,
    Mka = 5,
    AnnouncementGeneric = 6,
    AnnouncementSpecific = 7,
    AnnouncementReq = 8,
}

/// Which flavor of RSNA the frame belongs to. PTK message 3/4's `secure`
/// bit differs between the two: RSN requires it set, WPA1 does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Protection {
    Rsna,
    Wpa1,
}

// IEEE Std 802.11-2016, 12.7.2, Figure 12-33
bitfield! {
    #[derive(PartialEq)]
    pub struct KeyInformation(u16);
    impl Debug;
    pub key_descriptor_version, set_key_descriptor_version: 2, 0;
    pub key_type, set_key_type: 3, 3;
    // Bit 4-5 reserved.
    pub install, set_install: 6;
    pub key_ack, set_key_ack: 7;
    pub key_mic, set_key_mic: 8;
    pub secure, set_secure: 9;
    pub error, set_error: 10;
    pub request, set_request: 11;
    pub encrypted_key_data, set_encrypted_key_data: 12;
    pub smk_message, set_smk_message: 13;
    // Bit 14-15 reserved.

    pub value, _: 15, 0;
}

impl Clone for KeyInformation {
    fn clone(&self) -> KeyInformation {
        KeyInformation(self.value())
    }
}

impl Default for KeyInformation {
    fn default() -> KeyInformation {
        KeyInformation(0)
    }
}

// IEEE Std 802.11-2016, 12.7.2, Figure 12-32
#[derive(Default, Debug, Clone, PartialEq)]
pub struct KeyFrame {
    pub version: u8,
    pub packet_type: u8,
    pub packet_body_len: u16,

    pub descriptor_type: u8,
    pub key_info: KeyInformation,
    pub key_len: u16,
    pub key_replay_counter: u64,
    pub key_nonce: [u8; 32],
    pub key_iv: [u8; 16],
    pub key_rsc: u64,
    // 8 octets reserved.
    pub key_mic: Bytes, /* AKM dependent size */
    pub key_data_len: u16,
    pub key_data: Bytes,
}

/// Length of the whole frame (header included) except the dynamically
/// sized MIC and Key Data fields.
const FIXED_FIELDS_LEN: usize = 83;

/// Length of `packet_body_len`'s own fixed contribution: everything after
/// the 4-byte header except the dynamically sized MIC and Key Data fields.
const FIXED_BODY_LEN: u16 = 79;

impl KeyFrame {
    pub fn len(&self) -> usize {
        FIXED_FIELDS_LEN + self.key_mic.len() + self.key_data.len()
    }

    pub fn as_bytes(&self, clear_mic: bool, buf: &mut Vec<u8>) {
        buf.reserve(self.len());

        buf.put_u8(self.version);
        buf.put_u8(self.packet_type);
        buf.put_u16_be(self.packet_body_len);
        buf.put_u8(self.descriptor_type);
        buf.put_u16_be(self.key_info.value());
        buf.put_u16_be(self.key_len);
        buf.put_u64_be(self.key_replay_counter);
        buf.put_slice(&self.key_nonce[..]);
        buf.put_slice(&self.key_iv[..]);
        buf.put_u64_be(self.key_rsc);
        buf.put_uint_be(0, 8);
        if clear_mic {
            let zeroes: Vec<u8> = vec![0; self.key_mic.len()];
            buf.put_slice(&zeroes[..]);
        } else {
            buf.put_slice(&self.key_mic[..]);
        }
        buf.put_u16_be(self.key_data_len);
        buf.put_slice(&self.key_data[..]);
    }

    pub fn update_packet_body_len(&mut self) {
        self.packet_body_len = FIXED_BODY_LEN + self.key_mic.len() as u16 + self.key_data_len;
    }

    /// Parses a raw EAPoL-Key frame, validating the outer EAPoL header and
    /// the consistency of the declared body length before handing back a
    /// view over the frame. `mic_size` depends on the negotiated AKM/cipher
    /// and must be supplied by the caller (16 bytes for every AKM currently
    /// defined by 802.11).
    pub fn parse(bytes: &[u8], mic_size: u16) -> Result<KeyFrame, Error> {
        if bytes.len() < 4 {
            return Err(Error::MsgSize { got: bytes.len(), want: 4 });
        }
        if ProtocolVersion::from_u8(bytes[0]).is_none() {
            return Err(Error::BadProtocolVersion(bytes[0]));
        }
        if bytes[1] != PacketType::Key as u8 {
            return Err(Error::BadPacketType { want: PacketType::Key as u8, got: bytes[1] });
        }
        // packet_body_len covers everything after these first 4 bytes. Any
        // bytes beyond it are padding the transport added and are not part
        // of the frame (common with Ethernet minimum-frame padding).
        let declared = BigEndian::read_u16(&bytes[2..4]) as usize;
        if 4 + declared > bytes.len() {
            return Err(Error::MsgSize { got: bytes.len(), want: 4 + declared });
        }
        let frame_slice = &bytes[..4 + declared];
        let (_, frame) =
            key_frame_from_bytes(frame_slice, mic_size).map_err(|_| Error::BadMessage)?;
        Ok(frame)
    }
}

pub fn to_array<A>(slice: &[u8]) -> A
where
    A: Sized + Default + AsMut<[u8]>,
{
    let mut array = Default::default();
    <A as AsMut<[u8]>>::as_mut(&mut array).clone_from_slice(slice);
    array
}

named_args!(pub key_frame_from_bytes(mic_size: u16) <KeyFrame>,
       do_parse!(
           version: be_u8 >>
           packet_type: verify!(be_u8, |v:u8| v == PacketType::Key as u8) >>
           packet_body_len: be_u16 >>

           descriptor_type: be_u8 >>
           key_info: map!(be_u16, KeyInformation) >>
           key_len: be_u16 >>
           key_replay_counter: be_u64 >>
           key_nonce: take!(32) >>
           key_iv: take!(16) >>
           key_rsc: be_u64 >>
           take!(8 /* reserved octets */) >>
           key_mic: take!(mic_size) >>
           key_data_len: be_u16 >>
           key_data: take!(key_data_len) >>
           eof!() >>
           (KeyFrame{
               version: version,
               packet_type: packet_type,
               packet_body_len: packet_body_len,
               descriptor_type: descriptor_type,
               key_info: key_info,
               key_len: key_len,
               key_replay_counter: key_replay_counter,
               key_mic: Bytes::from(key_mic),
               key_rsc: key_rsc,
               key_iv: to_array(key_iv),
               key_nonce: to_array(key_nonce),
               key_data_len: key_data_len,
               key_data: Bytes::from(key_data),
           })
    )
);

/// IEEE Std 802.11-2016, 12.7.2, message classification for the 4-Way and
/// Group Key handshakes. These only inspect `KeyInformation`; they know
/// nothing about replay counters, nonces, or MICs, which is the SM's job.
pub fn verify_ptk_1_of_4(ki: &KeyInformation) -> bool {
    ki.key_type() == KEY_TYPE_PAIRWISE
        && ki.key_ack()
        && !ki.key_mic()
        && !ki.secure()
        && !ki.error()
        && !ki.request()
        && !ki.encrypted_key_data()
}

pub fn verify_ptk_2_of_4(ki: &KeyInformation) -> bool {
    ki.key_type() == KEY_TYPE_PAIRWISE
        && !ki.key_ack()
        && ki.key_mic()
        && !ki.secure()
        && !ki.error()
        && !ki.request()
        && !ki.install()
}

/// 802.11i-2004 8.5.3.7: RSN requires `secure` set on message 3/4; WPA1
/// predates the `secure` bit's meaning and leaves it clear.
pub fn verify_ptk_3_of_4(ki: &KeyInformation, protection: Protection) -> bool {
    let secure_ok = match protection {
        Protection::Rsna => ki.secure(),
        Protection::Wpa1 => true,
    };
    ki.key_type() == KEY_TYPE_PAIRWISE
        && ki.key_ack()
        && ki.key_mic()
        && secure_ok
        && !ki.error()
        && !ki.request()
}

pub fn verify_ptk_4_of_4(ki: &KeyInformation) -> bool {
    ki.key_type() == KEY_TYPE_PAIRWISE
        && !ki.key_ack()
        && ki.key_mic()
        && ki.secure()
        && !ki.error()
        && !ki.request()
        && !ki.install()
}

pub fn verify_gtk_1_of_2(ki: &KeyInformation) -> bool {
    ki.key_type() == KEY_TYPE_GROUP_SMK
        && ki.key_ack()
        && ki.key_mic()
        && ki.secure()
        && !ki.error()
        && !ki.request()
}

pub fn verify_gtk_2_of_2(ki: &KeyInformation) -> bool {
    ki.key_type() == KEY_TYPE_GROUP_SMK
        && !ki.key_ack()
        && ki.key_mic()
        && ki.secure()
        && !ki.error()
        && !ki.request()
}
