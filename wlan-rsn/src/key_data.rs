//! Key Data Encapsulation (KDE) parsing. IEEE Std 802.11-2016, 12.7.2,
//! Figure 12-35 and Table 12-8. The decrypted Key Data field of an EAPoL-
//! Key frame is itself a sequence of vendor-specific elements wrapping
//! these KDEs (OUI 00:0f:ac, type 1), each carrying its own one-byte
//! "data type" after the KDE header.

use crate::error::Error;
use crate::ie::TlvIter;
use crate::suite_selector::OUI;

pub const KDE_VENDOR_TYPE: u8 = 1;

pub const DATA_TYPE_GTK: u8 = 1;
pub const DATA_TYPE_MAC_ADDRESS: u8 = 3;
pub const DATA_TYPE_PMKID: u8 = 4;
pub const DATA_TYPE_SMK: u8 = 5;
pub const DATA_TYPE_NONCE: u8 = 6;
pub const DATA_TYPE_LIFETIME: u8 = 7;
pub const DATA_TYPE_ERROR: u8 = 8;
pub const DATA_TYPE_IGTK: u8 = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct GtkKde {
    pub key_id: u8,
    pub tx: bool,
    pub gtk: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IgtkKde {
    pub key_id: u16,
    pub ipn: [u8; 6],
    pub igtk: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kde {
    Gtk(GtkKde),
    Igtk(IgtkKde),
    /// Any KDE this crate doesn't act on directly (MAC address, PMKID,
    /// lifetime, ...); kept around with its raw data type and payload in
    /// case a caller wants it.
    Other { data_type: u8, data: Vec<u8> },
}

/// Parses every vendor-specific (OUI, type 1) element in the decrypted
/// Key Data field into its `Kde`. Elements with an unrelated OUI/type
/// (padding, other vendor elements) are skipped.
pub fn parse_kdes(key_data: &[u8]) -> Result<Vec<Kde>, Error> {
    let mut kdes = vec![];
    for tlv in TlvIter::new(key_data) {
        if tlv.tag != crate::ie::VENDOR_SPECIFIC_ELEMENT_ID || tlv.data.len() < 4 {
            continue;
        }
        if tlv.data[0..3] != OUI || tlv.data[3] != KDE_VENDOR_TYPE {
            continue;
        }
        if tlv.data.len() < 5 {
            return Err(Error::RsneTruncated);
        }
        let data_type = tlv.data[4];
        let body = &tlv.data[5..];
        kdes.push(parse_kde_body(data_type, body)?);
    }
    Ok(kdes)
}

fn parse_kde_body(data_type: u8, body: &[u8]) -> Result<Kde, Error> {
    match data_type {
        DATA_TYPE_GTK => {
            if body.len() < 2 {
                return Err(Error::RsneTruncated);
            }
            Ok(Kde::Gtk(GtkKde {
                key_id: body[0] & 0x03,
                tx: body[0] & 0x04 != 0,
                gtk: body[2..].to_vec(),
            }))
        }
        DATA_TYPE_IGTK => {
            if body.len() < 8 {
                return Err(Error::RsneTruncated);
            }
            let mut ipn = [0u8; 6];
            ipn.copy_from_slice(&body[2..8]);
            Ok(Kde::Igtk(IgtkKde {
                key_id: u16::from(body[0]) | (u16::from(body[1]) << 8),
                ipn,
                igtk: body[8..].to_vec(),
            }))
        }
        other => Ok(Kde::Other { data_type: other, data: body.to_vec() }),
    }
}

/// Wraps `gtk` into a GTK KDE vendor element and appends it to `buf`.
pub fn write_gtk_kde(buf: &mut Vec<u8>, key_id: u8, tx: bool, gtk: &[u8]) {
    let mut body = vec![];
    body.extend_from_slice(&OUI);
    body.push(KDE_VENDOR_TYPE);
    body.push(DATA_TYPE_GTK);
    let mut flags = key_id & 0x03;
    if tx {
        flags |= 0x04;
    }
    body.push(flags);
    body.push(0); // reserved
    body.extend_from_slice(gtk);
    crate::ie::tlv_append(buf, crate::ie::VENDOR_SPECIFIC_ELEMENT_ID, &body);
}
