//! Generic Information Element TLV iterator/builder plus the handful of
//! non-RSN elements this crate needs to read off an association: BSS
//! Load, Supported Rates, and Mobility Domain. IEEE Std 802.11-2016,
//! 9.4.2.

pub mod bss_load;
pub mod mobility_domain;
pub mod supported_rates;

use crate::error::Error;

pub const VENDOR_SPECIFIC_ELEMENT_ID: u8 = 0xdd;
pub const BSS_LOAD_ELEMENT_ID: u8 = 0x0b;
pub const SUPPORTED_RATES_ELEMENT_ID: u8 = 0x01;
pub const EXTENDED_SUPPORTED_RATES_ELEMENT_ID: u8 = 0x32;
pub const MOBILITY_DOMAIN_ELEMENT_ID: u8 = 0x36;

/// One `(tag, data)` pair yielded by `TlvIter`. Owns no data; `data`
/// borrows from the buffer the iterator was built on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tlv<'a> {
    pub tag: u8,
    pub data: &'a [u8],
}

/// Walks a byte buffer as a sequence of `tag(1) | length(1) | data(length)`
/// elements, the layout every 802.11 information element shares.
pub struct TlvIter<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TlvIter<'a> {
    pub fn new(buf: &'a [u8]) -> TlvIter<'a> {
        TlvIter { buf, pos: 0 }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Tlv<'a>;

    fn next(&mut self) -> Option<Tlv<'a>> {
        if self.pos + 2 > self.buf.len() {
            return None;
        }
        let tag = self.buf[self.pos];
        let len = self.buf[self.pos + 1] as usize;
        let data_start = self.pos + 2;
        if data_start + len > self.buf.len() {
            return None;
        }
        let data = &self.buf[data_start..data_start + len];
        self.pos = data_start + len;
        Some(Tlv { tag, data })
    }
}

/// Appends a `tag | len | data` element to `buf`. `data` must be 255 bytes
/// or shorter; longer payloads need `vendor_ie_encapsulate` to fragment.
pub fn tlv_append(buf: &mut Vec<u8>, tag: u8, data: &[u8]) {
    debug_assert!(data.len() <= 0xff);
    buf.push(tag);
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
}

/// Concatenates the payloads of every vendor-specific element matching
/// `oui`/`vendor_type` found while scanning `ies`. Used for elements (like
/// WSC) that may be split across several vendor IEs in one frame.
pub fn vendor_ie_concat(oui: [u8; 3], vendor_type: u8, ies: &[u8]) -> Option<Vec<u8>> {
    let mut out = vec![];
    for tlv in TlvIter::new(ies) {
        if tlv.tag != VENDOR_SPECIFIC_ELEMENT_ID || tlv.data.len() < 4 {
            continue;
        }
        if tlv.data[0..3] != oui || tlv.data[3] != vendor_type {
            continue;
        }
        out.extend_from_slice(&tlv.data[4..]);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Splits `data` into as many vendor-specific elements as needed, each
/// carrying at most 251 bytes of payload (255 byte element max minus 3
/// byte OUI minus 1 byte vendor type), and appends them to `buf`.
pub fn vendor_ie_encapsulate(buf: &mut Vec<u8>, oui: [u8; 3], vendor_type: u8, data: &[u8]) {
    const CHUNK: usize = 251;
    if data.is_empty() {
        let mut body = Vec::with_capacity(4);
        body.extend_from_slice(&oui);
        body.push(vendor_type);
        tlv_append(buf, VENDOR_SPECIFIC_ELEMENT_ID, &body);
        return;
    }
    for chunk in data.chunks(CHUNK) {
        let mut body = Vec::with_capacity(4 + chunk.len());
        body.extend_from_slice(&oui);
        body.push(vendor_type);
        body.extend_from_slice(chunk);
        tlv_append(buf, VENDOR_SPECIFIC_ELEMENT_ID, &body);
    }
}

pub fn require_tag(tlv: &Tlv, want: u8) -> Result<(), Error> {
    if tlv.tag != want {
        Err(Error::TlvWrongTag { want, got: tlv.tag })
    } else {
        Ok(())
    }
}
