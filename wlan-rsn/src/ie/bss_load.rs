//! BSS Load element. IEEE Std 802.11-2016, 9.4.2.26.

use crate::error::Error;
use crate::ie::{require_tag, Tlv, BSS_LOAD_ELEMENT_ID};
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BssLoad {
    pub station_count: u16,
    pub channel_utilization: u8,
    pub available_admission_capacity: u16,
}

impl BssLoad {
    pub fn parse(tlv: &Tlv) -> Result<BssLoad, Error> {
        require_tag(tlv, BSS_LOAD_ELEMENT_ID)?;
        if tlv.data.len() != 5 {
            return Err(Error::TlvTruncated {
                tag: BSS_LOAD_ELEMENT_ID,
                want: 5,
                have: tlv.data.len(),
            });
        }
        Ok(BssLoad {
            station_count: LittleEndian::read_u16(&tlv.data[0..2]),
            channel_utilization: tlv.data[2],
            available_admission_capacity: LittleEndian::read_u16(&tlv.data[3..5]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bss_load_fields() {
        let tlv = Tlv {
            tag: BSS_LOAD_ELEMENT_ID,
            data: &[0x0a, 0x00, 0x80, 0x64, 0x00],
        };
        let bss_load = BssLoad::parse(&tlv).expect("parse");
        assert_eq!(bss_load.station_count, 10);
        assert_eq!(bss_load.channel_utilization, 0x80);
        assert_eq!(bss_load.available_admission_capacity, 100);
    }

    #[test]
    fn rejects_wrong_length() {
        let tlv = Tlv { tag: BSS_LOAD_ELEMENT_ID, data: &[0, 0] };
        assert!(BssLoad::parse(&tlv).is_err());
    }
}
