//! Mobility Domain element. IEEE Std 802.11-2016, 9.4.2.46 (fast BSS
//! transition support).

use crate::error::Error;
use crate::ie::{require_tag, Tlv, MOBILITY_DOMAIN_ELEMENT_ID};
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MobilityDomain {
    pub mdid: u16,
    pub ft_over_ds: bool,
    pub resource_req: bool,
}

impl MobilityDomain {
    pub fn parse(tlv: &Tlv) -> Result<MobilityDomain, Error> {
        require_tag(tlv, MOBILITY_DOMAIN_ELEMENT_ID)?;
        if tlv.data.len() != 3 {
            return Err(Error::TlvTruncated {
                tag: MOBILITY_DOMAIN_ELEMENT_ID,
                want: 3,
                have: tlv.data.len(),
            });
        }
        Ok(MobilityDomain {
            mdid: LittleEndian::read_u16(&tlv.data[0..2]),
            ft_over_ds: tlv.data[2] & 0x01 != 0,
            resource_req: tlv.data[2] & 0x02 != 0,
        })
    }

    pub fn into_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; 3];
        LittleEndian::write_u16(&mut out[0..2], self.mdid);
        if self.ft_over_ds {
            out[2] |= 0x01;
        }
        if self.resource_req {
            out[2] |= 0x02;
        }
        out
    }
}
