//! Supported Rates / Extended Supported Rates elements. IEEE Std
//! 802.11-2016, 9.4.2.3 and 9.4.2.13.
//!
//! Each rate octet packs the rate in units of 500 kb/s into the low 7 bits
//! and a "basic rate" flag into the high bit; 0xff is a reserved filler
//! value some implementations pad with and is skipped.

use crate::error::Error;
use crate::ie::{Tlv, EXTENDED_SUPPORTED_RATES_ELEMENT_ID, SUPPORTED_RATES_ELEMENT_ID};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct SupportedRates {
    /// Rate values with the basic-rate bit masked off, in units of 500
    /// kb/s, deduplicated across however many elements contributed them.
    pub rates: BTreeSet<u8>,
}

impl SupportedRates {
    pub fn parse_into(tlv: &Tlv, out: &mut SupportedRates) -> Result<(), Error> {
        if tlv.tag != SUPPORTED_RATES_ELEMENT_ID && tlv.tag != EXTENDED_SUPPORTED_RATES_ELEMENT_ID
        {
            return Err(Error::TlvWrongTag {
                want: SUPPORTED_RATES_ELEMENT_ID,
                got: tlv.tag,
            });
        }
        if tlv.tag == SUPPORTED_RATES_ELEMENT_ID && tlv.data.len() != 8 {
            return Err(Error::TlvTruncated {
                tag: tlv.tag,
                want: 8,
                have: tlv.data.len(),
            });
        }
        for &rate in tlv.data {
            if rate == 0xff {
                continue;
            }
            out.rates.insert(rate & 0x7f);
        }
        Ok(())
    }
}

impl Default for SupportedRates {
    fn default() -> SupportedRates {
        SupportedRates { rates: BTreeSet::new() }
    }
}
