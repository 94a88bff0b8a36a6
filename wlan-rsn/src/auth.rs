//! PMK acquisition. IEEE Std 802.11-2016, Annex J.4: a PSK network derives
//! its PMK from a passphrase and SSID via PBKDF2-HMAC-SHA1; a PMK can also
//! be supplied directly (802.1X/EAP networks hand one down from the
//! authentication server, out of scope for this crate to produce).

use crate::error::Error;
use crypto::hmac::Hmac;
use crypto::pbkdf2::pbkdf2;
use crypto::sha1::Sha1;

const PMK_LEN: usize = 32;
const PSK_ITERATIONS: u32 = 4096;

#[derive(Debug, Clone)]
pub enum Config {
    Psk { passphrase: String, ssid: String },
    Pmk(Vec<u8>),
}

impl Config {
    pub fn for_psk(passphrase: &str, ssid: &str) -> Result<Config, Error> {
        if passphrase.len() < 8 || passphrase.len() > 63 {
            return Err(Error::InvalidKeyLength(passphrase.len() as u16, PMK_LEN as u16));
        }
        Ok(Config::Psk { passphrase: passphrase.to_string(), ssid: ssid.to_string() })
    }

    pub fn for_pmk(pmk: Vec<u8>) -> Result<Config, Error> {
        if pmk.len() != PMK_LEN {
            return Err(Error::InvalidKeyLength(pmk.len() as u16, PMK_LEN as u16));
        }
        Ok(Config::Pmk(pmk))
    }

    pub fn compute_pmk(&self) -> Vec<u8> {
        match self {
            Config::Pmk(pmk) => pmk.clone(),
            Config::Psk { passphrase, ssid } => {
                let mut mac = Hmac::new(Sha1::new(), passphrase.as_bytes());
                let mut pmk = vec![0u8; PMK_LEN];
                pbkdf2(&mut mac, ssid.as_bytes(), PSK_ITERATIONS, &mut pmk);
                pmk
            }
        }
    }
}
