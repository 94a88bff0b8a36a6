//! Cipher and AKM suite selectors.
//!
//! Every RSNE/WPA-IE cipher or AKM field is a 4-byte (OUI, suite_type) pair
//! (IEEE Std 802.11-2016, 9.4.2.25.2/.3). `akm` and `cipher` both wrap this
//! shape; this module holds the bits they share.

/// The standard IEEE 802.11 OUI used by every cipher/AKM suite this crate
/// supports.
pub const OUI: [u8; 3] = [0x00, 0x0f, 0xac];

/// Microsoft's OUI, used by the WPA1 vendor element and its suites.
pub const MICROSOFT_OUI: [u8; 3] = [0x00, 0x50, 0xf2];
