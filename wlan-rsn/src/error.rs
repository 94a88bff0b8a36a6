use eapol;
use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    // --- IE / TLV codec errors ---
    #[fail(display = "TLV element truncated: tag {} claims {} bytes, {} available", tag, want, have)]
    TlvTruncated { tag: u8, want: usize, have: usize },
    #[fail(display = "expected element id {}, got {}", want, got)]
    TlvWrongTag { want: u8, got: u8 },
    #[fail(display = "no vendor element matched OUI {:?} type {}", _0, _1)]
    VendorIeNotFound([u8; 3], u8),
    #[fail(display = "unsupported RSNE version: {}", _0)]
    UnsupportedRsneVersion(u16),
    #[fail(display = "RSNE field truncated")]
    RsneTruncated,
    #[fail(display = "zero-length {} list is invalid", _0)]
    EmptySuiteList(&'static str),
    #[fail(display = "unrecognized cipher suite {:?}/{}", _0, _1)]
    UnknownCipherSuite([u8; 3], u8),
    #[fail(display = "unrecognized AKM suite {:?}/{}", _0, _1)]
    UnknownAkmSuite([u8; 3], u8),
    #[fail(display = "group cipher CCMP cannot be paired with pairwise cipher TKIP")]
    CcmpGroupTkipPairwise,
    #[fail(display = "RSNE has trailing bytes after group management cipher")]
    RsneTrailingBytes,

    // --- Handshake / RSNA errors ---
    #[fail(display = "negotiated protection is invalid: {}", _0)]
    InvalidNegotiatedProtection(&'static str),
    #[fail(display = "unsupported AKM suite")]
    UnsupportedAkmSuite,
    #[fail(display = "unsupported cipher suite")]
    UnsupportedCipherSuite,
    #[fail(display = "invalid key descriptor type {}, expected {}", _0, _1)]
    InvalidKeyDescriptor(u8, u8),
    #[fail(display = "unsupported key descriptor type {}", _0)]
    UnsupportedKeyDescriptor(u8),
    #[fail(display = "unsupported key descriptor version {}", _0)]
    UnsupportedKeyDescriptorVersion(u16),
    #[fail(display = "install bit must not be set in the Group Key Handshake")]
    InvalidInstallBitGroupSmkHandshake,
    #[fail(display = "Supplicant must not set the key ack bit")]
    InvalidKeyAckBitSupplicant,
    #[fail(display = "Authenticator must not set the error bit")]
    InvalidErrorBitAuthenticator,
    #[fail(display = "Authenticator must not set the request bit")]
    InvalidRequestBitAuthenticator,
    #[fail(display = "SMK handshake is not supported")]
    SmkHandshakeNotSupported,
    #[fail(display = "invalid key length {}, expected {}", _0, _1)]
    InvalidKeyLength(u16, u16),
    #[fail(display = "invalid key replay counter {}, expected it to follow {}", _0, _1)]
    InvalidKeyReplayCounter(u64, u64),
    #[fail(display = "encrypted key data requires the MIC bit to be set")]
    InvalidMicBitForEncryptedKeyData,
    #[fail(display = "invalid MIC size")]
    InvalidMicSize,
    #[fail(display = "invalid MIC")]
    InvalidMic,
    #[fail(display = "RSNE carried in message 3/4 differs from the one seen during association")]
    SecurityIeMismatch,
    #[fail(display = "ANonce in message 3/4 differs from the one in message 1/4")]
    AnonceMismatch,
    #[fail(display = "nonce source failed to produce a nonce")]
    NonceGenerationFailed,
    #[fail(display = "no GTK KDE present in key data")]
    MissingGtkKde,
    #[fail(display = "handshake is not in a state that accepts this message")]
    UnexpectedHandshakeMessage,
    #[fail(display = "key information bits don't match the expected pattern for this message")]
    UnexpectedKeyInformation,

    #[fail(display = "{}", _0)]
    EapolError(#[cause] eapol::Error),
}

impl From<eapol::Error> for Error {
    fn from(e: eapol::Error) -> Error {
        Error::EapolError(e)
    }
}

impl Error {
    /// IEEE Std 802.11-2016, 12.7.2: a frame that fails MIC verification or
    /// carries a stale replay counter is dropped without tearing down the
    /// association — it's indistinguishable from packet loss or a spoofed
    /// frame, neither of which should cost the peer its connection. Every
    /// other handshake error (downgrade, nonce mismatch, malformed key
    /// data, ...) is escalated to deauthenticate.
    pub fn is_silently_dropped(&self) -> bool {
        matches!(self, Error::InvalidMic | Error::InvalidKeyReplayCounter(_, _))
    }

    /// IEEE Std 802.11-2016, Table 9-49: reason code to report to the peer
    /// when this error escalates to `deauthenticate`. Only RSNE downgrade
    /// detection has a specifically mandated code (17, "Invalid IE");
    /// every other escalated error uses the generic unspecified reason.
    pub fn deauth_reason_code(&self) -> u16 {
        match self {
            Error::SecurityIeMismatch => 17,
            _ => 0,
        }
    }
}
