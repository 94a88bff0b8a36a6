//! Top-level ESS Security Association engine: picks which handshake a
//! message belongs to and drives it, producing `SecAssocUpdate`s for the
//! caller (`sm::Sm`) to turn into callback invocations.

use crate::error::Error;
use crate::key::exchange::handshake::fourway::FourwayHandshake;
use crate::key::exchange::handshake::group_key::GroupKeyHandshake;
use crate::key::Key;
use crate::rsna::{NegotiatedProtection, SecAssocUpdate, UpdateSink};
use eapol::KeyFrame;

enum Phase {
    FourWay(FourwayHandshake),
    GroupKey { kck: Vec<u8>, kek: Vec<u8>, handshake: GroupKeyHandshake },
}

/// Drives a single peer's ESS-SA: the initial 4-Way Handshake, then any
/// number of subsequent Group Key Handshakes once the PTK is known.
pub struct EssSa {
    protection: NegotiatedProtection,
    phase: Phase,
}

impl EssSa {
    pub fn new(
        protection: NegotiatedProtection,
        pmk: Vec<u8>,
        aa: [u8; 6],
        spa: [u8; 6],
        assoc_rsne: Option<Vec<u8>>,
    ) -> Self {
        EssSa {
            protection: protection.clone(),
            phase: Phase::FourWay(FourwayHandshake::new(protection, pmk, aa, spa, assoc_rsne)),
        }
    }

    pub fn on_eapol_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &KeyFrame,
        snonce: [u8; 32],
    ) -> Result<(), Error> {
        match &mut self.phase {
            Phase::FourWay(hs) => {
                let before = update_sink.len();
                hs.on_eapol_key_frame(update_sink, frame, snonce)?;
                if let Some(ptk) = update_sink[before..].iter().find_map(|u| match u {
                    SecAssocUpdate::Key(Key::Ptk(ptk)) => Some(ptk.clone()),
                    _ => None,
                }) {
                    self.phase = Phase::GroupKey {
                        kck: ptk.kck.clone(),
                        kek: ptk.kek.clone(),
                        handshake: GroupKeyHandshake::new(self.protection.clone(), frame.key_replay_counter),
                    };
                }
                Ok(())
            }
            Phase::GroupKey { kck, kek, handshake } => {
                handshake.on_eapol_key_frame(update_sink, frame, kck, kek)
            }
        }
    }
}
