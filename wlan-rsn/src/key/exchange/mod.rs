pub mod handshake;

/// Which handshake a `Config` drives. Both share the same PTK/GTK
/// plumbing; only the message sequencing differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    FourWayHandshake,
    GroupKeyHandshake,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub method: Method,
}

impl Config {
    pub fn for_4way_handshake() -> Config {
        Config { method: Method::FourWayHandshake }
    }

    pub fn for_groupkey_handshake() -> Config {
        Config { method: Method::GroupKeyHandshake }
    }
}
