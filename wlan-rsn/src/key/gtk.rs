//! Group Temporal Key handling. Unlike the PTK, the GTK is generated by
//! the Authenticator (IEEE Std 802.11-2016, 12.7.1.4) and delivered to the
//! Supplicant inside a GTK KDE rather than derived independently by both
//! sides from shared material.

#[derive(Clone, PartialEq)]
pub struct Gtk {
    pub key_id: u8,
    pub tk: Vec<u8>,
}

impl std::fmt::Debug for Gtk {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Gtk").field("key_id", &self.key_id).field("tk_len", &self.tk.len()).finish()
    }
}

impl Gtk {
    pub fn new(key_id: u8, tk: Vec<u8>) -> Gtk {
        Gtk { key_id, tk }
    }
}
