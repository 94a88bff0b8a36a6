pub mod exchange;
pub mod gtk;
pub mod ptk;

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Ptk(ptk::Ptk),
    Gtk(gtk::Gtk),
}
