//! ICCCM atoms the window manager needs.

use anyhow::Result;
use x11rb::protocol::xproto::{Atom, ConnectionExt};
use x11rb::rust_connection::RustConnection;

/// Atoms for the polite close protocol
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
}

impl Atoms {
    /// Create and intern all required atoms
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            wm_protocols: Self::intern(conn, b"WM_PROTOCOLS")?,
            wm_delete_window: Self::intern(conn, b"WM_DELETE_WINDOW")?,
        })
    }

    /// Intern an atom name
    fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom> {
        Ok(conn.intern_atom(false, name)?.reply()?.atom)
    }
}
