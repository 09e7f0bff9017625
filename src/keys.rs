//! Key bindings.
//!
//! Translates server keycodes into keysyms and keysyms into window manager
//! actions. Every binding requires the configured modifier to be held.

use std::collections::HashMap;

use x11rb::protocol::xproto::Keycode;

pub type Keysym = u32;

// Latin-1 keysyms for the bound keys
pub const XK_D: Keysym = 0x64;
pub const XK_I: Keysym = 0x69;
pub const XK_J: Keysym = 0x6a;
pub const XK_K: Keysym = 0x6b;
pub const XK_Q: Keysym = 0x71;
pub const XK_T: Keysym = 0x74;
pub const XK_X: Keysym = 0x78;

// X11 modifier masks
pub const SHIFT_MASK: u16 = 1;
pub const LOCK_MASK: u16 = 2;
pub const CONTROL_MASK: u16 = 4;
pub const MOD1_MASK: u16 = 8; // Alt
pub const MOD2_MASK: u16 = 16; // NumLock, usually
pub const MOD4_MASK: u16 = 64; // Super/Win

/// Window manager action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SpawnTerminal,
    CloseFocused,
    FocusNext,
    FocusPrev,
    IncreaseMasters,
    DecreaseMasters,
    Quit,
}

/// The fixed binding table
pub const BINDINGS: [(Keysym, Action); 7] = [
    (XK_T, Action::SpawnTerminal),
    (XK_Q, Action::CloseFocused),
    (XK_J, Action::FocusNext),
    (XK_K, Action::FocusPrev),
    (XK_I, Action::IncreaseMasters),
    (XK_D, Action::DecreaseMasters),
    (XK_X, Action::Quit),
];

/// Look up the action bound to `keysym`
pub fn action_for(keysym: Keysym) -> Option<Action> {
    BINDINGS
        .iter()
        .find(|(k, _)| *k == keysym)
        .map(|&(_, action)| action)
}

/// Whether `state` has every bit of `modifier` set.
///
/// Extra modifiers such as Shift, CapsLock or NumLock do not prevent a match.
pub fn modifier_held(state: u16, modifier: u16) -> bool {
    state & modifier == modifier
}

/// Parse a modifier name like "Mod4" or "Alt" into an X11 mask
pub fn parse_modifier(name: &str) -> Option<u16> {
    match name.to_lowercase().as_str() {
        "mod1" | "alt" => Some(MOD1_MASK),
        "mod4" | "super" | "win" => Some(MOD4_MASK),
        "control" | "ctrl" => Some(CONTROL_MASK),
        "shift" => Some(SHIFT_MASK),
        _ => {
            log::warn!("Unknown modifier: {}", name);
            None
        }
    }
}

/// Snapshot of the server's keycode to keysym table
#[derive(Debug, Clone)]
pub struct KeyboardMap {
    min_keycode: Keycode,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyboardMap {
    pub fn new(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode: keysyms_per_keycode as usize,
            keysyms,
        }
    }

    /// Translate a keycode, taking the unshifted column unless Shift is held.
    pub fn keysym(&self, keycode: Keycode, state: u16) -> Option<Keysym> {
        let column = if state & SHIFT_MASK != 0 { 1 } else { 0 };
        if keycode < self.min_keycode || column >= self.keysyms_per_keycode {
            return None;
        }
        let idx = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode + column;
        self.keysyms.get(idx).copied().filter(|&k| k != 0)
    }

    /// First keycode that produces `keysym` in any column
    pub fn keycode(&self, keysym: Keysym) -> Option<Keycode> {
        if self.keysyms_per_keycode == 0 {
            return None;
        }
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .position(|chunk| chunk.contains(&keysym))
            .map(|i| self.min_keycode + i as u8)
    }

    /// Keycodes for every bound keysym the keyboard can produce
    pub fn bound_keycodes(&self) -> HashMap<Action, Keycode> {
        let mut codes = HashMap::new();
        for (keysym, action) in BINDINGS {
            match self.keycode(keysym) {
                Some(code) => {
                    codes.insert(action, code);
                }
                None => log::warn!(
                    "Could not find keycode for {:?} (keysym 0x{:x})",
                    action,
                    keysym
                ),
            }
        }
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two columns per keycode starting at 8: "t/T", "j/J", "x/X"
    fn keyboard() -> KeyboardMap {
        KeyboardMap::new(8, 2, vec![XK_T, 0x54, XK_J, 0x4a, XK_X, 0x58])
    }

    #[test]
    fn test_binding_table() {
        assert_eq!(action_for(XK_T), Some(Action::SpawnTerminal));
        assert_eq!(action_for(XK_Q), Some(Action::CloseFocused));
        assert_eq!(action_for(XK_J), Some(Action::FocusNext));
        assert_eq!(action_for(XK_K), Some(Action::FocusPrev));
        assert_eq!(action_for(XK_I), Some(Action::IncreaseMasters));
        assert_eq!(action_for(XK_D), Some(Action::DecreaseMasters));
        assert_eq!(action_for(XK_X), Some(Action::Quit));
        assert_eq!(action_for(0x61), None);
        assert_eq!(action_for(0x58), None); // shifted X
    }

    #[test]
    fn test_keysym_uses_shift_column() {
        let map = keyboard();
        assert_eq!(map.keysym(8, 0), Some(XK_T));
        assert_eq!(map.keysym(8, SHIFT_MASK), Some(0x54));
        assert_eq!(map.keysym(9, MOD1_MASK), Some(XK_J));
        assert_eq!(map.keysym(10, MOD1_MASK | SHIFT_MASK), Some(0x58));
    }

    #[test]
    fn test_keysym_out_of_range() {
        let map = keyboard();
        assert_eq!(map.keysym(7, 0), None);
        assert_eq!(map.keysym(200, 0), None);
    }

    #[test]
    fn test_keycode_reverse_lookup() {
        let map = keyboard();
        assert_eq!(map.keycode(XK_X), Some(10));
        assert_eq!(map.keycode(0x4a), Some(9));
        assert_eq!(map.keycode(XK_Q), None);

        let codes = map.bound_keycodes();
        assert_eq!(codes.get(&Action::SpawnTerminal), Some(&8));
        assert_eq!(codes.get(&Action::Quit), Some(&10));
        assert!(!codes.contains_key(&Action::CloseFocused));
    }

    #[test]
    fn test_modifier_held() {
        assert!(modifier_held(MOD1_MASK, MOD1_MASK));
        assert!(modifier_held(MOD1_MASK | LOCK_MASK | MOD2_MASK, MOD1_MASK));
        assert!(!modifier_held(CONTROL_MASK, MOD1_MASK));
        assert!(!modifier_held(0, MOD4_MASK));
    }

    #[test]
    fn test_parse_modifier() {
        assert_eq!(parse_modifier("Mod1"), Some(MOD1_MASK));
        assert_eq!(parse_modifier("alt"), Some(MOD1_MASK));
        assert_eq!(parse_modifier("Super"), Some(MOD4_MASK));
        assert_eq!(parse_modifier("ctrl"), Some(CONTROL_MASK));
        assert_eq!(parse_modifier("hyper"), None);
    }
}
