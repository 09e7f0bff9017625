//! X11 implementation of the window system seam.
//!
//! Owns the single `RustConnection`. Besides the `WindowSystem` requests it
//! knows how to take over the root window, grab the bindings and translate
//! raw protocol events into `WmEvent`s.

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::atoms::Atoms;
use crate::config::Settings;
use crate::display::WindowSystem;
use crate::event::{ConfigureRequest, EventKind, WmEvent};
use crate::keys::{KeyboardMap, LOCK_MASK, MOD2_MASK};
use crate::types::Rect;

/// Event classes the root and every frame are subscribed to
fn structure_events() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY
}

/// `modifiers` with every combination of CapsLock and NumLock added
fn lock_variants(modifiers: ModMask) -> [ModMask; 4] {
    let numlock = ModMask::from(MOD2_MASK);
    let capslock = ModMask::from(LOCK_MASK);
    [
        modifiers,
        modifiers | capslock,
        modifiers | numlock,
        modifiers | capslock | numlock,
    ]
}

/// How frames are drawn
struct FrameStyle {
    border_width: u32,
    border_color: u32,
    background: u32,
}

pub struct XDisplay {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
    keyboard: KeyboardMap,
    style: FrameStyle,
    modifier: u16,
}

impl XDisplay {
    /// Connect to the server named by $DISPLAY
    pub fn connect(settings: &Settings) -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 server")?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        log::info!(
            "Connected to X11, screen {}, root window 0x{:x}, {}x{}",
            screen_num,
            root,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        let atoms = Atoms::new(&conn)?;
        let keyboard = Self::keyboard_map(&conn)?;

        Ok(Self {
            conn,
            screen_num,
            root,
            atoms,
            keyboard,
            style: FrameStyle {
                border_width: settings.border_width,
                border_color: settings.border_color,
                background: settings.background,
            },
            modifier: settings.modifier,
        })
    }

    fn keyboard_map(conn: &RustConnection) -> Result<KeyboardMap> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(KeyboardMap::new(
            min_keycode,
            mapping.keysyms_per_keycode,
            mapping.keysyms,
        ))
    }

    /// Size of the root window
    pub fn screen_rect(&self) -> Rect {
        let screen = &self.conn.setup().roots[self.screen_num];
        Rect::new(
            0,
            0,
            screen.width_in_pixels as u32,
            screen.height_in_pixels as u32,
        )
    }

    /// Become the window manager by requesting SubstructureRedirect on root
    pub fn become_wm(&self) -> Result<()> {
        let result = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new().event_mask(structure_events()),
        );

        self.conn.flush()?;

        if let Err(e) = result?.check() {
            anyhow::bail!("Another window manager is already running! Error: {}", e);
        }

        log::info!("Successfully became the window manager");
        Ok(())
    }

    /// Grab every bound key and all pointer buttons with the modifier held
    pub fn grab_bindings(&self) -> Result<()> {
        let modifiers = ModMask::from(self.modifier);

        for (action, keycode) in self.keyboard.bound_keycodes() {
            self.grab_key(keycode, modifiers)?;
            log::info!(
                "Grabbed {:?} (keycode {}, mods 0x{:x})",
                action,
                keycode,
                self.modifier
            );
        }

        for mods in lock_variants(modifiers) {
            self.conn.grab_button(
                true, // owner_events
                self.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE, // confine_to
                x11rb::NONE, // cursor
                ButtonIndex::ANY,
                mods,
            )?;
        }

        self.conn.flush()?;
        Ok(())
    }

    /// Grab a single key combination
    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        // Grab with and without NumLock/CapsLock to handle those states
        for mods in lock_variants(modifiers) {
            self.conn.grab_key(
                true, // owner_events
                self.root,
                mods,
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    /// Top-level windows that were already visible before we started
    pub fn existing_windows(&self) -> Result<Vec<Window>> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let mut windows = Vec::new();

        for &window in &tree.children {
            let attrs = match self.conn.get_window_attributes(window)?.reply() {
                Ok(attrs) => attrs,
                // Gone between the query and now
                Err(ReplyError::X11Error(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            // Skip popups, menus and anything unmapped
            if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                continue;
            }

            log::info!("Found existing window 0x{:x}", window);
            windows.push(window);
        }

        Ok(windows)
    }

    fn translate(&mut self, event: Event) -> WmEvent {
        match event {
            Event::MapRequest(e) => WmEvent::MapRequest { window: e.window },
            Event::UnmapNotify(e) => WmEvent::UnmapNotify { window: e.window },
            Event::DestroyNotify(e) => WmEvent::DestroyNotify { window: e.window },
            Event::ConfigureRequest(e) => {
                let aux = ConfigureWindowAux::from_configure_request(&e);
                WmEvent::ConfigureRequest(ConfigureRequest {
                    window: e.window,
                    x: aux.x,
                    y: aux.y,
                    width: aux.width,
                    height: aux.height,
                    border_width: aux.border_width,
                })
            }
            Event::KeyPress(e) => {
                let state = u16::from(e.state);
                WmEvent::KeyPress {
                    keysym: self.keyboard.keysym(e.detail, state),
                    state,
                }
            }
            Event::MotionNotify(e) => WmEvent::MotionNotify {
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
            },
            Event::ButtonPress(_) => WmEvent::Ignored(EventKind::ButtonPress),
            Event::ButtonRelease(_) => WmEvent::Ignored(EventKind::ButtonRelease),
            Event::EnterNotify(_) => WmEvent::Ignored(EventKind::EnterNotify),
            Event::ClientMessage(_) => WmEvent::Ignored(EventKind::ClientMessage),
            Event::MappingNotify(_) => {
                match Self::keyboard_map(&self.conn) {
                    Ok(keyboard) => {
                        log::info!("Keyboard mapping changed, reloaded");
                        self.keyboard = keyboard;
                    }
                    Err(e) => log::warn!("Failed to reload keyboard mapping: {}", e),
                }
                WmEvent::Ignored(EventKind::Other)
            }
            Event::Error(e) => {
                // Usually a request racing a window's destruction
                log::debug!("X11 error: {:?}", e);
                WmEvent::Ignored(EventKind::Error)
            }
            _ => WmEvent::Ignored(EventKind::Other),
        }
    }
}

impl WindowSystem for XDisplay {
    fn next_event(&mut self) -> Result<WmEvent> {
        self.conn.flush()?;
        let event = self
            .conn
            .wait_for_event()
            .context("Lost connection to X11 server")?;
        Ok(self.translate(event))
    }

    fn geometry(&mut self, window: Window) -> Result<Option<Rect>> {
        match self.conn.get_geometry(window)?.reply() {
            Ok(geom) => Ok(Some(Rect::new(
                geom.x.into(),
                geom.y.into(),
                geom.width.into(),
                geom.height.into(),
            ))),
            Err(ReplyError::X11Error(e)) => {
                log::debug!("No geometry for window 0x{:x}: {:?}", window, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_frame(&mut self, rect: Rect) -> Result<Window> {
        let frame = self
            .conn
            .generate_id()
            .context("Out of X11 resource ids")?;
        self.conn.create_window(
            0, // depth (copy from parent)
            frame,
            self.root,
            rect.x as i16,
            rect.y as i16,
            rect.width.max(1) as u16,
            rect.height.max(1) as u16,
            self.style.border_width as u16,
            WindowClass::INPUT_OUTPUT,
            0, // visual (copy from parent)
            &CreateWindowAux::new()
                .background_pixel(self.style.background)
                .border_pixel(self.style.border_color),
        )?;
        Ok(frame)
    }

    fn reparent(&mut self, window: Window, frame: Window) -> Result<()> {
        // Keeps the window alive and visible if we exit
        self.conn.change_save_set(SetMode::INSERT, window)?;
        self.conn.reparent_window(window, frame, 0, 0)?;
        Ok(())
    }

    fn map(&mut self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn destroy(&mut self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn watch_structure(&mut self, frame: Window) -> Result<()> {
        self.conn.change_window_attributes(
            frame,
            &ChangeWindowAttributesAux::new().event_mask(structure_events()),
        )?;
        Ok(())
    }

    fn move_resize(&mut self, window: Window, rect: Rect) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width.max(1))
                .height(rect.height.max(1)),
        )?;
        Ok(())
    }

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(request.x)
            .y(request.y)
            .width(request.width)
            .height(request.height)
            .border_width(request.border_width);
        self.conn.configure_window(request.window, &aux)?;
        Ok(())
    }

    fn notify_geometry(&mut self, window: Window, rect: Rect) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: rect.x as i16,
            y: rect.y as i16,
            width: rect.width.max(1) as u16,
            height: rect.height.max(1) as u16,
            border_width: 0,
            override_redirect: false,
        };
        self.conn
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: Option<Window>) -> Result<()> {
        self.conn.set_input_focus(
            InputFocus::POINTER_ROOT,
            window.unwrap_or(self.root),
            x11rb::CURRENT_TIME,
        )?;
        Ok(())
    }

    fn supports_delete(&mut self, window: Window) -> bool {
        if let Ok(cookie) =
            self.conn
                .get_property(false, window, self.atoms.wm_protocols, AtomEnum::ATOM, 0, 32)
        {
            if let Ok(reply) = cookie.reply() {
                if let Some(mut protocols) = reply.value32() {
                    return protocols.any(|a| a == self.atoms.wm_delete_window);
                }
            }
        }
        false
    }

    fn send_delete(&mut self, window: Window) -> Result<()> {
        let data = ClientMessageData::from([self.atoms.wm_delete_window, x11rb::CURRENT_TIME, 0, 0, 0]);
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: self.atoms.wm_protocols,
            data,
        };
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill(&mut self, window: Window) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MOD1_MASK;

    #[test]
    fn test_lock_variants_cover_caps_and_numlock() {
        let masks: Vec<u16> = lock_variants(ModMask::from(MOD1_MASK))
            .into_iter()
            .map(u16::from)
            .collect();
        assert_eq!(
            masks,
            vec![
                MOD1_MASK,
                MOD1_MASK | LOCK_MASK,
                MOD1_MASK | MOD2_MASK,
                MOD1_MASK | LOCK_MASK | MOD2_MASK,
            ]
        );
    }
}
