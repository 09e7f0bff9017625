//! Event handling.
//!
//! The window system hands us a closed set of `WmEvent`s. A fixed table maps
//! each event kind to its handler; kinds without a handler are dropped.

use anyhow::Result;
use x11rb::protocol::xproto::Window;

use crate::display::WindowSystem;
use crate::keys::{action_for, modifier_held, Keysym};
use crate::wm::Wm;

/// Every kind of event the window system reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MapRequest,
    UnmapNotify,
    DestroyNotify,
    ConfigureRequest,
    KeyPress,
    MotionNotify,
    ButtonPress,
    ButtonRelease,
    EnterNotify,
    ClientMessage,
    Error,
    Other,
}

/// Geometry a client asked for; absent fields were not in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent {
    MapRequest { window: Window },
    UnmapNotify { window: Window },
    DestroyNotify { window: Window },
    ConfigureRequest(ConfigureRequest),
    /// `keysym` is `None` when the keycode has no symbol
    KeyPress { keysym: Option<Keysym>, state: u16 },
    MotionNotify { root_x: i32, root_y: i32 },
    /// Observed but carries nothing we use
    Ignored(EventKind),
}

impl WmEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WmEvent::MapRequest { .. } => EventKind::MapRequest,
            WmEvent::UnmapNotify { .. } => EventKind::UnmapNotify,
            WmEvent::DestroyNotify { .. } => EventKind::DestroyNotify,
            WmEvent::ConfigureRequest(_) => EventKind::ConfigureRequest,
            WmEvent::KeyPress { .. } => EventKind::KeyPress,
            WmEvent::MotionNotify { .. } => EventKind::MotionNotify,
            WmEvent::Ignored(kind) => *kind,
        }
    }

    /// The window the event is about, if any
    pub fn window(&self) -> Option<Window> {
        match self {
            WmEvent::MapRequest { window }
            | WmEvent::UnmapNotify { window }
            | WmEvent::DestroyNotify { window } => Some(*window),
            WmEvent::ConfigureRequest(req) => Some(req.window),
            _ => None,
        }
    }
}

pub type Handler<W> = fn(&mut Wm<W>, &WmEvent) -> Result<()>;

/// The dispatch table
pub fn handler_for<W: WindowSystem>(kind: EventKind) -> Option<Handler<W>> {
    match kind {
        EventKind::MapRequest => Some(Wm::<W>::handle_map_request as Handler<W>),
        EventKind::UnmapNotify => Some(Wm::<W>::handle_unmap_notify as Handler<W>),
        EventKind::DestroyNotify => Some(Wm::<W>::handle_destroy_notify as Handler<W>),
        EventKind::ConfigureRequest => Some(Wm::<W>::handle_configure_request as Handler<W>),
        EventKind::KeyPress => Some(Wm::<W>::handle_key_press as Handler<W>),
        EventKind::MotionNotify => Some(Wm::<W>::handle_motion as Handler<W>),
        _ => None,
    }
}

impl<W: WindowSystem> Wm<W> {
    /// Run the handler for `event` to completion
    pub fn dispatch(&mut self, event: WmEvent) -> Result<()> {
        let kind = event.kind();
        let Some(handler) = handler_for::<W>(kind) else {
            log::trace!("Dropping {:?}", event);
            return Ok(());
        };

        self.tracer
            .trace_event(&format!("{:?}", kind), event.window(), "");
        handler(self, &event)?;

        if cfg!(debug_assertions) {
            for violation in self.validate_state() {
                log::warn!(
                    "State violation after {:?}: {}",
                    kind,
                    serde_json::to_string(&violation).unwrap_or_else(|_| violation.description.clone())
                );
            }
        }
        Ok(())
    }

    fn handle_map_request(&mut self, event: &WmEvent) -> Result<()> {
        let WmEvent::MapRequest { window } = *event else {
            return Ok(());
        };
        log::debug!("MapRequest for window 0x{:x}", window);
        self.manage_window(window)
    }

    /// Unmapping never evicts; a client may map itself again later
    fn handle_unmap_notify(&mut self, event: &WmEvent) -> Result<()> {
        if let WmEvent::UnmapNotify { window } = *event {
            log::debug!("UnmapNotify for window 0x{:x}", window);
        }
        Ok(())
    }

    fn handle_destroy_notify(&mut self, event: &WmEvent) -> Result<()> {
        let WmEvent::DestroyNotify { window } = *event else {
            return Ok(());
        };
        log::debug!("DestroyNotify for window 0x{:x}", window);
        self.unmanage_window(window)
    }

    fn handle_configure_request(&mut self, event: &WmEvent) -> Result<()> {
        let WmEvent::ConfigureRequest(request) = *event else {
            return Ok(());
        };
        log::debug!("ConfigureRequest for window 0x{:x}", request.window);

        if self.clients.find_by_window(request.window).is_some() {
            // The layout decides; re-assert it and tell the client where it is
            self.apply_layout()?;
            if let Some(rect) = self.tiled_geometry(request.window) {
                self.system.notify_geometry(request.window, rect)?;
            }
            self.system.flush()
        } else if self.clients.find_by_frame(request.window).is_some() {
            self.apply_layout()
        } else {
            self.system.configure_unmanaged(&request)?;
            self.system.flush()
        }
    }

    fn handle_key_press(&mut self, event: &WmEvent) -> Result<()> {
        let WmEvent::KeyPress { keysym, state } = *event else {
            return Ok(());
        };
        log::debug!("KeyPress: keysym={:?}, state=0x{:x}", keysym, state);

        if !modifier_held(state, self.settings.modifier) {
            return Ok(());
        }
        match keysym.and_then(action_for) {
            Some(action) => self.execute_action(action),
            None => Ok(()),
        }
    }

    fn handle_motion(&mut self, event: &WmEvent) -> Result<()> {
        let WmEvent::MotionNotify { root_x, root_y } = *event else {
            return Ok(());
        };
        self.drag_head(root_x, root_y)
    }
}
