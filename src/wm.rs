//! The window manager state object.
//!
//! `Wm` owns the window system connection together with the registry,
//! focus, master count and running flag. It is constructed once in `main`
//! and torn down when the event loop ends.

use std::collections::HashSet;

use anyhow::Result;
use x11rb::protocol::xproto::Window;

use crate::config::Settings;
use crate::display::WindowSystem;
use crate::focus::Focus;
use crate::keys::Action;
use crate::layout::{adjust_masters, clamp_masters, master_stack};
use crate::registry::{Client, ClientRegistry};
use crate::spawn::spawn_detached;
use crate::state::{StateTransition, StateViolation, UnmanageReason, ViolationKind};
use crate::tracing::EventTracer;
use crate::types::Rect;

/// Number of trace entries written to the log on shutdown
const SHUTDOWN_TRACE_LEN: usize = 50;

pub struct Wm<W: WindowSystem> {
    pub(crate) system: W,
    pub(crate) settings: Settings,
    /// Area the layout is computed for
    screen: Rect,
    running: bool,
    pub(crate) clients: ClientRegistry,
    focus: Focus,
    masters: usize,
    pub(crate) tracer: EventTracer,
}

impl<W: WindowSystem> Wm<W> {
    pub fn new(system: W, settings: Settings, screen: Rect) -> Self {
        log::info!(
            "Tiling a {}x{} screen, border {}px",
            screen.width,
            screen.height,
            settings.border_width
        );
        Self {
            system,
            settings,
            screen,
            running: true,
            clients: ClientRegistry::new(),
            focus: Focus::new(),
            masters: 1,
            tracer: EventTracer::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn masters(&self) -> usize {
        self.masters
    }

    /// Application window of the focused client
    pub fn focused_window(&self) -> Option<Window> {
        self.focus
            .get()
            .and_then(|id| self.clients.get(id))
            .map(|c| c.window)
    }

    /// Main event loop
    pub fn run(&mut self) -> Result<()> {
        log::info!("Entering event loop");

        while self.is_running() {
            let event = self.system.next_event()?;
            self.dispatch(event)?;
        }

        log::info!("Exiting window manager");
        log::debug!(
            "Windows still managed: {:?}, {} master(s)",
            self.clients.windows(),
            self.masters()
        );
        log::debug!("Recent events: {}", self.tracer.dump_json(SHUTDOWN_TRACE_LEN));
        Ok(())
    }

    /// Frame and start managing `window`.
    ///
    /// A window that is already managed is only mapped again.
    pub fn manage_window(&mut self, window: Window) -> Result<()> {
        if self.clients.find_by_window(window).is_some() {
            log::debug!("Re-showing managed window 0x{:x}", window);
            return self.system.map(window);
        }
        if self.clients.find_by_frame(window).is_some() {
            return Ok(());
        }

        let Some(rect) = self.system.geometry(window)? else {
            log::debug!("Window 0x{:x} vanished before it could be framed", window);
            return Ok(());
        };

        let frame = self.system.create_frame(rect)?;
        self.system.reparent(window, frame)?;
        self.system.map(window)?;
        self.system.map(frame)?;
        self.system.watch_structure(frame)?;

        let previous = self.focused_window();
        let id = self.clients.push_front(Client::new(window, frame));
        self.focus.set(id);

        log::info!("Managing window 0x{:x} in frame 0x{:x}", window, frame);
        self.tracer
            .trace_transition(&StateTransition::ClientManaged { window, frame });

        self.apply_layout()?;
        self.sync_focus(previous)
    }

    /// Forget a destroyed window and release its frame
    pub fn unmanage_window(&mut self, window: Window) -> Result<()> {
        let Some(lookup) = self.clients.find_by_window(window) else {
            log::debug!("Ignoring untracked window 0x{:x}", window);
            return Ok(());
        };

        let previous = self.focused_window();
        let Some(removed) = self.clients.remove(lookup) else {
            log::warn!("Stale lookup for window 0x{:x}, not removing", window);
            return Ok(());
        };

        log::info!("Unmanaging window 0x{:x}", window);
        self.tracer.trace_transition(&StateTransition::ClientUnmanaged {
            window,
            reason: UnmanageReason::ClientDestroyed,
        });

        self.system.destroy(removed.client.frame)?;
        self.focus.client_removed(&removed, &self.clients);

        let masters = clamp_masters(self.masters, self.clients.len());
        if masters != self.masters {
            self.tracer.trace_transition(&StateTransition::MastersChanged {
                from: self.masters,
                to: masters,
            });
            self.masters = masters;
        }

        self.apply_layout()?;
        self.sync_focus(previous)
    }

    /// Push master/stack geometry for every client
    pub fn apply_layout(&mut self) -> Result<()> {
        let rects = master_stack(self.clients.len(), self.masters, self.screen);

        for ((_, client), rect) in self.clients.iter().zip(rects) {
            self.system.move_resize(client.frame, rect)?;
            // Only the frame moves; the window stays at the frame's origin
            self.system.move_resize(client.window, rect.at_origin())?;
        }

        self.system.flush()
    }

    pub fn focus_next(&mut self) -> Result<()> {
        let previous = self.focused_window();
        if self.focus.focus_next(&self.clients).is_none() {
            return Ok(());
        }
        self.sync_focus(previous)
    }

    pub fn focus_prev(&mut self) -> Result<()> {
        let previous = self.focused_window();
        if self.focus.focus_prev(&self.clients).is_none() {
            return Ok(());
        }
        self.sync_focus(previous)
    }

    /// Change the master count by `delta`; out-of-range changes are ignored
    pub fn update_masters(&mut self, delta: isize) -> Result<()> {
        let Some(masters) = adjust_masters(self.masters, delta, self.clients.len()) else {
            log::debug!("Master count stays at {}", self.masters);
            return Ok(());
        };

        self.tracer.trace_transition(&StateTransition::MastersChanged {
            from: self.masters,
            to: masters,
        });
        self.masters = masters;
        self.apply_layout()
    }

    /// Ask the focused client to close.
    ///
    /// Clients advertising WM_DELETE_WINDOW get the message; anything else is
    /// killed. Either way the client stays registered until its window is
    /// destroyed.
    pub fn close_focused(&mut self) -> Result<()> {
        let Some(window) = self.focused_window() else {
            return Ok(());
        };

        let polite = self.system.supports_delete(window);
        if polite {
            log::info!("Requesting close of window 0x{:x}", window);
            self.system.send_delete(window)?;
        } else {
            log::info!("Killing client of window 0x{:x}", window);
            self.system.kill(window)?;
        }
        self.tracer
            .trace_transition(&StateTransition::CloseRequested { window, polite });
        self.system.flush()
    }

    /// Move the head client's frame so its corner follows the pointer
    pub fn drag_head(&mut self, root_x: i32, root_y: i32) -> Result<()> {
        let Some(frame) = self.head_frame() else {
            return Ok(());
        };
        self.system.move_to(frame, root_x, root_y)
    }

    fn head_frame(&self) -> Option<Window> {
        let head = self.clients.head()?;
        self.clients.get(head).map(|c| c.frame)
    }

    /// Where the layout puts `window`, in root coordinates
    pub fn tiled_geometry(&self, window: Window) -> Option<Rect> {
        let rects = master_stack(self.clients.len(), self.masters, self.screen);
        let border = self.settings.border_width as i32;
        self.clients
            .iter()
            .zip(rects)
            .find(|((_, client), _)| client.window == window)
            .map(|(_, rect)| Rect::new(rect.x + border, rect.y + border, rect.width, rect.height))
    }

    pub fn spawn_terminal(&self) {
        spawn_detached(&self.settings.terminal);
    }

    pub fn quit(&mut self) {
        log::info!("Quitting window manager");
        self.running = false;
    }

    /// Execute a window manager action
    pub fn execute_action(&mut self, action: Action) -> Result<()> {
        log::debug!("Executing {:?}", action);
        match action {
            Action::SpawnTerminal => self.spawn_terminal(),
            Action::CloseFocused => self.close_focused()?,
            Action::FocusNext => self.focus_next()?,
            Action::FocusPrev => self.focus_prev()?,
            Action::IncreaseMasters => self.update_masters(1)?,
            Action::DecreaseMasters => self.update_masters(-1)?,
            Action::Quit => self.quit(),
        }
        Ok(())
    }

    /// Record a focus change and hand input focus to the server
    fn sync_focus(&mut self, previous: Option<Window>) -> Result<()> {
        let current = self.focused_window();
        if current != previous {
            log::debug!("Focus {:?} -> {:?}", previous, current);
            self.tracer.trace_transition(&StateTransition::FocusChanged {
                from: previous,
                to: current,
            });
        }
        self.system.set_input_focus(current)?;
        self.system.flush()
    }

    /// Check the invariants that must hold between events
    pub fn validate_state(&self) -> Vec<StateViolation> {
        let mut violations = Vec::new();

        if self.clients.linked_len() != self.clients.len() {
            violations.push(StateViolation::new(
                ViolationKind::BrokenLinks,
                format!(
                    "{} clients stored, {} reachable from head",
                    self.clients.len(),
                    self.clients.linked_len()
                ),
            ));
        }

        let mut windows = HashSet::new();
        let mut frames = HashSet::new();
        for (_, client) in self.clients.iter() {
            if !windows.insert(client.window) {
                violations.push(StateViolation::new(
                    ViolationKind::DuplicateWindow,
                    format!("window 0x{:x} registered twice", client.window),
                ));
            }
            if !frames.insert(client.frame) {
                violations.push(StateViolation::new(
                    ViolationKind::DuplicateFrame,
                    format!("frame 0x{:x} registered twice", client.frame),
                ));
            }
        }

        match self.focus.get() {
            Some(id) if self.clients.get(id).is_none() => violations.push(StateViolation::new(
                ViolationKind::InvalidFocus,
                "focus refers to a removed client",
            )),
            None if !self.clients.is_empty() => violations.push(StateViolation::new(
                ViolationKind::MissingFocus,
                format!("no focus with {} clients", self.clients.len()),
            )),
            _ => {}
        }

        if self.masters < 1 || self.masters > self.clients.len().max(1) {
            violations.push(StateViolation::new(
                ViolationKind::MastersOutOfBounds,
                format!("{} masters for {} clients", self.masters, self.clients.len()),
            ));
        }

        violations
    }
}
