//! The window system seam.
//!
//! Everything the window manager asks of the display server goes through
//! `WindowSystem`. The X11 implementation lives in `x11.rs`; tests use the
//! recording double below.

use anyhow::Result;
use x11rb::protocol::xproto::Window;

use crate::event::{ConfigureRequest, WmEvent};
use crate::types::Rect;

pub trait WindowSystem {
    /// Block until the next event arrives
    fn next_event(&mut self) -> Result<WmEvent>;

    /// Current geometry of `window`, `None` if it no longer exists
    fn geometry(&mut self, window: Window) -> Result<Option<Rect>>;

    /// Create a bordered frame window on the root at `rect`
    fn create_frame(&mut self, rect: Rect) -> Result<Window>;

    /// Make `window` a child of `frame` at (0, 0)
    fn reparent(&mut self, window: Window, frame: Window) -> Result<()>;

    fn map(&mut self, window: Window) -> Result<()>;

    fn destroy(&mut self, window: Window) -> Result<()>;

    /// Subscribe to structure events on a frame, the same classes the root
    /// is subscribed to
    fn watch_structure(&mut self, frame: Window) -> Result<()>;

    fn move_resize(&mut self, window: Window, rect: Rect) -> Result<()>;

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<()>;

    /// Grant a configure request for a window we do not manage
    fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> Result<()>;

    /// Send `window` a synthetic ConfigureNotify reporting `rect` in root
    /// coordinates
    fn notify_geometry(&mut self, window: Window, rect: Rect) -> Result<()>;

    /// Give input focus to `window`, or revert to the pointer root
    fn set_input_focus(&mut self, window: Option<Window>) -> Result<()>;

    /// Whether `window` advertises WM_DELETE_WINDOW in WM_PROTOCOLS
    fn supports_delete(&mut self, window: Window) -> bool;

    /// Ask `window` to close itself
    fn send_delete(&mut self, window: Window) -> Result<()>;

    /// Forcibly disconnect the client owning `window`
    fn kill(&mut self, window: Window) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

#[cfg(test)]
pub mod recording {
    //! A `WindowSystem` that records every request and replays queued events.

    use std::collections::{HashMap, HashSet, VecDeque};

    use anyhow::{anyhow, Result};
    use x11rb::protocol::xproto::Window;

    use super::WindowSystem;
    use crate::event::{ConfigureRequest, WmEvent};
    use crate::types::Rect;

    /// Frame ids handed out by the double start here
    pub const FIRST_FRAME: Window = 0x100_0000;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        CreateFrame(Window, Rect),
        Reparent(Window, Window),
        Map(Window),
        Destroy(Window),
        WatchStructure(Window),
        MoveResize(Window, Rect),
        MoveTo(Window, i32, i32),
        ConfigureUnmanaged(Window),
        NotifyGeometry(Window, Rect),
        SetInputFocus(Option<Window>),
        SendDelete(Window),
        Kill(Window),
    }

    #[derive(Debug, Default)]
    pub struct RecordingSystem {
        pub events: VecDeque<WmEvent>,
        pub calls: Vec<Call>,
        /// Windows that answer geometry queries; others are treated as gone
        pub windows: HashMap<Window, Rect>,
        /// Windows advertising WM_DELETE_WINDOW
        pub deletable: HashSet<Window>,
        next_frame: Window,
    }

    impl RecordingSystem {
        pub fn new() -> Self {
            Self {
                next_frame: FIRST_FRAME,
                ..Self::default()
            }
        }

        /// Register an application window the server knows about
        pub fn add_window(&mut self, window: Window) {
            self.windows.insert(window, Rect::new(10, 10, 300, 200));
        }

        /// Latest geometry pushed for `window`
        pub fn last_geometry(&self, window: Window) -> Option<Rect> {
            self.calls.iter().rev().find_map(|call| match call {
                Call::MoveResize(w, rect) if *w == window => Some(*rect),
                _ => None,
            })
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }
    }

    impl WindowSystem for RecordingSystem {
        fn next_event(&mut self) -> Result<WmEvent> {
            self.events
                .pop_front()
                .ok_or_else(|| anyhow!("event queue drained"))
        }

        fn geometry(&mut self, window: Window) -> Result<Option<Rect>> {
            Ok(self.windows.get(&window).copied())
        }

        fn create_frame(&mut self, rect: Rect) -> Result<Window> {
            let frame = self.next_frame;
            self.next_frame += 1;
            self.calls.push(Call::CreateFrame(frame, rect));
            Ok(frame)
        }

        fn reparent(&mut self, window: Window, frame: Window) -> Result<()> {
            self.calls.push(Call::Reparent(window, frame));
            Ok(())
        }

        fn map(&mut self, window: Window) -> Result<()> {
            self.calls.push(Call::Map(window));
            Ok(())
        }

        fn destroy(&mut self, window: Window) -> Result<()> {
            self.calls.push(Call::Destroy(window));
            Ok(())
        }

        fn watch_structure(&mut self, frame: Window) -> Result<()> {
            self.calls.push(Call::WatchStructure(frame));
            Ok(())
        }

        fn move_resize(&mut self, window: Window, rect: Rect) -> Result<()> {
            self.calls.push(Call::MoveResize(window, rect));
            Ok(())
        }

        fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<()> {
            self.calls.push(Call::MoveTo(window, x, y));
            Ok(())
        }

        fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> Result<()> {
            self.calls.push(Call::ConfigureUnmanaged(request.window));
            Ok(())
        }

        fn notify_geometry(&mut self, window: Window, rect: Rect) -> Result<()> {
            self.calls.push(Call::NotifyGeometry(window, rect));
            Ok(())
        }

        fn set_input_focus(&mut self, window: Option<Window>) -> Result<()> {
            self.calls.push(Call::SetInputFocus(window));
            Ok(())
        }

        fn supports_delete(&mut self, window: Window) -> bool {
            self.deletable.contains(&window)
        }

        fn send_delete(&mut self, window: Window) -> Result<()> {
            self.calls.push(Call::SendDelete(window));
            Ok(())
        }

        fn kill(&mut self, window: Window) -> Result<()> {
            self.calls.push(Call::Kill(window));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }
}
