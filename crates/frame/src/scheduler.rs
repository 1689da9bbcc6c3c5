use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

/// One-shot wakeup used to defer a frame to the platform's next repaint
/// opportunity. The desktop app backs this with `Window::request_redraw`;
/// tests substitute a recording fake.
pub trait Deferral {
    fn schedule(&self);
}

/// The work a single frame performs, in order. The scheduler owns *when* a
/// frame runs; implementations own *what* it does.
pub trait FramePipeline {
    /// Reconcile render targets with the current window size.
    fn sync_viewport(&mut self);

    /// Step camera inertia. Returns true if the camera actually moved and
    /// the settled image is therefore stale.
    fn advance_camera(&mut self) -> bool;

    /// Draw the scene (and any UI layered on it) to the screen.
    fn draw(&mut self);
}

/// Cloneable handle for code that runs *inside* a frame (the property panel,
/// surface recovery) to ask for another one. Notifications are collected at
/// the end of `run_frame` and coalesced into a single follow-up request.
#[derive(Clone)]
pub struct RenderSignal(Sender<()>);

impl RenderSignal {
    /// Request a follow-up frame. A disconnected scheduler means the app is
    /// shutting down, so a failed send is ignored.
    pub fn notify(&self) {
        let _ = self.0.send(());
    }
}

/// Coalescing render-on-demand scheduler.
///
/// `request_render` arms a flag and schedules one deferred wakeup; further
/// requests while the flag is armed are absorbed. When the wakeup arrives
/// the driver calls `run_frame`, which clears the flag *before* doing any
/// work: whatever requests a render mid-frame (camera still settling, a
/// panel edit) arms a fresh wakeup instead of being lost.
///
/// `run_frame` may also be called directly, without a prior request. The
/// startup seed frame and resize handling use this path.
pub struct RenderScheduler<D> {
    deferral: D,
    requested: bool,
    signal_tx: Sender<()>,
    signal_rx: Receiver<()>,
}

impl<D: Deferral> RenderScheduler<D> {
    pub fn new(deferral: D) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel();
        Self {
            deferral,
            requested: false,
            signal_tx,
            signal_rx,
        }
    }

    /// A handle that in-frame code can use to request a follow-up frame.
    pub fn signal(&self) -> RenderSignal {
        RenderSignal(self.signal_tx.clone())
    }

    /// True while a deferred frame is armed and not yet run.
    pub fn render_pending(&self) -> bool {
        self.requested
    }

    /// Ask for a frame. Bursts coalesce: only the first request after a
    /// frame actually schedules a wakeup.
    pub fn request_render(&mut self) {
        if !self.requested {
            self.requested = true;
            trace!("arming deferred frame");
            self.deferral.schedule();
        }
    }

    /// Run one frame through `frame`.
    ///
    /// Clears the coalescing flag first, then syncs the viewport, steps the
    /// camera (motion schedules a follow-up), draws, and finally drains any
    /// notifications emitted during the draw into one more request.
    pub fn run_frame(&mut self, frame: &mut impl FramePipeline) {
        self.requested = false;
        trace!("frame start");

        frame.sync_viewport();
        if frame.advance_camera() {
            self.request_render();
        }
        frame.draw();

        self.pump_signals();
    }

    fn pump_signals(&mut self) {
        let mut notified = false;
        while self.signal_rx.try_recv().is_ok() {
            notified = true;
        }
        if notified {
            self.request_render();
        }
    }
}
