//! Live capture session
//!
//! A session owns one open capture stream and drives it from its own thread,
//! one tick at a time:
//!
//! ```text
//! Stopped ──open──▶ Acquiring ──ok──▶ Streaming ──mode != live──▶ Stopped
//!                       │
//!                       └──────────err─────────────────────────▶ Stopped
//! ```
//!
//! The mode flag of the [`RenderContext`] is polled at every tick boundary,
//! so a switch away from live takes effect on the next tick and an in-flight
//! tick always completes first. Teardown (stopping every track) lives in a
//! drop guard and runs on every exit path of the thread.

use crate::{
    DemoError, DemoResult, RenderContext, SourceMode,
    target::{self, SharedTarget},
    ticker::FrameTicker,
};
use camera::{CaptureStream, FacingMode};
use crossbeam::channel::{Sender, TrySendError};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU8, Ordering},
    },
    thread::{self, JoinHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SessionState {
    #[default]
    Stopped = 0,
    Acquiring,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoEvent {
    StateChanged(SessionState),
    FramePresented {
        mode: SourceMode,
        width: u32,
        height: u32,
    },
    /// Human readable message for the user, e.g. a camera that could not be
    /// opened.
    Notice(String),
}

/// Session state shared between the demo and the session thread.
#[derive(Debug, Clone)]
pub struct StateCell {
    state: Arc<AtomicU8>,
    events: Sender<DemoEvent>,
}

impl StateCell {
    pub fn new(events: Sender<DemoEvent>) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(SessionState::Stopped.into())),
            events,
        }
    }

    pub fn get(&self) -> SessionState {
        SessionState::try_from(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set(&self, state: SessionState) {
        let previous = self.state.swap(state.into(), Ordering::AcqRel);

        if previous != u8::from(state) {
            log::info!("live session: {state:?}");
            self.emit(DemoEvent::StateChanged(state));
        }
    }

    /// Never blocks. A full queue drops the event, a dropped receiver is
    /// fine too.
    pub fn emit(&self, event: DemoEvent) {
        if let Err(TrySendError::Full(event)) = self.events.try_send(event) {
            log::trace!("event queue full, dropped {event:?}");
        }
    }
}

pub struct LiveSession {
    facing: FacingMode,
    stopping: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Start ticking `stream`. The caller has already moved the state to
    /// `Streaming`; the session moves it back to `Stopped` on teardown.
    pub fn spawn(
        stream: Box<dyn CaptureStream>,
        context: RenderContext,
        target: SharedTarget,
        state: StateCell,
        fps: u32,
    ) -> Self {
        let facing = stream.facing();
        let stopping = Arc::new(Mutex::new(false));
        let thread_stopping = stopping.clone();

        let handle = thread::spawn(move || {
            let mut guard = StreamGuard { stream, state };
            let mut ticker = FrameTicker::new(fps);

            loop {
                let tick = ticker.wait();

                if leave_unless_live(&context, &thread_stopping) {
                    log::info!("live mode deselected after {} ticks", tick - 1);
                    break;
                }

                if let Err(e) = render_tick(guard.stream.as_mut(), &context, &target, &guard.state)
                {
                    log::warn!("live tick {tick} skipped: {e}");
                }
            }
        });

        Self {
            facing,
            stopping,
            handle: Some(handle),
        }
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Whether the thread has committed to teardown.
    ///
    /// Once this returned `false` with the mode set to live, the next tick
    /// boundary is guaranteed to see live mode and the session keeps going.
    pub fn is_stopping(&self) -> bool {
        self.is_finished() || *lock_flag(&self.stopping)
    }

    /// Block until the session thread has released its device and exited.
    ///
    /// Only returns once the mode flag has been switched away from live.
    pub fn wait_released(mut self) -> DemoResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| DemoError::SessionPanicked),
            None => Ok(()),
        }
    }
}

struct StreamGuard {
    stream: Box<dyn CaptureStream>,
    state: StateCell,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Err(e) = self.stream.stop() {
            log::warn!("stop capture stream failed: {e}");
        }

        self.state.set(SessionState::Stopped);
    }
}

// mode check and commit share the lock `is_stopping` reads
fn leave_unless_live(context: &RenderContext, stopping: &Mutex<bool>) -> bool {
    let mut stopping = lock_flag(stopping);
    if !context.is_live() {
        *stopping = true;
    }

    *stopping
}

fn lock_flag(flag: &Mutex<bool>) -> std::sync::MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(|e| e.into_inner())
}

fn render_tick(
    stream: &mut dyn CaptureStream,
    context: &RenderContext,
    target: &SharedTarget,
    state: &StateCell,
) -> DemoResult<()> {
    let mut frame = stream.last_frame()?;
    if frame.is_empty() {
        log::trace!("empty camera frame");
        return Ok(());
    }

    context.params().apply(&mut frame)?;
    target::draw(target, &frame)?;

    state.emit(DemoEvent::FramePresented {
        mode: SourceMode::Live,
        width: frame.width(),
        height: frame.height(),
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectParams, target::MemoryTarget};
    use camera::{CaptureBackend, SyntheticBackend, SyntheticConfig};
    use crossbeam::channel::unbounded;
    use std::time::Duration;

    #[test]
    fn test_session_tears_down_when_mode_leaves_live() {
        let (tx, rx) = unbounded();
        let state = StateCell::new(tx);
        let backend =
            SyntheticBackend::new(SyntheticConfig::default().with_width(8).with_height(6));
        let context =
            RenderContext::new(EffectParams::new(2, 1), SourceMode::Live, FacingMode::User);
        let memory = MemoryTarget::new();

        let stream = backend.open(FacingMode::User).unwrap();
        state.set(SessionState::Streaming);
        let session = LiveSession::spawn(
            stream,
            context.clone(),
            target::shared(memory.clone()),
            state.clone(),
            200,
        );

        while memory.len() < 3 {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(backend.active_tracks().len(), 1);
        assert!(!session.is_finished());

        context.set_mode(SourceMode::Static);
        session.wait_released().unwrap();

        assert!(backend.active_tracks().is_empty());
        assert_eq!(state.get(), SessionState::Stopped);
        assert_eq!(memory.last_frame().unwrap().dimensions(), (8, 6));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.first(), Some(&DemoEvent::StateChanged(SessionState::Streaming)));
        assert_eq!(events.last(), Some(&DemoEvent::StateChanged(SessionState::Stopped)));
        assert!(events.contains(&DemoEvent::FramePresented {
            mode: SourceMode::Live,
            width: 8,
            height: 6
        }));
    }

    #[test]
    fn test_stopping_is_final() {
        let (tx, _rx) = unbounded();
        let state = StateCell::new(tx);
        let backend = SyntheticBackend::new(SyntheticConfig::default().with_width(4).with_height(4));
        let context = RenderContext::new(EffectParams::new(1, 0), SourceMode::Live, FacingMode::User);
        let memory = MemoryTarget::new();

        let session = LiveSession::spawn(
            backend.open(FacingMode::User).unwrap(),
            context.clone(),
            target::shared(memory.clone()),
            state.clone(),
            200,
        );

        while memory.is_empty() {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!session.is_stopping());

        context.set_mode(SourceMode::Static);
        while !session.is_stopping() {
            thread::sleep(Duration::from_millis(1));
        }

        // going live again does not revive a session that already left
        context.set_mode(SourceMode::Live);
        session.wait_released().unwrap();
        assert!(backend.active_tracks().is_empty());
        assert_eq!(state.get(), SessionState::Stopped);
    }

    #[test]
    fn test_state_cell_reports_changes_once() {
        let (tx, rx) = unbounded();
        let state = StateCell::new(tx);

        state.set(SessionState::Acquiring);
        state.set(SessionState::Acquiring);
        state.set(SessionState::Stopped);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                DemoEvent::StateChanged(SessionState::Acquiring),
                DemoEvent::StateChanged(SessionState::Stopped),
            ]
        );
    }
}
