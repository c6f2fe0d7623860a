//! The sync loop: a single timer-driven state machine that attaches to the
//! target, samples position and orientation every tick, and dispatches
//! write actions submitted from the input side.
//!
//! Concurrency discipline: the loop thread is the only writer of the
//! published [`Sample`]; input callbacks push [`InputAction`]s into a
//! bounded channel that the loop drains at the start of each attached
//! tick. Writes always act on the latest published sample and never
//! re-read target memory synchronously.

use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::Result;
use crate::memory::{MemoryAccess, open_process};

/// Poll intervals for the two attachment states.
pub mod timing {
    /// Tick interval while attached to the target (ms).
    pub const ATTACHED_POLL_MS: u64 = 100;

    /// Tick interval while searching for the target process (ms).
    pub const SEARCHING_POLL_MS: u64 = 1000;
}

/// Queued input actions the loop accepts between ticks.
const ACTION_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachState {
    #[default]
    Searching,
    Attached,
}

/// Heading scalars, post-inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    pub sin: f32,
    pub cos: f32,
}

/// One tick's snapshot of the target's position. Published whole; a
/// missing snapshot (`None` at the publication site) is the explicit
/// "unknown" marker, stale values are never left visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub heading: Option<Heading>,
    pub tick: u64,
}

/// Input events delivered from the UI / hotkey boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Copy the current sample's coordinates into the held slot. No
    /// memory write.
    StorePosition,
    /// Write the held coordinates to the target (and shadow, if any).
    LoadPosition,
    MoveUp,
    MoveDown,
    /// Heading-relative step; ignored when no orientation is configured.
    MoveForward,
    /// Replace the held slot directly (waypoint teleport).
    SetStored { x: f32, y: f32, z: f32 },
}

/// Where attached targets come from. The loop re-locates the process by
/// name on every searching tick; tests supply a scripted source.
pub trait ProcessSource {
    type Access: MemoryAccess;

    fn locate(&mut self, process_name: &str) -> Option<Self::Access>;
}

/// Live-system source backed by the platform process list.
#[derive(Debug, Default)]
pub struct SystemProcessSource;

impl ProcessSource for SystemProcessSource {
    type Access = crate::memory::ProcessHandle;

    fn locate(&mut self, process_name: &str) -> Option<Self::Access> {
        match open_process(process_name) {
            Ok(handle) => Some(handle),
            Err(e) => {
                debug!("Process '{}' not available: {}", process_name, e);
                None
            }
        }
    }
}

#[derive(Default)]
struct Shared {
    state: AttachState,
    sample: Option<Sample>,
    stored: Option<[f32; 3]>,
}

/// Cloneable read/submit handle for the UI side of the session.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Mutex<Shared>>,
    actions: mpsc::SyncSender<InputAction>,
}

impl SessionHandle {
    pub fn state(&self) -> AttachState {
        self.shared.lock().unwrap().state
    }

    /// Latest published sample, or `None` while the position is unknown.
    pub fn sample(&self) -> Option<Sample> {
        self.shared.lock().unwrap().sample
    }

    pub fn stored(&self) -> Option<[f32; 3]> {
        self.shared.lock().unwrap().stored
    }

    /// Queue an action for the next tick. Returns `false` when the queue
    /// is full or the loop is gone.
    pub fn submit(&self, action: InputAction) -> bool {
        self.actions.try_send(action).is_ok()
    }
}

/// The attachment state machine driving one session.
pub struct SyncLoop<S: ProcessSource> {
    config: GameConfig,
    source: S,
    target: Option<S::Access>,
    tick: u64,
    shared: Arc<Mutex<Shared>>,
    actions: mpsc::Receiver<InputAction>,
}

impl<S: ProcessSource> SyncLoop<S> {
    pub fn new(config: GameConfig, source: S) -> (Self, SessionHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (tx, rx) = mpsc::sync_channel(ACTION_QUEUE_DEPTH);
        let handle = SessionHandle {
            shared: Arc::clone(&shared),
            actions: tx,
        };
        let sync_loop = Self {
            config,
            source,
            target: None,
            tick: 0,
            shared,
            actions: rx,
        };
        (sync_loop, handle)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Replace the configuration wholesale and drop the current target;
    /// the next tick re-attaches under the new settings. The stored
    /// coordinate survives the swap.
    pub fn set_config(&mut self, config: GameConfig) {
        info!("Configuration replaced, re-attaching");
        self.config = config;
        self.target = None;
        self.publish(AttachState::Searching, None);
    }

    /// Current tick interval: fast while attached, slow while searching.
    pub fn poll_interval(&self) -> Duration {
        if self.target.is_some() {
            Duration::from_millis(timing::ATTACHED_POLL_MS)
        } else {
            Duration::from_millis(timing::SEARCHING_POLL_MS)
        }
    }

    /// Run one tick of the state machine.
    pub fn tick(&mut self) {
        self.tick += 1;
        match self.target.take() {
            None => self.searching_tick(),
            Some(target) => self.attached_tick(target),
        }
    }

    fn searching_tick(&mut self) {
        // Input delivered while detached is meaningless; drop it rather
        // than letting a stale teleport fire on the next attach.
        while self.actions.try_recv().is_ok() {}

        match self.source.locate(&self.config.process_name) {
            Some(target) => {
                info!("Attached to process '{}'", self.config.process_name);
                self.target = Some(target);
                self.publish(AttachState::Attached, None);
            }
            None => self.publish(AttachState::Searching, None),
        }
    }

    fn attached_tick(&mut self, target: S::Access) {
        while let Ok(action) = self.actions.try_recv() {
            self.handle_action(&target, action);
        }

        if !target.is_alive() {
            self.detach("process exited");
            return;
        }

        match self.sample_once(&target) {
            Ok(sample) => {
                self.target = Some(target);
                self.publish(AttachState::Attached, Some(sample));
            }
            Err(e) if target.is_alive() => {
                // Chain went stale for this tick; stay attached, mark the
                // position unknown, try again next tick.
                warn!("Sample failed on tick {}: {}", self.tick, e);
                self.target = Some(target);
                self.publish(AttachState::Attached, None);
            }
            Err(_) => self.detach("process exited mid-tick"),
        }
    }

    fn detach(&mut self, reason: &str) {
        info!(
            "Lost process '{}' ({}), searching again",
            self.config.process_name, reason
        );
        self.target = None;
        self.publish(AttachState::Searching, None);
    }

    fn publish(&self, state: AttachState, sample: Option<Sample>) {
        let mut shared = self.shared.lock().unwrap();
        shared.state = state;
        shared.sample = sample;
    }

    fn sample_once(&self, target: &S::Access) -> Result<Sample> {
        let [x, y, z] = self.config.position.read(target)?;
        let heading = match &self.config.orientation {
            Some(orientation) => {
                let (sin, cos) = orientation.read(target)?;
                Some(Heading { sin, cos })
            }
            None => None,
        };
        Ok(Sample {
            x,
            y,
            z,
            heading,
            tick: self.tick,
        })
    }

    fn handle_action(&mut self, target: &S::Access, action: InputAction) {
        let (sample, stored) = {
            let shared = self.shared.lock().unwrap();
            (shared.sample, shared.stored)
        };

        match action {
            InputAction::StorePosition => {
                if let Some(sample) = sample {
                    debug!(
                        "Stored position ({:.2}, {:.2}, {:.2})",
                        sample.x, sample.y, sample.z
                    );
                    self.shared.lock().unwrap().stored =
                        Some([sample.x, sample.y, sample.z]);
                }
            }
            InputAction::SetStored { x, y, z } => {
                self.shared.lock().unwrap().stored = Some([x, y, z]);
            }
            InputAction::LoadPosition => {
                if let Some([x, y, z]) = stored
                    && let Err(e) =
                        self.write_position(target, [Some(x), Some(y), Some(z)])
                {
                    warn!("Load position failed: {}", e);
                }
            }
            InputAction::MoveUp => self.nudge_height(target, sample, self.config.move_z),
            InputAction::MoveDown => {
                self.nudge_height(target, sample, -self.config.move_z)
            }
            InputAction::MoveForward => {
                let Some(sample) = sample else { return };
                match sample.heading {
                    Some(heading) => {
                        let next = [
                            Some(sample.x + heading.sin * self.config.move_xy),
                            Some(sample.y + heading.cos * self.config.move_xy),
                            None,
                        ];
                        if let Err(e) = self.write_position(target, next) {
                            warn!("Forward move failed: {}", e);
                        }
                    }
                    None => debug!("Forward move ignored: no orientation configured"),
                }
            }
        }
    }

    /// Vertical nudge: height only, the horizontal axes stay untouched.
    fn nudge_height(&self, target: &S::Access, sample: Option<Sample>, delta: f32) {
        let Some(sample) = sample else { return };
        if let Err(e) = self.write_position(target, [None, None, Some(sample.z + delta)]) {
            warn!("Height move failed: {}", e);
        }
    }

    /// Write the given axes to the primary position set, then mirror them
    /// to the shadow set. A primary failure aborts before the shadow is
    /// touched; a shadow failure is reported but the primary write stands
    /// as the committed result.
    fn write_position(
        &self,
        target: &S::Access,
        values: [Option<f32>; 3],
    ) -> Result<()> {
        let primary = self.config.position.axis_chains();
        for (chain, value) in primary.iter().zip(values) {
            if let Some(value) = value {
                let addr = chain.resolve(target)?;
                target.write_f32(addr, value)?;
            }
        }

        if let Some(shadow) = self.config.position.shadow_chains() {
            for (chain, value) in shadow.iter().zip(values) {
                if let Some(value) = value
                    && let Err(e) = chain
                        .resolve(target)
                        .and_then(|addr| target.write_f32(addr, value))
                {
                    warn!("Shadow write failed: {}", e);
                }
            }
        }
        Ok(())
    }
}
