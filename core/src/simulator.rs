//! Asynchronous transmission driver with a busy guard.

use crate::bits::text_to_bits;
use crate::config::PipelineConfig;
use crate::error::{Result, SimulatorError};
use crate::error_control::LinkStatus;
use crate::pipeline::{channel, receive_chain, transmit_chain, TransmissionResult};
use crate::PROPAGATION_DELAY_MS;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread;
use std::time::Duration;

/// Invoked once per transmission with the recovered text and link status
pub type Callback = Arc<dyn Fn(&str, LinkStatus) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Configuring,
    Transmitting,
    Receiving,
}

struct Shared {
    state: Mutex<SimulatorState>,
    config: RwLock<PipelineConfig>,
    callback: RwLock<Option<Callback>>,
    last_result: RwLock<Option<Arc<TransmissionResult>>>,
    propagation_delay: Duration,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, SimulatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: SimulatorState) {
        *self.lock_state() = state;
    }
}

/// Handle to a simulated link. Clones share the same link.
#[derive(Clone)]
pub struct Simulator {
    shared: Arc<Shared>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_propagation_delay(Duration::from_millis(PROPAGATION_DELAY_MS))
    }

    pub fn with_propagation_delay(propagation_delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SimulatorState::Idle),
                config: RwLock::new(PipelineConfig::default()),
                callback: RwLock::new(None),
                last_result: RwLock::new(None),
                propagation_delay,
            }),
        }
    }

    /// Replace the active configuration. Only valid while idle.
    pub fn configure(&self, config: PipelineConfig) -> Result<()> {
        config.validate()?;

        let mut state = self.shared.lock_state();
        if *state != SimulatorState::Idle {
            return Err(SimulatorError::Busy);
        }
        *state = SimulatorState::Configuring;
        *self.shared.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        *state = SimulatorState::Idle;

        log::info!("Configured link: {}", config);
        Ok(())
    }

    pub fn config(&self) -> PipelineConfig {
        *self.shared.config.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn(&str, LinkStatus) + Send + Sync + 'static,
    {
        *self.shared.callback.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(callback));
    }

    pub fn state(&self) -> SimulatorState {
        *self.shared.lock_state()
    }

    /// Result of the most recent completed transmission
    pub fn last_result(&self) -> Option<Arc<TransmissionResult>> {
        self.shared.last_result.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Start a transmission on a worker thread and return immediately.
    ///
    /// Completion is reported only through the registered callback.
    pub fn transmit(&self, text: &str) -> Result<()> {
        let bits = text_to_bits(text)?;

        let config = {
            let mut state = self.shared.lock_state();
            if *state != SimulatorState::Idle {
                return Err(SimulatorError::Busy);
            }
            *state = SimulatorState::Transmitting;
            self.config()
        };

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("link-transmission".into())
            .spawn(move || run_transmission(&shared, config, bits));

        if let Err(e) = spawned {
            self.shared.set_state(SimulatorState::Idle);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Returns the link to idle however the worker exits
struct IdleOnDrop<'a>(&'a Shared);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set_state(SimulatorState::Idle);
    }
}

fn run_transmission(shared: &Shared, config: PipelineConfig, bits: Vec<u8>) {
    let guard = IdleOnDrop(shared);
    log::info!("Transmitting {} bits over {}", bits.len(), config);

    let tx = transmit_chain(&config, &bits);
    let received = channel(&config, &tx.transmitted);

    if !shared.propagation_delay.is_zero() {
        thread::sleep(shared.propagation_delay);
    }

    shared.set_state(SimulatorState::Receiving);
    let rx = receive_chain(&config, &received);
    let result = Arc::new(TransmissionResult::assemble(config, tx, received, rx));
    log::info!("Received {:?} ({})", result.text, result.status);

    *shared.last_result.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&result));
    drop(guard);

    let callback = shared.callback.read().unwrap_or_else(|e| e.into_inner()).clone();
    if let Some(callback) = callback {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| callback(&result.text, result.status)));
        if delivered.is_err() {
            log::error!("Completion callback panicked");
        }
    }
}
