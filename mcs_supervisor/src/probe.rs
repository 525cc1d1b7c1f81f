//! Probe synchronization protocol.
//!
//! `Off --(start)--> Active --(contact)--> Off`
//!
//! The main loop arms the watcher before a probing move. The stepper tick
//! calls [`ProbeMonitor::monitor`] once per step interrupt; on contact it
//! copies the live step position into the snapshot, publishes `Off` and
//! raises `MOTION_CANCEL`. The main loop reads [`ProbeMonitor::position`]
//! only after it has drained that flag.
//!
//! The tick path is O(1): one atomic load while `Off`, one pin read plus a
//! bounded copy while `Active`.

use core::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use mcs_common::consts::{N_AXIS, PROBE_MASK};
use mcs_common::machine::Position;
use mcs_common::machine::flags::{ExecFlags, SettingsFlags};
use mcs_common::machine::state::ProbeState;

use crate::runtime::StepPosition;
use crate::signals::RealtimeSignals;

/// Raw probe input port.
pub trait ProbePin {
    /// Raw port level; only [`PROBE_MASK`] is consulted.
    fn read(&self) -> u8;
}

impl<F: Fn() -> u8> ProbePin for F {
    #[inline]
    fn read(&self) -> u8 {
        self()
    }
}

/// Invert mask for a probing move.
///
/// The probe input idles high through its pull-up, so a normally-open probe
/// reads low on contact: with the invert setting clear the mask flips the
/// pin so that contact reads as triggered. Probing away from a workpiece
/// flips it once more so that *loss* of contact triggers.
#[inline]
pub const fn invert_mask(probe_away: bool, settings: SettingsFlags) -> u8 {
    let mut mask = 0;
    if !settings.contains(SettingsFlags::INVERT_PROBE_PIN) {
        mask ^= PROBE_MASK;
    }
    if probe_away {
        mask ^= PROBE_MASK;
    }
    mask
}

/// Probe watcher shared between the stepper tick and the main loop.
#[derive(Debug)]
pub struct ProbeMonitor {
    state: AtomicU8,
    invert_mask: AtomicU8,
    position: [AtomicI32; N_AXIS],
}

impl Default for ProbeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeMonitor {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ProbeState::Off as u8),
            invert_mask: AtomicU8::new(0),
            position: [const { AtomicI32::new(0) }; N_AXIS],
        }
    }

    /// Current watcher state.
    #[inline]
    pub fn state(&self) -> ProbeState {
        match self.state.load(Ordering::Acquire) {
            1 => ProbeState::Active,
            _ => ProbeState::Off,
        }
    }

    /// Active invert mask.
    #[inline]
    pub fn invert_mask(&self) -> u8 {
        self.invert_mask.load(Ordering::Relaxed)
    }

    /// Recompute the invert mask. Only called while no probing move runs.
    pub fn configure_invert_mask(&self, probe_away: bool, settings: SettingsFlags) {
        self.invert_mask
            .store(invert_mask(probe_away, settings), Ordering::Relaxed);
    }

    /// Whether `pin_level` counts as contact under the current mask.
    #[inline]
    pub fn triggered(&self, pin_level: u8) -> bool {
        (pin_level & PROBE_MASK) ^ self.invert_mask() != 0
    }

    /// Arm the watcher for a probing move (main loop).
    ///
    /// The Release store of `Active` publishes the mask to the tick's
    /// Acquire load in [`monitor`](Self::monitor).
    pub fn start(&self, probe_away: bool, settings: SettingsFlags) {
        self.configure_invert_mask(probe_away, settings);
        self.state
            .store(ProbeState::Active as u8, Ordering::Release);
    }

    /// Disarm without a contact (probe move finished or aborted).
    pub fn cancel(&self) {
        self.state.store(ProbeState::Off as u8, Ordering::Release);
    }

    /// Per-tick watcher (stepper interrupt).
    ///
    /// Returns `true` on the tick that detected contact.
    #[inline]
    pub fn monitor<P: ProbePin + ?Sized>(
        &self,
        pin: &P,
        live: &StepPosition,
        signals: &RealtimeSignals,
    ) -> bool {
        // Pairs with the Release in `start`: seeing Active implies the new mask.
        if self.state.load(Ordering::Acquire) != ProbeState::Active as u8 {
            return false;
        }
        if !self.triggered(pin.read()) {
            return false;
        }
        for (dst, src) in self.position.iter().zip(live.axes()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        self.state.store(ProbeState::Off as u8, Ordering::Release);
        signals.raise_exec(ExecFlags::MOTION_CANCEL);
        true
    }

    /// Position captured at the last contact.
    ///
    /// Consistent once `MOTION_CANCEL` from that contact has been drained.
    pub fn position(&self) -> Position {
        core::array::from_fn(|i| self.position[i].load(Ordering::Relaxed))
    }

    /// Force `Off` and zero the snapshot (power-up).
    pub fn clear(&self) {
        self.cancel();
        for axis in &self.position {
            axis.store(0, Ordering::Relaxed);
        }
        self.invert_mask.store(0, Ordering::Relaxed);
    }
}
