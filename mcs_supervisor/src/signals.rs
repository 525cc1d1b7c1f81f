//! Realtime signal channel.
//!
//! Two independent flag registers (execute and alarm) written from interrupt
//! contexts and drained by the single main-loop consumer.
//!
//! ## Discipline
//!
//! - `raise_*` is one `fetch_or`: any context, never blocks, never fails.
//!   Raising the same flag twice before a drain is the same as raising it once.
//! - `drain_*` is one `swap(0)`: bits are read and cleared in the same atomic
//!   step, so a raise racing the drain lands in this snapshot or the next one.
//! - Raises use `Release`, drains `Acquire`: data a producer wrote before
//!   raising (e.g. the probe snapshot) is visible to the consumer that
//!   observed the flag.

use core::sync::atomic::{AtomicU8, Ordering};

use mcs_common::machine::flags::{AlarmFlags, ExecFlags};

/// Accumulating flag registers shared between interrupt and main-loop contexts.
#[derive(Debug, Default)]
pub struct RealtimeSignals {
    exec: AtomicU8,
    alarm: AtomicU8,
}

impl RealtimeSignals {
    pub const fn new() -> Self {
        Self {
            exec: AtomicU8::new(0),
            alarm: AtomicU8::new(0),
        }
    }

    // ── Producers (any context) ──

    /// OR `flags` into the execute register.
    #[inline]
    pub fn raise_exec(&self, flags: ExecFlags) {
        self.exec.fetch_or(flags.bits(), Ordering::Release);
    }

    /// OR `flags` into the alarm register.
    #[inline]
    pub fn raise_alarm(&self, flags: AlarmFlags) {
        self.alarm.fetch_or(flags.bits(), Ordering::Release);
    }

    /// Interrupt-safe soft reset request.
    ///
    /// Returns `true` if the request is new, `false` if a reset was already
    /// pending. The realtime executor turns a drained `RESET` into an abort.
    #[inline]
    pub fn request_reset(&self) -> bool {
        let prev = self
            .exec
            .fetch_or(ExecFlags::RESET.bits(), Ordering::AcqRel);
        prev & ExecFlags::RESET.bits() == 0
    }

    // ── Consumer (main loop only) ──

    /// Take and clear every pending execute flag.
    #[inline]
    pub fn drain_exec(&self) -> ExecFlags {
        ExecFlags::from_bits_truncate(self.exec.swap(0, Ordering::Acquire))
    }

    /// Take and clear every pending alarm flag.
    #[inline]
    pub fn drain_alarm(&self) -> AlarmFlags {
        AlarmFlags::from_bits_truncate(self.alarm.swap(0, Ordering::Acquire))
    }

    /// Pending execute flags without clearing them.
    #[inline]
    pub fn pending_exec(&self) -> ExecFlags {
        ExecFlags::from_bits_truncate(self.exec.load(Ordering::Acquire))
    }

    /// Pending alarm flags without clearing them.
    #[inline]
    pub fn pending_alarm(&self) -> AlarmFlags {
        AlarmFlags::from_bits_truncate(self.alarm.load(Ordering::Acquire))
    }

    /// Clear only `flags` from the execute register, keeping concurrent raises of others.
    #[inline]
    pub fn clear_exec(&self, flags: ExecFlags) {
        self.exec.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Clear only `flags` from the alarm register.
    #[inline]
    pub fn clear_alarm(&self, flags: AlarmFlags) {
        self.alarm.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Zero both registers (reinitialization only).
    pub fn reset(&self) {
        self.exec.store(0, Ordering::Release);
        self.alarm.store(0, Ordering::Release);
    }
}
