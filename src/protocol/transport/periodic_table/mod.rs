//! Software periodic transmission for CAN drivers without a broadcast manager.
//!
//! [`PeriodicTable`] stores up to `N` frames with their period. A dedicated task runs
//! [`PeriodicTable::drive`] with its own transmit handle while foreground code keeps
//! the main bus wrapped in a [`ScheduledBus`], which implements both
//! [`CanBus`] and [`PeriodicScheduler`] by delegating to the table.
//!
//! ```rust,ignore
//! static TABLE: PeriodicTable<CriticalSectionRawMutex, 4> = PeriodicTable::new();
//!
//! #[embassy_executor::task]
//! async fn periodic_task(tx: MyCanTx, timer: MyTimer) {
//!     let _ = TABLE.drive(&mut tx, &mut timer, 10).await;
//! }
//!
//! let bus = ScheduledBus::new(can, &TABLE);
//! let mut client = VtClient::new(bus, timer, VtClientConfig::default());
//! ```
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use thiserror_no_std::Error;

use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::{
    can_bus::CanBus, korri_timer::KorriTimer, periodic::PeriodicScheduler,
};

/// Identifies a scheduled frame. Handles of removed entries stay inert even if the
/// slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodicHandle {
    slot: usize,
    generation: u32,
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeriodicTableError {
    /// Every slot is taken.
    #[error("Periodic table is full")]
    TableFull,
    /// A period of zero would flood the bus.
    #[error("Period must be at least 1 ms")]
    ZeroPeriod,
}

#[derive(Clone, Copy, Debug)]
struct PeriodicEntry {
    frame: CanFrame,
    period_ms: u32,
    elapsed_ms: u32,
    generation: u32,
}

struct Slots<const N: usize> {
    entries: [Option<PeriodicEntry>; N],
    next_generation: u32,
}

/// Fixed-capacity table of periodic frames, shareable between tasks.
pub struct PeriodicTable<M: RawMutex, const N: usize> {
    slots: Mutex<M, RefCell<Slots<N>>>,
}

impl<M: RawMutex, const N: usize> Default for PeriodicTable<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> PeriodicTable<M, N> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots {
                entries: [None; N],
                next_generation: 0,
            })),
        }
    }

    /// Register `frame`; its first transmission happens one period from now.
    pub fn insert(
        &self,
        frame: &CanFrame,
        period_ms: u32,
    ) -> Result<PeriodicHandle, PeriodicTableError> {
        if period_ms == 0 {
            return Err(PeriodicTableError::ZeroPeriod);
        }
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let generation = slots.next_generation;
            let slot = slots
                .entries
                .iter()
                .position(Option::is_none)
                .ok_or(PeriodicTableError::TableFull)?;
            slots.entries[slot] = Some(PeriodicEntry {
                frame: *frame,
                period_ms,
                elapsed_ms: 0,
                generation,
            });
            slots.next_generation = generation.wrapping_add(1);
            Ok(PeriodicHandle { slot, generation })
        })
    }

    /// Drop the entry behind `handle`. Stale handles are ignored.
    pub fn remove(&self, handle: PeriodicHandle) {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            if let Some(entry) = slots.entries.get_mut(handle.slot) {
                if entry.is_some_and(|e| e.generation == handle.generation) {
                    *entry = None;
                }
            }
        });
    }

    /// Number of scheduled frames.
    pub fn len(&self) -> usize {
        self.slots
            .lock(|cell| cell.borrow().entries.iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance every entry by `elapsed_ms` and copy out the frames that fell due.
    fn tick(&self, elapsed_ms: u32) -> [Option<CanFrame>; N] {
        let mut due = [None; N];
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            for (entry, out) in slots.entries.iter_mut().zip(due.iter_mut()) {
                if let Some(entry) = entry {
                    entry.elapsed_ms = entry.elapsed_ms.saturating_add(elapsed_ms);
                    if entry.elapsed_ms >= entry.period_ms {
                        entry.elapsed_ms %= entry.period_ms;
                        *out = Some(entry.frame);
                    }
                }
            }
        });
        due
    }

    /// Send every frame due after `elapsed_ms`. The lock is released before the bus
    /// is touched.
    pub async fn send_due<C: CanBus>(
        &self,
        can_bus: &mut C,
        elapsed_ms: u32,
    ) -> Result<usize, C::Error> {
        let mut sent = 0;
        for frame in self.tick(elapsed_ms).iter().flatten() {
            can_bus.send(frame).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Service the table forever, waking every `tick_ms`. Returns only on a bus error.
    pub async fn drive<C: CanBus, T: KorriTimer>(
        &self,
        can_bus: &mut C,
        timer: &mut T,
        tick_ms: u32,
    ) -> Result<(), C::Error> {
        let tick_ms = tick_ms.max(1);
        loop {
            timer.delay_ms(tick_ms).await;
            let _sent = self.send_due(can_bus, tick_ms).await?;
            #[cfg(feature = "defmt")]
            if _sent > 0 {
                defmt::trace!("Periodic table sent {} frames", _sent);
            }
        }
    }
}

//==================================================================================SCHEDULED_BUS
/// A bus paired with a [`PeriodicTable`]: frames go straight to `bus`, periodic
/// frames go into the table.
pub struct ScheduledBus<'t, C: CanBus, M: RawMutex, const N: usize> {
    bus: C,
    table: &'t PeriodicTable<M, N>,
}

impl<'t, C: CanBus, M: RawMutex, const N: usize> ScheduledBus<'t, C, M, N> {
    pub fn new(bus: C, table: &'t PeriodicTable<M, N>) -> Self {
        Self { bus, table }
    }

    pub fn table(&self) -> &'t PeriodicTable<M, N> {
        self.table
    }

    pub fn into_inner(self) -> C {
        self.bus
    }
}

impl<'t, C: CanBus, M: RawMutex, const N: usize> CanBus for ScheduledBus<'t, C, M, N> {
    type Error = C::Error;

    fn send<'a>(
        &'a mut self,
        frame: &'a CanFrame,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>> + 'a {
        self.bus.send(frame)
    }

    fn recv<'a>(
        &'a mut self,
    ) -> impl core::future::Future<Output = Result<CanFrame, Self::Error>> + 'a {
        self.bus.recv()
    }
}

impl<'t, C: CanBus, M: RawMutex, const N: usize> PeriodicScheduler for ScheduledBus<'t, C, M, N> {
    type Handle = PeriodicHandle;
    type Error = PeriodicTableError;

    fn schedule_periodic(
        &mut self,
        frame: &CanFrame,
        period_ms: u32,
    ) -> Result<Self::Handle, Self::Error> {
        self.table.insert(frame, period_ms)
    }

    fn cancel_periodic(&mut self, handle: Self::Handle) {
        self.table.remove(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::can_id::CanId;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn frame(first: u8) -> CanFrame {
        CanFrame::new(CanId::builder(0xE700, 0x0A).to_destination(0xFF).build(), &[first])
    }

    #[test]
    fn test_entries_fall_due_once_per_period() {
        let table: PeriodicTable<NoopRawMutex, 2> = PeriodicTable::new();
        table.insert(&frame(1), 1000).unwrap();
        table.insert(&frame(2), 300).unwrap();

        assert_eq!(table.tick(200), [None, None]);
        assert_eq!(table.tick(100), [None, Some(frame(2))]);
        assert_eq!(table.tick(700), [Some(frame(1)), Some(frame(2))]);
    }

    #[test]
    fn test_capacity_and_zero_period() {
        let table: PeriodicTable<NoopRawMutex, 1> = PeriodicTable::new();
        assert_eq!(
            table.insert(&frame(1), 0),
            Err(PeriodicTableError::ZeroPeriod)
        );
        table.insert(&frame(1), 10).unwrap();
        assert_eq!(
            table.insert(&frame(2), 10),
            Err(PeriodicTableError::TableFull)
        );
    }

    #[test]
    fn test_stale_handle_does_not_remove_new_entry() {
        let table: PeriodicTable<NoopRawMutex, 1> = PeriodicTable::new();
        let old = table.insert(&frame(1), 10).unwrap();
        table.remove(old);
        assert!(table.is_empty());

        let _new = table.insert(&frame(2), 10).unwrap();
        table.remove(old);
        assert_eq!(table.len(), 1);
    }
}
