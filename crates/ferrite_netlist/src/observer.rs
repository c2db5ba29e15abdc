//! Change observation.
//!
//! While observation is enabled the netlist buffers a [`NetlistEvent`] for
//! every connectivity or master change. An [`ObserverScope`] enables
//! observation for its lifetime and delivers buffered events to a
//! [`NetlistObserver`]; dropping the scope flushes the remaining events and
//! restores the previous observation state on every exit path.

use crate::data::Netlist;
use crate::ids::{InstId, NetId, PinId};
use std::ops::{Deref, DerefMut};

/// A structural change to the netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetlistEvent {
    /// `pin` was connected to `net`.
    Connected {
        /// The pin.
        pin: PinId,
        /// The net.
        net: NetId,
    },
    /// `pin` was disconnected from `net`.
    Disconnected {
        /// The pin.
        pin: PinId,
        /// The net.
        net: NetId,
    },
    /// `inst` was rebound to another master.
    MasterSwapped {
        /// The instance.
        inst: InstId,
    },
    /// An instance was created or revived.
    InstanceCreated {
        /// The instance.
        inst: InstId,
    },
    /// An instance was deleted.
    InstanceDeleted {
        /// The instance.
        inst: InstId,
    },
    /// A net was created or revived.
    NetCreated {
        /// The net.
        net: NetId,
    },
    /// A net was deleted.
    NetDeleted {
        /// The net.
        net: NetId,
    },
}

/// Receives netlist change events.
pub trait NetlistObserver {
    /// Handles one event. `netlist` reflects the state after the whole batch
    /// being flushed, so referenced objects may already be gone.
    fn notify(&mut self, netlist: &Netlist, event: &NetlistEvent);
}

impl Netlist {
    pub(crate) fn emit(&mut self, event: NetlistEvent) {
        if self.observing {
            self.events.push(event);
        }
    }

    /// Returns `true` while change events are being buffered.
    pub fn is_observed(&self) -> bool {
        self.observing
    }

    fn flush_to(&mut self, observer: &mut dyn NetlistObserver) {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            observer.notify(self, event);
        }
    }
}

/// Scoped activation of a [`NetlistObserver`].
///
/// Dereferences to the netlist so edits can be made through the scope.
pub struct ObserverScope<'a, O: NetlistObserver> {
    netlist: &'a mut Netlist,
    observer: &'a mut O,
    was_observing: bool,
}

impl<'a, O: NetlistObserver> ObserverScope<'a, O> {
    /// Starts observing `netlist` on behalf of `observer`.
    pub fn new(netlist: &'a mut Netlist, observer: &'a mut O) -> Self {
        let was_observing = std::mem::replace(&mut netlist.observing, true);
        Self {
            netlist,
            observer,
            was_observing,
        }
    }

    /// Delivers all buffered events to the observer.
    pub fn flush(&mut self) {
        self.netlist.flush_to(&mut *self.observer);
    }

    /// Flushes, then lends out the netlist and the observer together.
    pub fn parts(&mut self) -> (&mut Netlist, &mut O) {
        self.flush();
        (&mut *self.netlist, &mut *self.observer)
    }
}

impl<O: NetlistObserver> Deref for ObserverScope<'_, O> {
    type Target = Netlist;

    fn deref(&self) -> &Netlist {
        self.netlist
    }
}

impl<O: NetlistObserver> DerefMut for ObserverScope<'_, O> {
    fn deref_mut(&mut self) -> &mut Netlist {
        self.netlist
    }
}

impl<O: NetlistObserver> Drop for ObserverScope<'_, O> {
    fn drop(&mut self) {
        self.flush();
        self.netlist.observing = self.was_observing;
    }
}
