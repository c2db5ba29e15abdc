//! Transactional journal over resizer edits.
//!
//! A transaction opens a database ECO and logs every resizer edit made
//! while it is open. Committing keeps the edits; restoring reverses them.
//! Most edits are reversed by the ECO undo log. Buffer removals recorded in
//! the journal bypass the ECO and are reversed by reviving the removed
//! buffer and net under their original IDs, interleaved with the ECO undo
//! in reverse order. Earlier ECO operations on the buffer then apply again.
//!
//! State machine: `Idle --journal_begin--> Open --journal_end/restore--> Idle`.
//! Nested transactions are rejected.

use crate::codes;
use crate::design::Design;
use crate::error::ResizerError;
use crate::session::{design_area, Resizer};
use ferrite_common::Point;
use ferrite_diagnostics::Diagnostic;
use ferrite_liberty::LibCellId;
use ferrite_netlist::{InstId, NetId, Netlist, ObserverScope, PinId, RemovalSnapshot};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A pin named by instance and port, stable across ID changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinRef {
    /// Owning instance name; `None` for a top-level port.
    pub instance: Option<String>,
    /// Port name.
    pub port: String,
}

impl PinRef {
    fn of(netlist: &Netlist, pin: PinId) -> Option<Self> {
        let p = netlist.pin(pin)?;
        let instance = match p.owner {
            Some(inst) => Some(netlist.instance(inst)?.name.clone()),
            None => None,
        };
        Some(Self {
            instance,
            port: p.port.clone(),
        })
    }
}

/// What a removed buffer was connected to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferRecord {
    /// Buffer instance name.
    pub name: String,
    /// Buffer cell.
    pub cell: LibCellId,
    /// Buffer location.
    pub location: Point,
    /// The pin that drove the buffer input.
    pub driver: Option<PinRef>,
    /// The pins the buffer output drove, in net order.
    pub loads: Vec<PinRef>,
}

/// One journaled edit.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    /// An instance was resized from `prior`.
    Resize {
        /// The instance.
        inst: InstId,
        /// Its cell before the first resize in this transaction.
        prior: LibCellId,
    },
    /// A buffer was inserted.
    MakeBuffer {
        /// The buffer.
        inst: InstId,
    },
    /// A buffer was removed.
    RemoveBuffer {
        /// The buffer as it was connected.
        record: BufferRecord,
        /// The buffer and its deleted net, for revival.
        snapshot: RemovalSnapshot,
        /// ECO log length when it was removed.
        eco_position: usize,
    },
    /// An instance was cloned.
    Clone {
        /// The original.
        original: InstId,
        /// The copy.
        clone: InstId,
    },
    /// Two input pins of an instance exchanged nets.
    SwapPins {
        /// The instance.
        inst: InstId,
        /// First port.
        port1: String,
        /// Second port.
        port2: String,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<JournalEntry>,
    resized: HashSet<InstId>,
}

/// Instances touched during the session, journaled or not.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    /// Resized instances.
    pub sized: BTreeSet<InstId>,
    /// Inserted buffers.
    pub buffered: BTreeSet<InstId>,
    /// Clones.
    pub cloned: BTreeSet<InstId>,
    /// Instances whose pins were swapped.
    pub swapped: BTreeSet<InstId>,
}

/// What a journal restore reversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    /// Resize entries reversed.
    pub resized: usize,
    /// Inserted buffers removed.
    pub inserted_buffers: usize,
    /// Clones removed.
    pub cloned: usize,
    /// Pin swaps reversed.
    pub swapped_pins: usize,
    /// Removed buffers put back.
    pub removed_buffers: usize,
    /// Removed buffers that could not be put back.
    pub unrestored_buffers: usize,
}

impl fmt::Display for RestoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restored {} sizing, {} buffering, {} cloning, {} pin swaps, {} buffer removal",
            self.resized, self.inserted_buffers, self.cloned, self.swapped_pins, self.removed_buffers
        )
    }
}

impl Resizer {
    /// Opens a transaction.
    pub fn journal_begin(&mut self, design: &mut Design) -> Result<(), ResizerError> {
        if self.journal.is_some() {
            return Err(ResizerError::JournalAlreadyOpen);
        }
        design.netlist.begin_eco()?;
        self.journal = Some(Journal::default());
        tracing::debug!("journal begin");
        Ok(())
    }

    /// Commits the open transaction.
    pub fn journal_end(&mut self, design: &mut Design) -> Result<(), ResizerError> {
        let journal = self.journal.take().ok_or(ResizerError::NoJournal)?;
        if !design.netlist.eco_empty() || !journal.entries.is_empty() {
            self.update_parasitics(design);
            design.sta.find_requireds(&design.netlist);
        }
        design.netlist.end_eco()?;
        tracing::debug!(entries = journal.entries.len(), "journal end");
        Ok(())
    }

    /// Returns `true` while a transaction is open.
    pub fn journal_is_open(&self) -> bool {
        self.journal.is_some()
    }

    /// Entries of the open transaction, oldest first.
    pub fn journal_entries(&self) -> &[JournalEntry] {
        match &self.journal {
            Some(journal) => &journal.entries,
            None => &[],
        }
    }

    /// Reverses every edit of the open transaction and closes it.
    ///
    /// Session counters drop by the number of reversed entries of each kind.
    pub fn journal_restore(&mut self, design: &mut Design) -> Result<RestoreSummary, ResizerError> {
        let journal = self.journal.take().ok_or(ResizerError::NoJournal)?;
        let mut summary = RestoreSummary::default();
        for entry in &journal.entries {
            match entry {
                JournalEntry::Resize { .. } => summary.resized += 1,
                JournalEntry::MakeBuffer { .. } => summary.inserted_buffers += 1,
                JournalEntry::Clone { .. } => summary.cloned += 1,
                JournalEntry::SwapPins { .. } => summary.swapped_pins += 1,
                JournalEntry::RemoveBuffer { .. } => {}
            }
        }
        let has_replay = journal
            .entries
            .iter()
            .any(|e| matches!(e, JournalEntry::RemoveBuffer { .. }));
        if design.netlist.eco_empty() && !has_replay {
            design.netlist.end_eco()?;
            self.apply_restore(summary);
            return Ok(summary);
        }

        {
            let mut scope = ObserverScope::new(&mut design.netlist, &mut self.tracker);
            for entry in journal.entries.iter().rev() {
                let JournalEntry::RemoveBuffer {
                    record,
                    snapshot,
                    eco_position,
                } = entry
                else {
                    continue;
                };
                scope.undo_eco_to(*eco_position)?;
                scope.suspend_eco();
                let restored = scope.restore_removal(snapshot);
                scope.resume_eco();
                if restored? {
                    tracing::debug!(buffer = %record.name, "restored removed buffer");
                    summary.removed_buffers += 1;
                } else {
                    summary.unrestored_buffers += 1;
                    self.diagnostics.emit(
                        Diagnostic::warning(
                            codes::BUFFER_NOT_RESTORED,
                            format!("removed buffer {} cannot be restored", record.name),
                        )
                        .with_object(&record.name)
                        .with_note("its driver or one of its loads no longer exists"),
                    );
                }
            }
            scope.undo_eco_to(0)?;
            scope.end_eco()?;
        }

        self.design_area = design_area(&design.netlist, &design.library);
        self.update_parasitics(design);
        design.sta.find_requireds(&design.netlist);
        self.apply_restore(summary);
        tracing::debug!(%summary, "journal restore");
        Ok(summary)
    }

    fn apply_restore(&mut self, summary: RestoreSummary) {
        let c = &mut self.counters;
        c.resized = c.resized.saturating_sub(summary.resized);
        c.inserted_buffers = c.inserted_buffers.saturating_sub(summary.inserted_buffers);
        c.cloned_gates = c.cloned_gates.saturating_sub(summary.cloned);
        c.swapped_pins = c.swapped_pins.saturating_sub(summary.swapped_pins);
        c.removed_buffers = c.removed_buffers.saturating_sub(summary.removed_buffers);
    }

    pub(crate) fn journal_resize(&mut self, inst: InstId, prior: LibCellId) {
        self.history.sized.insert(inst);
        if let Some(journal) = self.journal.as_mut() {
            if journal.resized.insert(inst) {
                journal.entries.push(JournalEntry::Resize { inst, prior });
            }
        }
    }

    pub(crate) fn journal_make_buffer(&mut self, inst: InstId) {
        self.history.buffered.insert(inst);
        if let Some(journal) = self.journal.as_mut() {
            journal.entries.push(JournalEntry::MakeBuffer { inst });
        }
    }

    pub(crate) fn journal_clone(&mut self, original: InstId, clone: InstId) {
        self.history.cloned.insert(clone);
        if let Some(journal) = self.journal.as_mut() {
            journal.entries.push(JournalEntry::Clone { original, clone });
        }
    }

    pub(crate) fn journal_swap_pins(&mut self, inst: InstId, port1: &str, port2: &str) {
        self.history.swapped.insert(inst);
        if let Some(journal) = self.journal.as_mut() {
            journal.entries.push(JournalEntry::SwapPins {
                inst,
                port1: port1.to_string(),
                port2: port2.to_string(),
            });
        }
    }

    /// Logs a buffer about to be removed along with `removed`, the net that
    /// goes with it. Returns `false` with no transaction open.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn journal_remove_buffer(
        &mut self,
        netlist: &Netlist,
        buffer: InstId,
        in_pin: PinId,
        out_pin: PinId,
        in_net: NetId,
        out_net: NetId,
        removed: NetId,
    ) -> bool {
        let Some(journal) = self.journal.as_mut() else {
            return false;
        };
        let Some(instance) = netlist.instance(buffer) else {
            return false;
        };
        let Ok(snapshot) = netlist.snapshot_removal(buffer, removed) else {
            return false;
        };
        let driver = netlist
            .net_pins(in_net)
            .iter()
            .find(|&&p| p != in_pin)
            .and_then(|&p| PinRef::of(netlist, p));
        let loads = netlist
            .net_pins(out_net)
            .iter()
            .filter(|&&p| p != out_pin)
            .filter_map(|&p| PinRef::of(netlist, p))
            .collect();
        journal.entries.push(JournalEntry::RemoveBuffer {
            record: BufferRecord {
                name: instance.name.clone(),
                cell: instance.cell,
                location: instance.location,
                driver,
                loads,
            },
            snapshot,
            eco_position: netlist.eco_position(),
        });
        true
    }
}
