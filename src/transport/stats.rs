/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::collections::BTreeMap;

/// The collectives implemented by [`Communicator`](crate::Communicator).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collective {
    Barrier,
    Broadcast,
    Gather,
    Scatter,
    AllGather,
    AllToAll,
    Reduce,
    AllReduce,
    ReduceScatter,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// A point-to-point message left this rank.
    Send { elements: usize },
    /// This rank entered a collective, contributing `elements` elements.
    Collective { kind: Collective, elements: usize },
}

/// Per-rank traffic counters.
///
/// Collectives are counted once per call (not once per underlying message),
/// which is what makes statements like "exactly one all-gather of 2 elements"
/// checkable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommStats {
    pub messages_sent: usize,
    pub elements_sent: usize,
    collectives: BTreeMap<Collective, (usize, usize)>,
}

impl CommStats {
    pub fn record(&mut self, event: Event) {
        match event {
            Event::Send { elements } => {
                self.messages_sent += 1;
                self.elements_sent += elements;
            },
            Event::Collective { kind, elements } => {
                let entry = self.collectives.entry(kind).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += elements;
            },
        }
    }

    /// Number of calls to a collective.
    pub fn calls(&self, kind: Collective) -> usize
    { self.collectives.get(&kind).map_or(0, |&(calls, _)| calls) }

    /// Total elements this rank contributed to a kind of collective.
    pub fn contributed(&self, kind: Collective) -> usize
    { self.collectives.get(&kind).map_or(0, |&(_, elements)| elements) }

    pub fn total_calls(&self) -> usize
    { self.collectives.values().map(|&(calls, _)| calls).sum() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut stats = CommStats::default();
        stats.record(Event::Collective { kind: Collective::AllGather, elements: 2 });
        stats.record(Event::Send { elements: 2 });
        stats.record(Event::Send { elements: 2 });
        stats.record(Event::Collective { kind: Collective::AllGather, elements: 3 });

        assert_eq!(stats.calls(Collective::AllGather), 2);
        assert_eq!(stats.contributed(Collective::AllGather), 5);
        assert_eq!(stats.calls(Collective::AllToAll), 0);
        assert_eq!(stats.total_calls(), 2);
        assert_eq!(stats.messages_sent, 2);
        assert_eq!(stats.elements_sent, 4);
    }
}
