use rand::Rng;
use srs_alarm::AlarmController;
use tracing::{debug, info, warn};

use crate::{CorrectWireSelection, CutOutcome, ResponseSubsystem, WireId};

const CORRECT_WIRE_REASON: &str = "correct wire cut";
const WRONG_WIRE_REASON: &str = "wrong wire cut";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisarmPanel {
    wires: Vec<WireId>,
    /// `None` only for an empty panel.
    correct_index: Option<usize>,
    cut: Vec<bool>,
    disarmed: bool,
}

impl DisarmPanel {
    /// Build a panel, choosing the correct wire once.
    ///
    /// `rng` is only drawn from for [`CorrectWireSelection::Random`].
    pub fn new<R: Rng + ?Sized>(
        wires: Vec<WireId>,
        selection: CorrectWireSelection,
        rng: &mut R,
    ) -> Self {
        let correct_index = match (wires.len(), selection) {
            (0, _) => None,
            (n, CorrectWireSelection::Fixed(i)) => Some(i.min(n - 1)),
            (n, CorrectWireSelection::Random) => Some(rng.gen_range(0..n)),
        };
        Self::with_correct_index(wires, correct_index, selection)
    }

    /// Fixed selection; no RNG needed.
    pub fn with_fixed(wires: Vec<WireId>, index: usize) -> Self {
        let correct_index = wires.len().checked_sub(1).map(|last| index.min(last));
        Self::with_correct_index(wires, correct_index, CorrectWireSelection::Fixed(index))
    }

    fn with_correct_index(
        wires: Vec<WireId>,
        correct_index: Option<usize>,
        selection: CorrectWireSelection,
    ) -> Self {
        let count = wires.len();
        if count == 0 {
            warn!("panel/no wires configured; every cut is out of range");
        }
        debug!(count, correct_index = ?correct_index, selection = ?selection, "panel/correct wire chosen");

        Self {
            cut: vec![false; count],
            wires,
            correct_index,
            disarmed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.correct_index
    }

    pub fn index_of(&self, id: &WireId) -> Option<usize> {
        self.wires.iter().position(|w| w == id)
    }

    /// `false` for out-of-range indices.
    pub fn is_cut(&self, index: usize) -> bool {
        self.cut.get(index).copied().unwrap_or(false)
    }

    pub fn cut_count(&self) -> usize {
        self.cut.iter().filter(|c| **c).count()
    }

    pub fn is_disarmed(&self) -> bool {
        self.disarmed
    }

    // -----------------------------------------------------------------------
    // Cut arbitration
    // -----------------------------------------------------------------------

    /// Resolve one cut attempt.
    pub fn cut(
        &mut self,
        index: usize,
        alarm: &mut AlarmController,
        response: &mut dyn ResponseSubsystem,
    ) -> CutOutcome {
        let Some(slot) = self.cut.get_mut(index) else {
            debug!(index, count = self.wires.len(), "panel/cut rejected (out of range)");
            return CutOutcome::OutOfRange;
        };
        if *slot {
            debug!(index, "panel/cut ignored (already cut)");
            return CutOutcome::AlreadyCut;
        }
        *slot = true;

        let wire = &self.wires[index];

        if Some(index) == self.correct_index {
            // Stop regardless of current phase, then clear the police timer.
            alarm.stop(CORRECT_WIRE_REASON);
            alarm.reset_escalation(CORRECT_WIRE_REASON);
            response.disable_to_static(CORRECT_WIRE_REASON);
            self.disarmed = true;
            info!(index, wire = %wire, "panel/disarmed");
            return CutOutcome::Disarmed;
        }

        if self.disarmed {
            debug!(index, wire = %wire, "panel/cut inert (already disarmed)");
            return CutOutcome::Inert;
        }

        info!(index, wire = %wire, "panel/false trigger");
        alarm.trigger(WRONG_WIRE_REASON);
        CutOutcome::FalseTrigger
    }

    /// Resolve a cut by wire identifier.
    pub fn cut_by_id(
        &mut self,
        id: &WireId,
        alarm: &mut AlarmController,
        response: &mut dyn ResponseSubsystem,
    ) -> CutOutcome {
        match self.index_of(id) {
            Some(index) => self.cut(index, alarm, response),
            None => {
                debug!(wire = %id, "panel/cut rejected (unknown wire)");
                CutOutcome::OutOfRange
            }
        }
    }
}
