/*!
State machine of a multi-section ballot-casting simulator.

A ballot is a fixed list of sections, each with a fixed list of candidate rows.
One vote can be cast per section. Casting a vote lights the lamp of the row for
a while, and once every section holds a vote the completion dialog is shown
after a short delay. [`BallotSimulator::reset`] starts over.

The simulator never reads a clock by itself: deferred actions are queued and
fire when the host calls [`BallotSimulator::advance_to`] or
[`BallotSimulator::advance_by`].

```
use ballot_simulator::builder::Builder;
use ballot_simulator::*;

let mut sim = Builder::new(&Timings::DEFAULT_TIMINGS)?
    .section(1, "Section 1:", None)?
    .candidate(1, "Anna", None)?
    .abstain(2, "NOTA")?
    .build()?;

sim.cast_vote(SectionId(1), CandidateId(1))?;
assert!(sim.is_lit(SectionId(1), CandidateId(1)));
assert!(!sim.is_complete());

sim.advance_by(Millis(2000));
assert!(!sim.is_lit(SectionId(1), CandidateId(1)));
assert!(sim.is_complete());
# Ok::<(), BallotErrors>(())
```
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::{max, Reverse},
    collections::{BinaryHeap, HashMap, HashSet},
};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Ord, PartialOrd)]
enum TimerAction {
    LampOff(SectionId, CandidateId),
    ShowCompletion,
}

// Ordered by deadline, ties broken by insertion order.
#[derive(Eq, PartialEq, Debug, Clone, Ord, PartialOrd)]
struct Timer {
    deadline: Millis,
    sequence: u64,
    // The voting round in which the timer was scheduled.
    round: u64,
    action: TimerAction,
}

/// The simulator: a static ballot layout and the voting state on top of it.
///
/// `cast_vote` and `reset` are the only operations that change the votes.
#[derive(Debug, Clone)]
pub struct BallotSimulator {
    sections: Vec<Section>,
    // Same order as `sections`.
    selections: Vec<Option<CandidateId>>,
    lamps: HashMap<(SectionId, CandidateId), bool>,
    completed: bool,
    completion_pending: bool,
    timers: BinaryHeap<Reverse<Timer>>,
    now: Millis,
    round: u64,
    sequence: u64,
    timings: Timings,
}

impl BallotSimulator {
    /// Creates a simulator with no vote cast, at time zero.
    pub fn new(sections: &[Section], timings: &Timings) -> Result<BallotSimulator, BallotErrors> {
        check_layout(sections)?;
        info!(
            "BallotSimulator: {} sections, {} rows, timings: {:?}",
            sections.len(),
            sections.iter().map(|s| s.candidates.len()).sum::<usize>(),
            timings
        );
        Ok(BallotSimulator {
            sections: sections.to_vec(),
            selections: vec![None; sections.len()],
            lamps: HashMap::new(),
            completed: false,
            completion_pending: false,
            timers: BinaryHeap::new(),
            now: Millis::ZERO,
            round: 0,
            sequence: 0,
            timings: *timings,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Casts the vote of a section.
    ///
    /// The selection is recorded immediately. The lamp of the row is lit and
    /// turned off once the animation delay has elapsed. Fails without changing
    /// anything if the ids are unknown or if the section already has a vote.
    pub fn cast_vote(
        &mut self,
        section: SectionId,
        candidate: CandidateId,
    ) -> Result<(), BallotErrors> {
        let idx = self.section_index(section)?;
        if self.sections[idx].candidate(candidate).is_none() {
            return Err(BallotErrors::InvalidReference {
                section,
                candidate: Some(candidate),
            });
        }
        if let Some(selected) = self.selections[idx] {
            debug!(
                "cast_vote: section {} already decided for {}, ignoring {}",
                section, selected, candidate
            );
            return Err(BallotErrors::AlreadyDecided { section, selected });
        }

        self.selections[idx] = Some(candidate);
        self.lamps.insert((section, candidate), true);
        self.schedule(
            self.timings.animation,
            TimerAction::LampOff(section, candidate),
        );
        info!(
            "cast_vote: section {} -> candidate {} at {} ({}/{})",
            section,
            candidate,
            self.now,
            self.votes_cast(),
            self.sections.len()
        );

        self.observe_completion();
        Ok(())
    }

    /// Clears all the votes, the lamps and the completion dialog.
    ///
    /// Timers scheduled before the reset still fire, but have no effect.
    pub fn reset(&mut self) {
        for s in self.selections.iter_mut() {
            *s = None;
        }
        self.lamps.clear();
        self.completed = false;
        self.completion_pending = false;
        self.round += 1;
        info!("reset: starting round {} at {}", self.round, self.now);
    }

    /// Moves the clock forward to `time` and fires all the timers due by then.
    ///
    /// Returns the number of timers that had an effect. The clock never goes
    /// backwards.
    pub fn advance_to(&mut self, time: Millis) -> usize {
        let mut applied = 0;
        while let Some(timer) = self.next_due(time) {
            self.now = max(self.now, timer.deadline);
            if self.fire(&timer) {
                applied += 1;
            }
        }
        self.now = max(self.now, time);
        applied
    }

    pub fn advance_by(&mut self, span: Millis) -> usize {
        self.advance_to(self.now + span)
    }

    // ******** Views *********

    pub fn now(&self) -> Millis {
        self.now
    }

    /// The number of sections that hold a vote.
    pub fn votes_cast(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    pub fn all_selected(&self) -> bool {
        self.selections.iter().all(|s| s.is_some())
    }

    /// True once the completion dialog is shown.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn selection(&self, section: SectionId) -> Result<Option<CandidateId>, BallotErrors> {
        let idx = self.section_index(section)?;
        Ok(self.selections[idx])
    }

    pub fn section_status(&self, section: SectionId) -> Result<SectionStatus, BallotErrors> {
        Ok(match self.selection(section)? {
            Some(_) => SectionStatus::Decided,
            None => SectionStatus::Open,
        })
    }

    /// True while the lamp animation of this row runs.
    pub fn is_lit(&self, section: SectionId, candidate: CandidateId) -> bool {
        self.lamps
            .get(&(section, candidate))
            .cloned()
            .unwrap_or(false)
    }

    /// The number of timers still queued, including the ones made obsolete by a reset.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.peek().map(|Reverse(t)| t.deadline)
    }

    pub fn snapshot(&self) -> Snapshot {
        let sections = self
            .sections
            .iter()
            .zip(self.selections.iter())
            .map(|(section, selection)| SectionView {
                id: section.id,
                label: section.label.clone(),
                color: section.color.clone(),
                status: match selection {
                    Some(_) => SectionStatus::Decided,
                    None => SectionStatus::Open,
                },
                selection: *selection,
                candidates: section
                    .candidates
                    .iter()
                    .enumerate()
                    .map(|(idx, c)| {
                        let selected = *selection == Some(c.id);
                        let lamp = if self.is_lit(section.id, c.id) {
                            Lamp::Flashing
                        } else if selected {
                            Lamp::Steady
                        } else {
                            Lamp::Dark
                        };
                        CandidateView {
                            id: c.id,
                            row: if c.abstain { None } else { Some(idx + 1) },
                            name: c.name.clone(),
                            symbol: if c.abstain { None } else { c.symbol.clone() },
                            abstain: c.abstain,
                            lamp,
                            selected,
                            can_vote: selection.is_none(),
                        }
                    })
                    .collect(),
            })
            .collect();
        Snapshot {
            now: self.now,
            votes_cast: self.votes_cast(),
            completed: self.completed,
            sections,
        }
    }

    // ******** Internals *********

    fn section_index(&self, section: SectionId) -> Result<usize, BallotErrors> {
        self.sections
            .iter()
            .position(|s| s.id == section)
            .ok_or(BallotErrors::InvalidReference {
                section,
                candidate: None,
            })
    }

    fn schedule(&mut self, delay: Millis, action: TimerAction) {
        let timer = Timer {
            deadline: self.now + delay,
            sequence: self.sequence,
            round: self.round,
            action,
        };
        debug!("schedule: {:?}", timer);
        self.sequence += 1;
        self.timers.push(Reverse(timer));
    }

    fn next_due(&mut self, time: Millis) -> Option<Timer> {
        let due = matches!(self.timers.peek(), Some(Reverse(t)) if t.deadline <= time);
        if due {
            self.timers.pop().map(|Reverse(t)| t)
        } else {
            None
        }
    }

    // Runs the completion check after a change of the selections.
    // At most one completion timer is pending per round.
    fn observe_completion(&mut self) {
        if self.all_selected() && !self.completed && !self.completion_pending {
            debug!("observe_completion: all sections decided at {}", self.now);
            self.completion_pending = true;
            self.schedule(self.timings.completion_delay, TimerAction::ShowCompletion);
        }
    }

    fn fire(&mut self, timer: &Timer) -> bool {
        if timer.round != self.round {
            debug!(
                "fire: dropping {:?} from round {} (current round {})",
                timer.action, timer.round, self.round
            );
            return false;
        }
        match timer.action {
            TimerAction::LampOff(section, candidate) => {
                debug!("fire: lamp off {}/{} at {}", section, candidate, self.now);
                self.lamps.insert((section, candidate), false);
                true
            }
            TimerAction::ShowCompletion => {
                self.completion_pending = false;
                if self.all_selected() {
                    info!("fire: voting completed at {}", self.now);
                    self.completed = true;
                    true
                } else {
                    false
                }
            }
        }
    }
}

fn check_layout(sections: &[Section]) -> Result<(), BallotErrors> {
    if sections.is_empty() {
        return Err(BallotErrors::EmptyBallot);
    }
    let mut seen_sections: HashSet<SectionId> = HashSet::new();
    for s in sections.iter() {
        if !seen_sections.insert(s.id) {
            return Err(BallotErrors::DuplicateSection(s.id));
        }
        if s.candidates.is_empty() {
            return Err(BallotErrors::EmptySection(s.id));
        }
        let mut seen_candidates: HashSet<CandidateId> = HashSet::new();
        for c in s.candidates.iter() {
            if !seen_candidates.insert(c.id) {
                return Err(BallotErrors::DuplicateCandidate {
                    section: s.id,
                    candidate: c.id,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // Four sections of 10, 4, 7 and 9 rows, the last row of each being NOTA.
    fn ward_ballot() -> BallotSimulator {
        let mut b = Builder::new(&Timings::DEFAULT_TIMINGS).unwrap();
        for (sid, rows) in [(1u32, 10u32), (2, 4), (3, 7), (4, 9)] {
            b = b.section(sid, &format!("Section {}:", sid), None).unwrap();
            for cid in 1..rows {
                let name = if cid == 2 { "Candidate" } else { "" };
                b = b.candidate(cid, name, Some("party.png")).unwrap();
            }
            b = b.abstain(rows, "NOTA").unwrap();
        }
        b.build().unwrap()
    }

    fn vote(sim: &mut BallotSimulator, section: u32, candidate: u32) -> Result<(), BallotErrors> {
        sim.cast_vote(SectionId(section), CandidateId(candidate))
    }

    #[test]
    fn nothing_selected_initially() {
        init();
        let sim = ward_ballot();
        for s in sim.sections() {
            assert_eq!(sim.selection(s.id), Ok(None));
            assert_eq!(sim.section_status(s.id), Ok(SectionStatus::Open));
        }
        assert_eq!(sim.votes_cast(), 0);
        assert!(!sim.is_complete());
        assert_eq!(sim.pending_timers(), 0);
    }

    #[test]
    fn vote_is_recorded_immediately() {
        init();
        let mut sim = ward_ballot();
        vote(&mut sim, 2, 1).unwrap();
        assert_eq!(sim.selection(SectionId(2)), Ok(Some(CandidateId(1))));
        assert_eq!(sim.section_status(SectionId(2)).unwrap().to_string(), "1/1");
        assert_eq!(sim.section_status(SectionId(1)).unwrap().to_string(), "0/1");
        assert_eq!(sim.now(), Millis::ZERO);
    }

    #[test]
    fn second_vote_in_section_is_rejected() {
        init();
        let mut sim = ward_ballot();
        vote(&mut sim, 1, 3).unwrap();
        assert_eq!(
            vote(&mut sim, 1, 10),
            Err(BallotErrors::AlreadyDecided {
                section: SectionId(1),
                selected: CandidateId(3)
            })
        );
        assert_eq!(sim.selection(SectionId(1)), Ok(Some(CandidateId(3))));
        assert!(!sim.is_lit(SectionId(1), CandidateId(10)));
        assert_eq!(sim.votes_cast(), 1);
    }

    #[test]
    fn invalid_references() {
        init();
        let mut sim = ward_ballot();
        assert_eq!(
            vote(&mut sim, 9, 1),
            Err(BallotErrors::InvalidReference {
                section: SectionId(9),
                candidate: None
            })
        );
        assert_eq!(
            vote(&mut sim, 2, 5),
            Err(BallotErrors::InvalidReference {
                section: SectionId(2),
                candidate: Some(CandidateId(5))
            })
        );
        assert_eq!(sim.votes_cast(), 0);
        assert_eq!(sim.pending_timers(), 0);
        assert!(sim.section_status(SectionId(9)).is_err());
    }

    #[test]
    fn lamp_turns_off_after_animation() {
        init();
        let mut sim = ward_ballot();
        vote(&mut sim, 3, 2).unwrap();
        assert!(sim.is_lit(SectionId(3), CandidateId(2)));

        sim.advance_by(Millis(1999));
        assert!(sim.is_lit(SectionId(3), CandidateId(2)));

        vote(&mut sim, 4, 2).unwrap();
        assert_eq!(sim.advance_by(Millis(1)), 1);
        assert!(!sim.is_lit(SectionId(3), CandidateId(2)));
        // The other lamp has its own timer.
        assert!(sim.is_lit(SectionId(4), CandidateId(2)));
        assert_eq!(sim.next_deadline(), Some(Millis(3999)));

        sim.advance_to(Millis(3999));
        assert!(!sim.is_lit(SectionId(4), CandidateId(2)));
        // The votes stay.
        assert_eq!(sim.votes_cast(), 2);
    }

    #[test]
    fn lamp_views() {
        init();
        let mut sim = ward_ballot();
        vote(&mut sim, 1, 3).unwrap();
        let snap = sim.snapshot();
        let s1 = &snap.sections[0];
        assert_eq!(s1.candidates[2].lamp, Lamp::Flashing);
        assert_eq!(s1.candidates[0].lamp, Lamp::Dark);
        assert!(s1.candidates.iter().all(|c| !c.can_vote));
        assert!(snap.sections[1].candidates.iter().all(|c| c.can_vote));

        sim.advance_by(Millis(2000));
        let snap = sim.snapshot();
        assert_eq!(snap.sections[0].candidates[2].lamp, Lamp::Steady);
        assert!(snap.sections[0].candidates[2].selected);
    }

    #[test]
    fn abstain_row_hides_number_and_symbol() {
        init();
        let sim = ward_ballot();
        let snap = sim.snapshot();
        let s2 = &snap.sections[1];
        assert_eq!(s2.candidates.len(), 4);
        assert_eq!(s2.candidates[0].row, Some(1));
        assert_eq!(s2.candidates[0].symbol, Some("party.png".to_string()));
        assert_eq!(s2.candidates[3].row, None);
        assert_eq!(s2.candidates[3].symbol, None);
        assert!(s2.candidates[3].abstain);
    }

    #[test]
    fn completion_after_delay() {
        init();
        let mut sim = ward_ballot();
        vote(&mut sim, 1, 3).unwrap();
        vote(&mut sim, 2, 1).unwrap();
        vote(&mut sim, 3, 2).unwrap();
        assert!(!sim.is_complete());
        assert_eq!(sim.votes_cast(), 3);

        sim.advance_by(Millis(100));
        vote(&mut sim, 4, 2).unwrap();
        assert_eq!(sim.votes_cast(), 4);
        assert!(sim.all_selected());
        assert!(!sim.is_complete());

        sim.advance_by(Millis(499));
        assert!(!sim.is_complete());
        sim.advance_by(Millis(1));
        assert!(sim.is_complete());
        assert!(sim.snapshot().completed);

        sim.reset();
        assert_eq!(sim.votes_cast(), 0);
        assert!(!sim.is_complete());
    }

    #[test]
    fn completion_scheduled_once() {
        init();
        let mut sim = ward_ballot();
        for s in 1..=4 {
            vote(&mut sim, s, 1).unwrap();
        }
        // One lamp timer per vote and a single completion timer.
        assert_eq!(sim.pending_timers(), 5);
        assert!(vote(&mut sim, 4, 2).is_err());
        assert_eq!(sim.pending_timers(), 5);
        assert_eq!(sim.advance_by(Millis(10_000)), 5);
        assert!(sim.is_complete());
        assert_eq!(sim.pending_timers(), 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        init();
        let mut sim = ward_ballot();
        let initial = sim.snapshot();
        for s in 1..=4 {
            vote(&mut sim, s, 2).unwrap();
        }
        sim.advance_by(Millis(600));
        assert!(sim.is_complete());

        sim.reset();
        let after = sim.snapshot();
        assert_eq!(after.sections, initial.sections);
        assert_eq!(after.votes_cast, 0);
        assert!(!after.completed);
    }

    #[test]
    fn stale_timers_are_harmless() {
        init();
        let mut sim = ward_ballot();
        for s in 1..=4 {
            vote(&mut sim, s, 1).unwrap();
        }
        // Reset before any timer fires, then vote again in one section.
        sim.advance_by(Millis(100));
        sim.reset();
        vote(&mut sim, 1, 2).unwrap();

        assert_eq!(sim.advance_by(Millis(500)), 0);
        assert!(!sim.is_complete());
        assert!(sim.is_lit(SectionId(1), CandidateId(2)));
        assert!(!sim.is_lit(SectionId(1), CandidateId(1)));

        // Old lamp timers fire at 2000, the new one at 2100.
        assert_eq!(sim.advance_to(Millis(2000)), 0);
        assert!(sim.is_lit(SectionId(1), CandidateId(2)));
        assert_eq!(sim.selection(SectionId(2)), Ok(None));
        assert_eq!(sim.advance_to(Millis(2100)), 1);
        assert!(!sim.is_lit(SectionId(1), CandidateId(2)));
        assert!(!sim.is_complete());
    }

    #[test]
    fn completion_pending_across_reset() {
        init();
        let mut sim = ward_ballot();
        for s in 1..=4 {
            vote(&mut sim, s, 1).unwrap();
        }
        sim.reset();
        // Fill the ballot again before the old completion timer fires.
        for s in 1..=4 {
            vote(&mut sim, s, 2).unwrap();
        }
        sim.advance_by(Millis(499));
        assert!(!sim.is_complete());
        sim.advance_by(Millis(1));
        assert!(sim.is_complete());
    }

    #[test]
    fn clock_does_not_go_backwards() {
        init();
        let mut sim = ward_ballot();
        sim.advance_to(Millis(1000));
        sim.advance_to(Millis(10));
        assert_eq!(sim.now(), Millis(1000));
    }

    #[test]
    fn layout_checks() {
        init();
        assert_eq!(
            BallotSimulator::new(&[], &Timings::DEFAULT_TIMINGS).err(),
            Some(BallotErrors::EmptyBallot)
        );
        let section = Section {
            id: SectionId(1),
            label: "".to_string(),
            color: None,
            candidates: vec![],
        };
        assert_eq!(
            BallotSimulator::new(&[section], &Timings::DEFAULT_TIMINGS).err(),
            Some(BallotErrors::EmptySection(SectionId(1)))
        );
    }
}
