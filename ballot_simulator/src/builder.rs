pub use crate::config::*;
use crate::BallotSimulator;

/// A builder for laying out a ballot.
///
/// Sections are added in display order, and candidates are attached to the
/// last section added.
///
/// ```
/// pub use ballot_simulator::builder::Builder;
/// pub use ballot_simulator::Timings;
/// # use ballot_simulator::BallotErrors;
///
/// let sim = Builder::new(&Timings::DEFAULT_TIMINGS)?
///     .section(1, "Section 1:", Some("white"))?
///     .candidate(1, "Anna", Some("lotus.png"))?
///     .candidate(2, "", None)?
///     .abstain(3, "NOTA")?
///     .build()?;
///
/// assert_eq!(sim.votes_cast(), 0);
///
/// # Ok::<(), BallotErrors>(())
/// ```
pub struct Builder {
    pub(crate) _timings: Timings,
    pub(crate) _sections: Vec<Section>,
}

impl Builder {
    pub fn new(timings: &Timings) -> Result<Builder, BallotErrors> {
        Ok(Builder {
            _timings: *timings,
            _sections: Vec::new(),
        })
    }

    /// Opens a new section. The following candidates will be added to it.
    pub fn section(
        mut self,
        id: u32,
        label: &str,
        color: Option<&str>,
    ) -> Result<Builder, BallotErrors> {
        let sid = SectionId(id);
        if self._sections.iter().any(|s| s.id == sid) {
            return Err(BallotErrors::DuplicateSection(sid));
        }
        self._sections.push(Section {
            id: sid,
            label: label.to_string(),
            color: color.map(|c| c.to_string()),
            candidates: Vec::new(),
        });
        Ok(self)
    }

    /// Adds a candidate row to the last section.
    ///
    /// name: may be empty, in which case the row shows no candidate.
    pub fn candidate(
        self,
        id: u32,
        name: &str,
        symbol: Option<&str>,
    ) -> Result<Builder, BallotErrors> {
        self.push_candidate(Candidate {
            id: CandidateId(id),
            name: name.to_string(),
            symbol: symbol.map(|s| s.to_string()),
            abstain: false,
        })
    }

    /// Adds the "none of the above" row to the last section.
    pub fn abstain(self, id: u32, name: &str) -> Result<Builder, BallotErrors> {
        self.push_candidate(Candidate {
            id: CandidateId(id),
            name: name.to_string(),
            symbol: None,
            abstain: true,
        })
    }

    /// Adds a complete section.
    pub fn add_section(&mut self, section: &Section) -> Result<(), BallotErrors> {
        if self._sections.iter().any(|s| s.id == section.id) {
            return Err(BallotErrors::DuplicateSection(section.id));
        }
        self._sections.push(section.clone());
        Ok(())
    }

    pub fn build(self) -> Result<BallotSimulator, BallotErrors> {
        BallotSimulator::new(&self._sections, &self._timings)
    }

    fn push_candidate(mut self, candidate: Candidate) -> Result<Builder, BallotErrors> {
        let section = self._sections.last_mut().ok_or(BallotErrors::EmptyBallot)?;
        if section.candidate(candidate.id).is_some() {
            return Err(BallotErrors::DuplicateCandidate {
                section: section.id,
                candidate: candidate.id,
            });
        }
        section.candidates.push(candidate);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_before_section() {
        let res = Builder::new(&Timings::DEFAULT_TIMINGS)
            .and_then(|b| b.candidate(1, "Anna", None));
        assert_eq!(res.err(), Some(BallotErrors::EmptyBallot));
    }

    #[test]
    fn duplicate_ids() {
        let res = Builder::new(&Timings::DEFAULT_TIMINGS)
            .and_then(|b| b.section(1, "a", None))
            .and_then(|b| b.candidate(1, "Anna", None))
            .and_then(|b| b.section(1, "b", None));
        assert_eq!(res.err(), Some(BallotErrors::DuplicateSection(SectionId(1))));

        let res = Builder::new(&Timings::DEFAULT_TIMINGS)
            .and_then(|b| b.section(1, "a", None))
            .and_then(|b| b.candidate(2, "Anna", None))
            .and_then(|b| b.abstain(2, "NOTA"));
        assert_eq!(
            res.err(),
            Some(BallotErrors::DuplicateCandidate {
                section: SectionId(1),
                candidate: CandidateId(2)
            })
        );
    }

    #[test]
    fn empty_section_rejected_at_build() {
        let res = Builder::new(&Timings::DEFAULT_TIMINGS)
            .and_then(|b| b.section(1, "a", None))
            .and_then(|b| b.candidate(1, "Anna", None))
            .and_then(|b| b.section(2, "b", None))
            .and_then(|b| b.build());
        assert_eq!(res.err(), Some(BallotErrors::EmptySection(SectionId(2))));
    }

    #[test]
    fn add_section() {
        let mut b = Builder::new(&Timings::DEFAULT_TIMINGS).unwrap();
        let s = Section {
            id: SectionId(4),
            label: "Section 4:".to_string(),
            color: None,
            candidates: vec![Candidate {
                id: CandidateId(1),
                name: "Bob".to_string(),
                symbol: None,
                abstain: false,
            }],
        };
        b.add_section(&s).unwrap();
        assert_eq!(
            b.add_section(&s),
            Err(BallotErrors::DuplicateSection(SectionId(4)))
        );
        let sim = b.build().unwrap();
        assert_eq!(sim.sections().len(), 1);
    }
}
