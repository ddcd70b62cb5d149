// ********* Ballot layout ***********

use std::error::Error;
use std::fmt::Display;
use std::ops::Add;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct SectionId(pub u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

impl Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point (or a span) on the simulator clock, in milliseconds.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Default)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);
}

impl Add for Millis {
    type Output = Millis;
    fn add(self: Millis, rhs: Millis) -> Millis {
        Millis(self.0.saturating_add(rhs.0))
    }
}

impl Display for Millis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// One row of a section.
///
/// An empty name means that no candidate is configured at this row. The row
/// can still receive a vote.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub symbol: Option<String>,
    /// The designated "none of the above" row.
    pub abstain: bool,
}

/// A color-coded group of candidates, in which exactly one vote is cast.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub label: String,
    pub color: Option<String>,
    pub candidates: Vec<Candidate>,
}

impl Section {
    pub fn candidate(&self, cid: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == cid)
    }
}

// ********* Timings **********

/// The delays of the two deferred actions of the simulator.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Timings {
    /// How long the lamp of a row stays lit after a vote.
    pub animation: Millis,
    /// How long after the last section is filled the completion dialog shows up.
    pub completion_delay: Millis,
}

impl Timings {
    pub const DEFAULT_TIMINGS: Timings = Timings {
        animation: Millis(2000),
        completion_delay: Millis(500),
    };
}

impl Default for Timings {
    fn default() -> Self {
        Timings::DEFAULT_TIMINGS
    }
}

// ********* Views **********

/// Voting status of one section, displayed as `1/1` or `0/1`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SectionStatus {
    Decided,
    Open,
}

impl Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionStatus::Decided => write!(f, "1/1"),
            SectionStatus::Open => write!(f, "0/1"),
        }
    }
}

/// State of the lamp in front of a row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Lamp {
    /// The vote was just cast on this row and the animation is running.
    Flashing,
    /// The row holds the vote of its section.
    Steady,
    Dark,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateView {
    pub id: CandidateId,
    /// 1-based position in the section, not shown for the abstain row.
    pub row: Option<usize>,
    pub name: String,
    /// Not shown for the abstain row.
    pub symbol: Option<String>,
    pub abstain: bool,
    pub lamp: Lamp,
    pub selected: bool,
    pub can_vote: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionView {
    pub id: SectionId,
    pub label: String,
    pub color: Option<String>,
    pub status: SectionStatus,
    pub selection: Option<CandidateId>,
    pub candidates: Vec<CandidateView>,
}

/// Everything a renderer needs to draw the ballot at a given instant.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Snapshot {
    pub now: Millis,
    pub votes_cast: usize,
    pub completed: bool,
    pub sections: Vec<SectionView>,
}

// ********* Errors **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotErrors {
    /// The section does not exist, or the candidate is not part of it.
    InvalidReference {
        section: SectionId,
        candidate: Option<CandidateId>,
    },
    /// A vote was already cast in this section.
    AlreadyDecided {
        section: SectionId,
        selected: CandidateId,
    },
    EmptyBallot,
    EmptySection(SectionId),
    DuplicateSection(SectionId),
    DuplicateCandidate {
        section: SectionId,
        candidate: CandidateId,
    },
}

impl Error for BallotErrors {}

impl Display for BallotErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotErrors::InvalidReference {
                section,
                candidate: Some(cid),
            } => write!(f, "no candidate {} in section {}", cid, section),
            BallotErrors::InvalidReference {
                section,
                candidate: None,
            } => write!(f, "no section {}", section),
            BallotErrors::AlreadyDecided { section, selected } => write!(
                f,
                "section {} already has a vote (candidate {})",
                section, selected
            ),
            BallotErrors::EmptyBallot => write!(f, "the ballot has no section"),
            BallotErrors::EmptySection(sid) => write!(f, "section {} has no candidate", sid),
            BallotErrors::DuplicateSection(sid) => write!(f, "section {} is defined twice", sid),
            BallotErrors::DuplicateCandidate { section, candidate } => write!(
                f,
                "candidate {} is defined twice in section {}",
                candidate, section
            ),
        }
    }
}
