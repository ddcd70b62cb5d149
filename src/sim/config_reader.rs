use crate::sim::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// The layout of the KDMC Ward No.16 ballot, used when no configuration is given.
pub const DEFAULT_LAYOUT: &str = include_str!("default_layout.json");

const DEFAULT_ABSTAIN_MARKER: &str = "NOTA";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LayoutCandidate {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub symbol: Option<String>,
    pub abstain: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSection {
    pub id: u32,
    pub label: Option<String>,
    pub color: Option<String>,
    pub candidates: Vec<LayoutCandidate>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LayoutTimings {
    #[serde(rename = "animationMs")]
    pub animation_ms: Option<u64>,
    #[serde(rename = "completionDelayMs")]
    pub completion_delay_ms: Option<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStrings {
    #[serde(rename = "voteButton")]
    pub vote_button: Option<String>,
    #[serde(rename = "dialogTitle")]
    pub dialog_title: Option<String>,
    #[serde(rename = "dialogMessage")]
    pub dialog_message: Option<String>,
    #[serde(rename = "dialogDetail")]
    pub dialog_detail: Option<String>,
    #[serde(rename = "resetButton")]
    pub reset_button: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotLayout {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(rename = "totalVotesBanner")]
    pub total_votes_banner: Option<String>,
    pub instructions: Option<Vec<String>>,
    pub footer: Option<String>,
    #[serde(rename = "abstainMarker")]
    pub abstain_marker: Option<String>,
    pub timings: Option<LayoutTimings>,
    pub strings: Option<LayoutStrings>,
    pub sections: Vec<LayoutSection>,
}

/// The literal strings shown by the renderer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DisplayStrings {
    pub title: String,
    pub subtitle: String,
    pub total_votes_banner: Option<String>,
    pub instructions: Vec<String>,
    pub footer: String,
    pub vote_button: String,
    pub dialog_title: String,
    pub dialog_message: String,
    pub dialog_detail: Option<String>,
    pub reset_button: String,
}

impl BallotLayout {
    pub fn timings(&self) -> SimResult<Timings> {
        let t = match &self.timings {
            Some(t) => t,
            None => return Ok(Timings::DEFAULT_TIMINGS),
        };
        let res = Timings {
            animation: t
                .animation_ms
                .map(Millis)
                .unwrap_or(Timings::DEFAULT_TIMINGS.animation),
            completion_delay: t
                .completion_delay_ms
                .map(Millis)
                .unwrap_or(Timings::DEFAULT_TIMINGS.completion_delay),
        };
        if res.animation == Millis::ZERO || res.completion_delay == Millis::ZERO {
            whatever!("animationMs and completionDelayMs must be positive")
        }
        Ok(res)
    }

    pub fn sections(&self) -> Vec<Section> {
        let marker = self
            .abstain_marker
            .clone()
            .unwrap_or_else(|| DEFAULT_ABSTAIN_MARKER.to_string());
        self.sections
            .iter()
            .map(|s| Section {
                id: SectionId(s.id),
                label: s
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("Section {}:", s.id)),
                color: s.color.clone(),
                candidates: s
                    .candidates
                    .iter()
                    .map(|c| Candidate {
                        id: CandidateId(c.id),
                        name: c.name.clone(),
                        symbol: match c.symbol.clone() {
                            Some(x) if x.is_empty() => None,
                            x => x,
                        },
                        abstain: c.abstain.unwrap_or_else(|| {
                            !marker.is_empty() && c.name.contains(marker.as_str())
                        }),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn display_strings(&self) -> DisplayStrings {
        let strings = self.strings.clone().unwrap_or(LayoutStrings {
            vote_button: None,
            dialog_title: None,
            dialog_message: None,
            dialog_detail: None,
            reset_button: None,
        });
        DisplayStrings {
            title: self.title.clone().unwrap_or_else(|| "Ballot".to_string()),
            subtitle: self
                .subtitle
                .clone()
                .unwrap_or_else(|| "Voting Simulator".to_string()),
            total_votes_banner: self.total_votes_banner.clone(),
            instructions: self.instructions.clone().unwrap_or_else(|| {
                vec!["Select 1 candidate in each colored section to complete voting.".to_string()]
            }),
            footer: self
                .footer
                .clone()
                .unwrap_or_else(|| "This is a voting training simulator.".to_string()),
            vote_button: strings.vote_button.unwrap_or_else(|| "Vote".to_string()),
            dialog_title: strings
                .dialog_title
                .unwrap_or_else(|| "Voting Completed".to_string()),
            dialog_message: strings
                .dialog_message
                .unwrap_or_else(|| "Your voting process is completed.".to_string()),
            dialog_detail: strings.dialog_detail,
            reset_button: strings.reset_button.unwrap_or_else(|| "Reset".to_string()),
        }
    }

    /// Builds a fresh simulator for this layout.
    pub fn simulator(&self) -> SimResult<BallotSimulator> {
        BallotSimulator::new(&self.sections(), &self.timings()?).context(InvalidLayoutSnafu {})
    }
}

pub fn parse_layout(contents: &str) -> SimResult<BallotLayout> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

/// Reads the layout at the given path, or the built-in layout.
pub fn read_layout(path: &Option<String>) -> SimResult<BallotLayout> {
    match path {
        Some(p) => {
            info!("Attempting to read layout file {:?}", p);
            let contents = fs::read_to_string(p).context(OpeningFileSnafu { path: p })?;
            parse_layout(contents.as_str())
        }
        None => {
            debug!("read_layout: using the built-in layout");
            parse_layout(DEFAULT_LAYOUT)
        }
    }
}

pub fn read_summary(path: &str) -> SimResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}
