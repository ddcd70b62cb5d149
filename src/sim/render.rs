// Text rendering of the ballot.

use ballot_simulator::{CandidateView, Lamp, SectionView, Snapshot};
use unicode_width::UnicodeWidthStr;

use crate::sim::config_reader::DisplayStrings;

const RULE_WIDTH: usize = 60;

fn lamp(l: Lamp) -> &'static str {
    match l {
        Lamp::Flashing => "(*)",
        Lamp::Steady => "(o)",
        Lamp::Dark => "( )",
    }
}

/// The vote control of a row. The label only shows for named candidates.
fn vote_control(c: &CandidateView, strings: &DisplayStrings) -> String {
    if !c.can_vote {
        "[ ---- ]".to_string()
    } else if c.name.is_empty() || c.abstain {
        "[      ]".to_string()
    } else {
        format!("[ {} ]", strings.vote_button)
    }
}

/// Left-aligns `txt` in `width` terminal columns. Combining marks take no column.
fn pad(txt: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(txt);
    format!("{}{}", txt, " ".repeat(width.saturating_sub(w)))
}

fn candidate_row(c: &CandidateView, strings: &DisplayStrings) -> String {
    let row = c.row.map(|r| r.to_string()).unwrap_or_default();
    let symbol = c
        .symbol
        .as_ref()
        .map(|s| format!("[{}]", s))
        .unwrap_or_default();
    format!(
        "  {:>3}  {} {} {}  {}",
        row,
        pad(&c.name, 28),
        pad(&symbol, 16),
        lamp(c.lamp),
        vote_control(c, strings)
    )
}

fn section_header(s: &SectionView) -> String {
    match &s.color {
        Some(color) => format!("== {} {} ({}) ==", s.label, s.status, color),
        None => format!("== {} {} ==", s.label, s.status),
    }
}

/// One line with the status of every section, followed by the vote count.
pub fn render_status(snapshot: &Snapshot) -> String {
    let strip: Vec<String> = snapshot
        .sections
        .iter()
        .map(|s| format!("[{} {}]", s.label, s.status))
        .collect();
    format!(
        "{}  votes cast: {}/{}",
        strip.join(" "),
        snapshot.votes_cast,
        snapshot.sections.len()
    )
}

pub fn render_dialog(strings: &DisplayStrings) -> Vec<String> {
    let rule = format!("+{}+", "-".repeat(RULE_WIDTH - 2));
    let mut lines = vec![rule.clone(), format!("| \u{2713} {}", strings.dialog_title)];
    lines.push(format!("| {}", strings.dialog_message));
    if let Some(detail) = &strings.dialog_detail {
        lines.push(format!("| {}", detail));
    }
    lines.push(format!("| [ {} ]  (reset)", strings.reset_button));
    lines.push(rule);
    lines
}

/// Draws the whole ballot: header, section strip, candidate table, footer and,
/// once the voting is complete, the completion dialog.
pub fn render_ballot(snapshot: &Snapshot, strings: &DisplayStrings) -> String {
    let mut lines: Vec<String> = vec![strings.title.clone(), strings.subtitle.clone()];
    if let Some(banner) = &strings.total_votes_banner {
        lines.push(format!("( {} )", banner));
    }
    lines.push("=".repeat(RULE_WIDTH));
    for l in strings.instructions.iter() {
        lines.push(l.clone());
    }
    lines.push("".to_string());
    lines.push(render_status(snapshot));
    lines.push("".to_string());

    for s in snapshot.sections.iter() {
        lines.push(section_header(s));
        for c in s.candidates.iter() {
            lines.push(candidate_row(c, strings));
        }
    }

    lines.push("=".repeat(RULE_WIDTH));
    lines.push(strings.footer.clone());

    if snapshot.completed {
        lines.push("".to_string());
        lines.extend(render_dialog(strings));
    }
    lines.push(format!("t = {}", snapshot.now));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config_reader::read_layout;
    use ballot_simulator::{CandidateId, Millis, SectionId};

    #[test]
    fn initial_ballot() {
        let layout = read_layout(&None).unwrap();
        let strings = layout.display_strings();
        let sim = layout.simulator().unwrap();
        let txt = render_ballot(&sim.snapshot(), &strings);

        assert!(txt.starts_with("BJP - Shivsena - KDMC Election - Ward No.16"));
        assert!(txt.contains("[विभाग १: 0/1] [विभाग २: 0/1]"));
        assert!(txt.contains("votes cast: 0/4"));
        // One labeled control per named candidate.
        assert_eq!(txt.matches("[ मत द्या ]").count(), 4);
        assert_eq!(txt.matches("( )").count(), 30);
        assert!(!txt.contains("[ ---- ]"));
        assert!(!txt.contains(&strings.dialog_title));
        assert!(txt.contains("[bjp.png]"));
    }

    #[test]
    fn decided_section() {
        let layout = read_layout(&None).unwrap();
        let strings = layout.display_strings();
        let mut sim = layout.simulator().unwrap();
        sim.cast_vote(SectionId(2), CandidateId(1)).unwrap();

        let txt = render_ballot(&sim.snapshot(), &strings);
        assert_eq!(txt.matches("[ ---- ]").count(), 4);
        assert_eq!(txt.matches("(*)").count(), 1);
        assert!(txt.contains("== विभाग २: 1/1 (pink) =="));

        sim.advance_by(Millis(2000));
        let txt = render_ballot(&sim.snapshot(), &strings);
        assert_eq!(txt.matches("(*)").count(), 0);
        assert_eq!(txt.matches("(o)").count(), 1);
    }

    #[test]
    fn abstain_row() {
        let layout = read_layout(&None).unwrap();
        let strings = layout.display_strings();
        let sim = layout.simulator().unwrap();
        let snap = sim.snapshot();
        let nota = &snap.sections[1].candidates[3];
        let row = candidate_row(nota, &strings);
        assert!(row.starts_with("       नोटा (NOTA)"));
        assert!(row.ends_with("( )  [      ]"));
    }

    #[test]
    fn columns_follow_display_width() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("e\u{301}", 4), "e\u{301}   ");
        assert_eq!(pad("too long", 3), "too long");

        let layout = read_layout(&None).unwrap();
        let strings = layout.display_strings();
        let sim = layout.simulator().unwrap();
        let snap = sim.snapshot();
        let lamp_columns: Vec<usize> = snap.sections[0]
            .candidates
            .iter()
            .filter(|c| !c.abstain)
            .map(|c| {
                let row = candidate_row(c, &strings);
                let at = row.find("( )").unwrap();
                UnicodeWidthStr::width(&row[..at])
            })
            .collect();
        assert!(lamp_columns.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn completion_dialog() {
        let layout = read_layout(&None).unwrap();
        let strings = layout.display_strings();
        let mut sim = layout.simulator().unwrap();
        for (s, c) in [(1, 3), (2, 1), (3, 2), (4, 2)] {
            sim.cast_vote(SectionId(s), CandidateId(c)).unwrap();
        }
        let txt = render_ballot(&sim.snapshot(), &strings);
        assert!(!txt.contains("Voting Completed"));

        sim.advance_by(Millis(500));
        let txt = render_ballot(&sim.snapshot(), &strings);
        assert!(txt.contains("Voting Completed"));
        assert!(txt.contains("[ पुन्हा सुरू करा (Reset) ]"));
        assert!(render_status(&sim.snapshot()).ends_with("votes cast: 4/4"));
    }
}
