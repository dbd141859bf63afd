use crate::board::{Move, Position};
use crate::engine::{Report, Reporter};

pub fn print_ready() {
    println!("readyok");
}

/// `cp X` or `mate M`
#[must_use]
pub fn format_score(report: &Report) -> String {
    match report.mate_in() {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", report.score),
    }
}

#[must_use]
pub fn format_info(report: &Report) -> String {
    let mut line = format!(
        "info depth {} seldepth {} time {} nodes {} nps {} score {} pv",
        report.depth,
        report.seldepth,
        report.time,
        report.nodes,
        report.nps,
        format_score(report)
    );
    for mv in &report.line {
        line.push(' ');
        line.push_str(&mv.to_string());
    }
    line
}

#[must_use]
pub fn format_bestmove(best_move: Move) -> String {
    if best_move.is_none() {
        "bestmove (none)".to_string()
    } else {
        format!("bestmove {best_move}")
    }
}

/// Protocol output for GUIs
#[derive(Debug, Default, Clone, Copy)]
pub struct UciReporter;

impl Reporter for UciReporter {
    fn on_update(&mut self, report: &Report) {
        println!("{}", format_info(report));
    }

    fn on_completion(&mut self, _report: &Report, best_move: Move) {
        println!("{}", format_bestmove(best_move));
    }

    fn show_position(&mut self, position: &Position, eval: i32) {
        println!("{position}");
        println!("info score cp {eval}");
    }
}
