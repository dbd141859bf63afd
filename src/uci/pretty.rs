//! Human-readable terminal output.

use std::fmt::Write as _;

use crate::board::search::{mate_in, MATE_BOUND};
use crate::board::{CastleSide, Color, Move, Position, Square};
use crate::engine::{Report, Reporter};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const FRAME: &str = "\x1b[38;5;189m";
const LABEL: &str = "\x1b[38;5;153m";
const VALUE: &str = "\x1b[38;5;105m";
const WHITE_PIECE: &str = "\x1b[38;5;255m";
const BLACK_PIECE: &str = "\x1b[38;5;63m";

/// Moves of a line shown per depth
const LINE_PREVIEW: usize = 8;

/// `1,234,567`
#[must_use]
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `850ms`, `4.2s`, `3m07s`
#[must_use]
pub fn format_time(ms: u64) -> String {
    match ms {
        0..=999 => format!("{ms}ms"),
        1_000..=59_999 => format!("{}.{}s", ms / 1000, (ms % 1000) / 100),
        _ => {
            let secs = ms / 1000;
            format!("{}m{:02}s", secs / 60, secs % 60)
        }
    }
}

/// Pawn units with sign, or `M3` / `M-2` for mates
#[must_use]
pub fn format_score(score: i32) -> String {
    if score.abs() >= MATE_BOUND {
        if let Some(moves) = mate_in(score) {
            return format!("M{moves}");
        }
    }
    format!("{:+.2}", f64::from(score) / 100.0)
}

/// Short algebraic line with move numbers, e.g. `12... Nf6 13. e5`
#[must_use]
pub fn format_line(position: &Position, line: &[Move], max_moves: usize) -> String {
    let mut pos = position.clone();
    let mut out = String::new();
    let mut number = pos.fullmove_number();

    for (i, &mv) in line.iter().take(max_moves).enumerate() {
        match pos.side_to_move() {
            Color::White => {
                let _ = write!(out, "{number}. ");
            }
            Color::Black if i == 0 => {
                let _ = write!(out, "{number}... ");
            }
            Color::Black => {}
        }
        out.push_str(&mv.to_pgn(&pos));
        out.push(' ');
        if pos.side_to_move() == Color::Black {
            number += 1;
        }
        pos.make_move(mv);
    }
    if line.len() > max_moves {
        out.push_str("...");
    }
    out.trim_end().to_string()
}

/// Framed board diagram, rank 8 at the top
#[must_use]
pub fn render_board(position: &Position) -> String {
    let border = format!("   {FRAME}+{}{RESET}", "---+".repeat(8));
    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    for rank in (0..8usize).rev() {
        let _ = write!(out, " {LABEL}{}{RESET} {FRAME}|{RESET}", rank + 1);
        for file in 0..8usize {
            let symbol = Square::new(rank, file)
                .and_then(|sq| position.piece_at(sq))
                .map_or_else(
                    || " ".to_string(),
                    |piece| {
                        let color = match piece.color {
                            Color::White => WHITE_PIECE,
                            Color::Black => BLACK_PIECE,
                        };
                        format!("{BOLD}{color}{}{RESET}", piece.to_fen_char())
                    },
                );
            let _ = write!(out, " {symbol} {FRAME}|{RESET}");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "     {LABEL}a   b   c   d   e   f   g   h{RESET}");
    out
}

fn castling_text(position: &Position) -> String {
    let rights = position.castling_rights();
    let text: String = [
        (Color::White, CastleSide::King, 'K'),
        (Color::White, CastleSide::Queen, 'Q'),
        (Color::Black, CastleSide::King, 'k'),
        (Color::Black, CastleSide::Queen, 'q'),
    ]
    .into_iter()
    .filter(|&(color, side, _)| rights.has(color, side))
    .map(|(_, _, c)| c)
    .collect();
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}

fn render_metadata(position: &Position) -> String {
    let mut out = String::new();
    let field = |out: &mut String, label: &str, value: &str| {
        let _ = writeln!(out, "    {LABEL}{label:<13}{RESET}{VALUE}{value}{RESET}");
    };
    field(&mut out, "FEN:", &position.to_fen());
    field(&mut out, "Zobrist:", &format!("{:#018x}", position.hash()));
    field(&mut out, "Side:", &position.side_to_move().to_string());
    field(&mut out, "Castling:", &castling_text(position));
    field(
        &mut out,
        "En passant:",
        &position.ep_square().map_or_else(|| "-".to_string(), |sq| sq.to_string()),
    );
    field(&mut out, "Halfmoves:", &position.halfmove_clock().to_string());
    out
}

/// Colored board and per-depth summaries for interactive use
#[derive(Debug, Default)]
pub struct PrettyReporter {
    root: Option<Position>,
}

impl PrettyReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One line per completed depth
    #[must_use]
    pub fn format_update(&self, report: &Report) -> String {
        let line = self
            .root
            .as_ref()
            .map(|pos| format_line(pos, &report.line, LINE_PREVIEW))
            .unwrap_or_default();
        format!(
            "{DIM}{LABEL}  depth {:>2}/{:<2}{RESET} {VALUE}{:>8}{RESET} {DIM}{:>12} nodes {:>7} {:>10} nps{RESET}  {BOLD}{}{RESET}",
            report.depth,
            report.seldepth,
            format_score(report.score),
            format_number(report.nodes),
            format_time(report.time),
            format_number(report.nps),
            line
        )
    }
}

impl Reporter for PrettyReporter {
    fn on_start(&mut self, position: &Position) {
        self.root = Some(position.clone());
        println!("{}", render_board(position));
        println!("{}", render_metadata(position));
    }

    fn on_update(&mut self, report: &Report) {
        println!("{}", self.format_update(report));
    }

    fn on_completion(&mut self, report: &Report, best_move: Move) {
        println!();
        println!(
            "    {LABEL}{:<13}{RESET}{VALUE}{} nodes in {}{RESET}",
            "Searched:",
            format_number(report.nodes),
            format_time(report.time)
        );
        if let Some(root) = &self.root {
            if !best_move.is_none() {
                println!(
                    "    {BOLD}{LABEL}{:<13}{RESET}{BOLD}{VALUE}{}{RESET}",
                    "Best move:",
                    format_line(root, &[best_move], 1)
                );
            }
        }
        println!();
    }

    fn show_position(&mut self, position: &Position, eval: i32) {
        println!("{}", render_board(position));
        print!("{}", render_metadata(position));
        println!("    {LABEL}{:<13}{RESET}{VALUE}{}{RESET}", "Eval:", format_score(eval));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::search::MATE;

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn times_scale_units() {
        assert_eq!(format_time(850), "850ms");
        assert_eq!(format_time(4_250), "4.2s");
        assert_eq!(format_time(187_000), "3m07s");
    }

    #[test]
    fn scores_in_pawns_and_mates() {
        assert_eq!(format_score(27), "+0.27");
        assert_eq!(format_score(-150), "-1.50");
        assert_eq!(format_score(MATE - 5), "M3");
        assert_eq!(format_score(-(MATE - 2)), "M-1");
    }

    #[test]
    fn lines_carry_move_numbers() {
        let mut position = Position::startpos();
        let mut line = Vec::new();
        for text in ["e2e4", "e7e5", "g1f3"] {
            let mv = position.parse_legal_move(text).unwrap();
            position.make_move(mv);
            line.push(mv);
        }
        let root = Position::startpos();
        assert_eq!(format_line(&root, &line, 8), "1. e4 e5 2. Nf3");
        assert_eq!(format_line(&root, &line, 2), "1. e4 e5 ...");

        let black_root = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(format_line(&black_root, &line[1..2], 8), "1... e5");
    }

    #[test]
    fn board_shows_every_piece() {
        let board = render_board(&Position::startpos());
        assert_eq!(board.matches('P').count(), 8);
        assert_eq!(board.matches('k').count(), 1);
        assert!(board.contains("a   b   c"));
    }
}
