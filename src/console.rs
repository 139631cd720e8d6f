//! Line-driven terminal front end.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use knight_swap_rules::{Board, GameEvent, Position, PuzzleGame, Replay, Selection, SessionPhase};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, instrument, warn};

use crate::{Autoplay, ReplayFrame, SessionRecorder, SessionStore, SessionSummary, Stats};

/// How a cell is decorated when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// The selected knight.
    Selected,
    /// A legal destination of the selection.
    Destination,
    /// Origin of the move being shown.
    MovedFrom,
    /// Target of the move being shown.
    MovedTo,
}

/// Renders a board with row and column labels.
///
/// ```text
///     0  1  2
/// 0  B  *  B
/// 1  .  .  *
/// 2 [W] .  W
/// ```
pub fn render_board(board: &Board, marks: &[(Position, Mark)]) -> String {
    let mut out = String::from("    0  1  2\n");
    for row in 0..Board::SIZE {
        out.push_str(&format!("{} ", row));
        for col in 0..Board::SIZE {
            let Some(pos) = Position::new(row, col) else {
                continue;
            };
            let glyph = board.get(pos).side().map_or('.', |side| side.symbol());
            let mark = marks.iter().find(|(at, _)| *at == pos).map(|(_, mark)| *mark);
            let cell = match mark {
                Some(Mark::Selected) => format!("[{}]", glyph),
                Some(Mark::Destination) => " * ".to_string(),
                Some(Mark::MovedFrom) => format!("({})", glyph),
                Some(Mark::MovedTo) => format!("<{}>", glyph),
                None => format!(" {} ", glyph),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out
}

/// Renders the live game: selection in brackets, destinations as `*`.
pub fn render_game(game: &PuzzleGame) -> String {
    let mut marks = Vec::new();
    if let Selection::Selected(pos) = game.selection() {
        marks.push((pos, Mark::Selected));
        marks.extend(game.highlighted().into_iter().map(|to| (to, Mark::Destination)));
    }
    render_board(game.board(), &marks)
}

/// Renders one replay frame with its move's endpoints marked.
pub fn render_frame(frame: &ReplayFrame, last_index: i64) -> String {
    let marks = frame
        .mv
        .map(|mv| vec![(mv.from, Mark::MovedFrom), (mv.to, Mark::MovedTo)])
        .unwrap_or_default();
    let heading = match frame.mv {
        Some(mv) => format!("Move {} of {}: {}", frame.index + 1, last_index + 1, mv),
        None => format!("Initial position ({} moves)", last_index + 1),
    };
    format!("{}\n{}", heading, render_board(&frame.board, &marks))
}

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Click a cell.
    Click(Position),
    /// Abandon the current game and start over.
    Reset,
    /// Print the help text.
    Help,
    /// Leave.
    Quit,
}

/// Parses `row col`, `reset`, `help` or `quit`.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "reset" | "r" => return Ok(Input::Reset),
        "help" | "h" | "?" => return Ok(Input::Help),
        "quit" | "q" | "exit" => return Ok(Input::Quit),
        _ => {}
    }

    let mut parts = line.split(|c: char| c.is_whitespace() || c == ',').filter(|p| !p.is_empty());
    let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("Expected `row col`, got '{}'", line));
    };
    let row: usize = row.parse().map_err(|_| format!("Invalid row '{}'", row))?;
    let col: usize = col.parse().map_err(|_| format!("Invalid column '{}'", col))?;
    Position::new(row, col)
        .map(Input::Click)
        .ok_or_else(|| format!("({}, {}) is off the board", row, col))
}

const HELP: &str = "Swap the knights: white to the top corners, black to the bottom.\n\
Enter `row col` to select a knight, then `row col` of a highlighted cell to move it.\n\
`reset` abandons the game, `quit` leaves.";

/// Runs an interactive game reading commands from `input`.
///
/// Every legal move and completion is handed to a [`SessionRecorder`] over
/// `store`. Quitting or reaching end of input abandons an unfinished game.
#[instrument(skip_all)]
pub async fn play<R, W>(store: Arc<dyn SessionStore>, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let recorder = SessionRecorder::spawn(store);
    let mut game = PuzzleGame::new();
    let mut lines = input.lines();

    writeln!(out, "{}\n\n{}", HELP, render_game(&game))?;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_input(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };
        debug!(?command, "Input");

        match command {
            Input::Help => writeln!(out, "{}", HELP)?,
            Input::Quit => break,
            Input::Reset => {
                recorder.record_all(game.abandon());
                writeln!(out, "New game.\n\n{}", render_game(&game))?;
            }
            Input::Click(pos) => {
                let events = game.interact(pos);
                for event in &events {
                    if let GameEvent::SessionCompleted(done) = event {
                        writeln!(
                            out,
                            "Solved in {} moves and {} seconds!",
                            done.total_moves, done.duration_seconds
                        )?;
                    }
                }
                recorder.record_all(events);
                writeln!(out, "{}", render_game(&game))?;
                if game.phase() == SessionPhase::Won {
                    writeln!(out, "Type `reset` for a new game or `quit`.")?;
                }
            }
        }

        let status = recorder.status();
        if let Some(error) = status.last_error() {
            debug!(error = %error, failures = status.failures(), "Recorder reported failures");
        }
    }

    recorder.record_all(game.abandon());
    let status = recorder.shutdown().await;
    if let Some(error) = status.last_error() {
        warn!(error = %error, failures = status.failures(), "Some moves were not saved");
        writeln!(out, "Warning: {} write(s) failed, last: {}", status.failures(), error)?;
    }
    info!(persisted_moves = status.persisted_moves(), "Play finished");
    Ok(())
}

/// Prints every step of a stored session, or plays it back on a timer.
#[instrument(skip(store, out))]
pub async fn replay<W: Write>(
    store: Arc<dyn SessionStore>,
    id: &str,
    autoplay: Option<Duration>,
    out: &mut W,
) -> Result<()> {
    let session = store.get_session(id).await?;
    let mut cursor = Replay::new(session.into_moves());
    cursor.validate().context("Stored move log does not replay")?;
    let last_index = cursor.last_index();

    writeln!(out, "{}", render_frame(&ReplayFrame::capture(&cursor)?, last_index))?;

    match autoplay {
        Some(interval) => {
            let (player, mut frames) = Autoplay::start(cursor, interval);
            while let Some(frame) = frames.recv().await {
                writeln!(out, "{}", render_frame(&frame?, last_index))?;
            }
            player.finished().await;
        }
        None => {
            while !cursor.at_end() {
                cursor.next()?;
                writeln!(out, "{}", render_frame(&ReplayFrame::capture(&cursor)?, last_index))?;
            }
        }
    }
    Ok(())
}

/// Formats aggregate statistics.
pub fn format_stats(stats: &Stats) -> String {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    format!(
        "Games played:      {}\n\
         Wins:              {} ({:.1}%)\n\
         Average moves/win: {}\n\
         Average time/win:  {}\n\
         Best moves:        {}\n\
         Best time:         {}\n",
        stats.total_games(),
        stats.wins(),
        stats.win_rate(),
        or_dash(stats.avg_moves_to_win().map(|v| format!("{:.1}", v))),
        or_dash(stats.avg_time_to_win().map(|v| format!("{:.1}s", v))),
        or_dash(stats.best_moves().map(|v| v.to_string())),
        or_dash(stats.best_time().map(|v| format!("{}s", v))),
    )
}

/// Formats a session listing, one line per session.
pub fn format_history(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No games yet.\n".to_string();
    }
    sessions
        .iter()
        .map(|s| {
            format!(
                "{}  {}  {:<11}  {:>3} moves  {}\n",
                s.id(),
                s.started_at().format("%Y-%m-%d %H:%M:%S"),
                s.status().to_string(),
                s.total_moves(),
                s.duration_seconds().map_or_else(|| "-".to_string(), |d| format!("{}s", d)),
            )
        })
        .collect()
}
