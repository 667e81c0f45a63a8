//! Line-based text protocol spoken with the game server
//!
//! Setup arrives once, then every tick sends an agent count followed by one
//! line per agent. Answers are one command name per line.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::agent::{Agent, Vision};
use crate::core::error::{BotError, Result};
use crate::core::types::{Cell, Command, Facing, GameSetup, Tile};

/// Name announced before the setup block
pub const BOT_NAME: &str = "Grush Crusher";

/// Pulls setup and tick blocks off a buffered input
pub struct ProtocolReader<R: BufRead> {
    input: R,
    buffer: String,
    /// Known once the setup block has been read
    board_size: Option<usize>,
}

impl<R: BufRead> ProtocolReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buffer: String::new(),
            board_size: None,
        }
    }

    /// Reject coordinates outside the announced board
    fn on_board(&self, cell: Cell, what: &str) -> Result<Cell> {
        match self.board_size {
            Some(size) if cell.row >= size || cell.col >= size => Err(BotError::Protocol(format!(
                "{} {} is outside the {}x{} board",
                what, cell, size, size
            ))),
            _ => Ok(cell),
        }
    }

    /// Next non-blank line, `None` at end of input
    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buffer.clear();
            if self.input.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            let line = self.buffer.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    fn expect_line(&mut self, what: &str) -> Result<String> {
        self.next_line()?
            .ok_or_else(|| BotError::Protocol(format!("input ended before {}", what)))
    }

    /// Read the game parameters block
    pub fn read_setup(&mut self) -> Result<GameSetup> {
        let line = self.expect_line("board size")?;
        let mut tokens = line.split_whitespace();
        let size: usize = parse_token(tokens.next(), "board size")?;
        let game_length: u64 = parse_token(tokens.next(), "game length")?;
        self.board_size = Some(size);

        let line = self.expect_line("player count")?;
        let player_count: usize = parse_token(line.split_whitespace().next(), "player count")?;

        let line = self.expect_line("base position")?;
        let my_base = self.on_board(parse_cell(&line, "base position")?, "base position")?;

        let mut enemy_bases = Vec::with_capacity(player_count.saturating_sub(1));
        for _ in 1..player_count {
            let line = self.expect_line("enemy base position")?;
            let base = parse_cell(&line, "enemy base position")?;
            enemy_bases.push(self.on_board(base, "enemy base position")?);
        }

        Ok(GameSetup::new(size, game_length, player_count, my_base).with_enemy_bases(enemy_bases))
    }

    /// Read one tick's roster, `None` once the server closes the stream
    ///
    /// All lines announced by the count are consumed before any of them is
    /// parsed, so a bad agent line never desynchronizes later ticks.
    pub fn read_tick(&mut self) -> Result<Option<Vec<Agent>>> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        let count: usize = parse_token(line.split_whitespace().next(), "agent count")?;

        let mut lines = Vec::new();
        for _ in 0..count {
            lines.push(self.expect_line("agent line")?);
        }

        lines
            .iter()
            .map(|line| {
                let agent = parse_agent(line)?;
                self.on_board(agent.cell, "agent")?;
                Ok(agent)
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| BotError::Protocol(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| BotError::Protocol(format!("invalid {}: {:?}", what, token)))
}

fn parse_cell(line: &str, what: &str) -> Result<Cell> {
    let mut tokens = line.split_whitespace();
    let row = parse_token(tokens.next(), what)?;
    let col = parse_token(tokens.next(), what)?;
    Ok(Cell::new(row, col))
}

fn parse_flag(token: Option<&str>, what: &str) -> Result<bool> {
    match token.map(|t| t.to_ascii_lowercase()) {
        None => Ok(false),
        Some(t) if t == "1" || t == "true" => Ok(true),
        Some(t) if t == "0" || t == "false" => Ok(false),
        Some(t) => Err(BotError::Protocol(format!("invalid {}: {:?}", what, t))),
    }
}

/// Parse `<row> <col> <tile> <distance> <facing> [<has_gold> <on_gold>]`
pub fn parse_agent(line: &str) -> Result<Agent> {
    let mut tokens = line.split_whitespace();
    let row = parse_token(tokens.next(), "agent row")?;
    let col = parse_token(tokens.next(), "agent col")?;

    let tile = tokens
        .next()
        .ok_or_else(|| BotError::Protocol("missing vision tile".into()))?
        .parse::<Tile>()?;
    let distance = parse_token(tokens.next(), "vision distance")?;
    let facing = tokens
        .next()
        .ok_or_else(|| BotError::Protocol("missing facing".into()))?
        .parse::<Facing>()?;

    let has_gold = parse_flag(tokens.next(), "has_gold flag")?;
    let on_gold = parse_flag(tokens.next(), "on_gold flag")?;

    if let Some(extra) = tokens.next() {
        return Err(BotError::Protocol(format!("unexpected token {:?} in agent line", extra)));
    }

    Ok(Agent::new(Cell::new(row, col), facing, Vision::new(tile, distance))
        .carrying(has_gold)
        .standing_on_gold(on_gold))
}

/// Inverse of `parse_agent`, flags always written
pub fn format_agent(agent: &Agent) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        agent.cell.row,
        agent.cell.col,
        agent.vision.tile,
        agent.vision.distance,
        agent.facing,
        u8::from(agent.has_gold),
        u8::from(agent.on_gold)
    )
}

pub fn write_name<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", BOT_NAME)?;
    out.flush()?;
    Ok(())
}

/// One command per line, flushed so the server sees the whole tick
pub fn write_commands<W: Write>(out: &mut W, commands: &[Command]) -> Result<()> {
    for command in commands {
        writeln!(out, "{}", command)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> ProtocolReader<Cursor<Vec<u8>>> {
        ProtocolReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_read_setup() {
        let mut input = reader("12 300\n3\n0 0\n11 11\n0 11\n");
        let setup = input.read_setup().unwrap();

        assert_eq!(setup.size, 12);
        assert_eq!(setup.game_length, 300);
        assert_eq!(setup.player_count, 3);
        assert_eq!(setup.my_base, Cell::new(0, 0));
        assert_eq!(setup.enemy_bases, vec![Cell::new(11, 11), Cell::new(0, 11)]);
    }

    #[test]
    fn test_read_setup_truncated() {
        let mut input = reader("12 300\n2\n0 0\n");
        assert!(matches!(input.read_setup(), Err(BotError::Protocol(_))));
    }

    #[test]
    fn test_read_setup_rejects_base_off_board() {
        let mut input = reader("5 100\n2\n5 0\n4 4\n");
        assert!(matches!(input.read_setup(), Err(BotError::Protocol(_))));

        let mut input = reader("5 100\n2\n0 0\n4 18446744073709551615\n");
        assert!(matches!(input.read_setup(), Err(BotError::Protocol(_))));
    }

    #[test]
    fn test_agent_off_board_rejected_without_desync() {
        let text = "5 100\n2\n0 0\n4 4\n\
                    2\n0 0 FOG 3 R\n18446744073709551615 2 FOG 1 D\n\
                    1\n4 4 EMPTY 0 U\n";
        let mut input = reader(text);
        input.read_setup().unwrap();

        assert!(matches!(input.read_tick(), Err(BotError::Protocol(_))));
        let agents = input.read_tick().unwrap().unwrap();
        assert_eq!(agents[0].cell, Cell::new(4, 4));
    }

    #[test]
    fn test_parse_agent_minimal() {
        let agent = parse_agent("3 4 WALL 2 R").unwrap();
        assert_eq!(agent.cell, Cell::new(3, 4));
        assert_eq!(agent.facing, Facing::Right);
        assert_eq!(agent.vision, Vision::new(Tile::Wall, 2));
        assert!(!agent.has_gold);
        assert!(!agent.on_gold);
    }

    #[test]
    fn test_parse_agent_with_flags() {
        let agent = parse_agent("0 1 my_base 5 DOWN 1 false").unwrap();
        assert_eq!(agent.vision.tile, Tile::MyBase);
        assert_eq!(agent.facing, Facing::Down);
        assert!(agent.has_gold);
        assert!(!agent.on_gold);
    }

    #[test]
    fn test_parse_agent_errors() {
        assert!(matches!(parse_agent("1 1 LAVA 2 U"), Err(BotError::InvalidTile(_))));
        assert!(matches!(parse_agent("1 1 FOG 2 X"), Err(BotError::InvalidFacing(_))));
        assert!(matches!(parse_agent("1 x FOG 2 U"), Err(BotError::Protocol(_))));
        assert!(matches!(parse_agent("1 1 FOG"), Err(BotError::Protocol(_))));
        assert!(matches!(parse_agent("1 1 FOG 2 U 1 1 9"), Err(BotError::Protocol(_))));
        assert!(matches!(parse_agent("1 1 FOG 2 U yes"), Err(BotError::Protocol(_))));
    }

    #[test]
    fn test_read_ticks_until_eof() {
        let mut input = reader("2\n0 0 FOG 3 R\n1 1 GOLD 1 D 0 0\n\n1\n2 2 ENEMY 4 L\n");
        assert_eq!(input.read_tick().unwrap().map(|a| a.len()), Some(2));
        assert_eq!(input.read_tick().unwrap().map(|a| a.len()), Some(1));
        assert!(input.read_tick().unwrap().is_none());
    }

    #[test]
    fn test_bad_agent_line_keeps_stream_aligned() {
        let mut input = reader("2\n0 0 FOG 3 R\n1 1 ??? 1 D\n1\n2 2 EMPTY 0 U\n");
        assert!(input.read_tick().is_err());
        let agents = input.read_tick().unwrap().unwrap();
        assert_eq!(agents[0].cell, Cell::new(2, 2));
    }

    #[test]
    fn test_empty_roster() {
        let mut input = reader("0\n");
        assert_eq!(input.read_tick().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_format_agent_parses_back() {
        let agent = parse_agent("5 6 ENEMY_BASE 3 L 1 1").unwrap();
        assert_eq!(format_agent(&agent), "5 6 ENEMY_BASE 3 L 1 1");
    }

    #[test]
    fn test_write_commands() {
        let mut out = Vec::new();
        write_name(&mut out).unwrap();
        write_commands(&mut out, &[Command::Go, Command::RotateBack, Command::Mine]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Grush Crusher\nGO\nBACK\nMINE\n");
    }
}
