//! Players, colours and the scoring rules

use std::fmt;

/// Target colours the board can light and the sensor can detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Green, Color::Blue];

    /// Wire index: RED=0, GREEN=1, BLUE=2
    pub fn index(self) -> i32 {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Blue => 2,
        }
    }

    pub fn from_index(index: i32) -> Option<Color> {
        match index {
            0 => Some(Color::Red),
            1 => Some(Color::Green),
            2 => Some(Color::Blue),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seat at the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// Number sent on the wire (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub score: u32,
    /// Most recent reaction time in milliseconds
    pub reaction_ms: u64,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: 0,
            reaction_ms: 0,
        }
    }
}

/// State of one game: the round counter and both players
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// 0 before the first round starts
    pub current_round: u8,
    pub players: [Player; 2],
}

impl Game {
    pub fn new(names: &[String; 2]) -> Self {
        Self {
            current_round: 0,
            players: [Player::new(&names[0]), Player::new(&names[1])],
        }
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        match id {
            PlayerId::One => &self.players[0],
            PlayerId::Two => &self.players[1],
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        match id {
            PlayerId::One => &mut self.players[0],
            PlayerId::Two => &mut self.players[1],
        }
    }

    pub fn award_round(&mut self, winner: PlayerId) {
        self.player_mut(winner).score += 1;
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.players[0].score, self.players[1].score)
    }

    pub fn outcome(&self) -> GameOutcome {
        let (one, two) = self.scores();
        decide_champion(one, two)
    }
}

/// Final result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Champion(PlayerId),
    Draw,
}

/// Strictly faster wins. An exact tie goes to player 2.
pub fn decide_round_winner(player1_ms: u64, player2_ms: u64) -> PlayerId {
    if player1_ms < player2_ms {
        PlayerId::One
    } else {
        PlayerId::Two
    }
}

/// Strictly higher score is champion; equal scores are a draw.
pub fn decide_champion(player1_score: u32, player2_score: u32) -> GameOutcome {
    if player1_score > player2_score {
        GameOutcome::Champion(PlayerId::One)
    } else if player2_score > player1_score {
        GameOutcome::Champion(PlayerId::Two)
    } else {
        GameOutcome::Draw
    }
}
