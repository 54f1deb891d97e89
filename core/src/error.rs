use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Coordinates outside the playable field")]
    InvalidCoords,
    #[error("More fires requested than playable cells")]
    TooManyFires,
    #[error("Fire placement did not settle within the attempt ceiling")]
    PlacementFailed,
    #[error("Round already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Not enough gems for this purchase")]
    NotEnoughGems,
    #[error("No clairvoyance hints left")]
    NoHintsLeft,
}

pub type Result<T> = core::result::Result<T, GameError>;
