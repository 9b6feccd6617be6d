pub mod change;
pub mod finding;
pub mod score;
pub mod tag;

pub use change::{AggregateScoresChanged, ScoreChange};
pub use finding::Finding;
pub use score::{ParseScoreError, Priority, Score, Significance};
pub use tag::TagKnownStatus;
