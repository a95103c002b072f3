mod ids;
mod leaderboard;
mod session;
mod user;
mod word;

pub use ids::{ParseIdError, SessionId, UserId};

pub use leaderboard::{LeaderboardEntry, WordProgress};
pub use session::{QuestionResult, QuizSession, QuizSessionError, QuizStats, QuizTotals};
pub use user::User;
pub use word::{WordError, WordPair, WordScope, normalize_key};
