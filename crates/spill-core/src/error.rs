use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpillError>;

#[derive(Debug, Error)]
pub enum SpillError {
    #[error("{0}")]
    InvalidAnswer(String),

    #[error("{0}")]
    InvalidRating(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you cannot unlock your own secret")]
    SelfUnlockForbidden,

    #[error("you have already unlocked this secret")]
    AlreadyUnlocked,

    #[error("your answer must have a spiciness of at least {required} to unlock this secret")]
    InsufficientRating { required: u8 },

    #[error("you are not a member of this room")]
    NotAMember,

    #[error("you cannot rate your own secret")]
    SelfRatingForbidden,

    #[error("you must unlock this secret before rating it")]
    NotUnlocked,

    #[error("answer this question before viewing everyone's answers")]
    MustAnswerFirst,

    #[error("only the author can change this secret")]
    NotAuthor,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SpillError {
    /// Stable name of the failure kind, as sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAnswer(_) => "InvalidAnswer",
            Self::InvalidRating(_) => "InvalidRating",
            Self::NotFound(_) => "NotFound",
            Self::SelfUnlockForbidden => "SelfUnlockForbidden",
            Self::AlreadyUnlocked => "AlreadyUnlocked",
            Self::InsufficientRating { .. } => "InsufficientRating",
            Self::NotAMember => "NotAMember",
            Self::SelfRatingForbidden => "SelfRatingForbidden",
            Self::NotUnlocked => "NotUnlocked",
            Self::MustAnswerFirst => "MustAnswerFirst",
            Self::NotAuthor => "NotAuthor",
            Self::Storage(_) => "Internal",
        }
    }
}
