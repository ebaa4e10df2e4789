pub mod cache;
pub mod event;
pub mod game_profile;
pub mod ledger;
pub mod mail;
pub mod r#match;
pub mod notification;
pub mod order;
pub mod permission;
pub mod reward;
pub mod team;
pub mod tournament;
pub mod user;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(uuid::Uuid::new_v4())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_hyphenated())
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map($name)
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(TournamentId);
uuid_id!(TeamId);
uuid_id!(MatchId);
uuid_id!(TransactionId);
uuid_id!(OrderId);
uuid_id!(RewardId);
uuid_id!(NotificationId);
uuid_id!(GameProfileId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;

    /// Builds a window from a 1-based page number.
    pub fn page(page: usize, limit: usize) -> Self {
        let limit = limit.clamp(1, Self::MAX_LIMIT);
        Self {
            offset: Some(page.saturating_sub(1) * limit),
            limit: Some(limit),
        }
    }

    /// No window at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Applies the window to an already sorted list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset.unwrap_or(0));
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    StorageError(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::NotFound => write!(f, "Record not found"),
            RepoError::UniqueViolation => write!(f, "Unique constraint violation"),
            RepoError::ForeignKeyViolation => write!(f, "Foreign key constraint violation"),
            RepoError::StorageError(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for RepoError {}

/// Failure of a flow that moves coins. Returned by the repository operations that
/// debit a balance under a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    InsufficientBalance,
    /// The guarded row was no longer in the expected status when the update ran.
    StaleState,
    Repo(RepoError),
}

impl From<RepoError> for LedgerError {
    fn from(e: RepoError) -> Self {
        LedgerError::Repo(e)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InsufficientBalance => write!(f, "Insufficient balance"),
            LedgerError::StaleState => write!(f, "Record changed concurrently"),
            LedgerError::Repo(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LedgerError {}
