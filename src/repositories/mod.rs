use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    Category, Comment, CommentId, Date, Flag, Idea, IdeaId, Milestone, ModerationAction,
    PrivacyLevel, ProgressUpdate, RequiredHelp, Status, User, UserId,
};

pub(crate) mod mock;
pub(crate) mod mongo;

type StdResult<T, E> = ::std::result::Result<T, E>;
pub(crate) type Result<T> = ::std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository {
    /// Returns `false` when the id or the email is already taken.
    async fn insert(&self, item: User) -> Result<bool>;

    async fn find(&self, id: UserId) -> Result<User>;
    async fn find_by_email(&self, email: &str) -> Result<User>;

    async fn update(&self, id: UserId, mutation: UserMutation) -> Result<User>;

    async fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait IdeaRepository {
    async fn insert(&self, item: Idea) -> Result<bool>;

    async fn find(&self, id: IdeaId) -> Result<Idea>;
    async fn finds(&self, query: IdeaQuery, sort: IdeaSort, page: Page) -> Result<Vec<Idea>>;
    async fn count(&self, query: IdeaQuery) -> Result<u64>;

    async fn update(&self, id: IdeaId, mutation: IdeaMutation) -> Result<Idea>;
    async fn increment_views(&self, id: IdeaId) -> Result<u64>;

    /// Returns whether the upvote was added and the resulting upvote count.
    async fn toggle_upvote(&self, id: IdeaId, user: UserId, at: Date) -> Result<(bool, u32)>;

    async fn insert_milestone(&self, id: IdeaId, milestone: Milestone) -> Result<Idea>;
    async fn complete_milestone(&self, id: IdeaId, milestone_id: Uuid, at: Date) -> Result<Idea>;
    async fn insert_update(&self, id: IdeaId, update: ProgressUpdate) -> Result<Idea>;

    async fn delete(&self, id: IdeaId) -> Result<Idea>;

    async fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait CommentRepository {
    async fn insert(&self, item: Comment) -> Result<bool>;

    async fn find(&self, id: CommentId) -> Result<Comment>;
    async fn finds(&self, query: CommentQuery, sort: CommentSort, page: Page)
        -> Result<Vec<Comment>>;
    async fn count(&self, query: CommentQuery) -> Result<u64>;

    async fn update_content(&self, id: CommentId, content: String, at: Date) -> Result<Comment>;
    async fn soft_delete(&self, id: CommentId, at: Date) -> Result<Comment>;

    /// Returns whether the like was added and the resulting like count.
    async fn toggle_like(&self, id: CommentId, user: UserId, at: Date) -> Result<(bool, u32)>;

    /// Returns `false` when the reporter already flagged the comment.
    async fn insert_flag(&self, id: CommentId, flag: Flag) -> Result<bool>;
    async fn moderate(&self, id: CommentId, moderation: Moderation) -> Result<Comment>;

    /// Removes every comment of an idea, returning how many were removed.
    async fn delete_by_idea(&self, idea: IdeaId) -> Result<u64>;

    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct UserMutation {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub student_id: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub expertise: Option<Vec<String>>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub last_login: Option<Date>,
    pub updated_at: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Any,
    Public,
    PublicOr(UserId),
}

#[derive(Debug, Clone, Default)]
pub struct IdeaQuery {
    pub visibility: Visibility,
    pub creator: Option<UserId>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub featured: Option<bool>,
    /// Plain text, matched case-insensitively against title, problem, solution and tags.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Views,
    Upvotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdeaSort {
    pub key: IdeaSortKey,
    pub ascending: bool,
}

impl Default for IdeaSort {
    fn default() -> Self {
        Self {
            key: IdeaSortKey::CreatedAt,
            ascending: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdeaMutation {
    pub title: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub secret_sauce: Option<String>,
    pub target_audience: Option<String>,
    pub required_help: Option<Vec<RequiredHelp>>,
    pub privacy_level: Option<PrivacyLevel>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub status: Option<Status>,
    pub assigned_mentor: Option<UserId>,
    pub mentor_assigned_at: Option<Date>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<Date>,
    pub review_notes: Option<String>,
    pub is_featured: Option<bool>,
    pub featured_at: Option<Option<Date>>,
    pub updated_at: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentQuery {
    TopLevel,
    Of(CommentId),
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub idea: Option<IdeaId>,
    pub parent: Option<ParentQuery>,
    /// Excludes deleted and hidden comments.
    pub listed_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSortKey {
    #[default]
    CreatedAt,
    Likes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSort {
    pub key: CommentSortKey,
    pub ascending: bool,
}

impl Default for CommentSort {
    fn default() -> Self {
        Self {
            key: CommentSortKey::CreatedAt,
            ascending: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Moderation {
    pub by: UserId,
    pub action: ModerationAction,
    pub note: Option<String>,
    pub at: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    pub fn all() -> Self {
        Self {
            skip: 0,
            limit: u64::MAX,
        }
    }
}

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    NoUnique { matched: u32 },
    Internal(anyhow::Error),
}

impl ::std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "cannot find object."),
            RepositoryError::NoUnique { matched } => write!(
                f,
                "expected unique object, found non-unique objects (matched: {})",
                matched
            ),
            RepositoryError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl ::std::error::Error for RepositoryError {}
