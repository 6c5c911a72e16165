use crate::entities::{
    Category, FlagReason, ModerationAction, PrivacyLevel, RequiredHelp, Role, Status,
};

// dates are stored as fixed-width RFC 3339 strings so that they sort lexicographically

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub expertise: Vec<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub email_verified: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoVoteModel {
    pub user: String,
    pub created_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoMilestoneModel {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUpdateModel {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoIdeaModel {
    pub id: String,
    pub creator: String,
    pub title: String,
    pub problem: String,
    pub solution: String,
    pub secret_sauce: String,
    pub target_audience: String,
    pub required_help: Vec<RequiredHelp>,
    pub privacy_level: PrivacyLevel,
    pub category: Category,
    pub tags: Vec<String>,
    pub status: Status,
    pub assigned_mentor: Option<String>,
    pub mentor_assigned_at: Option<String>,
    pub upvotes: Vec<MongoVoteModel>,
    pub upvotes_size: i64,
    pub views: i64,
    pub milestones: Vec<MongoMilestoneModel>,
    pub updates: Vec<MongoUpdateModel>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub review_notes: Option<String>,
    pub is_featured: bool,
    pub featured_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoFlagModel {
    pub reporter: String,
    pub reason: FlagReason,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoCommentModel {
    pub id: String,
    pub content: String,
    pub author: String,
    pub idea: String,
    pub parent_comment: Option<String>,
    pub likes: Vec<MongoVoteModel>,
    pub likes_size: i64,
    pub is_edited: bool,
    pub edited_at: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    pub flags: Vec<MongoFlagModel>,
    pub moderated_by: Option<String>,
    pub moderation_action: ModerationAction,
    pub moderation_note: Option<String>,
    pub moderated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
