use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

pub type Date = DateTime<Utc>;

pub const DELETED_COMMENT_CONTENT: &str = "[This comment has been deleted]";

macro_rules! id {
    ($n:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $n(pub Uuid);

        impl $n {
            pub fn generate() -> Self { Self(Uuid::new_v4()) }
        }

        impl From<Uuid> for $n {
            fn from(id: Uuid) -> Self { Self(id) }
        }

        impl ::core::str::FromStr for $n {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
        }

        impl ::core::fmt::Display for $n {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id!(UserId);
id!(IdeaId);
id!(CommentId);

/// Closed set of string labels, serialized exactly as written.
macro_rules! labelled {
    ($n:ident ($what:literal) { $( $v:ident => $l:literal ),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $n { $( $v ),* }

        impl $n {
            pub const ALL: &'static [$n] = &[ $( $n::$v ),* ];

            pub fn as_str(&self) -> &'static str {
                match self { $( $n::$v => $l ),* }
            }
        }

        impl ::core::str::FromStr for $n {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $l => Ok($n::$v), )*
                    _ => Err(format!("Invalid {}", $what)),
                }
            }
        }

        impl ::core::fmt::Display for $n {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $n {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $n {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                String::deserialize(d)?
                    .parse()
                    .map_err(::serde::de::Error::custom)
            }
        }
    };
}

labelled!(Role ("role") {
    Student => "student",
    Teacher => "teacher",
    Admin => "admin",
});

labelled!(PrivacyLevel ("privacy level") {
    Private => "private",
    Public => "public",
});

labelled!(Category ("category") {
    AiMl => "AI/ML",
    WebDevelopment => "Web Development",
    MobileApps => "Mobile Apps",
    Healthcare => "Healthcare",
    Education => "Education",
    FinTech => "Finance/FinTech",
    Sustainability => "Sustainability",
    Iot => "IoT",
    Blockchain => "Blockchain",
    Gaming => "Gaming",
    ECommerce => "E-commerce",
    SocialImpact => "Social Impact",
    Other => "Other",
});

labelled!(Status ("status") {
    Submitted => "Submitted",
    UnderReview => "Under Review",
    FeedbackReceived => "Feedback Received",
    MentorAssigned => "Mentor Assigned",
    InProgress => "In Progress",
    Completed => "Completed",
    Rejected => "Rejected",
    OnHold => "On Hold",
});

labelled!(RequiredHelp ("required help") {
    TechnicalMentorship => "Technical Mentorship",
    BusinessAdvice => "Business Advice",
    Funding => "Funding",
    Teammates => "Teammates",
    MarketingSupport => "Marketing Support",
    LegalGuidance => "Legal Guidance",
    ProductDevelopment => "Product Development",
    MarketResearch => "Market Research",
    Networking => "Networking",
    Other => "Other",
});

labelled!(FlagReason ("flag reason") {
    Spam => "spam",
    Inappropriate => "inappropriate",
    Harassment => "harassment",
    OffTopic => "off-topic",
    Other => "other",
});

labelled!(ModerationAction ("moderation action") {
    Approved => "approved",
    Hidden => "hidden",
    Deleted => "deleted",
});

impl Default for Role {
    fn default() -> Self { Role::Student }
}

impl Default for PrivacyLevel {
    fn default() -> Self { PrivacyLevel::Private }
}

impl Default for Status {
    fn default() -> Self { Status::Submitted }
}

impl Default for ModerationAction {
    fn default() -> Self { ModerationAction::Approved }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub expertise: Vec<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub email_verified: bool,
    pub last_login: Option<Date>,
    pub created_at: Date,
    pub updated_at: Date,
}

// keeps the hash out of traces
impl ::core::fmt::Debug for User {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl User {
    /// Teachers and admins review and mentor ideas.
    pub fn is_staff(&self) -> bool { matches!(self.role, Role::Teacher | Role::Admin) }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// One entry of an upvote or like set. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user: UserId,
    pub created_at: Date,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub completed: bool,
    pub completed_at: Option<Date>,
    pub created_by: UserId,
    pub created_at: Date,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: UserId,
    pub created_at: Date,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    // people are rendered by the presenters
    #[serde(skip_serializing)]
    pub creator: UserId,
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
    #[serde(skip_serializing)]
    pub assigned_mentor: Option<UserId>,
    pub mentor_assigned_at: Option<Date>,
    pub upvotes: Vec<Vote>,
    pub views: u64,
    pub milestones: Vec<Milestone>,
    pub updates: Vec<ProgressUpdate>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<Date>,
    pub review_notes: Option<String>,
    pub is_featured: bool,
    pub featured_at: Option<Date>,
    pub created_at: Date,
    pub updated_at: Date,
}

impl Idea {
    pub fn is_public(&self) -> bool { self.privacy_level == PrivacyLevel::Public }

    /// Read access to the idea and everything hanging off it (comments, replies, votes).
    pub fn can_access(&self, user: Option<&User>) -> bool {
        if self.is_public() {
            return true;
        }

        match user {
            Some(u) =>
                u.id == self.creator || self.assigned_mentor == Some(u.id) || u.is_staff(),
            None => false,
        }
    }

    /// Creator and assigned mentor may track progress.
    pub fn can_track(&self, user: &User) -> bool {
        user.id == self.creator || self.assigned_mentor == Some(user.id)
    }

    pub fn upvote_count(&self) -> u32 { self.upvotes.len() as u32 }

    pub fn has_upvoted(&self, user: UserId) -> bool { self.upvotes.iter().any(|v| v.user == user) }

    /// Returns `true` when the upvote was added, `false` when it was removed.
    pub fn toggle_upvote(&mut self, user: UserId, at: Date) -> bool {
        toggle_vote(&mut self.upvotes, user, at)
    }
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub reporter: UserId,
    pub reason: FlagReason,
    pub description: String,
    pub created_at: Date,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(skip_serializing)]
    pub author: UserId,
    pub idea: IdeaId,
    pub parent_comment: Option<CommentId>,
    pub likes: Vec<Vote>,
    pub is_edited: bool,
    pub edited_at: Option<Date>,
    pub is_deleted: bool,
    pub deleted_at: Option<Date>,
    #[serde(skip_serializing)]
    pub flags: Vec<Flag>,
    pub moderated_by: Option<UserId>,
    pub moderation_action: ModerationAction,
    pub moderation_note: Option<String>,
    pub moderated_at: Option<Date>,
    pub created_at: Date,
    pub updated_at: Date,
}

impl Comment {
    /// Shown in idea and reply listings.
    pub fn is_listed(&self) -> bool {
        !self.is_deleted && self.moderation_action != ModerationAction::Hidden
    }

    pub fn like_count(&self) -> u32 { self.likes.len() as u32 }

    pub fn has_liked(&self, user: UserId) -> bool { self.likes.iter().any(|v| v.user == user) }

    pub fn toggle_like(&mut self, user: UserId, at: Date) -> bool {
        toggle_vote(&mut self.likes, user, at)
    }

    pub fn edit(&mut self, content: String, at: Date) {
        self.content = content;
        self.is_edited = true;
        self.edited_at = Some(at);
        self.updated_at = at;
    }

    pub fn soft_delete(&mut self, at: Date) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
        self.content = DELETED_COMMENT_CONTENT.to_string();
        self.updated_at = at;
    }

    /// Returns `false` when the reporter already flagged this comment.
    pub fn add_flag(&mut self, flag: Flag) -> bool {
        if self.flags.iter().any(|f| f.reporter == flag.reporter) {
            return false;
        }

        self.flags.push(flag);
        true
    }

    pub fn can_edit(&self, user: &User) -> bool { self.author == user.id }

    pub fn can_delete(&self, user: &User) -> bool { self.author == user.id || user.is_admin() }
}

fn toggle_vote(votes: &mut Vec<Vote>, user: UserId, at: Date) -> bool {
    match votes.iter().position(|v| v.user == user) {
        Some(i) => {
            votes.remove(i);
            false
        },
        None => {
            votes.push(Vote {
                user,
                created_at: at,
            });
            true
        },
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(role: Role) -> User {
        let now = Utc::now();

        User {
            id: UserId::generate(),
            name: "Test User".to_string(),
            email: format!("{}@university.edu", Uuid::new_v4().simple()),
            password_hash: String::new(),
            role,
            student_id: None,
            university: None,
            department: None,
            year: None,
            expertise: vec![],
            bio: None,
            avatar: None,
            phone: None,
            is_active: true,
            is_verified: false,
            email_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn idea(creator: UserId, privacy_level: PrivacyLevel) -> Idea {
        let now = Utc::now();

        Idea {
            id: IdeaId::generate(),
            creator,
            title: "EcoTrack".to_string(),
            problem: "People do not know their footprint.".to_string(),
            solution: "Track it automatically.".to_string(),
            secret_sauce: "Gamification.".to_string(),
            target_audience: "Students".to_string(),
            required_help: vec![RequiredHelp::Funding],
            privacy_level,
            category: Category::Sustainability,
            tags: vec!["environment".to_string()],
            status: Status::Submitted,
            assigned_mentor: None,
            mentor_assigned_at: None,
            upvotes: vec![],
            views: 0,
            milestones: vec![],
            updates: vec![],
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            is_featured: false,
            featured_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn comment(author: UserId, idea: IdeaId, parent: Option<CommentId>) -> Comment {
        let now = Utc::now();

        Comment {
            id: CommentId::generate(),
            content: "Nice idea!".to_string(),
            author,
            idea,
            parent_comment: parent,
            likes: vec![],
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            flags: vec![],
            moderated_by: None,
            moderation_action: ModerationAction::Approved,
            moderation_note: None,
            moderated_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn private_idea_access() {
        let creator = user(Role::Student);
        let other = user(Role::Student);
        let mentor = user(Role::Student);
        let teacher = user(Role::Teacher);
        let admin = user(Role::Admin);

        let mut idea = idea(creator.id, PrivacyLevel::Private);
        idea.assigned_mentor = Some(mentor.id);

        assert!(!idea.can_access(None));
        assert!(!idea.can_access(Some(&other)));
        assert!(idea.can_access(Some(&creator)));
        assert!(idea.can_access(Some(&mentor)));
        assert!(idea.can_access(Some(&teacher)));
        assert!(idea.can_access(Some(&admin)));

        idea.privacy_level = PrivacyLevel::Public;
        assert!(idea.can_access(None));
        assert!(idea.can_access(Some(&other)));
    }

    #[test]
    fn upvote_toggles_back() {
        let voter = UserId::generate();
        let mut idea = idea(UserId::generate(), PrivacyLevel::Public);

        assert!(idea.toggle_upvote(voter, Utc::now()));
        assert!(idea.has_upvoted(voter));
        assert_eq!(idea.upvote_count(), 1);

        assert!(!idea.toggle_upvote(voter, Utc::now()));
        assert!(!idea.has_upvoted(voter));
        assert_eq!(idea.upvote_count(), 0);
    }

    #[test]
    fn soft_delete_replaces_content() {
        let mut comment = comment(UserId::generate(), IdeaId::generate(), None);
        assert!(comment.is_listed());

        comment.soft_delete(Utc::now());

        assert!(comment.is_deleted);
        assert!(comment.deleted_at.is_some());
        assert_eq!(comment.content, DELETED_COMMENT_CONTENT);
        assert!(!comment.is_listed());
    }

    #[test]
    fn hidden_comment_is_not_listed() {
        let mut comment = comment(UserId::generate(), IdeaId::generate(), None);
        comment.moderation_action = ModerationAction::Hidden;

        assert!(!comment.is_listed());
    }

    #[test]
    fn one_flag_per_reporter() {
        let reporter = UserId::generate();
        let mut comment = comment(UserId::generate(), IdeaId::generate(), None);
        let flag = Flag {
            reporter,
            reason: FlagReason::Spam,
            description: String::new(),
            created_at: Utc::now(),
        };

        assert!(comment.add_flag(flag.clone()));
        assert!(!comment.add_flag(flag));
        assert_eq!(comment.flags.len(), 1);
    }

    #[test]
    fn labels_parse_and_print() {
        assert_eq!("Finance/FinTech".parse::<Category>(), Ok(Category::FinTech));
        assert_eq!(Status::MentorAssigned.to_string(), "Mentor Assigned");
        assert_eq!("off-topic".parse::<FlagReason>(), Ok(FlagReason::OffTopic));
        assert_eq!("Cooking".parse::<Category>(), Err("Invalid category".to_string()));
        assert_eq!(Category::ALL.len(), 13);
        assert_eq!(RequiredHelp::ALL.len(), 10);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut u = user(Role::Student);
        u.password_hash = "$2b$04$secret".to_string();

        let json = serde_json::to_value(&u).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "student");
        assert_eq!(json["isActive"], true);
    }
}
