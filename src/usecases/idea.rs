usecase! {
    submit : {
        pub user: entities::User,
        pub draft: super::IdeaDraft,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    gets : {
        pub viewer: Option<entities::User>,
        pub filter: super::IdeaFilter,
        pub page: super::super::PageRequest,
    } => {
        pub ideas: Vec<(entities::Idea, super::Related)>,
        pub pagination: super::super::Pagination,
    }
}

usecase! {
    get : {
        pub viewer: Option<entities::User>,
        pub idea_id: entities::IdeaId,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
        /// `None` for anonymous viewers.
        pub has_upvoted: Option<bool>,
    }
}

usecase! {
    edit : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub draft: super::IdeaDraft,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    withdraw : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
    } => {
        pub idea: entities::Idea,
        pub comments_removed: u64,
    }
}

usecase! {
    upvote : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
    } => {
        pub upvoted: bool,
        pub upvote_count: u32,
    }
}

usecase! {
    assign_mentor : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub mentor_id: Option<String>,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    review : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub status: Option<String>,
        pub review_notes: Option<String>,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    feature : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub featured: bool,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    add_milestone : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub title: Option<String>,
        pub description: Option<String>,
        pub due_date: Option<entities::Date>,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    complete_milestone : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub milestone_id: ::uuid::Uuid,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

usecase! {
    add_update : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub title: Option<String>,
        pub content: Option<String>,
    } => {
        pub idea: entities::Idea,
        pub related: super::Related,
    }
}

/// Creator-editable idea fields, as received. On submit the text fields and the category are
/// required; on edit only the provided fields are checked and applied.
#[derive(Debug, Clone, Default)]
pub struct IdeaDraft {
    pub title: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub secret_sauce: Option<String>,
    pub target_audience: Option<String>,
    pub required_help: Option<Vec<String>>,
    pub privacy_level: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct IdeaFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    /// `private` (own ideas only) or `public`.
    pub privacy: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub featured: Option<bool>,
}

/// What responses show alongside an idea.
#[derive(Debug, Clone, Default)]
pub struct Related {
    /// `None` once the account is gone.
    pub creator: Option<super::UserCard>,
    pub mentor: Option<super::UserCard>,
    /// Listed comments and replies.
    pub comment_count: u64,
}
