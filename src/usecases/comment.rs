usecase! {
    add : {
        pub user: entities::User,
        pub idea_id: entities::IdeaId,
        pub content: Option<String>,
        pub parent_comment: Option<String>,
    } => {
        pub comment: entities::Comment,
        pub author: Option<super::super::UserCard>,
    }
}

usecase! {
    gets : {
        pub viewer: Option<entities::User>,
        pub idea_id: entities::IdeaId,
        pub page: super::super::PageRequest,
        pub sort_by: Option<String>,
        pub sort_order: Option<String>,
        pub include_replies: bool,
    } => {
        pub comments: Vec<super::Listed>,
        pub pagination: super::super::Pagination,
    }
}

usecase! {
    get_replies : {
        pub viewer: Option<entities::User>,
        pub comment_id: entities::CommentId,
        pub page: super::super::PageRequest,
        pub sort_order: Option<String>,
    } => {
        pub replies: Vec<super::Listed>,
        pub pagination: super::super::Pagination,
    }
}

usecase! {
    edit : {
        pub user: entities::User,
        pub comment_id: entities::CommentId,
        pub content: Option<String>,
    } => {
        pub comment: entities::Comment,
        pub author: Option<super::super::UserCard>,
    }
}

usecase! {
    withdraw : {
        pub user: entities::User,
        pub comment_id: entities::CommentId,
    } => {
        pub comment: entities::Comment,
    }
}

usecase! {
    like : {
        pub user: entities::User,
        pub comment_id: entities::CommentId,
    } => {
        pub liked: bool,
        pub like_count: u32,
    }
}

usecase! {
    flag : {
        pub user: entities::User,
        pub comment_id: entities::CommentId,
        pub reason: Option<String>,
        pub description: Option<String>,
    } => {}
}

usecase! {
    moderate : {
        pub user: entities::User,
        pub comment_id: entities::CommentId,
        pub action: Option<String>,
        pub note: Option<String>,
    } => {
        pub comment: entities::Comment,
        pub author: Option<super::super::UserCard>,
    }
}

/// A comment as it appears in a listing, with what the viewer may do to it.
#[derive(Debug, Clone)]
pub struct Listed {
    pub comment: crate::entities::Comment,
    pub author: Option<super::UserCard>,
    /// Listed replies only.
    pub reply_count: u64,
    pub viewer: Option<ViewerFlags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ::serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerFlags {
    pub has_liked: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}
