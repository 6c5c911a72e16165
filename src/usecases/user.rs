usecase! {
    register : {
        pub name: Option<String>,
        pub email: Option<String>,
        pub password: Option<super::super::Secret>,
        pub role: Option<String>,
    } => {
        pub user: entities::User,
        pub token: String,
    }
}

usecase! {
    login : {
        pub email: Option<String>,
        pub password: Option<super::super::Secret>,
    } => {
        pub user: entities::User,
        pub token: String,
    }
}

usecase! {
    get : {
        pub user_id: entities::UserId,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    edit : {
        pub user_id: entities::UserId,
        pub profile: super::ProfileEdit,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    change_password : {
        pub user_id: entities::UserId,
        pub current_password: Option<super::super::Secret>,
        pub new_password: Option<super::super::Secret>,
    } => {}
}

/// Self-editable profile fields. Email, role and password are not among them.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year: Option<i64>,
    pub expertise: Option<Vec<String>>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
}
