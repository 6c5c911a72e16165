macro_rules! usecase {
    ($n:ident : { $( $i:tt )* } => { $( $o:tt )* }) => {
        pub mod $n {
            #[allow(unused_imports)]
            use crate::entities;

            #[::async_trait::async_trait]
            pub trait Usecase {
                async fn handle(&self, data: Input) -> crate::error::Result<Output>;
            }

            #[derive(Debug)]
            pub struct Input { $( $i )* }

            #[derive(Debug)]
            pub struct Output { $( $o )* }
        }
    };
}

pub mod comment;
pub mod idea;
pub mod user;

/// Plain-text credential. Never shows up in traces.
#[derive(Clone)]
pub struct Secret(pub String);

impl Secret {
    pub fn expose(&self) -> &str { &self.0 }
}

impl ::core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Raw `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// The public face of a user, shown next to what they wrote or mentor.
#[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: crate::entities::UserId,
    pub name: String,
    pub role: crate::entities::Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expertise: Vec<String>,
}

impl From<&crate::entities::User> for UserCard {
    fn from(u: &crate::entities::User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            role: u.role,
            avatar: u.avatar.clone(),
            university: u.university.clone(),
            department: u.department.clone(),
            expertise: u.expertise.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ::serde::Serialize)]
pub struct Pagination {
    pub current: u64,
    pub pages: u64,
    pub total: u64,
    pub limit: u64,
}

#[cfg(test)]
mod tests {
    use super::{Secret, UserCard};
    use crate::entities::fixtures::user;
    use crate::entities::Role;

    #[test]
    fn secret_is_redacted() {
        let s = Secret("password123".to_string());

        assert_eq!(format!("{:?}", s), "Secret(***)");
        assert_eq!(s.expose(), "password123");
    }

    #[test]
    fn user_card_shows_only_public_fields() {
        let mut u = user(Role::Teacher);
        u.phone = Some("+919876543210".to_string());
        u.expertise = vec!["AI/ML".to_string()];

        let json = serde_json::to_value(UserCard::from(&u)).unwrap();

        assert_eq!(json, serde_json::json!({
            "id": u.id.to_string(),
            "name": "Test User",
            "role": "teacher",
            "expertise": ["AI/ML"],
        }));
    }
}
