use alloc::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::validation::{Violations, BIO_MAX, NAME_MAX};
use super::*;
use crate::auth::{PasswordHasher, TokenService};
use crate::entities::{Role, User, UserId};
use crate::error::{AppError, Result};
use crate::repositories::{UserMutation, UserRepository};
use crate::usecases::user::{change_password, edit, get, login, register};
use crate::utils::{Chain, NonBlank};

const DUPLICATE_EMAIL: &str = "User already exists with this email";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct UserRegisterInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
}
#[async_trait]
impl register::Usecase for UserRegisterInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: register::Input) -> Result<register::Output> {
        tracing::trace!("input - {:?}", data);

        let register::Input {
            name,
            email,
            password,
            role,
        } = data;

        let mut v = Violations::new();
        let name = v.required(
            name.as_deref(),
            NAME_MAX,
            "Name is required",
            "Name cannot be more than 100 characters",
        );
        let email = v.email(email.as_deref());
        let password = v.password(password.as_ref().map(|p| p.expose()));
        let role = match role.non_blank() {
            None | Some("student") => Some(Role::Student),
            Some("teacher") => Some(Role::Teacher),
            Some(_) => {
                v.push("Role must be either student or teacher");
                None
            },
        };
        v.finish()?;

        let (name, email, password, role) =
            (validated(name)?, validated(email)?, validated(password)?, validated(role)?);

        match self.user_repository.find_by_email(&email).await {
            Ok(_) => return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string())),
            Err(crate::repositories::RepositoryError::NotFound) => (),
            Err(e) => return Err(user_err_fmt(e)),
        }

        let now = Utc::now();
        let new_user = User {
            id: UserId::generate(),
            name,
            email,
            password_hash: self.passwords.hash(&password).await?,
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
        };

        let can_insert = self
            .user_repository
            .insert(new_user.clone())
            .await
            .map_err(user_err_fmt)?;

        if !can_insert {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string()));
        }

        tracing::info!("registered {} as {}", new_user.id, new_user.role);

        register::Output {
            token: self.tokens.issue(new_user.id)?,
            user: new_user,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct UserLoginInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
}
#[async_trait]
impl login::Usecase for UserLoginInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: login::Input) -> Result<login::Output> {
        tracing::trace!("input - {:?}", data);

        let login::Input { email, password } = data;

        let (email, password) = match (email.non_blank(), password) {
            (Some(e), Some(p)) if !p.expose().is_empty() =>
                (e.to_lowercase(), p),
            _ =>
                return Err(AppError::BadRequest(
                    "Please provide email and password".to_string(),
                )),
        };

        let user = match self.user_repository.find_by_email(&email).await {
            Ok(u) => u,
            Err(crate::repositories::RepositoryError::NotFound) =>
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string())),
            Err(e) => return Err(user_err_fmt(e)),
        };

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        if !self
            .passwords
            .verify(password.expose(), &user.password_hash)
            .await?
        {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = self
            .user_repository
            .update(user.id, UserMutation {
                last_login: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .map_err(user_err_fmt)?;

        login::Output {
            token: self.tokens.issue(user.id)?,
            user,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct UserGetInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl get::Usecase for UserGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { user_id } = data;

        self.user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?
            .let_(|user| get::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserEditInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
}
#[async_trait]
impl edit::Usecase for UserEditInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: edit::Input) -> Result<edit::Output> {
        tracing::trace!("input - {:?}", data);

        let edit::Input { user_id, profile } = data;

        let mut v = Violations::new();
        let mutation = UserMutation {
            name: profile.name.as_deref().and_then(|n| {
                v.required(
                    Some(n),
                    NAME_MAX,
                    "Name is required",
                    "Name cannot be more than 100 characters",
                )
            }),
            student_id: profile.student_id.map(|s| s.trim().to_string()),
            university: profile.university.map(|s| s.trim().to_string()),
            department: profile.department.map(|s| s.trim().to_string()),
            year: v.year(profile.year),
            expertise: profile.expertise.map(|e| {
                e.iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            bio: v.optional(
                profile.bio.as_deref(),
                BIO_MAX,
                "Bio cannot be more than 500 characters",
            ),
            avatar: profile.avatar,
            phone: v.phone(profile.phone.as_deref()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        v.finish()?;

        self.user_repository
            .update(user_id, mutation)
            .await
            .map_err(user_err_fmt)?
            .let_(|user| edit::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserChangePasswordInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub passwords: PasswordHasher,
}
#[async_trait]
impl change_password::Usecase for UserChangePasswordInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: change_password::Input) -> Result<change_password::Output> {
        tracing::trace!("input - {:?}", data);

        let change_password::Input {
            user_id,
            current_password,
            new_password,
        } = data;

        let current = match current_password {
            Some(p) if !p.expose().is_empty() => p,
            _ =>
                return Err(AppError::BadRequest(
                    "Please provide current and new password".to_string(),
                )),
        };

        let mut v = Violations::new();
        let new_password = v.password(new_password.as_ref().map(|p| p.expose()));
        v.finish()?;
        let new_password = validated(new_password)?;

        let user = self
            .user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?;

        if !self
            .passwords
            .verify(current.expose(), &user.password_hash)
            .await?
        {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        self.user_repository
            .update(user.id, UserMutation {
                password_hash: Some(self.passwords.hash(&new_password).await?),
                updated_at: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .map_err(user_err_fmt)?;

        tracing::info!("password changed for {}", user.id);

        Ok(change_password::Output {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::mock::InMemoryRepository;
    use crate::usecases::user::ProfileEdit;
    use crate::usecases::Secret;

    fn secret(s: &str) -> Option<Secret> { Some(Secret(s.to_string())) }

    struct Fixture {
        users: Arc<InMemoryRepository<User>>,
        tokens: Arc<TokenService>,
        passwords: PasswordHasher,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                users: Arc::new(InMemoryRepository::new()),
                tokens: Arc::new(TokenService::new("test-secret", 1)),
                passwords: PasswordHasher::new(4),
            }
        }

        fn register(&self) -> UserRegisterInteractor {
            UserRegisterInteractor {
                user_repository: self.users.clone(),
                tokens: self.tokens.clone(),
                passwords: self.passwords,
            }
        }

        fn login(&self) -> UserLoginInteractor {
            UserLoginInteractor {
                user_repository: self.users.clone(),
                tokens: self.tokens.clone(),
                passwords: self.passwords,
            }
        }
    }

    fn registration(email: &str, role: Option<&str>) -> register::Input {
        register::Input {
            name: Some("Priya Sharma".to_string()),
            email: Some(email.to_string()),
            password: secret("password123"),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let f = Fixture::new();

        let registered = register::Usecase::handle(
            &f.register(),
            registration("Priya@University.edu", None),
        )
        .await
        .unwrap();
        assert_eq!(registered.user.email, "priya@university.edu");
        assert_eq!(registered.user.role, Role::Student);
        assert_ne!(registered.user.password_hash, "password123");
        assert_eq!(f.tokens.verify(&registered.token), Some(registered.user.id));

        let logged_in = login::Usecase::handle(&f.login(), login::Input {
            email: Some("priya@university.edu".to_string()),
            password: secret("password123"),
        })
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert!(logged_in.user.last_login.is_some());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let f = Fixture::new();

        register::Usecase::handle(&f.register(), registration("a@uni.edu", None))
            .await
            .unwrap();
        let err = register::Usecase::handle(&f.register(), registration("A@uni.edu", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(m) if m == DUPLICATE_EMAIL));
    }

    #[tokio::test]
    async fn admins_cannot_self_register() {
        let f = Fixture::new();

        let err = register::Usecase::handle(&f.register(), registration("a@uni.edu", Some("admin")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(m) if m == vec!["Role must be either student or teacher"]
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let f = Fixture::new();

        register::Usecase::handle(&f.register(), registration("a@uni.edu", Some("teacher")))
            .await
            .unwrap();
        let err = login::Usecase::handle(&f.login(), login::Input {
            email: Some("a@uni.edu".to_string()),
            password: secret("password124"),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(m) if m == INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn change_password_checks_current() {
        let f = Fixture::new();
        let user = register::Usecase::handle(&f.register(), registration("a@uni.edu", None))
            .await
            .unwrap()
            .user;
        let change = UserChangePasswordInteractor {
            user_repository: f.users.clone(),
            passwords: f.passwords,
        };

        let err = change_password::Usecase::handle(&change, change_password::Input {
            user_id: user.id,
            current_password: secret("nope-nope"),
            new_password: secret("brandnew1"),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        change_password::Usecase::handle(&change, change_password::Input {
            user_id: user.id,
            current_password: secret("password123"),
            new_password: secret("brandnew1"),
        })
        .await
        .unwrap();

        login::Usecase::handle(&f.login(), login::Input {
            email: Some("a@uni.edu".to_string()),
            password: secret("brandnew1"),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn deactivated_accounts_cannot_log_in() {
        let f = Fixture::new();
        let mut dormant = crate::entities::fixtures::user(Role::Student);
        dormant.password_hash = f.passwords.hash("password123").await.unwrap();
        dormant.is_active = false;
        UserRepository::insert(f.users.as_ref(), dormant.clone())
            .await
            .unwrap();

        let err = login::Usecase::handle(&f.login(), login::Input {
            email: Some(dormant.email.clone()),
            password: secret("password123"),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(m) if m == "Account is deactivated"));
    }

    #[tokio::test]
    async fn profile_edit_validates_and_applies() {
        let f = Fixture::new();
        let user = register::Usecase::handle(&f.register(), registration("a@uni.edu", None))
            .await
            .unwrap()
            .user;
        let edit = UserEditInteractor {
            user_repository: f.users.clone(),
        };

        let err = edit::Usecase::handle(&edit, edit::Input {
            user_id: user.id,
            profile: ProfileEdit {
                phone: Some("call me".to_string()),
                year: Some(9),
                ..Default::default()
            },
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(m)
                if m == vec!["Year must be between 1 and 6", "Please provide a valid phone number"]
        ));

        let edited = edit::Usecase::handle(&edit, edit::Input {
            user_id: user.id,
            profile: ProfileEdit {
                university: Some(" Tech University ".to_string()),
                year: Some(2),
                phone: Some("+919876543210".to_string()),
                ..Default::default()
            },
        })
        .await
        .unwrap()
        .user;
        assert_eq!(edited.name, "Priya Sharma");
        assert_eq!(edited.university.as_deref(), Some("Tech University"));
        assert_eq!(edited.year, Some(2));
        assert_eq!(edited.phone.as_deref(), Some("+919876543210"));
        assert_eq!(edited.email, user.email);
    }
}
