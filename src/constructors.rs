use alloc::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::Config;
use crate::controllers::comment::CommentController;
use crate::controllers::idea::IdeaController;
use crate::controllers::user::UserController;
use crate::controllers::{AppState, RateLimiter};
use crate::entities::{Comment, Idea, User};
use crate::interactors::comment::*;
use crate::interactors::idea::*;
use crate::interactors::user::*;
use crate::interactors::Lookup;
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::mongo::{
    MongoCommentRepository, MongoIdeaRepository, MongoUserRepository,
};
use crate::repositories::{CommentRepository, IdeaRepository, UserRepository};

/// One handle per collection, shared by every interactor.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository + Sync + Send>,
    pub ideas: Arc<dyn IdeaRepository + Sync + Send>,
    pub comments: Arc<dyn CommentRepository + Sync + Send>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::new()),
            ideas: Arc::new(InMemoryRepository::<Idea>::new()),
            comments: Arc::new(InMemoryRepository::<Comment>::new()),
        }
    }

    pub async fn mongo(
        uri_str: impl AsRef<str>,
        db_name: impl AsRef<str>,
    ) -> ::anyhow::Result<Self> {
        let c = ::mongodb::Client::with_uri_str(uri_str).await?;
        let db = c.database(db_name.as_ref());

        let repos = Self {
            users: Arc::new(MongoUserRepository::new_with(&db).await?),
            ideas: Arc::new(MongoIdeaRepository::new_with(&db).await?),
            comments: Arc::new(MongoCommentRepository::new_with(&db).await?),
        };

        tracing::info!("connected to mongodb, database `{}`", db_name.as_ref());

        Ok(repos)
    }
}

pub fn app_state(repos: Repositories, config: &Config) -> Arc<AppState> {
    let Repositories {
        users,
        ideas,
        comments,
    } = repos;

    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.jwt_expire_days,
    ));
    let passwords = PasswordHasher::new(config.bcrypt_cost);
    let lookup = Lookup {
        user_repository: users.clone(),
        comment_repository: comments.clone(),
    };

    let user_controller = UserController {
        register: Arc::new(UserRegisterInteractor {
            user_repository: users.clone(),
            tokens: tokens.clone(),
            passwords,
        }),
        login: Arc::new(UserLoginInteractor {
            user_repository: users.clone(),
            tokens: tokens.clone(),
            passwords,
        }),
        get: Arc::new(UserGetInteractor {
            user_repository: users.clone(),
        }),
        edit: Arc::new(UserEditInteractor {
            user_repository: users.clone(),
        }),
        change_password: Arc::new(UserChangePasswordInteractor {
            user_repository: users.clone(),
            passwords,
        }),
    };

    let idea_controller = IdeaController {
        submit: Arc::new(IdeaSubmitInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        gets: Arc::new(IdeaGetsInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        get: Arc::new(IdeaGetInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        edit: Arc::new(IdeaEditInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        withdraw: Arc::new(IdeaWithdrawInteractor {
            idea_repository: ideas.clone(),
            comment_repository: comments.clone(),
        }),
        upvote: Arc::new(IdeaUpvoteInteractor {
            idea_repository: ideas.clone(),
        }),
        assign_mentor: Arc::new(IdeaAssignMentorInteractor {
            idea_repository: ideas.clone(),
            user_repository: users.clone(),
            lookup: lookup.clone(),
        }),
        review: Arc::new(IdeaReviewInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        feature: Arc::new(IdeaFeatureInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        add_milestone: Arc::new(IdeaAddMilestoneInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        complete_milestone: Arc::new(IdeaCompleteMilestoneInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        add_update: Arc::new(IdeaAddUpdateInteractor {
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
    };

    let comment_controller = CommentController {
        add: Arc::new(CommentAddInteractor {
            comment_repository: comments.clone(),
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        gets: Arc::new(CommentGetsInteractor {
            comment_repository: comments.clone(),
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        get_replies: Arc::new(CommentGetRepliesInteractor {
            comment_repository: comments.clone(),
            idea_repository: ideas.clone(),
            lookup: lookup.clone(),
        }),
        edit: Arc::new(CommentEditInteractor {
            comment_repository: comments.clone(),
            lookup: lookup.clone(),
        }),
        withdraw: Arc::new(CommentWithdrawInteractor {
            comment_repository: comments.clone(),
        }),
        like: Arc::new(CommentLikeInteractor {
            comment_repository: comments.clone(),
            idea_repository: ideas.clone(),
        }),
        flag: Arc::new(CommentFlagInteractor {
            comment_repository: comments.clone(),
            idea_repository: ideas,
        }),
        moderate: Arc::new(CommentModerateInteractor {
            comment_repository: comments,
            lookup,
        }),
    };

    Arc::new(AppState {
        users: user_controller,
        ideas: idea_controller,
        comments: comment_controller,
        tokens,
        user_repository: users,
        limiter: RateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        environment: config.environment.clone(),
    })
}

/// Router over fresh in-memory storage.
pub fn in_memory(config: &Config) -> ::axum::Router {
    crate::controllers::router(app_state(Repositories::in_memory(), config), config)
}

/// Router over MongoDB, creating the indexes on first use.
pub async fn mongo(config: &Config) -> ::anyhow::Result<::axum::Router> {
    let repos = Repositories::mongo(&config.mongodb_uri, &config.mongodb_db).await?;

    Ok(crate::controllers::router(app_state(repos, config), config))
}
