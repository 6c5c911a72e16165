extern crate alloc;

mod auth;
mod config;
mod constructors;
mod controllers;
pub(crate) mod entities;
mod error;
pub(crate) mod interactors;
mod presenters;
pub(crate) mod repositories;
mod seed;
mod server;
pub(crate) mod usecases;
pub(crate) mod utils;

pub use auth::PasswordHasher;
pub use config::Config;
pub use constructors::*;
pub use seed::seed;
pub use server::serve;
