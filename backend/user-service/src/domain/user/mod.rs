pub mod aggregate;
pub mod commands;
pub mod events;
pub mod repository;

pub use aggregate::User;
pub use commands::{
    ChangeEmailAddress, OnChangeEmailAddress, OnRegisterWithEmail, OnRegisterWithFacebook,
    OnRegisterWithGoogle, RegisterWithEmail, RegisterWithFacebook, RegisterWithGoogle,
};
pub use events::UserEvent;
pub use repository::{InMemoryUserRepository, UserRepository};
