pub mod chat;
pub mod login;
pub mod not_found;
pub mod shared;
pub mod signup;

pub use chat::ChatView;
pub use login::LoginView;
pub use not_found::NotFoundView;
pub use signup::SignupView;
