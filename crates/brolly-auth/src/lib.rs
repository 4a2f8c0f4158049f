pub mod google;
pub mod oauth;

pub use google::{GoogleOAuth2Provider, UserProfile};
pub use oauth::{AuthorizationRequest, OAuth2Config, OAuth2Provider, TokenSet};
