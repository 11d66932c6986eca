//! User profile service

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, User, UserClaims, UserShort},
    repository::Repository,
    services::media::MediaService,
};

/// Profile with the avatar display URL resolved
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub avatar_url: String,
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    media: MediaService,
}

impl UsersService {
    pub fn new(repository: Repository, media: MediaService) -> Self {
        Self { repository, media }
    }

    /// Get a profile; visibility is enforced by the caller's guard
    pub async fn get_profile(&self, user_id: i32) -> AppResult<Profile> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let avatar_url = self.media.avatar_url(user.picture_key.as_deref());
        Ok(Profile { user, avatar_url })
    }

    /// Update the caller's own profile
    pub async fn update_profile(
        &self,
        claims: &UserClaims,
        update: &UpdateProfile,
    ) -> AppResult<Profile> {
        let user = self
            .repository
            .users
            .update_profile(claims.user_id, update)
            .await?;
        let avatar_url = self.media.avatar_url(user.picture_key.as_deref());
        Ok(Profile { user, avatar_url })
    }

    /// Store a new profile picture and return its display URL
    pub async fn set_profile_picture(
        &self,
        claims: &UserClaims,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        let key = self.media.mint_key("profile_pictures", filename);
        self.media.store(&key, bytes).await?;
        self.repository.users.set_picture_key(claims.user_id, &key).await?;
        Ok(self.media.avatar_url(Some(&key)))
    }

    /// Grant the librarian role to a user
    pub async fn promote_to_librarian(&self, user_id: i32) -> AppResult<User> {
        let user = self.repository.users.promote_to_librarian(user_id).await?;
        tracing::info!("User {} promoted to librarian", user_id);
        Ok(user)
    }

    /// Users eligible for promotion
    pub async fn list_non_librarians(&self) -> AppResult<Vec<UserShort>> {
        self.repository.users.list_non_librarians().await
    }
}
