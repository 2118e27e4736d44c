use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::db::models::UserProfile;
use crate::db::now_millis;
use crate::error::AppError;

/// Partial profile write; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
}

/// Identity asserted by an external provider after a successful token exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    pub provider: String,
    pub external_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub user_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub is_friend: bool,
}

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Stored profile, or the synthetic default when the user never wrote one.
    pub async fn get_or_placeholder(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<UserProfile, AppError> {
        Ok(Self::get_by_id(pool, user_id)
            .await?
            .unwrap_or_else(|| UserProfile::placeholder(user_id)))
    }

    pub async fn upsert(
        pool: &Pool<Sqlite>,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id must not be empty".to_string()));
        }

        let now = now_millis();
        let username = update
            .username
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_string());
        let default_username = UserProfile::default_username(user_id);

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
INSERT INTO user_profiles (user_id, username, avatar, bio, status, created_at, updated_at)
VALUES (?1, COALESCE(?2, ?3), ?4, COALESCE(?5, ''), COALESCE(?6, ''), ?7, ?7)
ON CONFLICT(user_id) DO UPDATE SET
    username = COALESCE(?2, user_profiles.username),
    avatar = COALESCE(?4, user_profiles.avatar),
    bio = COALESCE(?5, user_profiles.bio),
    status = COALESCE(?6, user_profiles.status),
    updated_at = ?7
RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(default_username)
        .bind(update.avatar)
        .bind(update.bio)
        .bind(update.status)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    pub async fn get_by_external(
        pool: &Pool<Sqlite>,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE auth_provider = ? AND external_id = ?"
        )
        .bind(provider)
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Returns the profile linked to `identity`, creating one on the first exchange.
    pub async fn link_external(
        pool: &Pool<Sqlite>,
        identity: &ExternalIdentity,
    ) -> Result<UserProfile, AppError> {
        if let Some(existing) =
            Self::get_by_external(pool, &identity.provider, &identity.external_id).await?
        {
            // Keep the contact email current, the rest belongs to the user now.
            sqlx::query("UPDATE user_profiles SET email = ?, updated_at = ? WHERE user_id = ?")
                .bind(&identity.email)
                .bind(now_millis())
                .bind(&existing.user_id)
                .execute(pool)
                .await?;

            return Self::get_by_id(pool, &existing.user_id)
                .await?
                .ok_or_else(|| AppError::Internal("Linked profile vanished".to_string()));
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();
        let username = identity
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UserProfile::default_username(&user_id));

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
INSERT INTO user_profiles
    (user_id, username, avatar, bio, status, auth_provider, external_id, email, created_at, updated_at)
VALUES (?, ?, ?, '', '', ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(&username)
        .bind(&identity.avatar_url)
        .bind(&identity.provider)
        .bind(&identity.external_id)
        .bind(&identity.email)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created profile {} for {} identity", profile.user_id, identity.provider);

        Ok(profile)
    }

    /// Case-insensitive substring search on display name, excluding the caller.
    pub async fn search(
        pool: &Pool<Sqlite>,
        query: &str,
        current_user_id: &str,
    ) -> Result<Vec<SearchResult>, AppError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let rows = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, bool)>(
            r#"
SELECT p.user_id, p.username, p.avatar, p.bio,
       EXISTS (SELECT 1 FROM friends f WHERE f.user_id = ?1 AND f.friend_id = p.user_id)
FROM user_profiles p
WHERE p.user_id <> ?1 AND LOWER(p.username) LIKE ?2 ESCAPE '\'
ORDER BY p.username ASC
            "#,
        )
        .bind(current_user_id)
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, username, avatar, bio, is_friend)| SearchResult {
                user_id,
                username,
                avatar,
                bio: bio.unwrap_or_default(),
                is_friend,
            })
            .collect())
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("alice"), "alice");
    }
}
