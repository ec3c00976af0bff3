//! The authenticated user and their profile.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info};
use workit_shared::constants::KEY_SESSION_USER;
use workit_shared::types::UserId;
use workit_shared::validation::{parse_skills, require_field, validate_email};
use workit_store::User;

use crate::avatar;
use crate::error::Result;
use crate::persist::{self, SharedDatabase};

/// Read-only view of who is logged in, handed to the stores that need it.
pub trait SessionAccessor: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;
}

/// Fields accepted at sign-up. The password is checked for presence and
/// then dropped; it is never kept in memory or written to storage.
#[derive(Debug, Clone, Default)]
pub struct RegisterDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Comma-separated, as typed in the profile form.
    pub skills: Option<String>,
    pub is_freelancer: bool,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Comma-separated. A blank value clears the list.
    pub skills: Option<String>,
    pub avatar: Option<String>,
    pub is_freelancer: Option<bool>,
}

pub struct SessionStore {
    db: SharedDatabase,
    user: RwLock<Option<User>>,
    max_avatar_bytes: usize,
}

impl SessionStore {
    /// Hydrate the session from local storage.
    pub fn open(db: SharedDatabase, max_avatar_bytes: usize) -> Self {
        let user: Option<User> = persist::load_json(&db, KEY_SESSION_USER);
        match &user {
            Some(u) => debug!(user_id = %u.id, "restored session"),
            None => debug!("no stored session"),
        }

        Self {
            db,
            user: RwLock::new(user),
            max_avatar_bytes,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Start a session for `email`. Any non-blank credentials are accepted;
    /// the display name is the local part of the address.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = require_field("email", Some(email))?;
        require_field("password", Some(password))?;

        let name = email
            .split_once('@')
            .map_or(email.as_str(), |(local, _)| local)
            .to_string();

        let user = User {
            id: UserId::generate(),
            name,
            email,
            bio: None,
            location: None,
            skills: None,
            avatar: None,
            is_freelancer: false,
            created_at: Utc::now(),
        };

        self.replace(Some(user.clone()));
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Create a new account and log it in.
    pub fn register(&self, draft: RegisterDraft) -> Result<User> {
        let name = require_field("name", draft.name.as_deref())?;
        let email = validate_email(&require_field("email", draft.email.as_deref())?)?;

        let user = User {
            id: UserId::generate(),
            name,
            email,
            bio: non_blank(draft.bio),
            location: non_blank(draft.location),
            skills: draft.skills.as_deref().and_then(skill_list),
            avatar: None,
            is_freelancer: draft.is_freelancer,
            created_at: Utc::now(),
        };

        self.replace(Some(user.clone()));
        info!(user_id = %user.id, freelancer = user.is_freelancer, "registered");
        Ok(user)
    }

    pub fn logout(&self) {
        let previous = self.replace(None);
        if let Some(user) = previous {
            info!(user_id = %user.id, "logged out");
        }
    }

    /// Merge `patch` into the current profile. Returns `Ok(None)` when
    /// nobody is logged in.
    pub fn update_profile(&self, patch: ProfilePatch) -> Result<Option<User>> {
        self.merge(None, patch)
    }

    /// Decode `image` into a data URI and store it as the avatar.
    ///
    /// The avatar goes to the user who was logged in when the upload
    /// started. Returns `Ok(None)` if nobody was, or if the session changed
    /// hands while the image was decoding.
    pub async fn update_avatar(&self, image: Vec<u8>) -> Result<Option<User>> {
        let Some(owner) = self.current_user_id() else {
            return Ok(None);
        };

        let uri = avatar::to_data_uri(image, self.max_avatar_bytes).await?;

        self.merge(
            Some(&owner),
            ProfilePatch {
                avatar: Some(uri),
                ..Default::default()
            },
        )
    }

    /// Apply `patch` to the current user, provided it is `owner` when one
    /// is given.
    fn merge(&self, owner: Option<&UserId>, patch: ProfilePatch) -> Result<Option<User>> {
        let name = patch
            .name
            .as_deref()
            .map(|n| require_field("name", Some(n)))
            .transpose()?;
        let email = patch.email.as_deref().map(validate_email).transpose()?;

        let mut guard = self.write();
        let Some(user) = guard.as_mut() else {
            return Ok(None);
        };
        if owner.is_some_and(|owner| owner != &user.id) {
            debug!(user_id = %user.id, "session changed during update, dropping it");
            return Ok(None);
        }

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if patch.bio.is_some() {
            user.bio = non_blank(patch.bio);
        }
        if patch.location.is_some() {
            user.location = non_blank(patch.location);
        }
        if let Some(skills) = patch.skills.as_deref() {
            user.skills = skill_list(skills);
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(freelancer) = patch.is_freelancer {
            user.is_freelancer = freelancer;
        }

        let updated = user.clone();
        persist::save_json(&self.db, KEY_SESSION_USER, &updated);
        debug!(user_id = %updated.id, "profile updated");
        Ok(Some(updated))
    }

    fn replace(&self, user: Option<User>) -> Option<User> {
        let mut guard = self.write();
        let previous = std::mem::replace(&mut *guard, user);
        match guard.as_ref() {
            Some(user) => persist::save_json(&self.db, KEY_SESSION_USER, user),
            None => persist::remove_key(&self.db, KEY_SESSION_USER),
        }
        previous
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<User>> {
        self.user.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<User>> {
        self.user.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionAccessor for SessionStore {
    fn current_user_id(&self) -> Option<UserId> {
        self.read().as_ref().map(|u| u.id.clone())
    }
}

fn skill_list(input: &str) -> Option<Vec<String>> {
    Some(parse_skills(input)).filter(|skills| !skills.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use workit_shared::ValidationError;

    use super::*;
    use crate::error::ClientError;
    use crate::test_utils::{logged_in_session, memory_db, png_bytes, png_bytes_sized, session};

    #[test]
    fn register_logs_in_and_logout_clears_storage() {
        let db = memory_db();
        let session = session(&db);

        let user = session
            .register(RegisterDraft {
                name: Some("Jean Dupont".into()),
                email: Some("jean@x.com".into()),
                password: Some("secret".into()),
                ..Default::default()
            })
            .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.current_user_id(), Some(user.id.clone()));
        assert!(user.id.as_str().starts_with("user_"));
        assert!(persist::has_key(&db, KEY_SESSION_USER));

        session.logout();
        assert!(!session.is_authenticated());
        assert!(!persist::has_key(&db, KEY_SESSION_USER));

        // Idempotent.
        session.logout();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn password_is_never_persisted() {
        let db = memory_db();
        let session = session(&db);
        session.login("jean@x.com", "hunter2").unwrap();

        let raw = persist::lock(&db).get_item(KEY_SESSION_USER).unwrap().unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(!raw.contains("password"));
    }

    #[test]
    fn register_requires_name_and_email() {
        let session = session(&memory_db());

        let err = session
            .register(RegisterDraft {
                email: Some("jean@x.com".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::MissingField("name"))
        ));

        let err = session
            .register(RegisterDraft {
                name: Some("Jean".into()),
                email: Some("   ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::MissingField("email"))
        ));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_uses_local_part_as_name() {
        let session = session(&memory_db());
        let user = session.login("jean.dupont@x.com", "pw").unwrap();
        assert_eq!(user.name, "jean.dupont");
        assert_eq!(user.email, "jean.dupont@x.com");
    }

    #[test]
    fn login_rejects_blank_credentials() {
        let session = session(&memory_db());
        assert!(matches!(
            session.login("", "pw"),
            Err(ClientError::Validation(ValidationError::MissingField("email")))
        ));
        assert!(matches!(
            session.login("jean@x.com", " "),
            Err(ClientError::Validation(ValidationError::MissingField("password")))
        ));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn update_profile_without_user_is_noop() {
        let db = memory_db();
        let session = session(&db);

        let result = session
            .update_profile(ProfilePatch {
                name: Some("Nobody".into()),
                ..Default::default()
            })
            .unwrap();

        assert!(result.is_none());
        assert!(!persist::has_key(&db, KEY_SESSION_USER));
    }

    #[test]
    fn update_profile_merges_and_keeps_identity() {
        let db = memory_db();
        let session = logged_in_session(&db);
        let before = session.current_user().unwrap();

        let after = session
            .update_profile(ProfilePatch {
                bio: Some("Développeur fullstack".into()),
                skills: Some("Rust, React ,".into()),
                is_freelancer: Some(true),
                ..Default::default()
            })
            .unwrap()
            .unwrap();

        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.name, "Jean Dupont");
        assert_eq!(after.bio.as_deref(), Some("Développeur fullstack"));
        assert_eq!(
            after.skills,
            Some(vec!["Rust".to_string(), "React".to_string()])
        );
        assert!(after.is_freelancer);

        let reopened = SessionStore::open(db, 1024);
        assert_eq!(reopened.current_user(), Some(after));
    }

    #[test]
    fn blank_skills_clear_the_list() {
        let session = logged_in_session(&memory_db());
        session
            .update_profile(ProfilePatch {
                skills: Some("Figma".into()),
                ..Default::default()
            })
            .unwrap();

        let user = session
            .update_profile(ProfilePatch {
                skills: Some(" , ".into()),
                ..Default::default()
            })
            .unwrap()
            .unwrap();
        assert!(user.skills.is_none());
    }

    #[test]
    fn register_parses_skills_text() {
        let session = session(&memory_db());
        let user = session
            .register(RegisterDraft {
                name: Some("Amira".into()),
                email: Some("amira@x.com".into()),
                skills: Some("Logo, Branding".into()),
                is_freelancer: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            user.skills,
            Some(vec!["Logo".to_string(), "Branding".to_string()])
        );
    }

    #[test]
    fn update_profile_rejects_bad_email() {
        let session = logged_in_session(&memory_db());
        let err = session
            .update_profile(ProfilePatch {
                email: Some("not-an-email".into()),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(ValidationError::InvalidEmail(_))));
        assert_eq!(session.current_user().unwrap().email, "jean@x.com");
    }

    #[test]
    fn corrupt_stored_user_is_discarded() {
        let db = memory_db();
        persist::lock(&db)
            .set_item(KEY_SESSION_USER, "{\"id\": \"user_1\", \"name\":")
            .unwrap();

        let session = SessionStore::open(db.clone(), 1024);
        assert!(!session.is_authenticated());
        assert!(!persist::has_key(&db, KEY_SESSION_USER));
    }

    #[tokio::test]
    async fn avatar_is_stored_as_data_uri() {
        let db = memory_db();
        let session = logged_in_session(&db);

        let user = session.update_avatar(png_bytes()).await.unwrap().unwrap();
        let avatar = user.avatar.unwrap();
        assert!(avatar.starts_with("data:image/png;base64,"));

        let reopened = SessionStore::open(db, 1024);
        assert_eq!(reopened.current_user().unwrap().avatar, Some(avatar));
    }

    #[tokio::test]
    async fn unreadable_avatar_leaves_profile_unchanged() {
        let session = logged_in_session(&memory_db());

        let err = session.update_avatar(vec![1, 2, 3, 4]).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert!(session.current_user().unwrap().avatar.is_none());
    }

    #[tokio::test]
    async fn avatar_stays_with_the_uploader_when_session_changes() {
        let db = memory_db();
        let session = logged_in_session(&db);
        let uploader = session.current_user_id().unwrap();

        let upload = session.update_avatar(png_bytes_sized(512, 512));
        tokio::pin!(upload);

        // Start the decode, then switch accounts before it finishes.
        tokio::select! {
            biased;
            _ = &mut upload => panic!("decode finished before the session changed"),
            _ = std::future::ready(()) => {}
        }
        session.logout();
        let other = session.login("other@x.com", "pw").unwrap();

        assert!(upload.await.unwrap().is_none());

        let current = session.current_user().unwrap();
        assert_eq!(current.id, other.id);
        assert_ne!(current.id, uploader);
        assert!(current.avatar.is_none());

        let stored = SessionStore::open(db, 1024);
        assert!(stored.current_user().unwrap().avatar.is_none());
    }

    #[tokio::test]
    async fn avatar_without_user_is_noop() {
        let session = session(&memory_db());
        assert!(session.update_avatar(png_bytes()).await.unwrap().is_none());
    }
}
