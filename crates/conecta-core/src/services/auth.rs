//! Account and session operations against `/auth/*`.

use tracing::{debug, info, warn};

use crate::api::{path_id, ApiClient, ApiError, ApiRequest};
use crate::auth::SessionStore;
use crate::models::{
    AuthPayload, AuthResponse, Credentials, NewAccount, PasswordChange, ProfileUpdate, User,
    UserUpdate,
};

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn persist(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        self.api
            .session_store()
            .save(&auth.access_token, auth.refresh_token.as_deref(), &auth.user)?;
        Ok(())
    }

    /// Sign in and cache the resulting session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("/auth/login")
            .json(&Credentials { email, password })?
            .auth_entry();
        let payload: AuthPayload = self.api.send(request).await?;

        let auth = payload.into_response().ok_or_else(|| {
            ApiError::InvalidResponse("login response is missing accessToken or user".to_string())
        })?;
        self.persist(&auth)?;
        info!(user_id = %auth.user.id, role = %auth.user.role, "Signed in");
        Ok(auth)
    }

    /// Create an account.
    ///
    /// With `persist_session`, a response carrying tokens signs the new user
    /// in. Admins registering someone else pass `false` so their own session
    /// is left alone.
    pub async fn register(
        &self,
        account: &NewAccount,
        persist_session: bool,
    ) -> Result<AuthPayload, ApiError> {
        let request = ApiRequest::post("/auth/register").json(account)?.auth_entry();
        let payload: AuthPayload = self.api.send(request).await?;

        if persist_session {
            if let Some(auth) = payload.clone().into_response() {
                self.persist(&auth)?;
                info!(user_id = %auth.user.id, "Registered and signed in");
            } else {
                debug!("Registration returned no session; separate login required");
            }
        }
        Ok(payload)
    }

    /// Forget the cached session. Purely local.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.api.session_store().clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Cached user snapshot, regardless of token presence.
    pub fn local_user(&self) -> Option<User> {
        match self.api.session_store().load() {
            Ok(session) => session.user,
            Err(e) => {
                warn!(error = %e, "Failed to read cached user");
                None
            }
        }
    }

    /// Cached user, only if a token is cached alongside it.
    pub fn restore(&self) -> Option<User> {
        match self.api.session_store().load() {
            Ok(session) if session.is_authenticated() => session.user,
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to restore cached session");
                None
            }
        }
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.api.get("/auth/profile").await
    }

    /// Update the signed-in profile and replace the cached snapshot.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.api.patch("/auth/profile", update).await?;

        let store = self.api.session_store();
        let session = store.load()?;
        match session.access_token {
            Some(ref token) => store.save(token, session.refresh_token.as_deref(), &user)?,
            None => warn!("Profile updated but no cached session to refresh"),
        }
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let body = PasswordChange {
            current_password,
            new_password,
        };
        self.api
            .execute(ApiRequest::patch("/auth/change-password").json(&body)?)
            .await?;
        Ok(())
    }

    pub async fn teachers(&self) -> Result<Vec<User>, ApiError> {
        self.api.get("/auth/teachers").await
    }

    pub async fn students(&self) -> Result<Vec<User>, ApiError> {
        self.api.get("/auth/students").await
    }

    pub async fn user(&self, id: &str) -> Result<User, ApiError> {
        self.api.get(&format!("/auth/users/{}", path_id(id)?)).await
    }

    /// Admin edit of another account.
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.api.patch(&format!("/auth/users/{}", path_id(id)?), update).await
    }

    /// Delete an account. Deleting the signed-in account also ends the session.
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/auth/users/{}", path_id(id)?)).await?;

        if self.local_user().is_some_and(|u| u.id == id) {
            self.api.session_store().clear()?;
            info!(user_id = id, "Deleted own account, session cleared");
        }
        Ok(())
    }
}
