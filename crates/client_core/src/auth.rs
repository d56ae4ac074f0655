use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use shared::{
    domain::User,
    protocol::{
        AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest,
        ResetPasswordResponse, LOGIN_PATH, REGISTER_PATH, RESET_PASSWORD_PATH,
    },
};
use storage::{SessionStore, AUTH_TOKEN_KEY, USER_KEY};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{error::ClientError, gateway::ApiGateway};

/// An authenticated identity. Token and user only ever travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        // loading until restore_session has run
        Self {
            session: None,
            loading: true,
        }
    }
}

pub struct AuthSessionManager {
    api: Arc<dyn ApiGateway>,
    store: Arc<dyn SessionStore>,
    inner: Mutex<AuthState>,
    auth_gate: Mutex<()>,
}

impl AuthSessionManager {
    pub fn new(api: Arc<dyn ApiGateway>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            inner: Mutex::new(AuthState::default()),
            auth_gate: Mutex::new(()),
        }
    }

    /// Adopts a persisted session if both keys are present. Storage problems
    /// are logged and treated as signed out.
    pub async fn restore_session(&self) {
        let _gate = self.auth_gate.lock().await;
        let restored = match self.read_persisted_session().await {
            Ok(session) => session,
            Err(err) => {
                error!("auth: failed to restore session: {err:#}");
                None
            }
        };

        let mut guard = self.inner.lock().await;
        if let Some(session) = restored {
            info!("auth: restored session for {}", session.user.email);
            guard.session = Some(session);
        }
        guard.loading = false;
    }

    async fn read_persisted_session(&self) -> anyhow::Result<Option<Session>> {
        let token = self.store.get(AUTH_TOKEN_KEY).await?;
        let user = self.store.get(USER_KEY).await?;

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                let user: User =
                    serde_json::from_str(&user).context("stored user record is not valid")?;
                Ok(Some(Session { user, token }))
            }
            (None, None) => Ok(None),
            _ => {
                warn!("auth: ignoring incomplete persisted session");
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate(LOGIN_PATH, &request).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate(REGISTER_PATH, &request).await
    }

    async fn authenticate(
        &self,
        path: &str,
        request: &impl Serialize,
    ) -> Result<User, ClientError> {
        let _gate = self.auth_gate.lock().await;

        let body = self.api.post(path, serde_json::to_value(request)?, None).await?;
        let response: AuthResponse = serde_json::from_value(body)?;
        if response.token.is_empty() {
            return Err(ClientError::Validation(
                "The server did not return a session token".into(),
            ));
        }

        self.persist(&response).await?;

        let user = response.user.clone();
        let mut guard = self.inner.lock().await;
        guard.session = Some(Session {
            user: response.user,
            token: response.token,
        });
        info!("auth: signed in as {}", user.email);
        Ok(user)
    }

    async fn persist(&self, response: &AuthResponse) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(&response.user)?;
        let written = async {
            self.store.set(AUTH_TOKEN_KEY, &response.token).await?;
            self.store.set(USER_KEY, &user_json).await
        }
        .await;

        if let Err(err) = written {
            // never leave a token without its user behind
            for key in [AUTH_TOKEN_KEY, USER_KEY] {
                if let Err(cleanup) = self.store.remove(key).await {
                    warn!("auth: failed to roll back session key {key}: {cleanup:#}");
                }
            }
            return Err(ClientError::storage(err));
        }
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<ResetPasswordResponse, ClientError> {
        if email.trim().is_empty() {
            return Err(ClientError::Validation("Email is required".into()));
        }
        let request = ResetPasswordRequest {
            email: email.trim().to_string(),
        };
        let body = self
            .api
            .post(RESET_PASSWORD_PATH, serde_json::to_value(&request)?, None)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Always succeeds; a failing store is logged.
    pub async fn logout(&self) {
        let _gate = self.auth_gate.lock().await;
        {
            let mut guard = self.inner.lock().await;
            guard.session = None;
        }
        if let Err(err) = self.store.clear().await {
            error!("auth: failed to purge persisted session: {err:#}");
        }
        info!("auth: signed out");
    }

    pub async fn snapshot(&self) -> AuthState {
        self.inner.lock().await.clone()
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.lock().await.session.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.session.is_some()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
