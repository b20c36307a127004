use super::ObjectModel;
use crate::context::ModelContext;
use crate::entity::UserEntity;
use crate::errors::{ObjectModelError, ObjectModelResult};
use remote_client::{RemoteObject, USER_CLASS};

impl<E: UserEntity> ObjectModel<E> {
    /// Create the account. Username and password must be set.
    pub async fn sign_up(&mut self) -> ObjectModelResult<&mut Self> {
        if E::CLASS_NAME != USER_CLASS {
            return Err(ObjectModelError::MalformedArgument(format!(
                "user entities must live in {}, not {}",
                USER_CLASS,
                E::CLASS_NAME
            )));
        }
        if self.id().is_some() {
            return Err(ObjectModelError::MalformedArgument(
                "cannot sign up a user that already exists".to_string(),
            ));
        }
        for key in ["username", "password"] {
            let present = self
                .attribute(key)
                .and_then(|value| value.as_str())
                .map(|value| !value.is_empty())
                .unwrap_or(false);
            if !present {
                return Err(ObjectModelError::MalformedArgument(format!(
                    "cannot sign up without a {}",
                    key
                )));
            }
        }
        self.save().await
    }

    pub async fn log_in(
        context: &ModelContext,
        username: &str,
        password: &str,
    ) -> ObjectModelResult<Self> {
        tracing::debug!(username, "Logging in");
        let json = context.store().log_in(username, password).await?;
        let object = RemoteObject::from_json(USER_CLASS, &json)?;
        Ok(Self::from_remote(object, context))
    }

    /// The user a session token belongs to
    pub async fn become_user(context: &ModelContext, session_token: &str) -> ObjectModelResult<Self> {
        let json = context.store().current_user(session_token).await?;
        let object = RemoteObject::from_json(USER_CLASS, &json)?;
        Ok(Self::from_remote(object, context))
    }

    pub fn session_token(&self) -> Option<&str> {
        self.object.session_token()
    }
}
