use tracing::info;

use crate::context::AppContext;
use crate::models::LoginRequest;

#[derive(Debug, Default)]
pub struct LoginView {
    pub username: String,
    pub password: String,
    pub busy: bool,
    pub error: Option<String>,
}

impl LoginView {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Log in and, on success, store the session and move to the dashboard
    pub async fn submit(&mut self, ctx: &mut AppContext) -> bool {
        self.error = None;
        self.busy = true;

        let req = LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        let result = ctx.api.login(&req).await;
        self.busy = false;

        match result {
            Ok(session) => {
                info!("Login succeeded for {}", session.username);
                ctx.sign_in(session);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.busy {
            "Authenticating..."
        } else {
            "Login"
        }
    }
}
