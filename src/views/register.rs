use crate::context::AppContext;
use crate::models::RegisterRequest;
use crate::routes::Route;

pub const REGISTERED: &str = "Account created. You can login now.";

#[derive(Debug, Default)]
pub struct RegisterView {
    pub username: String,
    pub email: String,
    pub password: String,
    pub busy: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl RegisterView {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Create the account. Registering does not sign in, the user lands on the login form.
    pub async fn submit(&mut self, ctx: &mut AppContext) -> bool {
        self.error = None;
        self.message = None;
        self.busy = true;

        let req = RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        };
        let result = ctx.api.register(&req).await;
        self.busy = false;

        match result {
            Ok(_) => {
                self.message = Some(REGISTERED.to_string());
                ctx.navigate(Route::Login);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
