use crate::dashboard::model::{Role, Theme};
use std::sync::Arc;

pub type TokenGetter = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Per-session context handed to the engine at construction time.
#[derive(Clone)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub theme: Theme,
    token: TokenGetter,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            theme: Theme::default(),
            token: Arc::new(|| None),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_token_getter(
        mut self,
        getter: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.token = Arc::new(getter);
        self
    }

    /// Current auth token, fetched lazily so refreshed tokens are picked up.
    pub fn token(&self) -> Option<String> {
        (self.token)()
    }

    pub fn token_getter(&self) -> TokenGetter {
        Arc::clone(&self.token)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
