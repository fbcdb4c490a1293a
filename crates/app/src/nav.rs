//! Page selection. Everything except the login form sits behind login.

use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Chat,
    Instructions,
    Settings,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Chat, Page::Instructions, Page::Settings];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Chat => "Chat",
            Page::Instructions => "Instructions",
            Page::Settings => "Settings",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Page::Chat => "💬",
            Page::Instructions => "📝",
            Page::Settings => "⚙",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Page(Page),
}

/// What to draw for `requested` given the session's login state.
pub fn resolve(session: &SessionContext, requested: Page) -> Screen {
    if session.authenticated {
        Screen::Page(requested)
    } else {
        Screen::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::in_memory_session;

    #[test]
    fn test_pages_gated_by_login() {
        let mut session = in_memory_session();
        for page in Page::ALL {
            assert_eq!(resolve(&session, page), Screen::Login);
        }
        session.authenticated = true;
        for page in Page::ALL {
            assert_eq!(resolve(&session, page), Screen::Page(page));
        }
    }
}
