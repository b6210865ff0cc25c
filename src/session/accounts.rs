use crate::model::{Company, User};

use super::AuthError;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: &'static str,
}

/// Fixed set of accounts known to this build.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    /// The two partner administrator accounts.
    pub fn builtin() -> Self {
        Self {
            accounts: vec![
                Account {
                    user: User {
                        id: "1".to_string(),
                        username: "ello_admin".to_string(),
                        name: "Ello Admin".to_string(),
                        company: Company::Ello,
                    },
                    password: "stellar",
                },
                Account {
                    user: User {
                        id: "2".to_string(),
                        username: "stacia_admin".to_string(),
                        name: "Stacia Admin".to_string(),
                        company: Company::Stacia,
                    },
                    password: "stellar",
                },
            ],
        }
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        self.accounts
            .iter()
            .find(|account| account.user.username == username && account.password == password)
            .map(|account| account.user.clone())
            .ok_or(AuthError::InvalidCredentials)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.accounts.iter().map(|account| &account.user)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&User> {
        self.users().find(|user| user.id == id)
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
