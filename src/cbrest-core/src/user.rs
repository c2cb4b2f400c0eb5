use crate::FormPayload;

/// Local RBAC user definition for `PUT /settings/rbac/users/local/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub password: String,
    /// Role specs such as `admin` or `bucket_admin[travel]`
    pub roles: Vec<String>,
}

impl UserSettings {
    pub fn new<I, S>(password: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            password: password.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_form(&self) -> FormPayload {
        vec![
            ("password".to_string(), self.password.clone()),
            ("roles".to_string(), self.roles.join(",")),
        ]
    }
}
