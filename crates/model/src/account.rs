use serde::{Deserialize, Serialize};
use utility::id::HasId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "uname")]
    pub username: String,
    #[serde(rename = "pword", skip_serializing)]
    pub password: String,
    pub email: String,
    #[serde(rename = "fname")]
    pub forename: String,
    #[serde(rename = "lname")]
    pub surname: String,
}

impl HasId for Account {
    type IdType = u64;
}

impl Account {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}
