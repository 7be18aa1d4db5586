use serde::{Deserialize, Serialize};

/// A system address book entry, ready for case-insensitive search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Server user id (vCard `UID`).
    pub id: String,
    pub label: String,
    pub email: String,
    pub id_lower: String,
    pub label_lower: String,
    pub email_lower: String,
    pub avatar_data_url: Option<String>,
}

impl Contact {
    pub fn new(id: String, label: String, email: String, avatar_data_url: Option<String>) -> Self {
        Self {
            id_lower: id.to_lowercase(),
            label_lower: label.to_lowercase(),
            email_lower: email.to_lowercase(),
            id,
            label,
            email,
            avatar_data_url,
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.id_lower.contains(needle_lower)
            || self.label_lower.contains(needle_lower)
            || self.email_lower.contains(needle_lower)
    }
}

/// `EMAIL` property with its parameters (`(NAME, value)`, names upper-cased).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailEntry {
    pub value: String,
    pub params: Vec<(String, String)>,
}

/// Raw `PHOTO` property as found in the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoRef {
    pub value: String,
    pub encoding: Option<String>,
    pub value_type: Option<String>,
    pub mime: Option<String>,
}

/// Accumulator for one `BEGIN:VCARD` .. `END:VCARD` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub uid: Option<String>,
    pub fn_name: Option<String>,
    pub structured_name: Option<String>,
    pub nickname: Option<String>,
    pub display_name: Option<String>,
    pub emails: Vec<EmailEntry>,
    pub photo: Option<PhotoRef>,
}

/// Query for [`crate::TalkClient::search_system_addressbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressbookSearch {
    pub search_term: String,
    /// Maximum number of hits; `0` means unlimited.
    pub limit: usize,
    pub force_refresh: bool,
}

/// Default number of search hits.
pub const DEFAULT_SEARCH_LIMIT: usize = 200;

impl Default for AddressbookSearch {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            limit: DEFAULT_SEARCH_LIMIT,
            force_refresh: false,
        }
    }
}
