pub mod addressbook;
pub mod types;
pub mod vcard;

pub use addressbook::{SYSTEM_ADDRESSBOOK, filter_contacts};
pub use types::{AddressbookSearch, Card, Contact, DEFAULT_SEARCH_LIMIT, EmailEntry, PhotoRef};
pub use vcard::{parse_cards, parse_contacts, photo_data_url, sort_contacts, unfold_lines};
