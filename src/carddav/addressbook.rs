use std::sync::Arc;

use hyper::Method;

use crate::carddav::types::{AddressbookSearch, Contact};
use crate::carddav::vcard::parse_contacts;
use crate::config::settings::Credentials;
use crate::error::Result;
use crate::ocs::client::{OcsRequest, endpoint};
use crate::talk::client::{TalkClient, http_error};

/// Collection name of the server-generated system address book.
pub const SYSTEM_ADDRESSBOOK: &str = "z-server-generated--system";

/// Case-insensitive substring filter over id, label and email.
///
/// Order is preserved; `limit == 0` keeps every hit.
pub fn filter_contacts(contacts: &[Contact], term: &str, limit: usize) -> Vec<Contact> {
    let needle = term.trim().to_lowercase();
    let hits = contacts
        .iter()
        .filter(|c| needle.is_empty() || c.matches(&needle))
        .cloned();
    if limit > 0 {
        hits.take(limit).collect()
    } else {
        hits.collect()
    }
}

impl TalkClient {
    /// System address book contacts, from cache when fresh.
    ///
    /// Only missing credentials are an error. A failed download is logged and
    /// answered with the last known list (possibly expired) or an empty one.
    pub async fn get_system_addressbook_contacts(
        &self,
        force: bool,
    ) -> Result<Arc<Vec<Contact>>> {
        let (creds, verbose) = self.require_credentials()?;
        let key = creds.cache_key();
        if !force && let Some(hit) = self.addressbook.get(&key) {
            return Ok(hit);
        }

        match self.fetch_system_addressbook(&creds, verbose).await {
            Ok(contacts) => {
                tracing::debug!(count = contacts.len(), "system address book fetched");
                let contacts = Arc::new(contacts);
                self.addressbook.insert(key, contacts.clone());
                Ok(contacts)
            }
            Err(e) => {
                tracing::warn!("system address book unavailable: {e}");
                Ok(self.addressbook.get_stale(&key).unwrap_or_default())
            }
        }
    }

    pub async fn search_system_addressbook(
        &self,
        query: &AddressbookSearch,
    ) -> Result<Vec<Contact>> {
        let contacts = self
            .get_system_addressbook_contacts(query.force_refresh)
            .await?;
        Ok(filter_contacts(&contacts, &query.search_term, query.limit))
    }

    async fn fetch_system_addressbook(
        &self,
        creds: &Credentials,
        verbose: bool,
    ) -> Result<Vec<Contact>> {
        let mut url = endpoint(
            &creds.base_url,
            &[
                "remote.php",
                "dav",
                "addressbooks",
                "users",
                creds.user.as_str(),
                SYSTEM_ADDRESSBOOK,
                "",
            ],
        )?;
        url.set_query(Some("export"));

        let request = OcsRequest::new(Method::GET, url)
            .auth(creds)
            .accept("text/vcard, text/directory;q=0.9, */*;q=0.5")
            .verbose(verbose);
        let resp = self.ocs.send(request).await?;
        if !resp.is_success() {
            return Err(http_error("fetch system address book", &resp));
        }
        Ok(parse_contacts(&resp.raw))
    }
}
