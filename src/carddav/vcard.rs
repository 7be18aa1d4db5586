//! Minimal vCard reader for the Nextcloud system address book export.
//!
//! Only the properties needed to build a [`Contact`] are looked at: UID, FN,
//! N, NICKNAME, X-DISPLAYNAME/ORG, EMAIL and PHOTO. Everything else is skipped.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use crate::carddav::types::{Card, Contact, EmailEntry, PhotoRef};

/// Scope parameter value Nextcloud uses for the federated (public) address.
pub const FEDERATED_SCOPE: &str = "v2-federated";

/// Undo RFC 6350 line folding: a line starting with a space or tab continues the previous one.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix([' ', '\t'])
            && let Some(last) = out.last_mut()
        {
            last.push_str(rest);
            continue;
        }
        if !line.trim().is_empty() {
            out.push(line.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Property {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl Property {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Split on `sep` outside double quotes.
fn split_outside_quotes(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_property(line: &str) -> Option<Property> {
    let mut in_quotes = false;
    let colon = line.char_indices().find_map(|(i, c)| match c {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ':' if !in_quotes => Some(i),
        _ => None,
    })?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut parts = split_outside_quotes(head, ';').into_iter();
    let raw_name = parts.next()?.trim();
    let name = raw_name
        .rsplit('.')
        .next()
        .unwrap_or(raw_name)
        .to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }

    let params = parts
        .filter(|p| !p.trim().is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (
                k.trim().to_ascii_uppercase(),
                v.trim().trim_matches('"').to_string(),
            ),
            // vCard 2.1 bare parameters, e.g. `PHOTO;JPEG;ENCODING=BASE64`
            None => ("TYPE".to_string(), p.trim().to_string()),
        })
        .collect();

    Some(Property {
        name,
        params,
        value: value.to_string(),
    })
}

/// Unescape a TEXT value (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a structured value on unescaped `;` and unescape each component.
fn split_components(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ';' {
            parts.push(unescape_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    parts.push(unescape_text(&current));
    parts
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn mime_for(photo: &PhotoRef) -> String {
    let declared = photo
        .mime
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    match declared {
        Some(m) if m.contains('/') => m.to_ascii_lowercase(),
        Some(m) => format!("image/{}", m.to_ascii_lowercase()),
        None => "image/jpeg".to_string(),
    }
}

/// Build a `data:` URL for a PHOTO property.
///
/// Inline base64 (`ENCODING=b` / `ENCODING=BASE64`) and `data:` URIs are
/// supported; external URIs and unknown encodings give `None`.
pub fn photo_data_url(photo: &PhotoRef) -> Option<String> {
    let compact: String = photo
        .value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }
    if compact
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
    {
        return Some(compact);
    }

    let encoding = photo.encoding.as_deref().map(str::to_ascii_lowercase);
    if !matches!(encoding.as_deref(), Some("b" | "base64")) {
        return None;
    }
    if STANDARD.decode(&compact).is_err() && STANDARD_NO_PAD.decode(&compact).is_err() {
        return None;
    }
    Some(format!("data:{};base64,{}", mime_for(photo), compact))
}

impl Card {
    fn apply(&mut self, prop: Property) {
        match prop.name.as_str() {
            "UID" => self.uid = non_empty(unescape_text(&prop.value)),
            "FN" => self.fn_name = non_empty(unescape_text(&prop.value)),
            "N" => {
                let joined = split_components(&prop.value)
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.structured_name = non_empty(joined);
            }
            "NICKNAME" => {
                self.nickname = split_outside_quotes(&prop.value, ',')
                    .into_iter()
                    .map(unescape_text)
                    .find_map(non_empty);
            }
            "X-DISPLAYNAME" => self.display_name = non_empty(unescape_text(&prop.value)),
            "ORG" if self.display_name.is_none() => {
                self.display_name = split_components(&prop.value)
                    .into_iter()
                    .find_map(non_empty);
            }
            "EMAIL" => {
                if let Some(value) = non_empty(unescape_text(&prop.value)) {
                    self.emails.push(EmailEntry {
                        value,
                        params: prop.params,
                    });
                }
            }
            "PHOTO" => {
                self.photo = Some(PhotoRef {
                    encoding: prop.param("ENCODING").map(str::to_string),
                    value_type: prop.param("VALUE").map(str::to_string),
                    mime: prop
                        .param("MEDIATYPE")
                        .or_else(|| prop.param("TYPE"))
                        .map(str::to_string),
                    value: prop.value,
                });
            }
            _ => {}
        }
    }

    /// The federated-scope address if present, else the first one.
    pub fn preferred_email(&self) -> Option<&EmailEntry> {
        self.emails
            .iter()
            .find(|e| {
                e.params
                    .iter()
                    .any(|(_, v)| v.to_ascii_lowercase().contains(FEDERATED_SCOPE))
            })
            .or_else(|| self.emails.first())
    }

    /// Fold into a [`Contact`]; cards without a UID or without an email are dropped.
    pub fn into_contact(self) -> Option<Contact> {
        let uid = self.uid.clone()?;
        let email = self.preferred_email()?.value.clone();
        let label = self
            .fn_name
            .clone()
            .or_else(|| self.structured_name.clone())
            .or_else(|| self.nickname.clone())
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| uid.clone());
        let avatar = self.photo.as_ref().and_then(photo_data_url);
        Some(Contact::new(uid, label, email, avatar))
    }
}

/// Parse every card of a vCard export.
pub fn parse_cards(text: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    let mut current: Option<Card> = None;
    for line in unfold_lines(text) {
        let Some(prop) = parse_property(&line) else {
            continue;
        };
        let is_vcard = prop.value.trim().eq_ignore_ascii_case("VCARD");
        if is_vcard && prop.name == "BEGIN" {
            current = Some(Card::default());
        } else if is_vcard && prop.name == "END" {
            cards.extend(current.take());
        } else if let Some(card) = current.as_mut() {
            card.apply(prop);
        }
    }
    cards
}

/// Sort contacts by label (case-insensitive), ties broken by id.
pub fn sort_contacts(contacts: &mut [Contact]) {
    contacts.sort_by(|a, b| {
        a.label_lower
            .cmp(&b.label_lower)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Parse an export into the sorted contact list.
pub fn parse_contacts(text: &str) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = parse_cards(text)
        .into_iter()
        .filter_map(Card::into_contact)
        .collect();
    sort_contacts(&mut contacts);
    contacts
}
