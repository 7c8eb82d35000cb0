//! Address-book use cases.
//!
//! # Invariants
//! - No two contacts share an e-mail address (compared case-insensitively).
//! - The duplicate check runs before any repository write.

use super::validation::{is_valid_email, is_valid_name, is_valid_phone};
use crate::model::contact::{Contact, ContactPatch, NewContact};
use crate::repo::contact_repo::ContactRepository;
use crate::repo::RepoError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContactServiceResult<T> = Result<T, ContactServiceError>;

#[derive(Debug)]
pub enum ContactServiceError {
    InvalidName,
    InvalidEmail,
    MissingPhone,
    DuplicateEmail(String),
    NotFound(String),
    Repo(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must be at least 2 characters"),
            Self::InvalidEmail => write!(f, "please enter a valid email address"),
            Self::MissingPhone => write!(f, "please enter a phone number"),
            Self::DuplicateEmail(email) => {
                write!(f, "a contact with email `{email}` already exists")
            }
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Contacts sharing a first letter, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactGroup {
    pub letter: char,
    pub contacts: Vec<Contact>,
}

pub struct ContactService<C: ContactRepository> {
    repo: C,
}

impl<C: ContactRepository> ContactService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub async fn add_contact(
        &self,
        input: NewContact,
        created_by: &str,
    ) -> ContactServiceResult<Contact> {
        validate_fields(&input.name, &input.email, &input.phone)?;
        self.ensure_email_free(&input.email, None).await?;
        Ok(self.repo.create_contact(input, created_by).await?)
    }

    /// Replaces name, e-mail and phone of an existing contact.
    pub async fn edit_contact(
        &self,
        id: &str,
        input: NewContact,
    ) -> ContactServiceResult<Contact> {
        validate_fields(&input.name, &input.email, &input.phone)?;
        self.ensure_email_free(&input.email, Some(id)).await?;
        let patch = ContactPatch {
            name: Some(input.name),
            email: Some(input.email.trim().to_string()),
            phone: Some(input.phone.trim().to_string()),
            ..ContactPatch::default()
        };
        self.repo
            .update_contact(id, patch)
            .await?
            .ok_or_else(|| ContactServiceError::NotFound(id.to_string()))
    }

    /// Deletes the contact and unassigns it from all tasks.
    pub async fn delete_contact(&self, id: &str) -> ContactServiceResult<bool> {
        Ok(self.repo.delete_contact(id).await?)
    }

    pub async fn list_contacts(&self) -> ContactServiceResult<Vec<Contact>> {
        Ok(self.repo.list_contacts().await?)
    }

    /// Contacts grouped by uppercased first letter, groups in letter order.
    pub async fn list_grouped(&self) -> ContactServiceResult<Vec<ContactGroup>> {
        Ok(group_by_letter(self.repo.list_contacts().await?))
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        except_id: Option<&str>,
    ) -> ContactServiceResult<()> {
        let email = email.trim().to_lowercase();
        let taken = self.repo.list_contacts().await?.into_iter().any(|contact| {
            contact.email.to_lowercase() == email && Some(contact.id.as_str()) != except_id
        });
        if taken {
            return Err(ContactServiceError::DuplicateEmail(email));
        }
        Ok(())
    }
}

fn validate_fields(name: &str, email: &str, phone: &str) -> ContactServiceResult<()> {
    if !is_valid_name(name) {
        return Err(ContactServiceError::InvalidName);
    }
    if !is_valid_email(email) {
        return Err(ContactServiceError::InvalidEmail);
    }
    if !is_valid_phone(phone) {
        return Err(ContactServiceError::MissingPhone);
    }
    Ok(())
}

fn group_by_letter(mut contacts: Vec<Contact>) -> Vec<ContactGroup> {
    contacts.sort_by_key(|contact| contact.name.to_lowercase());
    let mut groups: BTreeMap<char, Vec<Contact>> = BTreeMap::new();
    for contact in contacts {
        groups.entry(contact.group_letter()).or_default().push(contact);
    }
    groups
        .into_iter()
        .map(|(letter, contacts)| ContactGroup { letter, contacts })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::group_by_letter;
    use crate::model::contact::Contact;
    use chrono::Utc;

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@demo.com"),
            phone: "+49 1".to_string(),
            initials: String::new(),
            color: "#FF7A00".to_string(),
            user_id: None,
            created_at: Utc::now(),
            created_by: "guest".to_string(),
        }
    }

    #[test]
    fn groups_sorted_by_letter_then_name() {
        let groups = group_by_letter(vec![
            contact("c1", "Moritz Wagner"),
            contact("c2", "anja Schulz"),
            contact("c3", "Anton Mayer"),
        ]);
        let letters: Vec<char> = groups.iter().map(|group| group.letter).collect();
        assert_eq!(letters, vec!['A', 'M']);
        let names: Vec<&str> = groups[0]
            .contacts
            .iter()
            .map(|contact| contact.name.as_str())
            .collect();
        assert_eq!(names, vec!["anja Schulz", "Anton Mayer"]);
    }
}
