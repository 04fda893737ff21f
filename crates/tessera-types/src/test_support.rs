//! A small hand-written message used by test suites across the workspace.

use serde::{Deserialize, Serialize};

use crate::descriptor::MessageDescriptor;
use crate::message::{Message, MessageBuilder};

static CONTACT_DESCRIPTOR: MessageDescriptor = MessageDescriptor::new("test", "Contact");
static MARKER_DESCRIPTOR: MessageDescriptor = MessageDescriptor::new("test", "Marker");

/// Address-book style record with scalar, optional, and repeated fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    name: String,
    email: Option<String>,
    age: u32,
    tags: Vec<String>,
}

impl Contact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Message for Contact {
    type Builder = ContactBuilder;

    fn descriptor() -> &'static MessageDescriptor {
        &CONTACT_DESCRIPTOR
    }

    fn mutate(&self) -> ContactBuilder {
        ContactBuilder {
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            tags: self.tags.clone(),
        }
    }
}

/// Builder for [`Contact`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactBuilder {
    name: String,
    email: Option<String>,
    age: u32,
    tags: Vec<String>,
}

impl ContactBuilder {
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    pub fn clear_email(&mut self) -> &mut Self {
        self.email = None;
        self
    }

    pub fn age(&mut self, age: u32) -> &mut Self {
        self.age = age;
        self
    }

    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tags.push(tag.into());
        self
    }

    pub fn current_name(&self) -> &str {
        &self.name
    }
}

impl MessageBuilder for ContactBuilder {
    type Message = Contact;

    fn build(&self) -> Contact {
        Contact {
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            tags: self.tags.clone(),
        }
    }
}

/// Message with no fields. Encodes to an empty binary payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker;

/// Builder for [`Marker`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkerBuilder;

impl Message for Marker {
    type Builder = MarkerBuilder;

    fn descriptor() -> &'static MessageDescriptor {
        &MARKER_DESCRIPTOR
    }

    fn mutate(&self) -> MarkerBuilder {
        MarkerBuilder
    }
}

impl MessageBuilder for MarkerBuilder {
    type Message = Marker;

    fn build(&self) -> Marker {
        Marker
    }
}

/// Shorthand for a contact with only a name and age set.
pub fn contact(name: &str, age: u32) -> Contact {
    Contact::builder().name(name).age(age).build()
}
