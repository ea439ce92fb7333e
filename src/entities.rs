//! Entity descriptors: table name, field schema and validation rules for
//! every content type managed from the back-office.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, FieldError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntityKind {
    Contact,
    User,
    Slide,
    Service,
    Work,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Contact => write!(f, "contact"),
            EntityKind::User => write!(f, "user"),
            EntityKind::Slide => write!(f, "slide"),
            EntityKind::Service => write!(f, "service"),
            EntityKind::Work => write!(f, "work"),
        }
    }
}

/// Icon tags the marketing site knows how to render.
pub const SERVICE_ICONS: &[&str] = &[
    "fa-faucet",
    "fa-fire-alt",
    "fa-bath",
    "fa-project-diagram",
    "fa-gas-pump",
    "fa-temperature-high",
    "fa-water",
];

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required,
    Optional,
    Email,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rule: Rule,
}

const fn field(name: &'static str, rule: Rule) -> FieldSpec {
    FieldSpec { name, rule }
}

#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub label: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    /// Field used to name a row in activity descriptions.
    pub caption: Option<&'static str>,
}

pub const SERVICE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Service,
    label: "Service",
    table: "services",
    fields: &[
        field("title", Rule::Required),
        field("description", Rule::Required),
        field("icon", Rule::OneOf(SERVICE_ICONS)),
    ],
    caption: Some("title"),
};

pub const SLIDE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Slide,
    label: "Slide",
    table: "slides",
    fields: &[
        field("title", Rule::Required),
        field("description", Rule::Required),
    ],
    caption: Some("title"),
};

pub const WORK: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Work,
    label: "Work",
    table: "works",
    fields: &[],
    caption: None,
};

pub const CONTACT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Contact,
    label: "Contact",
    table: "contacts",
    fields: &[
        field("phone", Rule::Required),
        field("whatsapp", Rule::Required),
        field("email", Rule::Email),
        field("address", Rule::Required),
        field("facebook", Rule::Optional),
        field("instagram", Rule::Optional),
        field("twitter", Rule::Optional),
    ],
    caption: None,
};

pub const USER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::User,
    label: "User",
    table: "users",
    fields: &[field("name", Rule::Required), field("email", Rule::Email)],
    caption: Some("email"),
};

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Field values that passed validation, in descriptor order.
/// Optional fields left blank are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields(Vec<(&'static str, Option<String>)>);

impl ValidFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, Option<String>)> {
        self.0.iter()
    }
}

impl EntityDescriptor {
    /// Checks every field and reports all offenders at once.
    pub fn check(&self, input: &HashMap<String, String>) -> std::result::Result<ValidFields, Vec<FieldError>> {
        let mut valid = Vec::with_capacity(self.fields.len());
        let mut errors = Vec::new();

        for spec in self.fields {
            let value = input
                .get(spec.name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty());

            match (spec.rule, value) {
                (Rule::Optional, v) => valid.push((spec.name, v.map(str::to_string))),
                (_, None) => errors.push(FieldError::new(spec.name, "is required")),
                (Rule::Email, Some(v)) if !is_valid_email(v) => {
                    errors.push(FieldError::new(spec.name, "is not a valid email address"))
                }
                (Rule::OneOf(allowed), Some(v)) if !allowed.iter().any(|a| *a == v) => errors.push(
                    FieldError::new(spec.name, format!("must be one of: {}", allowed.join(", "))),
                ),
                (_, Some(v)) => valid.push((spec.name, Some(v.to_string()))),
            }
        }

        if errors.is_empty() {
            Ok(ValidFields(valid))
        } else {
            Err(errors)
        }
    }

    pub fn validate(&self, input: &HashMap<String, String>) -> Result<ValidFields> {
        self.check(input).map_err(AppError::Validation)
    }

    /// The value naming a row built from `fields`, e.g. a service title.
    pub fn caption_of<'a>(&self, fields: &'a ValidFields) -> Option<&'a str> {
        self.caption.and_then(|c| fields.get(c))
    }

    /// Human-readable activity text, e.g. `Service "Kombi" created`.
    pub fn describe(&self, caption: Option<&str>, verb: &str) -> String {
        match caption {
            Some(caption) => format!("{} \"{}\" {}", self.label, caption, verb),
            None => format!("{} {}", self.label, verb),
        }
    }
}
