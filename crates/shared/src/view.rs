use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{Owner, OwnerId};

pub const SELECTIONS_ATTRIBUTE: &str = "selections";
pub const OWNER_ATTRIBUTE: &str = "owner";

/// Names the page (or redirect) the caller should render next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    FindOwners,
    OwnersList,
    OwnerDetails,
    CreateOrUpdateOwnerForm,
    RedirectToOwner(OwnerId),
}

impl View {
    pub fn template_name(&self) -> Option<&'static str> {
        match self {
            View::FindOwners => Some("owners/findOwners"),
            View::OwnersList => Some("owners/ownersList"),
            View::OwnerDetails => Some("owners/ownerDetails"),
            View::CreateOrUpdateOwnerForm => Some("owners/createOrUpdateOwnerForm"),
            View::RedirectToOwner(_) => None,
        }
    }

    pub fn redirect_location(&self) -> Option<String> {
        match self {
            View::RedirectToOwner(owner_id) => Some(format!("/owners/{owner_id}")),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::RedirectToOwner(owner_id) => write!(f, "redirect:/owners/{owner_id}"),
            template => f.write_str(template.template_name().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelValue {
    Owners(Vec<Owner>),
    Owner(Owner),
}

impl From<Owner> for ModelValue {
    fn from(value: Owner) -> Self {
        ModelValue::Owner(value)
    }
}

impl From<Vec<Owner>> for ModelValue {
    fn from(value: Vec<Owner>) -> Self {
        ModelValue::Owners(value)
    }
}

/// Sink for attributes a view needs in order to render.
pub trait RenderContext: Send {
    fn add_attribute(&mut self, name: &str, value: ModelValue);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model {
    attributes: BTreeMap<String, ModelValue>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl RenderContext for Model {
    fn add_attribute(&mut self, name: &str, value: ModelValue) {
        self.attributes.insert(name.to_string(), value);
    }
}
