use services::OwnerService;
use shared::{
    domain::{Owner, OwnerId},
    error::{ApiError, ErrorCode},
    validation::BindingResult,
    view::{RenderContext, View, OWNER_ATTRIBUTE, SELECTIONS_ATTRIBUTE},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("owner {0} not found")]
    OwnerNotFound(OwnerId),
    #[error("owner service returned an owner without an id")]
    MissingId,
    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

impl ControllerError {
    pub fn to_api_error(&self) -> ApiError {
        match self {
            ControllerError::OwnerNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, self.to_string())
            }
            ControllerError::MissingId | ControllerError::Service(_) => {
                ApiError::new(ErrorCode::Internal, self.to_string())
            }
        }
    }
}

/// Wraps a partial last name into the pattern handed to the owner lookup.
pub fn last_name_pattern(last_name: &str) -> String {
    format!("%{last_name}%")
}

pub struct OwnerController<S> {
    owner_service: S,
}

impl<S: OwnerService> OwnerController<S> {
    pub fn new(owner_service: S) -> Self {
        Self { owner_service }
    }

    pub fn owner_service(&self) -> &S {
        &self.owner_service
    }

    pub fn init_find_form(&self, model: &mut dyn RenderContext) -> View {
        model.add_attribute(OWNER_ATTRIBUTE, Owner::default().into());
        View::FindOwners
    }

    /// Dispatches on how many owners match `owner.last_name`: none shows the
    /// search form again, one redirects to that owner, several fill
    /// `selections` and show the list.
    pub async fn process_find_form(
        &self,
        owner: &Owner,
        _result: &BindingResult,
        model: Option<&mut dyn RenderContext>,
    ) -> Result<View, ControllerError> {
        let pattern = last_name_pattern(&owner.last_name);
        let mut results = self
            .owner_service
            .find_all_by_last_name_like(&pattern)
            .await?;
        debug!(%pattern, matches = results.len(), "owner search");

        match results.len() {
            0 => Ok(View::FindOwners),
            1 => {
                let found = results.remove(0);
                let owner_id = found.id.ok_or(ControllerError::MissingId)?;
                Ok(View::RedirectToOwner(owner_id))
            }
            _ => {
                if let Some(model) = model {
                    model.add_attribute(SELECTIONS_ATTRIBUTE, results.into());
                }
                Ok(View::OwnersList)
            }
        }
    }

    pub fn init_creation_form(&self, model: &mut dyn RenderContext) -> View {
        model.add_attribute(OWNER_ATTRIBUTE, Owner::default().into());
        View::CreateOrUpdateOwnerForm
    }

    pub async fn process_creation_form(
        &self,
        owner: Owner,
        result: &BindingResult,
    ) -> Result<View, ControllerError> {
        if result.has_errors() {
            debug!(errors = result.field_errors().len(), "owner form rejected");
            return Ok(View::CreateOrUpdateOwnerForm);
        }

        let saved = self.owner_service.save(owner).await?;
        let owner_id = saved.id.ok_or(ControllerError::MissingId)?;
        info!(%owner_id, "owner created");
        Ok(View::RedirectToOwner(owner_id))
    }

    pub async fn show_owner(
        &self,
        owner_id: OwnerId,
        model: &mut dyn RenderContext,
    ) -> Result<View, ControllerError> {
        let owner = self.load_owner(owner_id).await?;
        model.add_attribute(OWNER_ATTRIBUTE, owner.into());
        Ok(View::OwnerDetails)
    }

    pub async fn init_update_owner_form(
        &self,
        owner_id: OwnerId,
        model: &mut dyn RenderContext,
    ) -> Result<View, ControllerError> {
        let owner = self.load_owner(owner_id).await?;
        model.add_attribute(OWNER_ATTRIBUTE, owner.into());
        Ok(View::CreateOrUpdateOwnerForm)
    }

    pub async fn process_update_owner_form(
        &self,
        mut owner: Owner,
        result: &BindingResult,
        owner_id: OwnerId,
    ) -> Result<View, ControllerError> {
        if result.has_errors() {
            debug!(%owner_id, errors = result.field_errors().len(), "owner form rejected");
            return Ok(View::CreateOrUpdateOwnerForm);
        }

        self.load_owner(owner_id).await?;
        owner.id = Some(owner_id);
        let saved = self.owner_service.save(owner).await?;
        let saved_id = saved.id.ok_or(ControllerError::MissingId)?;
        info!(owner_id = %saved_id, "owner updated");
        Ok(View::RedirectToOwner(saved_id))
    }

    async fn load_owner(&self, owner_id: OwnerId) -> Result<Owner, ControllerError> {
        self.owner_service
            .find_by_id(owner_id)
            .await?
            .ok_or(ControllerError::OwnerNotFound(owner_id))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
