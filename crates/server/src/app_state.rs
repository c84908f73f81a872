use server_api::OwnerController;
use storage::Storage;

pub(crate) struct AppState {
    pub(crate) owners: OwnerController<Storage>,
}

impl AppState {
    pub(crate) fn new(storage: Storage) -> Self {
        Self {
            owners: OwnerController::new(storage),
        }
    }

    pub(crate) fn storage(&self) -> &Storage {
        self.owners.owner_service()
    }
}
