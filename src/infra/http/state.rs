use std::sync::Arc;

use crate::application::contacts::ContactService;
use crate::application::regions::RegionService;
use crate::application::repos::StoreHealth;

#[derive(Clone)]
pub struct AppState {
    pub regions: Arc<RegionService>,
    pub contacts: Arc<ContactService>,
    pub store: Arc<dyn StoreHealth>,
}
