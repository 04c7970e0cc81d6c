use std::sync::Arc;

use tower_cookies::Key;

use crate::app::config::Config;
use crate::app::oauth::AuthGateway;
use crate::profiles::usecase::authn::AuthnUseCase;
use crate::profiles::usecase::profile::ProfileUseCase;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub gateway: Arc<dyn AuthGateway>,
    pub profiles: ProfilesState,
}

#[derive(Clone)]
pub struct ProfilesState {
    pub authn: Arc<dyn AuthnUseCase>,
    pub profile: Arc<dyn ProfileUseCase>,
}

impl ProfilesState {
    pub fn new(authn: Arc<dyn AuthnUseCase>, profile: Arc<dyn ProfileUseCase>) -> Self {
        Self { authn, profile }
    }
}
