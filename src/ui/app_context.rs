use crate::config;
use crate::screen::ScreenController;

#[derive(Clone)]
pub struct AppContext {
    pub config: config::Config,
    pub screen: ScreenController,
    pub runtime_handle: tokio::runtime::Handle,
}
