use string_analysis_backend::config::AppConfig;
use string_analysis_backend::db::StringStore;
use string_analysis_backend::filter::Translator;

/// Shared application state / 应用共享状态
///
/// The translator is immutable after construction, so it is shared without locking.
pub struct AppState {
    pub store: StringStore,
    pub translator: Translator,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: StringStore, translator: Translator, config: AppConfig) -> Self {
        Self {
            store,
            translator,
            config,
        }
    }
}
