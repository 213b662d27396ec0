//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use refstash_core::models::ItemSummary;
use refstash_core::proxy::ProxyScheme;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Refstash Connector API",
        description = "Local save endpoint for the Refstash browser extension"
    ),
    paths(
        handlers::save_items::save_items,
        handlers::save_snapshot::save_snapshot,
        handlers::save_page::save_page,
        handlers::import::import,
        handlers::update_session::update_session,
        handlers::detect::detect,
        handlers::translator_code::get_translator_code,
    ),
    components(schemas(
        ErrorResponse,
        ItemSummary,
        ProxyScheme,
        handlers::save_page::SavePageResponse,
        handlers::update_session::UpdateSessionResponse,
        handlers::detect::DetectedTranslatorResponse,
    )),
    tags(
        (name = "save", description = "Save pipeline endpoints"),
        (name = "import", description = "Bibliographic-format import"),
        (name = "translate", description = "Translator detection and distribution")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_spec_lists_all_connector_paths() {
        let spec = get_openapi_spec();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        for path in [
            "/connector/saveItems",
            "/connector/saveSnapshot",
            "/connector/savePage",
            "/connector/import",
            "/connector/updateSession",
            "/connector/detect",
            "/connector/getTranslatorCode",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == path),
                "missing path {}",
                path
            );
        }
    }
}
