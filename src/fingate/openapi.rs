use crate::fingate::handlers::{self, health::Health, Message};
use crate::gate::Identity;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health::health, handlers::session::session, handlers::logout::logout),
    components(schemas(Health, Identity, Message)),
    tags(
        (name = "health", description = "Liveness of the gate and its upstream"),
        (name = "session", description = "Session credential helpers")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_paths() {
        let doc = openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/health"));
        assert!(paths.contains(&"/session"));
        assert!(paths.contains(&"/logout"));
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
    }
}
