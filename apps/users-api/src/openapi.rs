use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::root::root),
    components(
        schemas(axum_helpers::ErrorResponse, crate::api::root::RootResponse)
    ),
    info(
        title = "Users API",
        version = "0.1.0",
        description = "Create, search, update and delete users"
    ),
    modifiers(&UsersApi),
    tags((name = "meta", description = "Service metadata"))
)]
pub struct ApiDoc;

/// Merges the users domain paths, which are served at the root.
struct UsersApi;

impl Modify for UsersApi {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.merge(domain_users::ApiDoc::openapi());
    }
}
