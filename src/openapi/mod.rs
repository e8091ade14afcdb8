use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BestOf API",
        version = "0.1.0",
        description = r#"
# BestOf storefront API

Catalog, ordering, blog and homepage content for the bilingual (en/fr) BestOf site.

## Authentication

Read endpoints for the catalog, slides and published posts are public. Everything
that writes, plus orders and the admin blog, needs an ADMIN session obtained from
`POST /api/auth/signin`, sent either as the session cookie or as a bearer token:

```
Authorization: Bearer <session-token>
```

## Error Handling

Failures share one body shape:

```json
{
  "error": "Category not found",
  "requestId": "5f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "auth", description = "Sign-in and session"),
        (name = "categories", description = "Product categories"),
        (name = "products", description = "Product catalog"),
        (name = "orders", description = "Customer orders and CSV export"),
        (name = "blog", description = "Blog posts"),
        (name = "slides", description = "Homepage carousel"),
        (name = "trusted-companies", description = "Customer logos"),
        (name = "i18n", description = "Locale and message catalogs"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::auth::sign_in,
        crate::handlers::auth::sign_out,
        crate::handlers::auth::current_session,

        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        crate::handlers::blog::list_posts,
        crate::handlers::blog::get_post,
        crate::handlers::blog::create_post,
        crate::handlers::blog::update_post,
        crate::handlers::blog::delete_post,
        crate::handlers::blog::list_published_posts,
        crate::handlers::blog::get_published_post,

        crate::handlers::slides::list_slides,
        crate::handlers::slides::get_slide,
        crate::handlers::slides::create_slide,
        crate::handlers::slides::update_slide,
        crate::handlers::slides::delete_slide,
        crate::handlers::slides::move_slide,

        crate::handlers::trusted_companies::list_trusted_companies,
        crate::handlers::trusted_companies::get_trusted_company,
        crate::handlers::trusted_companies::create_trusted_company,
        crate::handlers::trusted_companies::update_trusted_company,
        crate::handlers::trusted_companies::delete_trusted_company,

        crate::handlers::locale::get_messages,
        crate::handlers::locale::set_locale,

        crate::health::health_check,
        crate::health::readiness_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::SuccessResponse,
            crate::entities::order::OrderStatus,
            crate::entities::user::UserRole,
            crate::i18n::Locale,
            crate::services::blog::PostAuthor,
            crate::services::slides::MoveDirection,
        )
    ),
    modifiers(&SessionSecurity)
)]
pub struct ApiDoc;

/// Registers the bearer and cookie forms of the session token.
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("bestof_session"))),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        for path in [
            "/api/categories",
            "/api/products/{id}",
            "/api/orders",
            "/api/blog/{id}",
            "/api/public/blog/{slug}",
            "/api/slides/{id}/move",
            "/api/trusted-companies",
            "/api/auth/signin",
            "/health/ready",
        ] {
            assert!(json.contains(path), "missing {path}");
        }
        assert!(json.contains("Bearer"));
    }
}
