use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

pub const FORKME_IMAGE: &str = "forkme_right_orange_ff7600.png";

/// Static files referenced by the status page template.
/// Anything else under the assets directory stays private.
pub fn asset_routes<S>(dir: impl AsRef<Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let dir = dir.as_ref();

    Router::new()
        .nest_service("/css", ServeDir::new(dir.join("css")))
        .nest_service("/js", ServeDir::new(dir.join("js")))
        .route_service(&format!("/{}", FORKME_IMAGE), ServeFile::new(dir.join(FORKME_IMAGE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn assets_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::create_dir_all(dir.path().join("js/vendor")).unwrap();
        std::fs::write(dir.path().join("css/app.css"), "body { margin: 0; }").unwrap();
        std::fs::write(dir.path().join("js/vendor/app.js"), "console.log(1);").unwrap();
        std::fs::write(dir.path().join(FORKME_IMAGE), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(dir.path().join("index.html"), "%%CONTENT%%").unwrap();
        dir
    }

    async fn get(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_serves_known_assets() {
        let dir = assets_dir();
        let app: Router = asset_routes(dir.path());

        assert_eq!(get(app.clone(), "/css/app.css").await, StatusCode::OK);
        assert_eq!(get(app.clone(), "/js/vendor/app.js").await, StatusCode::OK);
        assert_eq!(get(app, "/forkme_right_orange_ff7600.png").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_template_and_missing_files_not_served() {
        let dir = assets_dir();
        let app: Router = asset_routes(dir.path());

        assert_eq!(get(app.clone(), "/index.html").await, StatusCode::NOT_FOUND);
        assert_eq!(get(app, "/css/missing.css").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shipped_template_assets_are_served() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
        let template = std::fs::read_to_string(dir.join("index.html")).unwrap();
        assert_eq!(template.matches("%%CONTENT%%").count(), 1);

        let app: Router = asset_routes(&dir);
        for uri in ["/css/app.css", "/js/app.js", "/forkme_right_orange_ff7600.png"] {
            assert!(template.contains(uri), "template should reference {}", uri);
            assert_eq!(get(app.clone(), uri).await, StatusCode::OK, "{}", uri);
        }
    }
}
