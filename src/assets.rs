use std::path::PathBuf;

use axum::{response::Html, routing::get, Extension, Router};

use crate::error::{assets as AssetsError, Error};

/// Static pages served next to the archives. Read from disk on every request.
#[derive(Clone, Debug)]
pub struct Assets {
    index: PathBuf,
}

impl Assets {
    pub fn new<P: Into<PathBuf>>(index: P) -> Self {
        Self {
            index: index.into(),
        }
    }

    async fn index(&self) -> Result<Vec<u8>, Error> {
        tokio::fs::read(&self.index).await.map_err(|err| {
            log::error!("Cannot read index page {}: {}", self.index.display(), err);
            AssetsError::IndexUnavailable
        })
    }
}

pub async fn index_handler(Extension(assets): Extension<Assets>) -> Result<Html<Vec<u8>>, Error> {
    Ok(Html(assets.index().await?))
}

pub fn router(assets: Assets) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route_layer(Extension(assets))
}

#[cfg(test)]
mod tests {
    use axum::{response::IntoResponse, Extension};
    use hyper::{header, StatusCode};

    use super::{index_handler, Assets};
    use crate::error::Error;

    #[tokio::test]
    async fn index() {
        let dir = tempfile::tempdir().unwrap();
        let page = "<!DOCTYPE html>\n<html><body><h1>Archives</h1></body></html>\n";
        std::fs::write(dir.path().join("index.html"), page).unwrap();

        let resp = index_handler(Extension(Assets::new(dir.path().join("index.html"))))
            .await
            .unwrap()
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], page.as_bytes());
    }

    #[tokio::test]
    async fn missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = index_handler(Extension(Assets::new(dir.path().join("index.html")))).await;
        match result {
            Err(err) => {
                assert!(matches!(err, Error::IndexUnavailable));
                assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            Ok(_) => panic!("missing index page was served"),
        }
    }
}
