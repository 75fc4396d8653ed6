use std::sync::Arc;

use axum::{
    body::StreamBody,
    extract::Path,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use hyper::{
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    http::HeaderValue,
    StatusCode,
};

use crate::{error::Error, storage::Dir};

mod archiver;
mod process;
mod relay;

pub use archiver::Archiver;
pub use process::ArchiveProcess;
pub use relay::{relay, Pacing};

pub async fn handler(
    Path(id): Path<String>,
    Extension(dir): Extension<Dir>,
    Extension(archiver): Extension<Arc<Archiver>>,
    Extension(pacing): Extension<Pacing>,
) -> Result<Response, Error> {
    let path = dir.resolve(&id).await?;
    let process = archiver.spawn(&path)?;
    log::debug!(
        "Streaming archive of {} (archiver pid {:?})",
        path.display(),
        process.id()
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (
                CONTENT_DISPOSITION,
                HeaderValue::from_static(r#"attachment; filename="archive.zip""#),
            ),
        ],
        StreamBody::new(relay(process, pacing)),
    )
        .into_response())
}

pub fn router(dir: Dir, archiver: Arc<Archiver>, pacing: Pacing) -> Router {
    Router::new()
        .route("/archive/:id/", get(handler))
        .route_layer(Extension(dir))
        .route_layer(Extension(archiver))
        .route_layer(Extension(pacing))
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        io::{Cursor, Read},
        sync::Arc,
    };

    use axum::{extract::Path, response::Response, Extension};
    use hyper::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    };
    use tempfile::TempDir;

    use super::{handler, Archiver, Pacing};
    use crate::{error::Error, storage::Dir};

    fn photos() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        let photos = root.path().join("photos");
        fs::create_dir_all(photos.join("b")).unwrap();
        fs::write(photos.join("a.txt"), "hello").unwrap();
        fs::write(photos.join("b").join("b.txt"), "world").unwrap();
        root
    }

    async fn request(root: &TempDir, id: &str, archiver: Archiver) -> Result<Response, Error> {
        handler(
            Path(id.to_owned()),
            Extension(Dir::new(root.path())),
            Extension(Arc::new(archiver)),
            Extension(Pacing::default()),
        )
        .await
    }

    fn zip_installed() -> bool {
        std::process::Command::new("zip")
            .arg("-v")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn missing_directory() {
        let root = photos();
        // A spawn attempt would surface as ArchiverSpawn instead.
        let archiver = Archiver::zip("/nonexistent/archiver");
        for id in ["does-not-exist", ".."] {
            match request(&root, id, archiver.clone()).await {
                Err(err) => assert_eq!(err.status_code(), StatusCode::NOT_FOUND),
                Ok(_) => panic!("{:?} was served", id),
            }
        }
    }

    #[tokio::test]
    async fn archiver_unavailable() {
        let root = photos();
        assert!(matches!(
            request(&root, "photos", Archiver::zip("/nonexistent/archiver")).await,
            Err(Error::ArchiverSpawn)
        ));
    }

    #[tokio::test]
    async fn headers_and_body() {
        let root = photos();
        let archiver = Archiver::new("sh", ["-c", "cat a.txt b/b.txt"]);
        let resp = request(&root, "photos", archiver).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/zip");
        assert_eq!(
            resp.headers()[CONTENT_DISPOSITION],
            r#"attachment; filename="archive.zip""#
        );
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"helloworld");
    }

    #[tokio::test]
    async fn zip_archive() {
        if !zip_installed() {
            eprintln!("zip is not installed, skipping");
            return;
        }
        let root = photos();
        let resp = request(&root, "photos", Archiver::zip("zip")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/zip");

        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
        let files = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        assert_eq!(files.len(), 2);

        for (name, expected) in [("a.txt", "hello"), ("b/b.txt", "world")] {
            let mut content = String::new();
            archive
                .by_name(name)
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, expected);
        }
    }
}
