use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    extract::ConnectInfo,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router, Server,
};
use clap::Parser;

use crate::{
    archive::Archiver,
    assets::Assets,
    options::Options,
    storage::Dir,
};

mod archive;
mod assets;
mod error;
mod options;
mod storage;

macro_rules! exit_error {
    ($($arg:tt)+) => {
        {
            log::error!($($arg)+);
            std::process::exit(1)
        }
    }
}

async fn logger<B>(req: Request<B>, next: Next<B>) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_owned());
    log::info!("{} {} {}", remote, req.method(), req.uri().path());
    next.run(req).await
}

fn router(options: &Options) -> Router {
    Router::new()
        .merge(assets::router(Assets::new(&options.index)))
        .merge(archive::router(
            Dir::new(&options.root),
            Arc::new(Archiver::zip(&options.zip_program)),
            options.pacing(),
        ))
        .layer(middleware::from_fn(logger))
}

async fn check_root(path: &Path) {
    match tokio::fs::metadata(path).await {
        Ok(md) if md.is_dir() => (),
        Ok(_) => log::warn!("Source path {} is not a directory", path.display()),
        Err(err) => log::warn!("Cannot access source directory {}: {}", path.display(), err),
    }
}

#[tokio::main]
async fn main() {
    let options = Options::parse();
    env_logger::Builder::new()
        .filter_level(options.log_level())
        .init();

    check_root(&options.root).await;
    let app = router(&options);

    let address = SocketAddr::new(options.address, options.port);
    log::info!("App is running on: {}", address);
    Server::try_bind(&address)
        .unwrap_or_else(|err| exit_error!("Cannot bind {}: {}", address, err))
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .unwrap_or_else(|err| exit_error!("Server stopped: {}", err))
}
