#[cfg(feature = "multi-thread")]
use geoapi::config::ConfigThreads;
use geoapi::config::{parse_config, Config};
use geoapi::service::{log_response, GeoApiService, InvalidConfigError};

use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Server};
use std::convert::Infallible;
use std::sync::Arc;

async fn async_main(config: Config) -> anyhow::Result<()> {
    let host = config.host;

    simple_logger::init_with_level(config.log_level)?;

    // Opening databases reads whole files, keep it off the reactor
    let geoapi_service = tokio::task::spawn_blocking(move || -> Result<_, InvalidConfigError> {
        Ok(Arc::new(GeoApiService::from_config(config)?))
    })
    .await??;

    let make_service = make_service_fn(move |connection: &AddrStream| {
        let socket_remote_ip = connection.remote_addr().ip();
        let geoapi_service = geoapi_service.clone();
        let service = service_fn(move |request: Request<Body>| {
            let geoapi_service = geoapi_service.clone();
            async move {
                let method = request.method().clone();
                let uri = request.uri().clone();
                let response = geoapi_service.response(socket_remote_ip, request).await;
                log_response(socket_remote_ip, &method, &uri, &response);
                Ok::<_, Infallible>(response)
            }
        });
        async move { Ok::<_, Infallible>(service) }
    });

    let server = Server::try_bind(&host)?.serve(make_service);
    log::info!("listening on http://{host}");

    if let Err(e) = server.await {
        log::error!("server error: {}", e);
    }
    Err(anyhow::anyhow!("server exited"))
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "geoapi.toml".to_owned());

    let config = parse_config(&config_path)?;

    #[cfg(feature = "multi-thread")]
    let mut runtime_builder = match config.threads {
        ConfigThreads::Custom(threads) => match threads.into() {
            1 => tokio::runtime::Builder::new_current_thread(),
            threads => {
                let mut builder = tokio::runtime::Builder::new_multi_thread();
                builder.worker_threads(threads);
                builder
            }
        },
        ConfigThreads::Cores => tokio::runtime::Builder::new_multi_thread(),
    };
    #[cfg(not(feature = "multi-thread"))]
    let mut runtime_builder = tokio::runtime::Builder::new_current_thread();
    let runtime = runtime_builder.enable_all().build()?;

    runtime.block_on(async_main(config))
}
