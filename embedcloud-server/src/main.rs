use std::collections::HashMap;
use std::net::SocketAddr;
use std::process::exit;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use embedcloud_core::series::{build_series, rgb_to_hex};
use embedcloud_core::{
    compute_projection, loader, ArtifactPaths, EmbedCloudResult, ProjectionCache,
    ProjectionParams, ProjectionSource, VisualizerConfig,
};
use embedcloud_server::config::ServerConfig;
use embedcloud_server::platform::{PlatformApi, TeamFilesClient};
use embedcloud_server::state::AppState;
use embedcloud_server::{app_router, platform};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("embedcloud_server=info".parse().unwrap())
                .add_directive("embedcloud_core=info".parse().unwrap()),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "fatal error");
        exit(1);
    }
}

async fn run() -> EmbedCloudResult<()> {
    info!("Initializing EmbedCloud server...");

    let server_config = ServerConfig::from_env()?;
    let run_config = VisualizerConfig::from_env()?;
    info!(
        project_id = run_config.project_id,
        model = %run_config.model_name,
        method = %run_config.projection_method,
        metric = %run_config.metric,
        "run configuration resolved"
    );

    let client = Arc::new(
        TeamFilesClient::connect(
            server_config.api_url.clone(),
            server_config.api_token.clone(),
            run_config.team_id,
        )
        .await?,
    );
    info!(team_id = client.team_id(), "connected to platform");

    let paths = ArtifactPaths::new(
        run_config.project_id,
        &run_config.save_name(),
        run_config.projection_method,
        run_config.metric,
    );

    let (dataset, _cfg) =
        loader::load_dataset(client.as_ref(), &paths, &server_config.data_path).await?;

    let cache = ProjectionCache::new(client.clone(), &server_config.data_path);
    let params = ProjectionParams {
        metric: run_config.metric,
        umap_min_dist: run_config.umap_min_dist,
        seed: run_config.seed,
    };
    let (projections, source) = cache
        .load_or_compute(&paths, run_config.force_recalculate, || {
            compute_projection(dataset.embeddings().view(), run_config.projection_method, &params)
        })
        .await?;
    if source == ProjectionSource::Computed {
        info!(method = %run_config.projection_method, "projections computed and cached");
    }

    let class_colors = fetch_class_colors(client.as_ref(), run_config.project_id).await;
    let series = build_series(&dataset, projections.view(), &class_colors)?;
    let title = format!("{} {} projections", run_config.save_name(), run_config.projection_method);

    let records = dataset.records().to_vec();
    let state = AppState::new(title, series, records, client);
    let app = app_router(state);

    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port)
        .parse()
        .map_err(|e| {
            embedcloud_core::EmbedCloudError::Configuration(format!("invalid bind address: {}", e))
        })?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(embedcloud_core::EmbedCloudError::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(embedcloud_core::EmbedCloudError::from)?;
    Ok(())
}

/// Loads class colors from project metadata. A metadata failure only costs
/// the colors, so it is logged and the fallback palette takes over.
async fn fetch_class_colors(
    platform: &dyn PlatformApi,
    project_id: i64,
) -> HashMap<String, String> {
    match platform.get_project(project_id).await {
        Ok(project) => {
            info!(project = %project.name, classes = project.obj_classes.len(), "project metadata loaded");
            project
                .obj_classes
                .into_iter()
                .map(|class: platform::ClassColor| (class.name, rgb_to_hex(class.color)))
                .collect()
        }
        Err(e) => {
            error!(error = %e, "failed to load project metadata, using palette colors");
            HashMap::new()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>(); // On non-Unix, just wait for Ctrl+C

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
