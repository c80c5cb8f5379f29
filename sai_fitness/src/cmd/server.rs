use crate::modules::handlers::{
    admin, athlete, auth, leaderboard, liveness, notification, readiness, test,
};
use anyhow::{Context, Result};
use axum::{extract::Extension, routing, Router, Server};
use clap::Args;
use sqlx::{postgres::Postgres, Pool};
use std::{env, net::SocketAddr};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let database_url: String = env::var("DATABASE_URL").with_context(|| {
        let message = "DATABASE_URL must be configured.";
        tracing::error!(message);
        message
    })?;

    let pool: Pool<Postgres> = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .with_context(|| {
            let message = "Failed to create database connection pool.";
            tracing::error!(message);
            message
        })?;

    let app = create_router(pool);
    let port = match args.port.or_else(|| {
        env::var("PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
    }) {
        Some(port) => port,
        None => {
            tracing::warn!("API server will be launched at default port number 8000");
            8000u16
        }
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to bind server.");

    Ok(())
}

fn create_router(pool: Pool<Postgres>) -> Router {
    Router::new()
        .route("/api/auth/register", routing::post(auth::register))
        .route("/api/auth/login", routing::post(auth::login))
        .route("/api/auth/profile", routing::get(auth::get_profile))
        .route("/api/auth/forgot-password", routing::post(auth::forgot_password))
        .route("/api/auth/reset-password", routing::post(auth::reset_password))
        .route("/api/tests", routing::get(test::get_all_tests))
        .route("/api/tests/submit", routing::post(test::submit_performance))
        .route(
            "/api/leaderboard/:test_id",
            routing::get(leaderboard::get_leaderboard),
        )
        .route(
            "/api/athletes/:athlete_id/stats",
            routing::get(athlete::get_athlete_stats),
        )
        .route(
            "/api/athletes/:athlete_id/badges",
            routing::post(admin::award_badge),
        )
        .route(
            "/api/performances/:performance_id/verify",
            routing::post(admin::verify_performance),
        )
        .route(
            "/api/performances/:performance_id/flag",
            routing::post(admin::flag_performance),
        )
        .route(
            "/api/notifications",
            routing::get(notification::get_notifications),
        )
        .route(
            "/api/notifications/:notification_id/read",
            routing::post(notification::mark_notification_read),
        )
        .route("/api/liveness", routing::get(liveness))
        .route("/api/readiness", routing::get(readiness))
        .layer(Extension(pool))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("SIGINT signal received, starting graceful shutdown.");
}
