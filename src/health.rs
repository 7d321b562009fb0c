//! Minimal liveness/readiness HTTP surface, served alongside the sync/media
//! worker loops so the daemon is deployable behind the same orchestration
//! tooling as the teacher's API service. This is ambient ops surface, not
//! the public read API carved out by spec.md's Non-goals.

use std::sync::Arc;

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadinessResponse {
    status: &'static str,
    database: &'static str,
}

/// LIVENESS PROBE
/// - No I/O, no DB round-trip.
#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// READINESS PROBE
/// - Confirms the relational store is reachable.
#[get("/ready")]
async fn readiness(db: web::Data<Arc<DatabaseConnection>>) -> impl Responder {
    let database_status = match db
        .execute(Statement::from_string(db.get_database_backend(), "SELECT 1"))
        .await
    {
        Ok(_) => "ok",
        Err(_) => "unhealthy",
    };

    if database_status == "ok" {
        HttpResponse::Ok().json(ReadinessResponse {
            status: "ok",
            database: database_status,
        })
    } else {
        HttpResponse::ServiceUnavailable().json(ReadinessResponse {
            status: "unhealthy",
            database: database_status,
        })
    }
}

/// Serves `/health` and `/ready` until the process exits. Runs as a spawned
/// task alongside the orchestrator; a bind failure is logged and the task
/// exits without taking down the sync/media loops.
pub async fn serve(host: String, port: u16, db: Arc<DatabaseConnection>) {
    let addr = format!("{host}:{port}");
    info!(%addr, "starting health/readiness server");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .service(health)
            .service(readiness)
    })
    .bind(&addr);

    match server {
        Ok(server) => {
            if let Err(e) = server.run().await {
                error!(error = %e, "health server exited with error");
            }
        }
        Err(e) => {
            error!(error = %e, %addr, "failed to bind health server");
        }
    }
}
