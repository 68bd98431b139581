//! Schedule Planner Demo Binary
//!
//! Loads a student's schedule through the synchronization engine, optionally
//! performs one move or removal, and prints the resulting grid as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Load from a seeded in-memory service
//! SCHEDULE_SEED_FILE=seed.json cargo run --bin schedule-planner
//!
//! # Drag course 12 to term 9, period 1
//! SCHEDULE_SEED_FILE=seed.json cargo run --bin schedule-planner -- move 12 term9-period1
//!
//! # Remove enrollment 3
//! SCHEDULE_SEED_FILE=seed.json cargo run --bin schedule-planner -- remove 3
//! ```
//!
//! # Environment Variables
//!
//! - `SCHEDULE_SEED_FILE`: JSON seed for the local service
//! - `SCHEDULE_SERVICE_TYPE`, `SCHEDULE_SERVICE_URL`, `SCHEDULE_USER_ID`: see `EngineConfig`
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use schedule_sync::api::{CourseId, EnrollmentId};
use schedule_sync::remote::{LocalScheduleService, ScheduleService, ServiceFactory, ServiceType};
use schedule_sync::services::DropOutcome;
use schedule_sync::{EngineConfig, ScheduleEngine};

enum Command {
    Show,
    Move { course_id: CourseId, zone: String },
    Remove { enrollment_id: EnrollmentId },
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args {
        [] => Ok(Command::Show),
        [cmd, course_id, zone] if cmd == "move" => Ok(Command::Move {
            course_id: CourseId::new(course_id.parse().context("course id must be a number")?),
            zone: zone.clone(),
        }),
        [cmd, enrollment_id] if cmd == "remove" => Ok(Command::Remove {
            enrollment_id: EnrollmentId::new(
                enrollment_id
                    .parse()
                    .context("enrollment id must be a number")?,
            ),
        }),
        _ => bail!("usage: schedule-planner [move <course-id> <zone> | remove <enrollment-id>]"),
    }
}

fn build_service(config: &EngineConfig) -> anyhow::Result<Arc<dyn ScheduleService>> {
    if config.service.service_type()? == ServiceType::Local {
        if let Ok(path) = env::var("SCHEDULE_SEED_FILE") {
            let service = LocalScheduleService::from_file(&path)?;
            info!("Seeded local service from {}", path);
            return Ok(Arc::new(service));
        }
        warn!("SCHEDULE_SEED_FILE not set, starting with an empty schedule");
    }
    Ok(ServiceFactory::create(config)?)
}

/// Wait until every optimistic change is confirmed or rolled back.
async fn settle(engine: &ScheduleEngine, limit: Duration) {
    let mut updates = engine.store().subscribe();
    let wait = async {
        while updates.borrow_and_update().has_pending() {
            if updates.changed().await.is_err() {
                break;
            }
        }
    };
    if tokio::time::timeout(limit, wait).await.is_err() {
        warn!("operations still pending after {:?}", limit);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let config = EngineConfig::load()?;
    info!(
        "Starting schedule planner for user {} ({} service)",
        config.user_id, config.service.service_type
    );

    let service = build_service(&config)?;
    if !service.health_check().await? {
        warn!("Schedule service reports unhealthy");
    }

    let engine = ScheduleEngine::start(service, &config);
    engine.load_schedule().await?;

    match command {
        Command::Show => {}
        Command::Move { course_id, zone } => {
            if !engine.drag().drag_started(course_id) {
                bail!("course {} is not on the grid", course_id);
            }
            match engine.drag().drag_ended(Some(&zone)) {
                DropOutcome::Dispatched(id) => info!("Move {} dispatched", id),
                other => warn!("Drop had no effect: {:?}", other),
            }
        }
        Command::Remove { enrollment_id } => match engine.remove_course(enrollment_id) {
            Some(id) => info!("Removal {} dispatched", id),
            None => warn!("enrollment {} is not on the grid", enrollment_id),
        },
    }

    settle(&engine, config.sync.idle_threshold() * 2).await;

    for notification in engine.notifications().drain() {
        warn!("[{:?}] {}", notification.level, notification.message);
    }
    println!("{}", serde_json::to_string_pretty(&engine.grid())?);

    engine.shutdown().await;
    Ok(())
}
