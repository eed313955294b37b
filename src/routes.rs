use std::path::PathBuf;
use std::time::Duration;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::backup::{BackupService, GitHubClient};
use crate::db::DbPool;
use crate::handlers::{activities, backup, health, log, plan, session, settings, workouts};
use crate::repositories::{
    BackupRepository, KvStore, LogRepository, PlanRepository, SessionRepository,
    SettingsRepository, WorkoutRepository,
};
use crate::timer::SessionManager;

/// Everything the server wires together, shared between `main` and tests.
pub struct App {
    pub router: Router,
    pub backup: BackupService,
    pub sessions: SessionManager,
    pub workout_repo: WorkoutRepository,
}

pub struct AppOptions {
    pub github_api_url: String,
    pub data_dir: PathBuf,
    pub tick: Duration,
}

pub fn build_app(pool: DbPool, options: AppOptions) -> App {
    let kv = KvStore::new(pool);
    let workout_repo = WorkoutRepository::new(kv.clone());
    let plan_repo = PlanRepository::new(kv.clone());
    let log_repo = LogRepository::new(kv.clone());
    let settings_repo = SettingsRepository::new(kv.clone());
    let backups = BackupRepository::new(kv.clone());
    let session_repo = SessionRepository::new(kv);

    let backup_service = BackupService::new(
        GitHubClient::new(&options.github_api_url),
        backups.clone(),
        settings_repo.clone(),
        options.data_dir,
    );
    let sessions = SessionManager::new(options.tick);

    let router = create_router(
        plan::PlanState {
            plan_repo,
            workout_repo: workout_repo.clone(),
        },
        workouts::WorkoutsState {
            workout_repo: workout_repo.clone(),
        },
        activities::ActivitiesState {
            workout_repo: workout_repo.clone(),
        },
        session::TimerState {
            sessions: sessions.clone(),
            workout_repo: workout_repo.clone(),
            session_repo,
            backup: backup_service.clone(),
        },
        log::LogState {
            log_repo,
            settings_repo: settings_repo.clone(),
        },
        backup::BackupState { backups },
        settings::SettingsState {
            settings_repo,
            backup: backup_service.clone(),
        },
    );

    App {
        router,
        backup: backup_service,
        sessions,
        workout_repo,
    }
}

pub fn create_router(
    plan_state: plan::PlanState,
    workouts_state: workouts::WorkoutsState,
    activities_state: activities::ActivitiesState,
    timer_state: session::TimerState,
    log_state: log::LogState,
    backup_state: backup::BackupState,
    settings_state: settings::SettingsState,
) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/plan") }))
        .route("/health", get(health::health_check))
        // Plan routes
        .route("/plan", get(plan::index))
        .route("/plan/{date}/items", post(plan::schedule))
        .route("/plan/{date}/items/{id}/delete", post(plan::unschedule))
        .route(
            "/plan/{date}/items/{id}/recurring",
            post(plan::toggle_recurring),
        )
        .route(
            "/plan/{date}/items/{id}/complete",
            post(plan::toggle_completed),
        )
        .route("/plan/{date}/note", post(plan::set_note))
        .route("/plan/{date}/note/delete", post(plan::delete_note))
        .with_state(plan_state)
        // Workout routes
        .route("/workouts", get(workouts::list).post(workouts::create))
        .route("/workouts/new", get(workouts::new_page))
        .route("/workouts/{id}/edit", get(workouts::edit_page))
        .route("/workouts/{id}", post(workouts::update))
        .route("/workouts/{id}/delete", post(workouts::delete))
        .with_state(workouts_state)
        // Activity routes
        .route(
            "/activities",
            get(activities::list).post(activities::create),
        )
        .route("/activities/{name}", post(activities::update))
        .route("/activities/{name}/delete", post(activities::delete))
        .with_state(activities_state)
        // Session routes
        .route("/session", get(session::show))
        .route("/session/state", get(session::state_json))
        .route("/remote", get(session::remote))
        .route("/session/start", post(session::start))
        .route("/session/begin", post(session::begin))
        .route("/session/adjust", post(session::adjust))
        .route("/session/skip", post(session::skip))
        .route("/session/reps", post(session::add_reps))
        .route("/session/sets/{index}/reps", post(session::set_reps))
        .route("/session/sets/{index}/toggle", post(session::toggle_set))
        .route("/session/weight", post(session::set_weight))
        .route("/session/finish", post(session::finish))
        .route("/session/cancel", post(session::cancel))
        .with_state(timer_state)
        // Log routes
        .route("/log", get(log::index))
        .route("/log/charts", get(log::charts_json))
        .route(
            "/log/settings",
            get(log::settings_page).post(log::save_settings),
        )
        .route("/log/clear", post(log::clear))
        .route("/log/{index}/delete", post(log::delete))
        .with_state(log_state)
        // Backup routes
        .route("/backup/export", get(backup::export))
        .route("/backup/import", post(backup::import))
        .with_state(backup_state)
        // Settings routes
        .route("/settings", get(settings::index).post(settings::save))
        .route("/settings/github/save", post(settings::github_save))
        .route("/settings/github/load", post(settings::github_load))
        .with_state(settings_state)
}
