//! Drives the console workflows through the HTTP client against the real
//! router served on an ephemeral port.

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use steeple_api::router::build_app_router;
use steeple_api::state::AppState;
use steeple_client::{ClientConfig, SteepleApi};
use steeple_core::attendance::{AttendanceKey, AttendanceStatus, ServiceType};
use steeple_core::board::{ScheduleBadge, ScheduleBoard};
use steeple_core::reconciliation::{AttendanceSession, SaveOutcome, SessionPhase};
use steeple_core::recurrence::RecurrenceRule;
use steeple_core::schedule::ScheduleInput;
use steeple_core::store::{ConsoleError, TransportError};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

async fn serve(pool: PgPool) -> SteepleApi {
    let config = steeple_api::config::ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    };
    let state = AppState { pool };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    SteepleApi::new(&ClientConfig::new(format!("http://{addr}"))).unwrap()
}

async fn seed_member(pool: &PgPool, first: &str, last: &str) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO members (first_name, last_name) VALUES ($1, $2) RETURNING id")
            .bind(first)
            .bind(last)
            .fetch_one(pool)
            .await
            .unwrap();
    id
}

fn worship(y: i32, m: u32, d: u32) -> AttendanceKey {
    AttendanceKey::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), ServiceType::Worship)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_saves_and_moves_through_http(pool: PgPool) {
    let ann = seed_member(&pool, "Ann", "Adams").await;
    let ben = seed_member(&pool, "Ben", "Baker").await;
    let cal = seed_member(&pool, "Cal", "Clark").await;
    let api = serve(pool.clone()).await;

    let from = worship(2024, 5, 5);
    let to = worship(2024, 5, 12);

    // Cal was already recorded at the destination.
    let session = AttendanceSession::open(api.clone(), to).await.unwrap();
    session.set_status(cal, AttendanceStatus::Present).await.unwrap();
    assert_eq!(session.save(today()).await.unwrap(), SaveOutcome::Saved { key: to });

    // Record Ann on the wrong Sunday, then move it.
    session.load(from).await.unwrap();
    session.set_status(ann, AttendanceStatus::Present).await.unwrap();
    assert_matches!(session.save(today()).await, Ok(SaveOutcome::Saved { .. }));

    session.select(to).await.unwrap();
    let risk = assert_matches!(
        session.save(today()).await,
        Ok(SaveOutcome::ConfirmationRequired(risk)) => risk
    );
    assert_eq!(risk.row_count, 1);

    let outcome = session.confirm_move().await.unwrap();
    assert_eq!(outcome, SaveOutcome::Moved { from, to });
    assert_eq!(session.phase().await, SessionPhase::Viewing);

    let dest = api.get_roster(to).await.unwrap();
    let status = |id| dest.items.iter().find(|r| r.member.id == id).unwrap().status;
    assert_eq!(status(ann), AttendanceStatus::Present);
    assert_eq!(status(ben), AttendanceStatus::Absent);
    assert_eq!(status(cal), AttendanceStatus::Present);

    let summary = api.get_summary(from).await.unwrap();
    assert_eq!(summary.present, 0);
    assert_eq!(summary.total, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_server_rejection_rolls_session_back(pool: PgPool) {
    let ann = seed_member(&pool, "Ann", "Adams").await;
    let api = serve(pool.clone()).await;
    let key = worship(2024, 5, 5);

    let session = AttendanceSession::open(api.clone(), key).await.unwrap();
    session.set_status(ann, AttendanceStatus::Present).await.unwrap();

    // The member disappears between load and save; the server answers 400.
    sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(ann)
        .execute(&pool)
        .await
        .unwrap();

    let err = session.save(today()).await.unwrap_err();
    assert_matches!(
        err,
        ConsoleError::Transport(TransportError {
            status: Some(400),
            ..
        })
    );
    assert_eq!(session.phase().await, SessionPhase::Dirty);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_note_edit_persists_full_roster(pool: PgPool) {
    let ann = seed_member(&pool, "Ann", "Adams").await;
    seed_member(&pool, "Ben", "Baker").await;
    let api = serve(pool.clone()).await;
    let key = worship(2024, 5, 5);

    let session = AttendanceSession::open(api.clone(), key).await.unwrap();
    session.edit_note(ann, "arrived late", today()).await.unwrap();

    let sheet = api.get_roster(key).await.unwrap();
    assert_eq!(sheet.items[0].notes, "arrived late");
    assert_eq!(api.list_members().await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_board_round_trip_through_http(pool: PgPool) {
    let api = serve(pool).await;
    let board = ScheduleBoard::new(api.clone());

    let prayer = board
        .create(ScheduleInput {
            title: None,
            day_of_week: "Wednesday".to_string(),
            service_name: "Midweek Prayer".to_string(),
            preacher: None,
            location: None,
            latitude: None,
            longitude: None,
            starts_at: at(2024, 5, 1, 19),
            ends_at: None,
            recurrence_rule: RecurrenceRule::Weekly,
        })
        .await
        .unwrap();
    assert!(prayer.id > 0);

    let mut lapsed = ScheduleInput {
        service_name: "Lenten Vespers".to_string(),
        starts_at: at(2024, 2, 14, 18),
        ends_at: Some(at(2024, 3, 27, 18)),
        ..ScheduleInput {
            title: None,
            day_of_week: "Wednesday".to_string(),
            service_name: String::new(),
            preacher: None,
            location: None,
            latitude: None,
            longitude: None,
            starts_at: at(2024, 1, 1, 0),
            ends_at: None,
            recurrence_rule: RecurrenceRule::Weekly,
        }
    };
    let vespers = board.create(lapsed.clone()).await.unwrap();

    // Fresh board sees what the server stored.
    let fresh = ScheduleBoard::new(api.clone());
    fresh.refresh().await.unwrap();
    let cards = fresh.cards(at(2024, 5, 6, 9)).await;
    assert_eq!(cards.len(), 2);
    let prayer_card = cards.iter().find(|c| c.schedule.id == prayer.id).unwrap();
    assert_eq!(prayer_card.badge, ScheduleBadge::Next);
    let vespers_card = cards.iter().find(|c| c.schedule.id == vespers.id).unwrap();
    assert_eq!(vespers_card.badge, ScheduleBadge::Ended);

    // The server computes the same annotations.
    let server_cards = api.overview(Some(at(2024, 5, 6, 9))).await.unwrap();
    assert_eq!(server_cards, cards);

    lapsed.ends_at = None;
    let updated = board.update(vespers.id, lapsed).await.unwrap();
    assert_eq!(updated.ends_at, None);

    let window = api
        .occurrences(prayer.id, at(2024, 5, 1, 0), at(2024, 5, 15, 0))
        .await
        .unwrap();
    assert_eq!(window.occurrences, vec![at(2024, 5, 1, 19), at(2024, 5, 8, 19)]);

    board.delete(prayer.id).await.unwrap();
    assert_matches!(
        api.get_schedule(prayer.id).await,
        Err(steeple_client::ClientError::ApiError { status: 404, .. })
    );
}
