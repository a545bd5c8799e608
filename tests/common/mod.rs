use axum::{Router, routing::get};
use filtercrate::{FilterMethod, FilterRegistry, FilterState, get_filter_form, get_filtered};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};

pub mod user_entity;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // ignore the error when another test already installed the subscriber
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let db = Database::connect("sqlite::memory:").await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(user_entity::Entity)))
        .await?;

    seed_users(&db).await?;
    Ok(db)
}

async fn seed_users(db: &DatabaseConnection) -> Result<(), DbErr> {
    let users = [
        ("Jeremy", "Jackson", "jjackson", "admin"),
        ("Sarah", "First", "sfirst", "staff"),
        ("Second", "Firstly", "secfirst", "guest"),
        ("Anna", "Smith", "anna_s", "staff"),
    ];

    for (first_name, last_name, login, role) in users {
        user_entity::ActiveModel {
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            login: Set(login.to_string()),
            role: Set(role.to_string()),
            password: Set(format!("{login}-secret")),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Users are searchable on names and login, never on the password.
pub fn users_registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry
        .register_entity::<user_entity::Entity, _>(|cfg| {
            cfg.except(["id", "password"])
                .allow_scopes(["with_role", "login_starts_with"])
                .default_method(FilterMethod::Any);
        })
        .expect("users filter configuration is valid");
    registry
}

#[allow(dead_code)]
pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/users", get(get_filtered::<user_entity::Entity>))
        .route("/users/filter_form", get(get_filter_form::<user_entity::Entity>))
        .with_state(FilterState::new(db, users_registry()));

    Router::new().nest("/api/v1", api)
}
