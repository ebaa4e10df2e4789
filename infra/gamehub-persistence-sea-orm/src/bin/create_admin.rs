use gamehub_app::{
    domain::user::{NewUser, Role, UserRepository},
    services::password::hash_password,
};
use gamehub_persistence_sea_orm::{create_db_pool, entity::user, users::UserRepositoryImpl};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let email = std::env::var("GAMEHUB_ADMIN_EMAIL").expect("GAMEHUB_ADMIN_EMAIL must be set");
    let username =
        std::env::var("GAMEHUB_ADMIN_USERNAME").expect("GAMEHUB_ADMIN_USERNAME must be set");
    let password =
        std::env::var("GAMEHUB_ADMIN_PASSWORD").expect("GAMEHUB_ADMIN_PASSWORD must be set");

    let pool = create_db_pool().await;
    let existing = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .one(&pool)
        .await
        .expect("Failed to look up admin accounts");
    if let Some(admin) = existing {
        println!("Admin account already exists: {}", admin.email);
        return;
    }

    let password_hash = hash_password(&password).expect("Failed to hash admin password");
    let users = UserRepositoryImpl::with_connection(pool);
    let admin = users
        .create_user(NewUser {
            email,
            username,
            password_hash,
            first_name: Some("Admin".to_string()),
            last_name: Some("User".to_string()),
            role: Role::Admin,
            is_verified: true,
        })
        .await
        .expect("Failed to create admin account");

    println!("Created admin account {} ({})", admin.username, admin.id);
}
