use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use scolaris_auth::{Role, Session, create_access_token};
use scolaris_config::JwtConfig;
use scolaris_core::{AppError, hash_password, verify_password};
use scolaris_models::auth::{LoginRequest, LoginResponse, MeResponse, RegisterSchoolRequest};
use scolaris_models::subscription::Subscription;
use scolaris_models::users::{User, UserCredentials, normalize_email};

use crate::metrics;
use crate::modules::school::service::SchoolService;
use crate::modules::settings::service::SettingsService;

pub(crate) const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, role, school_id, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    fn issue_token(user: User, jwt_config: &JwtConfig) -> Result<LoginResponse, AppError> {
        let access_token = create_access_token(
            user.id,
            &user.email,
            user.role,
            user.school_id,
            jwt_config,
        )?;
        metrics::track_jwt_issued();

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }

    /// Creates a school on a fresh trial together with its first admin.
    #[instrument(skip(db, dto, jwt_config), fields(school.name = %dto.school_name, db.operation = "INSERT", db.table = "schools"))]
    pub async fn register_school(
        db: &PgPool,
        dto: RegisterSchoolRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let trial_days = SettingsService::trial_days(db).await?;
        let trial = Subscription::trial(trial_days, Utc::now()).map_err(AppError::unprocessable)?;
        let email = normalize_email(&dto.email);
        let hashed_password = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;

        let school_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO schools (name, address, phone, email, subscription_end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(dto.school_name.trim())
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(dto.school_email.as_deref().map(normalize_email))
        .bind(trial.end_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!("Registration with an existing school name");
                return AppError::conflict(anyhow::anyhow!("School name already exists"));
            }
            error!(error = %e, "Database error creating school");
            AppError::from(e)
        })?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password, role, school_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&email)
        .bind(&hashed_password)
        .bind(Role::Admin)
        .bind(school_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!("Registration with an existing admin email");
                return AppError::conflict(anyhow::anyhow!("Email already registered"));
            }
            AppError::from(e)
        })?;

        tx.commit().await?;

        metrics::track_school_registered();
        info!(school.id = %school_id, user.id = %user.id, trial_days, "School registered");

        Self::issue_token(user, jwt_config)
    }

    #[instrument(skip(db, dto, jwt_config), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let email = normalize_email(&dto.email);

        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password, role, school_id FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(credentials) = credentials else {
            debug!("Login for unknown email");
            metrics::track_user_login_failure("unknown_email");
            return Err(AppError::unauthorized("Invalid email or password".to_string()));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            debug!(user.id = %credentials.id, "Login with wrong password");
            metrics::track_user_login_failure("wrong_password");
            return Err(AppError::unauthorized("Invalid email or password".to_string()));
        }

        let user = Self::get_user(db, credentials.id).await?;
        metrics::track_user_login_success(user.role.as_str());
        info!(user.id = %user.id, role = %user.role, "User logged in");

        Self::issue_token(user, jwt_config)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    pub async fn me(db: &PgPool, session: &Session) -> Result<MeResponse, AppError> {
        let user = Self::get_user(db, session.user_id).await?;
        let school = match user.school_id {
            Some(school_id) => Some(SchoolService::get_school_view(db, school_id).await?),
            None => None,
        };
        Ok(MeResponse { user, school })
    }
}
