use anyhow::Result;
use desk_audit::ActivityLog;
use desk_db::NewActivity;
use desk_schemas::Actor;
use serde_json::Value;
use sqlx::PgPool;

/// Activity log backed by the `activity_log` table.
///
/// Writes use the pool, not the engine's transaction: the entry is recorded
/// after commit and a failure here cannot undo the change it describes.
#[derive(Clone)]
pub struct DbActivityLog {
    pool: PgPool,
}

impl DbActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ActivityLog for DbActivityLog {
    async fn record(&self, actor: &Actor, action: &str, details: Value) -> Result<()> {
        desk_db::insert_activity(
            &self.pool,
            &NewActivity {
                user_id: actor.user_id,
                role: actor.role.clone(),
                action: action.to_string(),
                details,
            },
        )
        .await?;
        Ok(())
    }
}
