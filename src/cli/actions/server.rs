use crate::api;
use crate::api::handlers::auth::AppConfig;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            base_url,
        } => {
            let config = AppConfig::new(base_url);

            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
