use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use taskly_reminders::features::reminders::run_until_shutdown;
use taskly_reminders::features::{get_app_version, get_features};
use taskly_reminders::{Config, ReminderScheduler, SmtpMailer, SupabaseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Taskly reminder service v{}...", get_app_version());
    for feature in get_features() {
        info!("  {} v{}", feature.name, feature.version);
    }

    let mailer = Arc::new(SmtpMailer::new(config.smtp.as_ref(), &config.email_from)?);

    let scheduler_task = match &config.supabase {
        Some(supabase) => {
            let store = Arc::new(SupabaseStore::new(supabase)?);
            let scheduler = Arc::new(ReminderScheduler::new(
                store.clone(),
                store,
                mailer,
                &config,
            )?);
            info!(
                "Reminder scheduler configured (schedule: '{}', horizon: {}h)",
                scheduler.schedule_expr(),
                config.horizon_hours
            );
            Some(tokio::spawn(scheduler.run()))
        }
        None => {
            warn!("Supabase is not configured (SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY) - reminder scheduler not started.");
            None
        }
    };

    match scheduler_task {
        Some(handle) => run_until_shutdown(handle, tokio::signal::ctrl_c()).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
        }
    }

    Ok(())
}
