use std::sync::Arc;

use dwb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), dwb_core::Error> {
    dwb_core::logging::init("dwb")?;

    let cfg = Arc::new(Config::load()?);

    let mode = match cfg.webhook_bind {
        Some(addr) => dwb_telegram::router::run_webhook(cfg.clone(), addr).await,
        None => dwb_telegram::router::run_polling(cfg).await,
    };

    mode.map_err(|e| dwb_core::Error::External(format!("bot failed: {e}")))?;

    Ok(())
}
