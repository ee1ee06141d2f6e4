use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::UpdateKind};

use tokio::sync::{Mutex, OwnedMutexGuard};

use dwb_core::{
    config::Config,
    entitlement::EntitlementStore,
    messaging::port::MessagingPort,
    policy::AccessPolicy,
    resolver::LinkResolver,
    store::JsonFileStore,
    usage::UsageTracker,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub entitlements: Arc<EntitlementStore>,
    pub usage: Arc<UsageTracker>,
    pub policy: AccessPolicy,
    pub resolver: LinkResolver,
    pub messenger: Arc<dyn MessagingPort>,
    pub user_locks: Arc<UserLocks>,
}

/// Per-user mutexes serializing the check-resolve-record sequence, so two
/// near-simultaneous requests from one user cannot both pass the access
/// check before either records usage.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub fn build_state(cfg: Arc<Config>, bot: Bot) -> dwb_core::Result<Arc<AppState>> {
    let entitlements = Arc::new(EntitlementStore::new(Arc::new(JsonFileStore::new(
        cfg.premium_file.clone(),
    ))));
    let usage = Arc::new(UsageTracker::new(
        Arc::new(JsonFileStore::new(cfg.usage_file.clone())),
        cfg.free_window_hours,
    ));
    let policy = AccessPolicy::new(entitlements.clone(), usage.clone());
    let resolver = LinkResolver::new(cfg.fetch_timeout)?;
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot));

    Ok(Arc::new(AppState {
        cfg,
        entitlements,
        usage,
        policy,
        resolver,
        messenger,
        user_locks: Arc::new(UserLocks::default()),
    }))
}

/// Long-polling mode: the teloxide dispatcher sequences updates per chat.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!("dwb started (polling): @{}", me.username());
    }

    let state = build_state(cfg, bot.clone())?;

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Webhook mode: the axum boundary feeds a channel and a single worker
/// drains it, one update at a time.
pub async fn run_webhook(cfg: Arc<Config>, addr: SocketAddr) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!("dwb started (webhook): @{}", me.username());
    }

    let state = build_state(cfg.clone(), bot)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let server = tokio::spawn(dwb_webhook::serve(addr, cfg.webhook_secret.clone(), tx));

    while let Some(update) = rx.recv().await {
        dispatch_update(update, state.clone()).await;
    }

    // The channel only closes when the server task is gone.
    match server.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(anyhow::anyhow!("webhook server failed: {e}")),
        Err(e) => Err(anyhow::anyhow!("webhook server panicked: {e}")),
    }
}

/// Route one decoded update to the handlers. Shared by the webhook drain
/// loop; the polling dispatcher routes through dptree instead.
pub async fn dispatch_update(update: Update, state: Arc<AppState>) {
    match update.kind {
        UpdateKind::Message(msg) => {
            if let Err(e) = handlers::handle_message(msg, state).await {
                tracing::warn!("message handler failed: {e}");
            }
        }
        UpdateKind::CallbackQuery(q) => {
            if let Err(e) = handlers::handle_callback(q, state).await {
                tracing::warn!("callback handler failed: {e}");
            }
        }
        other => {
            tracing::debug!("ignoring update kind: {other:?}");
        }
    }
}
