// src/scheduler.rs
//
// Loop de fundo que roda a ingestão e o CRM-sync para todas as contas
// elegíveis. Antes de mexer numa conta, adquire um lease no banco (um
// UPDATE condicional atômico): com duas réplicas do processo, só uma
// trabalha a conta por vez. O lease tem TTL maior que o tick para que
// um processo morto no meio da rodada não trave a conta para sempre.

use chrono::Duration as ChronoDuration;

use crate::config::AppState;

/// TTL do lease: folga sobre o intervalo para cobrir rodadas lentas.
const LEASE_TTL_SECS: i64 = 600;

pub fn spawn(app_state: AppState) {
    tokio::spawn(async move {
        run(app_state).await;
    });
}

async fn run(app_state: AppState) {
    let mut ticker = tokio::time::interval(app_state.scheduler_interval);
    // Se um tick atrasar, não tenta "recuperar" os perdidos.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = app_state.scheduler_interval.as_secs(),
        "🔄 Scheduler de ingestão iniciado"
    );

    loop {
        ticker.tick().await;
        if let Err(e) = tick(&app_state).await {
            // O loop nunca morre por causa de uma rodada ruim.
            tracing::error!("🔥 Rodada do scheduler falhou: {}", e);
        }
    }
}

async fn tick(app_state: &AppState) -> anyhow::Result<()> {
    let accounts = app_state.account_repo.list_eligible_for_sync().await?;
    if accounts.is_empty() {
        return Ok(());
    }

    tracing::debug!(accounts = accounts.len(), "Iniciando rodada de ingestão");

    for account in accounts {
        // Falha ao tentar o lease também não derruba a rodada das demais.
        let acquired = match app_state
            .account_repo
            .try_acquire_ingestion_lease(account.id, ChronoDuration::seconds(LEASE_TTL_SECS))
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(account = %account.id, "Falha ao adquirir o lease: {}", e);
                continue;
            }
        };
        if !acquired {
            tracing::debug!(account = %account.id, "Lease ocupado, pulando conta");
            continue;
        }

        // Uma conta com problema não derruba a rodada das demais.
        if let Err(e) = app_state.ingestion_service.run_for_account(&account).await {
            tracing::warn!(account = %account.id, "Ingestão da conta falhou: {}", e);
        }
        if let Err(e) = app_state.crm_sync_service.sync_account(&account).await {
            tracing::warn!(account = %account.id, "CRM-sync da conta falhou: {}", e);
        }

        if let Err(e) = app_state.account_repo.release_ingestion_lease(account.id).await {
            // O TTL expira sozinho; só registramos.
            tracing::warn!(account = %account.id, "Falha ao liberar o lease: {}", e);
        }
    }

    Ok(())
}
