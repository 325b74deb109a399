// src/services/ingestion.rs
//
// O pipeline de ingestão: para uma conta, varre os agentes no
// fornecedor, pagina as execuções concluídas, classifica os transcripts
// novos e persiste. Entrega "at-least-once, dedup por vendor_call_id":
// a trava final contra duplicatas é o índice único no banco.
//
// Semântica de falha:
//   - falha ao listar execuções de UM agente: loga e pula o agente;
//   - falha ao classificar UM transcript: persiste mesmo assim
//     (processed = true, analysis nula, texto bruto guardado);
//   - sem retry/backoff dentro da rodada — o próximo tick reprocessa o
//     que ficou de fora, já que chamadas não persistidas continuam
//     "novas" para o check de existência.

use crate::{
    common::{crypto::KeyCipher, error::AppError},
    db::{call_repo::NewCallRecord, CallRepository},
    llm::CallClassifier,
    models::{account::Account, calls::IngestionReport},
    vendor::{bolna::BolnaExecution, BolnaClient},
};

#[derive(Clone)]
pub struct IngestionService {
    call_repo: CallRepository,
    classifier: CallClassifier,
    cipher: KeyCipher,
}

impl IngestionService {
    pub fn new(call_repo: CallRepository, classifier: CallClassifier, cipher: KeyCipher) -> Self {
        Self {
            call_repo,
            classifier,
            cipher,
        }
    }

    /// Roda o pipeline inteiro para uma conta. Erros de conta inteira
    /// (sem chave, chave indecifrável, fornecedor fora do ar na listagem
    /// de agentes) sobem; erros por agente/chamada ficam contidos.
    pub async fn run_for_account(&self, account: &Account) -> Result<IngestionReport, AppError> {
        let key_enc = account
            .bolna_api_key_enc
            .as_deref()
            .ok_or(AppError::MissingVendorKey)?;
        let api_key = self.cipher.decrypt(key_enc)?;
        let client = BolnaClient::new(api_key);

        let agents = client.list_agents().await?;
        tracing::debug!(
            account = %account.id,
            agents = agents.len(),
            "Iniciando ingestão de chamadas"
        );

        let mut report = IngestionReport::default();

        for agent in &agents {
            if let Err(e) = self
                .ingest_agent(&client, account, &agent.id, &mut report)
                .await
            {
                // Um agente com problema não derruba os demais.
                tracing::warn!(
                    account = %account.id,
                    agent = %agent.id,
                    "Falha ao ingerir execuções do agente: {}",
                    e
                );
            }
        }

        tracing::info!(
            account = %account.id,
            total = report.total,
            processed = report.processed,
            failed = report.failed,
            "Ingestão concluída"
        );

        Ok(report)
    }

    async fn ingest_agent(
        &self,
        client: &BolnaClient,
        account: &Account,
        agent_id: &str,
        report: &mut IngestionReport,
    ) -> Result<(), AppError> {
        let mut page_number = 1u32;

        loop {
            let page = client
                .list_executions(agent_id, page_number, Some("completed"))
                .await?;

            let fetched = page.data.len();
            for execution in page.data {
                self.ingest_execution(account, agent_id, execution, report)
                    .await?;
            }

            let last_page = page
                .total_pages
                .is_some_and(|total| page_number >= total)
                || fetched < crate::vendor::bolna::EXECUTIONS_PAGE_SIZE as usize;
            if last_page {
                break;
            }
            page_number += 1;
        }

        Ok(())
    }

    async fn ingest_execution(
        &self,
        account: &Account,
        agent_id: &str,
        execution: BolnaExecution,
        report: &mut IngestionReport,
    ) -> Result<(), AppError> {
        // Nada a classificar sem transcript.
        if !execution.has_transcript() {
            return Ok(());
        }

        // Checagem barata antes de gastar tokens do LLM. A idempotência
        // de verdade é o ON CONFLICT do insert.
        if self
            .call_repo
            .exists(account.id, &execution.id)
            .await?
        {
            return Ok(());
        }

        let transcript = execution.transcript.as_deref().unwrap_or_default();

        // Classificação nunca bloqueia a ingestão: qualquer falha vira
        // analysis nula com o texto bruto preservado.
        let (analysis, raw_text) = match self.classifier.classify(transcript).await {
            Ok(classification) => (classification.analysis, classification.raw_text),
            Err(e) => {
                tracing::warn!(
                    call = %execution.id,
                    "Classificador indisponível para a chamada: {}",
                    e
                );
                (None, String::new())
            }
        };

        let duration_secs = execution
            .telephony_data
            .as_ref()
            .and_then(|t| t.duration)
            .map(|d| d.round() as i32);

        let new_call = NewCallRecord {
            vendor_call_id: &execution.id,
            agent_id: Some(agent_id),
            caller_number: execution.caller_number(),
            direction: execution.direction(),
            duration_secs,
            started_at: execution.created_at,
            transcript: Some(transcript),
            recording_url: execution
                .telephony_data
                .as_ref()
                .and_then(|t| t.recording_url.as_deref()),
            cost_breakdown: execution.cost_breakdown.as_ref(),
            llm_analysis: analysis.as_ref(),
            raw_llm_output: if raw_text.is_empty() {
                None
            } else {
                Some(&raw_text)
            },
        };

        match self.call_repo.insert_if_new(account.id, new_call).await? {
            Some(_) => record_outcome(report, analysis.is_some()),
            // Outra rodada inseriu primeiro (ticks sobrepostos): o índice
            // único segurou a duplicata, não contamos nada.
            None => tracing::debug!(call = %execution.id, "Chamada já ingerida, ignorando"),
        }

        Ok(())
    }
}

/// Atualiza os agregados de uma rodada para uma chamada NOVA.
fn record_outcome(report: &mut IngestionReport, classified: bool) {
    report.total += 1;
    if classified {
        report.processed += 1;
    } else {
        report.failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contadores_da_rodada() {
        let mut report = IngestionReport::default();
        record_outcome(&mut report, true);
        record_outcome(&mut report, true);
        record_outcome(&mut report, false);

        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn uma_chamada_nova_classificada() {
        // O cenário fim-a-fim da rodada com uma execução já ingerida
        // (não chega a contar) e uma nova classificada com sucesso.
        let mut report = IngestionReport::default();
        record_outcome(&mut report, true);

        assert_eq!(report.total, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
    }
}
